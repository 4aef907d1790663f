//! The commands available in the `vtfs` binary.
mod cat;
mod create;
mod link;
mod list;
mod remove;
mod serve;
mod stat;
mod write;

pub use self::{
    cat::Cat, create::Create, link::Link, list::List, remove::Remove, serve::Serve, stat::Stat,
    write::Write,
};

use crate::{logging::Output, VtfsEnv};
use anyhow::Context;
use clap::Parser;
use vtfs::{store::path, Attr, Vtfs};

/// Command-line arguments for the vtfs CLI.
#[derive(Parser, Debug)]
#[clap(name = "vtfs", author, version, about = concat!("vtfs ", env!("CARGO_PKG_VERSION")))]
pub struct VtfsCmd {
    #[clap(flatten)]
    output: Output,
    #[clap(flatten)]
    env: VtfsEnv,
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(clap::Subcommand, Debug)]
enum Cmd {
    /// Serve an in-memory remote store
    Serve(Serve),
    /// Show the attributes of an entry
    Stat(Stat),
    /// Print the contents of a file
    Cat(Cat),
    /// Write to a file, creating it when missing
    Write(Write),
    /// Create an empty file
    Touch(Create),
    /// Create a directory
    Mkdir(Create),
    /// Remove a file
    Rm(Remove),
    /// Remove an empty directory
    Rmdir(Remove),
    /// Add a name for an existing file
    Ln(Link),
    /// List a directory
    Ls(List),
}

impl VtfsCmd {
    pub fn execute(self) -> Result<(), anyhow::Error> {
        let VtfsCmd { output, env, cmd } = self;
        output.initialize_logging();

        match cmd {
            Cmd::Serve(serve) => serve.execute(&env),
            Cmd::Stat(stat) => stat.execute(&env),
            Cmd::Cat(cat) => cat.execute(&env),
            Cmd::Write(write) => write.execute(&env),
            Cmd::Touch(touch) => touch.execute(&env, false),
            Cmd::Mkdir(mkdir) => mkdir.execute(&env, true),
            Cmd::Rm(rm) => rm.execute(&env, false),
            Cmd::Rmdir(rmdir) => rmdir.execute(&env, true),
            Cmd::Ln(ln) => ln.execute(&env),
            Cmd::Ls(ls) => ls.execute(&env),
        }
    }

    /// The main function for the vtfs CLI tool.
    pub fn run() {
        if let Err(err) = Self::parse().execute() {
            eprintln!("error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Resolve the directory that will hold `path`, returning it with the
/// new entry's name.
fn parent_of<'a>(fs: &Vtfs, path: &'a str) -> Result<(Attr, &'a str), anyhow::Error> {
    let (parent, name) = path::split_parent(path)
        .with_context(|| format!("\"{path}\" is not an absolute path to an entry"))?;
    let parent = fs
        .resolve(parent)
        .with_context(|| format!("unable to resolve \"{parent}\""))?;
    Ok((parent, name))
}
