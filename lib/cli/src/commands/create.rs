use super::parent_of;
use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;

fn parse_perm(perm: &str) -> Result<u32, String> {
    u32::from_str_radix(perm, 8)
        .ok()
        .filter(|perm| *perm <= 0o7777)
        .ok_or_else(|| format!("\"{perm}\" is not an octal permission"))
}

#[derive(Debug, Parser)]
/// The options for the `vtfs touch` and `vtfs mkdir` subcommands
pub struct Create {
    /// Absolute path of the new entry
    path: String,
    /// Permission bits, in octal
    #[clap(long, default_value = "777", value_parser = parse_perm)]
    mode: u32,
}

impl Create {
    /// Execute `vtfs touch` or, with `dir`, `vtfs mkdir`
    pub fn execute(&self, env: &VtfsEnv, dir: bool) -> Result<(), anyhow::Error> {
        let fs = env.mount()?;
        let (parent, name) = parent_of(&fs, &self.path)?;

        let created = if dir {
            fs.mkdir(parent.ino, name, self.mode)
        } else {
            fs.create(parent.ino, name, self.mode)
        };
        let attr = created.with_context(|| format!("unable to create \"{}\"", self.path))?;
        tracing::info!(path = %self.path, ino = attr.ino, "created");

        fs.unmount();
        Ok(())
    }
}
