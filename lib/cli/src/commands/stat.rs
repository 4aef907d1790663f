use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;

#[derive(Debug, Parser)]
/// The options for the `vtfs stat` subcommand
pub struct Stat {
    /// Absolute path of the entry
    path: String,
}

impl Stat {
    /// Execute `vtfs stat`
    pub fn execute(&self, env: &VtfsEnv) -> Result<(), anyhow::Error> {
        let fs = env.mount()?;
        let attr = fs
            .resolve(&self.path)
            .with_context(|| format!("unable to stat \"{}\"", self.path))?;

        println!("  File: {}", self.path);
        println!("  Size: {}\tLinks: {}", attr.size, attr.nlink);
        println!(" Inode: {}\tMode: {} ({:04o})", attr.ino, attr.mode, attr.mode.perm());
        println!("Access: {}", attr.accessed);
        println!("Modify: {}", attr.modified);
        println!("Change: {}", attr.changed);

        fs.unmount();
        Ok(())
    }
}
