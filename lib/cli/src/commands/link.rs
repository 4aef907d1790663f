use super::parent_of;
use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;

#[derive(Debug, Parser)]
/// The options for the `vtfs ln` subcommand
pub struct Link {
    /// The existing file
    target: String,
    /// The new name
    link: String,
}

impl Link {
    /// Execute `vtfs ln`
    pub fn execute(&self, env: &VtfsEnv) -> Result<(), anyhow::Error> {
        let fs = env.mount()?;
        let target = fs
            .resolve(&self.target)
            .with_context(|| format!("unable to find \"{}\"", self.target))?;
        let (parent, name) = parent_of(&fs, &self.link)?;

        let attr = fs
            .link(target.ino, parent.ino, name)
            .with_context(|| format!("unable to link \"{}\" to \"{}\"", self.link, self.target))?;
        tracing::info!(target = %self.target, link = %self.link, nlink = attr.nlink, "linked");

        fs.unmount();
        Ok(())
    }
}
