use super::parent_of;
use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;
use vtfs::Unlinked;

#[derive(Debug, Parser)]
/// The options for the `vtfs rm` and `vtfs rmdir` subcommands
pub struct Remove {
    /// Absolute path of the entry
    path: String,
}

impl Remove {
    /// Execute `vtfs rm` or, with `dir`, `vtfs rmdir`
    pub fn execute(&self, env: &VtfsEnv, dir: bool) -> Result<(), anyhow::Error> {
        let fs = env.mount()?;
        let (parent, name) = parent_of(&fs, &self.path)?;
        // Make sure the entry is known locally before removing it.
        fs.lookup(parent.ino, name)
            .with_context(|| format!("unable to find \"{}\"", self.path))?;

        let removed = if dir {
            fs.rmdir(parent.ino, name)
        } else {
            fs.unlink(parent.ino, name)
        };
        match removed.with_context(|| format!("unable to remove \"{}\"", self.path))? {
            Unlinked::Live { nlink } => tracing::info!(path = %self.path, nlink, "removed name"),
            Unlinked::Deleted { path } => tracing::info!(%path, "deleted"),
        }

        fs.unmount();
        Ok(())
    }
}
