use super::parent_of;
use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;
use std::io::Read;
use vtfs::{Mode, StoreError};

#[derive(Debug, Parser)]
/// The options for the `vtfs write` subcommand
pub struct Write {
    /// Absolute path of the file
    path: String,
    /// The bytes to write. Read from stdin when omitted
    data: Option<String>,
    /// Where in the file to start writing
    #[clap(long, default_value_t = 0)]
    offset: u64,
}

impl Write {
    /// Execute `vtfs write`
    pub fn execute(&self, env: &VtfsEnv) -> Result<(), anyhow::Error> {
        let data = match &self.data {
            Some(data) => data.clone().into_bytes(),
            None => {
                let mut data = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut data)
                    .context("unable to read stdin")?;
                data
            }
        };

        let fs = env.mount()?;
        let file = match fs.resolve(&self.path) {
            Ok(file) => file,
            Err(StoreError::NotFound) => {
                let (parent, name) = parent_of(&fs, &self.path)?;
                fs.create(parent.ino, name, Mode::DEFAULT_PERM)
                    .with_context(|| format!("unable to create \"{}\"", self.path))?
            }
            Err(err) => {
                return Err(err).with_context(|| format!("unable to open \"{}\"", self.path))
            }
        };

        let written = fs
            .write(file.ino, &data, self.offset)
            .with_context(|| format!("unable to write to \"{}\"", self.path))?;
        tracing::info!(path = %self.path, written, offset = self.offset, "wrote");

        fs.unmount();
        Ok(())
    }
}
