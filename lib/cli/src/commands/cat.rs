use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;
use std::io::Write as _;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Parser)]
/// The options for the `vtfs cat` subcommand
pub struct Cat {
    /// Absolute path of the file
    path: String,
}

impl Cat {
    /// Execute `vtfs cat`
    pub fn execute(&self, env: &VtfsEnv) -> Result<(), anyhow::Error> {
        let fs = env.mount()?;
        let attr = fs
            .resolve(&self.path)
            .with_context(|| format!("unable to open \"{}\"", self.path))?;

        let mut stdout = std::io::stdout().lock();
        let mut buf = vec![0; CHUNK_SIZE];
        let mut offset = 0;
        loop {
            let read = fs
                .read(attr.ino, &mut buf, offset)
                .with_context(|| format!("unable to read \"{}\"", self.path))?;
            if read == 0 {
                break;
            }
            stdout.write_all(&buf[..read])?;
            offset += read as u64;
        }
        stdout.flush()?;

        fs.unmount();
        Ok(())
    }
}
