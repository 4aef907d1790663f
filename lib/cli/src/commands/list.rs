use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;
use vtfs::{Mode, Vtfs};

#[derive(Debug, Parser)]
/// The options for the `vtfs ls` subcommand
pub struct List {
    /// Absolute path of the directory
    #[clap(default_value = "/")]
    path: String,
}

impl List {
    /// Execute `vtfs ls`
    ///
    /// Asks the remote store when one is configured, and lists what is
    /// cached locally otherwise or when the remote listing fails.
    pub fn execute(&self, env: &VtfsEnv) -> Result<(), anyhow::Error> {
        let fs = env.mount()?;

        let lines = match fs.remote().map(|remote| remote.list(&self.path)) {
            Some(Ok(entries)) => entries
                .into_iter()
                .map(|entry| {
                    let mode = Mode::from_bits(entry.mode).unwrap_or(Mode::file(entry.mode));
                    format_line(mode, entry.size, &entry.name)
                })
                .collect(),
            Some(Err(err)) => {
                tracing::warn!(path = %self.path, error = %err, "remote listing failed, listing the cache");
                self.list_local(&fs)?
            }
            None => self.list_local(&fs)?,
        };
        for line in lines {
            println!("{line}");
        }

        fs.unmount();
        Ok(())
    }

    fn list_local(&self, fs: &Vtfs) -> Result<Vec<String>, anyhow::Error> {
        let dir = fs
            .resolve(&self.path)
            .with_context(|| format!("unable to open \"{}\"", self.path))?;

        let mut lines = Vec::new();
        for entry in fs.read_dir(dir.ino)? {
            let entry = entry?;
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            let size = fs.getattr(entry.ino).map(|attr| attr.size).unwrap_or(0);
            lines.push(format_line(entry.mode, size, &entry.name));
        }
        Ok(lines)
    }
}

fn format_line(mode: Mode, size: u64, name: &str) -> String {
    format!("{mode} {size:>8} {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_look_like_ls() {
        assert_eq!(
            format_line(Mode::dir(0o755), 0, "docs"),
            "drwxr-xr-x        0 docs"
        );
        assert_eq!(
            format_line(Mode::file(0o644), 1234, "a.txt"),
            "-rw-r--r--     1234 a.txt"
        );
    }
}
