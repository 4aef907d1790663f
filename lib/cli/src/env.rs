use anyhow::Context;
use std::path::PathBuf;
use vtfs::{MountConfig, Vtfs, SERVER_ENV_VAR, TOKEN_ENV_VAR};

/// Command-line flags selecting the remote store.
///
/// Flags and environment variables override the config file. Without
/// any of them the mount is local and forgets everything on exit.
#[derive(Debug, Default, Clone, PartialEq, Eq, clap::Parser)]
pub struct VtfsEnv {
    /// The remote store to mirror to, as `[http://]host[:port]`
    #[clap(long, env = SERVER_ENV_VAR, global = true)]
    pub server: Option<String>,
    /// The token sent with every remote call
    #[clap(long, env = TOKEN_ENV_VAR, global = true, hide_env_values = true)]
    pub token: Option<String>,
    /// A TOML mount config
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
}

impl VtfsEnv {
    pub fn mount_config(&self) -> Result<MountConfig, anyhow::Error> {
        let config = match &self.config {
            Some(path) => MountConfig::from_file(path)?,
            None => MountConfig::local(),
        };
        Ok(config.with_overrides(self.server.clone(), self.token.clone()))
    }

    pub fn mount(&self) -> Result<Vtfs, anyhow::Error> {
        let config = self.mount_config()?;
        Vtfs::mount(&config).context("unable to mount")
    }
}
