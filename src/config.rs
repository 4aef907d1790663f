use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use vtfs_remote::{Endpoint, RemoteClient, RemoteError, TcpTransport};

/// Environment variable naming the remote store URL.
pub const SERVER_ENV_VAR: &str = "VTFS_SERVER";
/// Environment variable holding the remote store token.
pub const TOKEN_ENV_VAR: &str = "VTFS_TOKEN";

/// How a [`crate::Vtfs`] is mounted.
///
/// ```toml
/// [remote]
/// url = "http://127.0.0.1:8080"
/// token = "secret"
/// timeout_ms = 5000
/// ```
#[derive(Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct MountConfig {
    /// Mirror the namespace to this remote store. Without it the mount is
    /// purely local.
    pub remote: Option<RemoteConfig>,
}

#[derive(Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// `[http://]host[:port][/...]`
    pub url: String,
    #[serde(default)]
    pub token: String,
    /// Bound on every remote call. Calls block indefinitely when unset.
    pub timeout_ms: Option<u64>,
}

#[derive(Error, Debug)]
pub enum MountError {
    #[error("failed to read config file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid remote endpoint")]
    Endpoint(#[source] RemoteError),
}

impl MountConfig {
    /// A local-only mount.
    pub fn local() -> Self {
        Self::default()
    }

    /// A mount mirrored to `url`.
    pub fn remote(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            remote: Some(RemoteConfig {
                url: url.into(),
                token: token.into(),
                timeout_ms: None,
            }),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MountError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| MountError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| MountError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override the file's settings with ones given on the command line
    /// or in the environment. A server URL alone enables the remote.
    pub fn with_overrides(mut self, server: Option<String>, token: Option<String>) -> Self {
        match (&mut self.remote, server) {
            (Some(remote), Some(url)) => remote.url = url,
            (None, Some(url)) => {
                self.remote = Some(RemoteConfig {
                    url,
                    token: String::new(),
                    timeout_ms: None,
                })
            }
            (_, None) => {}
        }
        if let (Some(remote), Some(token)) = (&mut self.remote, token) {
            remote.token = token;
        }
        self
    }

    /// Read `VTFS_SERVER` and `VTFS_TOKEN` as overrides.
    pub fn with_env(self) -> Self {
        let server = std::env::var(SERVER_ENV_VAR).ok();
        let token = std::env::var(TOKEN_ENV_VAR).ok();
        self.with_overrides(server, token)
    }

    pub(crate) fn client(&self) -> Result<Option<RemoteClient>, MountError> {
        let Some(remote) = &self.remote else {
            return Ok(None);
        };
        let endpoint: Endpoint = remote.url.parse().map_err(MountError::Endpoint)?;
        let transport =
            TcpTransport::new().with_timeout(remote.timeout_ms.map(Duration::from_millis));

        Ok(Some(RemoteClient::with_transport(
            endpoint,
            remote.token.clone(),
            Arc::new(transport),
        )))
    }
}
