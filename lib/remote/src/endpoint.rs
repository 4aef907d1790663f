use crate::RemoteError;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// The `host:port` of the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// A name or an address, IPv6 addresses without brackets.
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parses `[http://]host[:port][/anything]`, where an IPv6 host is
/// written in brackets.
///
/// A port that isn't a valid number falls back to [`DEFAULT_PORT`].
impl FromStr for Endpoint {
    type Err = RemoteError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let rest = match url.split_once("://") {
            Some(("http", rest)) => rest,
            Some((scheme, _)) => {
                return Err(RemoteError::Endpoint(format!("unsupported scheme \"{scheme}\"")))
            }
            None => url,
        };
        let authority = rest.split('/').next().unwrap_or_default();

        let (host, port) = match authority.strip_prefix('[') {
            Some(bracketed) => {
                let (host, rest) = bracketed
                    .split_once(']')
                    .ok_or_else(|| RemoteError::Endpoint(format!("unclosed \"[\" in \"{url}\"")))?;
                match rest.strip_prefix(':') {
                    Some(port) => (host, parse_port(port)),
                    None if rest.is_empty() => (host, DEFAULT_PORT),
                    None => {
                        return Err(RemoteError::Endpoint(format!(
                            "unexpected \"{rest}\" after the host in \"{url}\""
                        )))
                    }
                }
            }
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, parse_port(port)),
                None => (authority, DEFAULT_PORT),
            },
        };

        if host.is_empty() {
            return Err(RemoteError::Endpoint(format!("no host in \"{url}\"")));
        }
        Ok(Self::new(host, port))
    }
}

fn parse_port(port: &str) -> u16 {
    port.parse().unwrap_or_else(|_| {
        tracing::warn!(port, "invalid port, using {DEFAULT_PORT}");
        DEFAULT_PORT
    })
}
