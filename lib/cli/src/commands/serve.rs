use crate::VtfsEnv;
use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use vtfs::store::Store;
use vtfs_server::Handler;

#[derive(Debug, Parser)]
/// The options for the `vtfs serve` subcommand
pub struct Serve {
    /// The address to listen on
    #[clap(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

impl Serve {
    /// Execute `vtfs serve`. Runs until interrupted.
    ///
    /// With `--token` only that token is accepted; otherwise any
    /// non-empty token is.
    pub fn execute(&self, env: &VtfsEnv) -> Result<(), anyhow::Error> {
        let handler = Handler::new(Store::new(), env.token.clone());
        let runtime = tokio::runtime::Runtime::new()?;

        runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(self.listen)
                .await
                .with_context(|| format!("unable to listen on {}", self.listen))?;
            eprintln!("Serving on http://{}", listener.local_addr()?);
            vtfs_server::serve(listener, handler).await?;
            Ok::<_, anyhow::Error>(())
        })
    }
}
