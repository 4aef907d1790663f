//! Reference implementation of the vtfs remote store.
//!
//! Serves `list`, `create`, `delete`, `read`, `write`, `stat` and
//! `link` over HTTP/1.1 `GET` requests, backed by a [`vtfs_store::Store`].

mod error;
mod handler;
mod ops;
mod query;

pub use error::ApiError;
pub use handler::{Handler, SharedState};

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Accept connections on `listener` until an accept fails.
pub async fn serve(listener: TcpListener, handler: Handler) -> io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "serving");

    loop {
        let (stream, peer) = listener.accept().await?;
        let handler = handler.clone();

        tokio::spawn(async move {
            let service = service_fn(move |request: Request<Incoming>| {
                let response = handler.handle(request.uri());
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(%peer, error = %err, "connection closed with an error");
            }
        });
    }
}

/// A server running on its own thread and runtime, stopped on drop.
#[derive(Debug)]
pub struct BackgroundServer {
    local_addr: SocketAddr,
    handler: Handler,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<io::Result<()>>>,
}

impl BackgroundServer {
    pub fn spawn(addr: SocketAddr, handler: Handler) -> io::Result<Self> {
        let listener = std::net::TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (shutdown, stop) = oneshot::channel();

        let served = handler.clone();
        let thread = std::thread::Builder::new()
            .name("vtfs-server".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = TcpListener::from_std(listener)?;
                    tokio::select! {
                        result = serve(listener, served) => result,
                        _ = stop => Ok(()),
                    }
                })
            })?;

        Ok(Self {
            local_addr,
            handler,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The `http://host:port` URL clients should use.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl Drop for BackgroundServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(Err(err)) => tracing::warn!(error = %err, "server stopped with an error"),
                Err(_) => tracing::warn!("server thread panicked"),
                Ok(Ok(())) => {}
            }
        }
    }
}
