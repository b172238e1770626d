//! SOCKS5 server
//!
//! Owns the listening socket and spawns one [`Connection`] task per accepted
//! client. There is no cap on concurrent connections.

mod connection;

pub use connection::Connection;

use crate::config::ServerConfig;
use crate::error::LightsocksError;
use crate::transport::timed::accept;
use crate::transport::{bind_listener, Resolve, SocketOpts, SystemResolver};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause after a failed accept before trying again
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Listening SOCKS5 server
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    resolver: Arc<dyn Resolve>,
}

impl Server {
    /// Validate `config` and bind its listen endpoint
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: ServerConfig) -> Result<Self, LightsocksError> {
        config.validate().map_err(LightsocksError::Config)?;

        let listener = bind_listener(config.bind_addr, config.backlog)?;

        Ok(Server {
            listener,
            config: Arc::new(config),
            resolver: Arc::new(SystemResolver),
        })
    }

    /// Replace the resolver used for DOMAINNAME requests
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept clients until `cancel` fires
    ///
    /// Accept failures are logged and retried; they never stop the server.
    /// Connections already running keep going until their tunnels observe
    /// the same token.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), LightsocksError> {
        let local_addr = self.local_addr()?;
        let socket_opts = SocketOpts::from_tcp_config(&self.config.tcp);

        info!("SOCKS5 server listening on {}", local_addr);

        loop {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = accept(&self.listener) => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {}", peer);
                    socket_opts.apply_best_effort(&stream);

                    let mut connection = Connection::new(
                        stream,
                        peer,
                        self.config.clone(),
                        self.resolver.clone(),
                    );
                    let cancel = cancel.clone();

                    tokio::spawn(async move {
                        match connection.transport(cancel).await {
                            Ok(summary) => debug!(
                                "Connection from {} closed after {} ({} bytes)",
                                peer, summary.finished, summary.bytes
                            ),
                            Err(e) => debug!("Connection from {} ended: {}", peer, e),
                        }
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }

        info!("SOCKS5 server on {} stopped", local_addr);
        Ok(())
    }
}

/// Bind `config.bind_addr` and serve until `cancel` fires
pub async fn start(config: ServerConfig, cancel: CancellationToken) -> Result<(), LightsocksError> {
    Server::bind(config)?.run(cancel).await
}
