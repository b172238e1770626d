//! Per-connection lifecycle
//!
//! A [`Connection`] owns one accepted client socket and, after a successful
//! handshake, the upstream socket dialed for it:
//!
//! ```text
//! Remote <=> upstream socket <=> Lightsocks <=> client socket <=> Consumer
//! ```
//!
//! Both sockets are shut down and closed on every exit path.

use crate::config::ServerConfig;
use crate::error::LightsocksError;
use crate::socks::handshake::handshake;
use crate::socks::tunnel::{Tunnel, TunnelSummary};
use crate::transport::timed::connect_with_timeout;
use crate::transport::{Resolve, SocketOpts};
use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// One proxied client connection
#[derive(Debug)]
pub struct Connection {
    /// Client-facing socket
    transfer: Option<TcpStream>,
    /// Upstream socket, present once dialed
    upstream: Option<TcpStream>,
    peer: SocketAddr,
    config: Arc<ServerConfig>,
    resolver: Arc<dyn Resolve>,
}

impl Connection {
    /// Wrap an accepted client socket
    pub fn new(
        transfer: TcpStream,
        peer: SocketAddr,
        config: Arc<ServerConfig>,
        resolver: Arc<dyn Resolve>,
    ) -> Self {
        Connection {
            transfer: Some(transfer),
            upstream: None,
            peer,
            config,
            resolver,
        }
    }

    /// Address of the connected client
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Handshake, dial, relay, then close both sockets
    ///
    /// Any failure ends this connection only. The sockets are closed
    /// whether or not the run succeeded.
    pub async fn transport(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<TunnelSummary, LightsocksError> {
        let result = self.proxy(cancel).await;
        self.close();
        result
    }

    async fn proxy(&mut self, cancel: CancellationToken) -> Result<TunnelSummary, LightsocksError> {
        let transfer = self
            .transfer
            .as_mut()
            .ok_or_else(|| LightsocksError::Connection("connection already closed".to_string()))?;

        let destination = handshake(transfer, &self.config, self.resolver.as_ref()).await?;

        debug!("Connecting {} to {}", self.peer, destination);

        let upstream = connect_with_timeout(destination, self.config.timeouts.connect())
            .await
            .map_err(|e| {
                LightsocksError::Connection(format!("Failed to connect to {}: {}", destination, e))
            })?;
        SocketOpts::from_tcp_config(&self.config.tcp).apply_best_effort(&upstream);

        let upstream = self.upstream.insert(upstream);

        debug!("Tunnel established {} <-> {}", self.peer, destination);

        Ok(Tunnel::new(cancel).run(transfer, upstream).await)
    }

    /// Shut down and release both sockets
    ///
    /// Teardown errors are ignored, and a failure on one socket does not
    /// stop the other from being closed. Calling this again is a no-op.
    pub fn close(&mut self) {
        if let Some(stream) = self.transfer.take() {
            shutdown_quietly(stream, "client");
        }
        if let Some(stream) = self.upstream.take() {
            shutdown_quietly(stream, "upstream");
        }
    }

    /// Whether both sockets have been released
    pub fn is_closed(&self) -> bool {
        self.transfer.is_none() && self.upstream.is_none()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn shutdown_quietly(stream: TcpStream, side: &str) {
    if let Err(e) = socket2::SockRef::from(&stream).shutdown(Shutdown::Both) {
        trace!("Shutdown of {} socket failed: {}", side, e);
    }
    drop(stream);
}
