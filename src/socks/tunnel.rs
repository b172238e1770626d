//! Bidirectional relay between a client and its upstream
//!
//! Two copy loops run concurrently and the tunnel finishes as soon as
//! either one does. The other loop is dropped mid-flight, so bytes it had
//! read but not yet written are lost; the caller closes both sockets right
//! after.

use crate::socks::consts::DEFAULT_BUFFER_SIZE;
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Relay direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to upstream
    ClientToUpstream,
    /// Upstream to client
    UpstreamToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToUpstream => write!(f, "client->upstream"),
            Direction::UpstreamToClient => write!(f, "upstream->client"),
        }
    }
}

/// What ended a tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelSummary {
    /// The direction that finished first
    pub finished: Direction,
    /// Bytes that direction relayed
    pub bytes: u64,
}

/// Racing two-way relay
#[derive(Debug, Clone)]
pub struct Tunnel {
    cancel: CancellationToken,
    buffer_size: usize,
}

impl Tunnel {
    /// Create a tunnel observing `cancel`
    pub fn new(cancel: CancellationToken) -> Self {
        Tunnel {
            cancel,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Override the per-read buffer size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Relay between `client` and `upstream` until one direction ends
    pub async fn run<A, B>(&self, client: &mut A, upstream: &mut B) -> TunnelSummary
    where
        A: AsyncRead + AsyncWrite + Unpin,
        B: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut client_read, mut client_write) = tokio::io::split(client);
        let (mut upstream_read, mut upstream_write) = tokio::io::split(upstream);

        let summary = tokio::select! {
            bytes = relay(&mut client_read, &mut upstream_write, &self.cancel, self.buffer_size) => {
                TunnelSummary { finished: Direction::ClientToUpstream, bytes }
            }
            bytes = relay(&mut upstream_read, &mut client_write, &self.cancel, self.buffer_size) => {
                TunnelSummary { finished: Direction::UpstreamToClient, bytes }
            }
        };

        debug!("{} finished: {} bytes", summary.finished, summary.bytes);
        summary
    }
}

/// Copy from `src` to `dst` until EOF, an error or cancellation
///
/// Errors end the loop silently. Returns the number of bytes written.
async fn relay<R, W>(
    src: &mut R,
    dst: &mut W,
    cancel: &CancellationToken,
    buffer_size: usize,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = src.read(&mut buf) => match read {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            },
        };

        let written = tokio::select! {
            _ = cancel.cancelled() => break,
            written = async {
                dst.write_all(&buf[..n]).await?;
                dst.flush().await
            } => written,
        };

        if written.is_err() {
            break;
        }
        total += n as u64;
    }

    total
}
