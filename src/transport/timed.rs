//! Time-bounded socket primitives
//!
//! Each bounded operation is raced against a timer with
//! `tokio::time::timeout`. When the timer wins, the I/O future is dropped
//! and the caller sees [`Socks5Error::Timeout`]. tokio's socket reads and
//! writes are cancel-safe, so a dropped read never consumes bytes.

use crate::error::Socks5Error;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Accept one connection from the listener
pub async fn accept(listener: &TcpListener) -> Result<(TcpStream, SocketAddr), Socks5Error> {
    Ok(listener.accept().await?)
}

/// Connect to `addr`, giving up after `timeout`
pub async fn connect_with_timeout(
    addr: SocketAddr,
    timeout: Duration,
) -> Result<TcpStream, Socks5Error> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| Socks5Error::Timeout("connect"))??;
    Ok(stream)
}

/// Perform a single read of up to `buf.len()` bytes within `timeout`
///
/// Returns the number of bytes read; zero means the peer closed.
pub async fn receive_with_timeout<S>(
    stream: &mut S,
    buf: &mut [u8],
    timeout: Duration,
) -> Result<usize, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let n = tokio::time::timeout(timeout, stream.read(buf))
        .await
        .map_err(|_| Socks5Error::Timeout("receive"))??;
    Ok(n)
}

/// Fill `buf` completely within `timeout`
pub async fn receive_exact_with_timeout<S>(
    stream: &mut S,
    buf: &mut [u8],
    timeout: Duration,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + Unpin,
{
    tokio::time::timeout(timeout, stream.read_exact(buf))
        .await
        .map_err(|_| Socks5Error::Timeout("receive"))??;
    Ok(())
}

/// Fill `buf` completely with no time bound
pub async fn receive_exact<S>(stream: &mut S, buf: &mut [u8]) -> Result<(), Socks5Error>
where
    S: AsyncRead + Unpin,
{
    stream.read_exact(buf).await?;
    Ok(())
}

/// Write all of `data` and flush within `timeout`
pub async fn send_with_timeout<S>(
    stream: &mut S,
    data: &[u8],
    timeout: Duration,
) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    tokio::time::timeout(timeout, async {
        stream.write_all(data).await?;
        stream.flush().await
    })
    .await
    .map_err(|_| Socks5Error::Timeout("send"))??;
    Ok(())
}
