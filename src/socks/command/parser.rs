//! SOCKS5 request parser
//!
//! Parses the client's request and decides the REP value answered for it.

use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::consts::*;
use crate::socks::types::{unspecified_endpoint, Request, SocksCommand};
use crate::transport::timed::{receive_exact, receive_exact_with_timeout};
use crate::transport::Resolve;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::debug;

/// Parse a SOCKS5 request from the stream
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Only the 4-byte header read is time bounded. A bad version or an
/// unknown command is an error; an unresolvable domain or unknown address
/// type is not. Those yield a [`Request`] carrying the matching REP code
/// and the unspecified endpoint.
pub async fn parse_request<S>(
    stream: &mut S,
    resolver: &dyn Resolve,
    timeout: Duration,
) -> Result<Request, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    receive_exact_with_timeout(stream, &mut header, timeout).await?;

    let version = header[0];
    let cmd_byte = header[1];
    let addr_type = header[3];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let command =
        SocksCommand::from_byte(cmd_byte).ok_or(Socks5Error::CommandNotSupported(cmd_byte))?;

    let (destination, reply) = match parse_destination(stream, addr_type, resolver).await? {
        Ok(addr) => (addr, SOCKS5_REPLY_SUCCEEDED),
        Err(e) => {
            debug!("Request not serviceable: {}", e);
            (unspecified_endpoint(), Socks5ReplyCode::from(&e).into())
        }
    };

    Ok(Request {
        command,
        destination,
        reply,
    })
}

/// Decode DST.ADDR and DST.PORT
///
/// The outer error is a socket failure that aborts the handshake. The inner
/// one is answered in-protocol.
async fn parse_destination<S>(
    stream: &mut S,
    addr_type: u8,
    resolver: &dyn Resolve,
) -> Result<Result<SocketAddr, Socks5Error>, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            let mut addr = [0u8; 4];
            receive_exact(stream, &mut addr).await?;
            let port = read_port(stream).await?;

            Ok(Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::from(addr)), port)))
        }

        SOCKS5_ADDR_TYPE_DOMAIN => {
            let mut len_buf = [0u8; 1];
            receive_exact(stream, &mut len_buf).await?;

            let mut domain_buf = vec![0u8; len_buf[0] as usize];
            receive_exact(stream, &mut domain_buf).await?;
            let domain = String::from_utf8_lossy(&domain_buf).into_owned();

            let first = match resolver.resolve(&domain).await {
                Ok(addrs) => addrs.into_iter().next(),
                Err(e) => {
                    debug!("Failed to resolve {}: {}", domain, e);
                    None
                }
            };

            // DST.PORT is left unread when the name does not resolve
            match first {
                Some(ip) => {
                    let port = read_port(stream).await?;
                    Ok(Ok(SocketAddr::new(ip, port)))
                }
                None => Ok(Err(Socks5Error::Resolution(domain))),
            }
        }

        SOCKS5_ADDR_TYPE_IPV6 => {
            let mut addr = [0u8; 16];
            receive_exact(stream, &mut addr).await?;
            let port = read_port(stream).await?;

            Ok(Ok(SocketAddr::new(IpAddr::V6(Ipv6Addr::from(addr)), port)))
        }

        other => Ok(Err(Socks5Error::AddressTypeNotSupported(other))),
    }
}

async fn read_port<S>(stream: &mut S) -> Result<u16, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let mut port_buf = [0u8; 2];
    receive_exact(stream, &mut port_buf).await?;
    Ok(u16::from_be_bytes(port_buf))
}
