//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages.

use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::transport::timed::send_with_timeout;
use bytes::{BufMut, Bytes, BytesMut};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWrite;

/// Build a SOCKS5 reply
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// `bind_addr` is the server's configured listen endpoint, never the
/// destination that was dialed.
pub fn build_reply(reply_code: u8, bind_addr: SocketAddr) -> Bytes {
    let mut reply = BytesMut::with_capacity(4 + 16 + 2);
    reply.put_u8(SOCKS5_VERSION);
    reply.put_u8(reply_code);
    reply.put_u8(SOCKS5_RESERVED);

    match bind_addr {
        SocketAddr::V4(addr) => {
            reply.put_u8(SOCKS5_ADDR_TYPE_IPV4);
            reply.put_slice(&addr.ip().octets());
            reply.put_u16(addr.port());
        }
        SocketAddr::V6(addr) => {
            reply.put_u8(SOCKS5_ADDR_TYPE_IPV6);
            reply.put_slice(&addr.ip().octets());
            reply.put_u16(addr.port());
        }
    }

    reply.freeze()
}

/// Build and send a SOCKS5 reply within `timeout`
pub async fn send_reply<S>(
    stream: &mut S,
    reply_code: u8,
    bind_addr: SocketAddr,
    timeout: Duration,
) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    let reply = build_reply(reply_code, bind_addr);
    send_with_timeout(stream, &reply, timeout).await
}
