//! SOCKS5 authentication module
//!
//! Handles method negotiation and username/password authentication.

mod password;

pub use password::{authenticate_password, parse_credentials, Credentials};

use super::consts::*;
use crate::config::AuthType;
use crate::error::Socks5Error;
use crate::transport::timed::{receive_with_timeout, send_with_timeout};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Pick the METHOD byte answered for a proposed method
///
/// Proposals 0x00-0x03 are answered with the configured mode, 0x80 is
/// echoed and everything else is refused.
pub fn select_method(proposed: u8, auth: AuthType) -> u8 {
    match proposed {
        SOCKS5_AUTH_METHOD_NONE
        | SOCKS5_AUTH_METHOD_GSSAPI
        | SOCKS5_AUTH_METHOD_PASSWORD
        | SOCKS5_AUTH_METHOD_CHAP => match auth {
            AuthType::None => SOCKS5_AUTH_METHOD_NONE,
            AuthType::Password => SOCKS5_AUTH_METHOD_PASSWORD,
        },
        SOCKS5_AUTH_METHOD_PRIVATE => SOCKS5_AUTH_METHOD_PRIVATE,
        _ => SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE,
    }
}

/// Run method negotiation
///
/// ```text
/// +----+----------+----------+        +----+--------+
/// |VER | NMETHODS | METHODS  |   ->   |VER | METHOD |
/// +----+----------+----------+        +----+--------+
/// | 1  |    1     | 1 to 255 |        | 1  |   1    |
/// +----+----------+----------+        +----+--------+
/// ```
///
/// The greeting is taken from a single read. The proposal is the byte
/// following VER. A wrong version ends the handshake without a reply; a
/// refused method is answered with 0xFF and then ends it.
pub async fn negotiate_method<S>(
    stream: &mut S,
    auth: AuthType,
    timeout: Duration,
) -> Result<u8, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; GREETING_BUFFER_SIZE];
    let n = receive_with_timeout(stream, &mut buf, timeout).await?;

    if n < GREETING_MIN_LEN {
        return Err(Socks5Error::Malformed(format!(
            "greeting of {} bytes",
            n
        )));
    }

    let version = buf[0];
    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let method = select_method(buf[1], auth);
    send_with_timeout(stream, &[SOCKS5_VERSION, method], timeout).await?;

    if method == SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE {
        return Err(Socks5Error::NoAcceptableMethod);
    }

    Ok(method)
}
