//! Username/password authentication handler
//!
//! Implements the RFC 1929 subnegotiation against the configured account.

use crate::config::Account;
use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::transport::timed::{receive_with_timeout, send_with_timeout};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Credentials presented by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Presented username
    pub username: String,
    /// Presented password
    pub password: String,
}

/// Extract the credentials from a subnegotiation message
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
///
/// Fields are sliced by their declared lengths. Lengths are not checked
/// against what was actually received; bytes past the end of `msg` read as
/// missing and shorten the field.
pub fn parse_credentials(msg: &[u8]) -> Credentials {
    let ulen = msg.get(1).copied().unwrap_or(0) as usize;
    let plen = msg.get(2 + ulen).copied().unwrap_or(0) as usize;

    let username = field(msg, 2, ulen);
    let password = field(msg, 3 + ulen, plen);

    Credentials { username, password }
}

fn field(msg: &[u8], start: usize, len: usize) -> String {
    let start = start.min(msg.len());
    let end = (start + len).min(msg.len());
    String::from_utf8_lossy(&msg[start..end]).into_owned()
}

/// Perform username/password authentication
///
/// The status byte is 0x00 on success and 0xFF otherwise, answered with
/// VER = 0x05. A rejected client ends the handshake even if the status
/// could not be delivered.
pub async fn authenticate_password<S>(
    stream: &mut S,
    account: Option<&Account>,
    timeout: Duration,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Zero-filled, so declared lengths past the read stay inside the buffer
    let mut buf = [0u8; AUTH_BUFFER_SIZE];
    let n = receive_with_timeout(stream, &mut buf, timeout).await?;

    if n < AUTH_MIN_LEN {
        return Err(Socks5Error::Malformed(format!(
            "auth message of {} bytes",
            n
        )));
    }

    let credentials = parse_credentials(&buf);
    let verified = account
        .map(|a| a.verify(&credentials.username, &credentials.password))
        .unwrap_or(false);

    let status = if verified {
        SOCKS5_AUTH_STATUS_SUCCESS
    } else {
        SOCKS5_AUTH_STATUS_FAILURE
    };

    let sent = send_with_timeout(stream, &[SOCKS5_VERSION, status], timeout).await;

    if !verified {
        debug!("Authentication failed for user: {}", credentials.username);
        return Err(Socks5Error::AuthFailed);
    }
    sent?;

    debug!("Authentication successful for user: {}", credentials.username);
    Ok(())
}
