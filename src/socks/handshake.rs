//! SOCKS5 handshake state machine
//!
//! Runs method negotiation, the optional username/password exchange and
//! request parsing over one client stream, in that order, and yields the
//! endpoint to dial.

use crate::config::{AuthType, ServerConfig};
use crate::socks::auth::{authenticate_password, negotiate_method};
use crate::socks::command::{parse_request, send_reply};
use crate::socks::consts::SOCKS5_REPLY_SUCCEEDED;
use crate::socks::types::HandshakeResult;
use crate::transport::Resolve;
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for the method selection message
    AwaitGreeting,
    /// Waiting for the username/password message
    AwaitAuth,
    /// Waiting for the request
    AwaitRequest,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeState::AwaitGreeting => write!(f, "greeting"),
            HandshakeState::AwaitAuth => write!(f, "auth"),
            HandshakeState::AwaitRequest => write!(f, "request"),
        }
    }
}

/// Handshake driver bound to a configuration and a resolver
#[derive(Debug, Clone, Copy)]
pub struct Handshake<'a> {
    config: &'a ServerConfig,
    resolver: &'a dyn Resolve,
}

impl<'a> Handshake<'a> {
    /// Create a new handshake driver
    pub fn new(config: &'a ServerConfig, resolver: &'a dyn Resolve) -> Self {
        Handshake { config, resolver }
    }

    /// Run the handshake to completion on `stream`
    ///
    /// Returns the destination to dial. A request answered with a failure
    /// REP (host unreachable, address type not supported) still returns
    /// `Ok` with `0.0.0.0:0`; dialing that endpoint is what fails.
    pub async fn run<S>(&self, stream: &mut S) -> HandshakeResult
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let timeout = self.config.timeouts.handshake();
        let mut state = HandshakeState::AwaitGreeting;

        loop {
            trace!("SOCKS5 handshake: {}", state);

            state = match state {
                HandshakeState::AwaitGreeting => {
                    let method = negotiate_method(stream, self.config.auth, timeout).await?;
                    debug!("Negotiated method 0x{:02x}", method);

                    match self.config.auth {
                        AuthType::None => HandshakeState::AwaitRequest,
                        AuthType::Password => HandshakeState::AwaitAuth,
                    }
                }
                HandshakeState::AwaitAuth => {
                    authenticate_password(stream, self.config.account.as_ref(), timeout).await?;
                    HandshakeState::AwaitRequest
                }
                HandshakeState::AwaitRequest => {
                    let request = parse_request(stream, self.resolver, timeout).await?;

                    if request.reply != SOCKS5_REPLY_SUCCEEDED {
                        debug!(
                            "SOCKS5 {} answered with REP 0x{:02x}",
                            request.command, request.reply
                        );
                    }

                    if let Err(e) =
                        send_reply(stream, request.reply, self.config.bind_addr, timeout).await
                    {
                        debug!("Failed to send SOCKS5 reply: {}", e);
                    }

                    return Ok(request.destination);
                }
            };
        }
    }
}

/// Run a handshake with the given configuration and resolver
pub async fn handshake<S>(
    stream: &mut S,
    config: &ServerConfig,
    resolver: &dyn Resolve,
) -> HandshakeResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Handshake::new(config, resolver).run(stream).await
}
