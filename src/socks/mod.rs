//! SOCKS5 protocol for Lightsocks
//!
//! Server side of RFC 1928 method negotiation, RFC 1929 username/password
//! authentication and request handling, plus the relay that runs once a
//! destination has been dialed.

pub mod auth;
pub mod command;
pub mod consts;
pub mod handshake;
pub mod tunnel;
pub mod types;

pub use auth::{authenticate_password, negotiate_method, select_method};
pub use command::{build_reply, parse_request, send_reply};
pub use consts::*;
pub use handshake::{handshake, Handshake, HandshakeState};
pub use tunnel::{Direction, Tunnel, TunnelSummary};
pub use types::{unspecified_endpoint, HandshakeResult, Request, SocksCommand};
