//! # Lightsocks - Lightweight SOCKS5 Proxy Server
//!
//! Lightsocks accepts TCP clients on a configured endpoint, runs the SOCKS5
//! handshake with each one (RFC 1928, optionally with RFC 1929
//! username/password authentication), dials the requested destination and
//! relays bytes both ways until either side closes.
//!
//! ## Features
//!
//! - **No-auth or username/password**: one account, matched case-insensitively
//! - **IPv4, IPv6 and domain destinations**: domains go through a pluggable resolver
//! - **Bounded handshake I/O**: every handshake step runs under a timeout
//! - **Isolated connections**: a failing client never affects the listener or its neighbours
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lightsocks::config::load_config;
//! use lightsocks::server::Server;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let cancel = CancellationToken::new();
//!
//!     Server::bind(config.server)?.run(cancel).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Consumer -> Lightsocks (handshake, dial) -> Destination
//!          <-          (tunnel)            <-
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config, ServerConfig};
pub use error::{LightsocksError, Socks5Error};
pub use server::{start, Server};

/// Version of the Lightsocks library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "lightsocks");
    }
}
