//! Timeout and TCP tuning configuration
//!
//! Time bounds applied to handshake I/O and upstream dials, plus the socket
//! options applied to every stream the server owns.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default handshake read/send bound in milliseconds
fn default_handshake_ms() -> u64 {
    3000
}

/// Default upstream dial bound in milliseconds
fn default_connect_ms() -> u64 {
    30000
}

/// I/O time bounds
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Bound on each timed handshake read and send
    #[serde(default = "default_handshake_ms")]
    pub handshake_ms: u64,

    /// Bound on the upstream connect
    #[serde(default = "default_connect_ms")]
    pub connect_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        TimeoutConfig {
            handshake_ms: default_handshake_ms(),
            connect_ms: default_connect_ms(),
        }
    }
}

impl TimeoutConfig {
    /// Handshake bound as a `Duration`
    pub fn handshake(&self) -> Duration {
        Duration::from_millis(self.handshake_ms)
    }

    /// Connect bound as a `Duration`
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

fn default_nodelay() -> bool {
    true
}

/// Default keepalive seconds
fn default_keepalive_secs() -> u64 {
    20
}

/// Default keepalive interval
fn default_keepalive_interval() -> u64 {
    8
}

/// TCP socket configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive timeout in seconds
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}
