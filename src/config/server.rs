//! Server configuration types
//!
//! Defines the listen endpoint, the authentication mode and the static
//! account the proxy checks credentials against.

use super::{TcpConfig, TimeoutConfig};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default listen endpoint
fn default_bind_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 1880)
}

/// Default listen backlog
fn default_backlog() -> u32 {
    10
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Authentication mode offered to clients
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthType {
    /// No authentication
    #[default]
    #[serde(rename = "none")]
    None,
    /// RFC 1929 username/password
    #[serde(rename = "password")]
    Password,
}

/// Static credential pair
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Account {
    /// Expected username
    pub username: String,
    /// Expected password
    pub password: String,
}

impl Account {
    /// Create a new account
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Account {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check a candidate credential pair.
    ///
    /// Both fields compare case-insensitively after Unicode lowercasing.
    /// This is a plain comparison, not a constant-time one.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        eq_ignore_case(&self.username, username) && eq_ignore_case(&self.password, password)
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// SOCKS5 server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listen endpoint; also echoed back as BND.ADDR/BND.PORT
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Authentication mode
    #[serde(default)]
    pub auth: AuthType,

    /// Credentials, required when `auth` is `password`
    #[serde(default)]
    pub account: Option<Account>,

    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// I/O time bounds
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Socket options for accepted and upstream streams
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthType::None,
            account: None,
            backlog: default_backlog(),
            timeouts: TimeoutConfig::default(),
            tcp: TcpConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Configuration without authentication listening on `bind_addr`
    pub fn no_auth(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    /// Configuration requiring the given account
    pub fn with_account(bind_addr: SocketAddr, account: Account) -> Self {
        Self {
            bind_addr,
            auth: AuthType::Password,
            account: Some(account),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.auth == AuthType::Password && self.account.is_none() {
            return Err("Password authentication enabled but no account configured".to_string());
        }
        if self.backlog == 0 {
            return Err("Listen backlog must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:1880".parse().unwrap());
        assert_eq!(config.auth, AuthType::None);
        assert!(config.account.is_none());
        assert_eq!(config.backlog, 10);
    }

    #[test]
    fn test_server_config_validate() {
        let config = ServerConfig {
            auth: AuthType::Password,
            account: None,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig::with_account(
            "127.0.0.1:1080".parse().unwrap(),
            Account::new("user", "pass"),
        );
        assert!(config.validate().is_ok());

        let config = ServerConfig {
            backlog: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_account_verify_exact() {
        let account = Account::new("alice", "s3cret");
        assert!(account.verify("alice", "s3cret"));
        assert!(!account.verify("alice", "wrong"));
        assert!(!account.verify("bob", "s3cret"));
    }

    #[test]
    fn test_account_verify_ignores_case() {
        let account = Account::new("Alice", "S3cret");
        assert!(account.verify("alice", "s3CRET"));
        assert!(account.verify("ALICE", "S3CRET"));
    }

    #[test]
    fn test_account_verify_unicode_case() {
        let account = Account::new("Ärger", "ÖL");
        assert!(account.verify("ärger", "öl"));
    }

    #[test]
    fn test_account_verify_empty() {
        let account = Account::new("", "");
        assert!(account.verify("", ""));
        assert!(!account.verify("x", ""));
    }
}
