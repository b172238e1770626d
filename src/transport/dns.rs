//! Host name resolution
//!
//! The handshake resolves DOMAINNAME requests through the [`Resolve`] trait so
//! the lookup strategy can be swapped out.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::net::IpAddr;

/// Name resolution capability
#[async_trait]
pub trait Resolve: Debug + Send + Sync {
    /// Resolve `host` to zero or more addresses
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Resolver answering from a fixed table
///
/// Names missing from the table resolve to no addresses.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn with_entry(mut self, host: &str, addrs: Vec<IpAddr>) -> Self {
        self.entries.insert(host.to_ascii_lowercase(), addrs);
        self
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        Ok(self
            .entries
            .get(&host.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_system_resolver_ip_literal() {
        let addrs = SystemResolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(addrs, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
    }

    #[tokio::test]
    async fn test_static_resolver_hit() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3));
        let resolver = StaticResolver::new().with_entry("Example.COM", vec![ip]);
        assert_eq!(resolver.resolve("example.com").await.unwrap(), vec![ip]);
    }

    #[tokio::test]
    async fn test_static_resolver_miss() {
        let resolver = StaticResolver::new();
        assert!(resolver.resolve("nowhere.invalid").await.unwrap().is_empty());
    }
}
