//! Test utilities and mocks for Lightsocks
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use lightsocks::config::ServerConfig;
use lightsocks::server::Server;
use lightsocks::transport::Resolve;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound for any single step of an integration test
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// A running proxy server bound to an ephemeral loopback port
pub struct TestServer {
    /// Address clients connect to
    pub addr: SocketAddr,
    /// Token that stops the server and its tunnels
    pub cancel: CancellationToken,
    handle: JoinHandle<Result<(), lightsocks::LightsocksError>>,
}

impl TestServer {
    /// Start a server with `config` and `resolver`
    pub async fn start(config: ServerConfig, resolver: Arc<dyn Resolve>) -> Self {
        let server = Server::bind(config).unwrap().with_resolver(resolver);
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(server.run(cancel.clone()));

        TestServer {
            addr,
            cancel,
            handle,
        }
    }

    /// Open a client connection to the server
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }

    /// Cancel the server and wait for its accept loop to finish
    pub async fn stop(self) {
        self.cancel.cancel();
        tokio::time::timeout(STEP_TIMEOUT, self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

/// Loopback config with no authentication
pub fn no_auth_config() -> ServerConfig {
    ServerConfig::no_auth("127.0.0.1:0".parse().unwrap())
}

/// Start an upstream that echoes everything back on every connection
pub async fn start_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    addr
}

/// Start an upstream that sends `greeting` and closes each connection
pub async fn start_greeting_server(greeting: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(greeting).await;
            let _ = stream.shutdown().await;
        }
    });

    addr
}

/// Read exactly `len` bytes, failing the test on timeout
pub async fn read_exact_timeout(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    tokio::time::timeout(STEP_TIMEOUT, stream.read_exact(&mut buf))
        .await
        .expect("read timed out")
        .unwrap();
    buf
}

/// Whether the peer closed the stream without sending anything more
pub async fn is_closed(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 16];
    match tokio::time::timeout(STEP_TIMEOUT, stream.read(&mut buf)).await {
        Ok(Ok(0)) | Ok(Err(_)) => true,
        Ok(Ok(_)) | Err(_) => false,
    }
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use lightsocks::socks::*;
    use std::net::SocketAddr;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a password auth method selection request
    pub fn create_auth_request_password() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_PASSWORD]
    }

    /// Create a username/password sub-negotiation message
    pub fn create_credentials(username: &str, password: &str) -> Vec<u8> {
        let mut msg = vec![0x01, username.len() as u8];
        msg.extend_from_slice(username.as_bytes());
        msg.push(password.len() as u8);
        msg.extend_from_slice(password.as_bytes());
        msg
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to a loopback IPv4 socket address
    pub fn create_connect_to(addr: SocketAddr) -> Vec<u8> {
        match addr {
            SocketAddr::V4(v4) => create_connect_ipv4(v4.ip().octets(), v4.port()),
            SocketAddr::V6(_) => panic!("IPv4 address expected"),
        }
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = create_domain_header(domain);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a domain connect command up to and including the name
    pub fn create_domain_header(domain: &str) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd
    }

    /// Expected reply for a server bound to `127.0.0.1:0`
    pub fn loopback_reply(rep: u8) -> Vec<u8> {
        vec![
            SOCKS5_VERSION,
            rep,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
            127,
            0,
            0,
            1,
            0,
            0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_server() {
        let addr = start_echo_server().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"hello").await.unwrap();
        assert_eq!(read_exact_timeout(&mut stream, 5).await, b"hello");
    }

    #[test]
    fn test_socks5_mock_credentials() {
        let msg = socks5_mock::create_credentials("user", "pw");
        assert_eq!(msg, vec![0x01, 4, b'u', b's', b'e', b'r', 2, b'p', b'w']);
    }

    #[test]
    fn test_socks5_mock_connect_ipv4() {
        let cmd = socks5_mock::create_connect_ipv4([192, 168, 1, 1], 8080);
        assert_eq!(cmd[0], 5); // SOCKS5 version
        assert_eq!(cmd[1], 1); // CONNECT
        assert_eq!(cmd[3], 1); // IPv4
        assert_eq!(&cmd[4..8], &[192, 168, 1, 1]);
        assert_eq!(&cmd[8..], &[0x1F, 0x90]);
    }
}
