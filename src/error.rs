//! Error types for Lightsocks
//!
//! This module defines all custom error types used throughout the server.

use std::io;
use thiserror::Error;

/// Main error type for Lightsocks operations
#[derive(Error, Debug)]
pub enum LightsocksError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
}

/// SOCKS5 specific errors
///
/// Every handshake step reports its outcome through this type; nothing in
/// the protocol layer panics or raises past the connection boundary.
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Socket level failure
    #[error("Socket error: {0}")]
    Socket(#[from] io::Error),

    /// An operation exceeded its time bound
    #[error("Timeout: {0}")]
    Timeout(&'static str),

    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// No acceptable authentication method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Message too short or otherwise unusable
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Authentication failed
    #[error("Authentication failed")]
    AuthFailed,

    /// DNS failure or empty result
    #[error("Failed to resolve: {0}")]
    Resolution(String),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for Socks5ReplyCode {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Socks5ReplyCode::Succeeded),
            0x01 => Ok(Socks5ReplyCode::GeneralFailure),
            0x02 => Ok(Socks5ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(Socks5ReplyCode::NetworkUnreachable),
            0x04 => Ok(Socks5ReplyCode::HostUnreachable),
            0x05 => Ok(Socks5ReplyCode::ConnectionRefused),
            0x06 => Ok(Socks5ReplyCode::TtlExpired),
            0x07 => Ok(Socks5ReplyCode::CommandNotSupported),
            0x08 => Ok(Socks5ReplyCode::AddressTypeNotSupported),
            other => Err(Socks5Error::Malformed(format!("unknown reply code {}", other))),
        }
    }
}

impl From<&Socks5Error> for Socks5ReplyCode {
    fn from(err: &Socks5Error) -> Self {
        match err {
            Socks5Error::Resolution(_) => Socks5ReplyCode::HostUnreachable,
            Socks5Error::AddressTypeNotSupported(_) => Socks5ReplyCode::AddressTypeNotSupported,
            Socks5Error::CommandNotSupported(_) => Socks5ReplyCode::CommandNotSupported,
            Socks5Error::Socket(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                Socks5ReplyCode::ConnectionRefused
            }
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socks5_reply_code_from_u8_valid() {
        assert_eq!(
            Socks5ReplyCode::try_from(0x00).unwrap(),
            Socks5ReplyCode::Succeeded
        );
        assert_eq!(
            Socks5ReplyCode::try_from(0x04).unwrap(),
            Socks5ReplyCode::HostUnreachable
        );
        assert_eq!(
            Socks5ReplyCode::try_from(0x08).unwrap(),
            Socks5ReplyCode::AddressTypeNotSupported
        );
    }

    #[test]
    fn test_socks5_reply_code_from_u8_invalid() {
        assert!(Socks5ReplyCode::try_from(0xFF).is_err());
        assert!(Socks5ReplyCode::try_from(0x09).is_err());
    }

    #[test]
    fn test_socks5_reply_code_to_u8() {
        assert_eq!(u8::from(Socks5ReplyCode::Succeeded), 0x00);
        assert_eq!(u8::from(Socks5ReplyCode::HostUnreachable), 0x04);
        assert_eq!(u8::from(Socks5ReplyCode::AddressTypeNotSupported), 0x08);
    }

    #[test]
    fn test_socks5_reply_code_from_error() {
        let err = Socks5Error::Resolution("nowhere.invalid".to_string());
        assert_eq!(Socks5ReplyCode::from(&err), Socks5ReplyCode::HostUnreachable);

        let err = Socks5Error::AddressTypeNotSupported(0x09);
        assert_eq!(
            Socks5ReplyCode::from(&err),
            Socks5ReplyCode::AddressTypeNotSupported
        );

        let err = Socks5Error::Socket(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(
            Socks5ReplyCode::from(&err),
            Socks5ReplyCode::ConnectionRefused
        );

        let err = Socks5Error::AuthFailed;
        assert_eq!(Socks5ReplyCode::from(&err), Socks5ReplyCode::GeneralFailure);
    }

    #[test]
    fn test_lightsocks_error_display() {
        let err = LightsocksError::Config("invalid config".to_string());
        assert_eq!(format!("{}", err), "Configuration error: invalid config");

        let err = LightsocksError::Connection("dial failed".to_string());
        assert_eq!(format!("{}", err), "Connection error: dial failed");
    }

    #[test]
    fn test_lightsocks_error_from_socks5() {
        let err: LightsocksError = Socks5Error::AuthFailed.into();
        assert!(matches!(err, LightsocksError::Socks5(_)));
    }

    #[test]
    fn test_socks5_error_display() {
        assert_eq!(
            format!("{}", Socks5Error::UnsupportedVersion(4)),
            "Unsupported SOCKS version: 4"
        );
        assert_eq!(
            format!("{}", Socks5Error::CommandNotSupported(0x99)),
            "Command not supported: 153"
        );
        assert_eq!(
            format!("{}", Socks5Error::Timeout("greeting read")),
            "Timeout: greeting read"
        );
        assert_eq!(format!("{}", Socks5Error::AuthFailed), "Authentication failed");
    }
}
