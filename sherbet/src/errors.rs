// -*- mode: rust; -*-
//
// This file is part of `sherbet`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

/// Errors produced by the private set intersection protocol.
///
/// No error is recovered from inside the library. A caller that wants to try
/// again must start a fresh run, which samples fresh exponents; see
/// [`Error::retryable`].
#[derive(Debug)]
pub enum Error {
    /// The random number generator failed to produce an exponent.
    Entropy(rand_core::Error),
    /// A point encoding was malformed, non-canonical, or the identity.
    InvalidPoint(&'static str),
    /// A message does not have the structure the protocol requires.
    ProtocolViolation(String),
    /// The configuration was rejected before any message was exchanged.
    Configuration(String),
    /// An input/output error occurred on the channel.
    IoError(std::io::Error),
}

/// The kind of an [`Error`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Entropy`].
    Entropy,
    /// See [`Error::InvalidPoint`].
    InvalidPoint,
    /// See [`Error::ProtocolViolation`].
    ProtocolViolation,
    /// See [`Error::Configuration`].
    Configuration,
    /// See [`Error::IoError`].
    Io,
}

impl Error {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Entropy(_) => ErrorKind::Entropy,
            Error::InvalidPoint(_) => ErrorKind::InvalidPoint,
            Error::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::IoError(_) => ErrorKind::Io,
        }
    }

    /// Whether a new run, with fresh exponents, could succeed where this one
    /// failed. Entropy and configuration failures will happen again.
    pub fn retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Io | ErrorKind::ProtocolViolation | ErrorKind::InvalidPoint
        )
    }

    pub(crate) fn violation(msg: impl Into<String>) -> Self {
        Error::ProtocolViolation(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

impl From<std::io::Error> for Error {
    #[inline]
    fn from(e: std::io::Error) -> Error {
        // Length limits in the channel report `InvalidData`; that is the peer
        // breaking the message format, not a transport failure.
        if e.kind() == std::io::ErrorKind::InvalidData {
            Error::ProtocolViolation(e.to_string())
        } else {
            Error::IoError(e)
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Entropy(e) => write!(f, "entropy source failed: {}", e),
            Error::InvalidPoint(s) => write!(f, "invalid point encoding: {}", s),
            Error::ProtocolViolation(s) => write!(f, "protocol violation: {}", s),
            Error::Configuration(s) => write!(f, "invalid configuration: {}", s),
            Error::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Entropy(e) => Some(e),
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_is_a_violation() {
        let e: Error = std::io::Error::new(std::io::ErrorKind::InvalidData, "too long").into();
        assert_eq!(e.kind(), ErrorKind::ProtocolViolation);
        assert!(e.retryable());
        let e: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert_eq!(e.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_configuration_is_not_retryable() {
        assert!(!Error::config("bad").retryable());
        assert_eq!(
            Error::config("p must be in (0, 1)").to_string(),
            "invalid configuration: p must be in (0, 1)"
        );
    }
}
