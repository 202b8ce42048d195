//! Error handling for domain resolution.
//!
//! Every failure the engine can produce is a variant of [`LookupError`].
//! Callers that only need the coarse transport-level outcome use
//! [`LookupError::kind`].

use std::fmt;
use std::time::Duration;

/// Main error type for resolution operations.
#[derive(Debug, Clone)]
pub enum LookupError {
    /// Query could not be turned into an ASCII domain name
    InvalidDomain { domain: String, reason: String },

    /// An authority answered definitively that the domain is not registered
    DomainNotRegistered { domain: String, source: String },

    /// The TLD has neither an RDAP server nor a known WHOIS host
    UnsupportedSuffix { tld: String },

    /// No RDAP server candidate exists for the TLD
    NoServerFound { tld: String },

    /// Every RDAP candidate was tried and none produced a usable answer
    AllServersFailed { domain: String, attempts: Vec<String> },

    /// Network-related errors (connection refused, reset, DNS, HTTP status)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// TCP connection to a WHOIS host could not be established or broke off
    ConnectionError { host: String, message: String },

    /// Operation exceeded its deadline
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Upstream payload could not be decoded
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Invalid settings in a config file or environment variable
    ConfigError { message: String },

    /// Config file could not be read
    FileError { path: String, message: String },
}

/// Coarse classification used by transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Maps to a "not found" response
    NotRegistered,
    /// Neither protocol can serve this suffix
    Unsupported,
    /// Try again later
    Transient,
    /// The caller sent something that is not a domain
    InvalidInput,
}

impl LookupError {
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    pub fn not_registered<D: Into<String>, S: Into<String>>(domain: D, source: S) -> Self {
        Self::DomainNotRegistered {
            domain: domain.into(),
            source: source.into(),
        }
    }

    pub fn unsupported<T: Into<String>>(tld: T) -> Self {
        Self::UnsupportedSuffix { tld: tld.into() }
    }

    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn connection<H: Into<String>, M: Into<String>>(host: H, message: M) -> Self {
        Self::ConnectionError {
            host: host.into(),
            message: message.into(),
        }
    }

    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify this error for the transport layer.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DomainNotRegistered { .. } => FailureKind::NotRegistered,
            Self::UnsupportedSuffix { .. } | Self::NoServerFound { .. } => {
                FailureKind::Unsupported
            }
            Self::InvalidDomain { .. } => FailureKind::InvalidInput,
            _ => FailureKind::Transient,
        }
    }

    /// True for failures that a later step of the fallback chain may recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoServerFound { .. }
                | Self::AllServersFailed { .. }
                | Self::NetworkError { .. }
                | Self::ConnectionError { .. }
                | Self::Timeout { .. }
                | Self::ParseError { .. }
        )
    }

    /// True when the authority said the domain does not exist.
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::DomainNotRegistered { .. })
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::DomainNotRegistered { domain, source } => {
                write!(f, "Domain '{}' is not registered (according to {})", domain, source)
            }
            Self::UnsupportedSuffix { tld } => {
                write!(f, "No RDAP server or WHOIS host is known for '.{}'", tld)
            }
            Self::NoServerFound { tld } => {
                write!(f, "No RDAP server found for '.{}'", tld)
            }
            Self::AllServersFailed { domain, attempts } => {
                write!(
                    f,
                    "All {} RDAP server(s) failed for '{}'",
                    attempts.len(),
                    domain
                )
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::ConnectionError { host, message } => {
                write!(f, "Connection to '{}' failed: {}", host, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ParseError { message, content: _ } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for LookupError {}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", Duration::from_secs(10))
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::parse(format!("Response body could not be decoded: {}", err))
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<std::io::Error> for LookupError {
    fn from(err: std::io::Error) -> Self {
        Self::network_with_source("I/O error", err.to_string())
    }
}
