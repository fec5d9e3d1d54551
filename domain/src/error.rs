//! Error types for the `domain` layer.
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors are modeled as a small tree: `Error` holds an `error_kind` that says
/// whether the fault lies with us (`Internal`) or with the upstream provider
/// (`External`), plus the original error in `source` when there is one.
/// Callers never inspect `source` to decide what to do; they match on the kind
/// or ask for the `category`.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Faults raised while handling data we already have.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    /// The upstream answered successfully but the body could not be understood.
    Decode,
    Other(String),
}

/// Faults in reaching the upstream provider.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Timeout,
    Status(u16),
}

/// How a failed poll is reported to a streaming client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    UpstreamUnavailable,
    InternalFault,
}

impl Error {
    pub fn internal(kind: InternalErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(kind),
        }
    }

    pub fn external(kind: ExternalErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::External(kind),
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self.error_kind {
            DomainErrorKind::External(_) => FailureCategory::UpstreamUnavailable,
            DomainErrorKind::Internal(_) => FailureCategory::InternalFault,
        }
    }

    /// Human readable description suitable for an in-band error event: the
    /// kind's description followed by every message in the source chain.
    pub fn detail(&self) -> String {
        let mut detail = self.kind_description();
        let mut next = StdError::source(self);
        while let Some(err) = next {
            let message = err.to_string();
            if !detail.ends_with(&message) {
                detail.push_str(": ");
                detail.push_str(&message);
            }
            next = err.source();
        }
        detail
    }

    fn kind_description(&self) -> String {
        match &self.error_kind {
            DomainErrorKind::External(ExternalErrorKind::Network) => {
                "upstream unreachable".to_string()
            }
            DomainErrorKind::External(ExternalErrorKind::Timeout) => {
                "upstream request timed out".to_string()
            }
            DomainErrorKind::External(ExternalErrorKind::Status(code)) => {
                format!("upstream responded with status {code}")
            }
            DomainErrorKind::Internal(InternalErrorKind::Config) => {
                "invalid configuration".to_string()
            }
            DomainErrorKind::Internal(InternalErrorKind::Decode) => {
                "malformed upstream response".to_string()
            }
            DomainErrorKind::Internal(InternalErrorKind::Other(message)) => message.clone(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}: {}", self.error_kind, self.detail())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            // Raised before any network call is made.
            DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to build reqwest client".to_string(),
            ))
        } else if err.is_timeout() {
            DomainErrorKind::External(ExternalErrorKind::Timeout)
        } else if let Some(status) = err.status() {
            DomainErrorKind::External(ExternalErrorKind::Status(status.as_u16()))
        } else if err.is_decode() {
            DomainErrorKind::Internal(InternalErrorKind::Decode)
        } else {
            DomainErrorKind::External(ExternalErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Decode),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }
}
