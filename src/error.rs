use miette::Diagnostic;
use thiserror::Error;

/// The outcome classes every operation reports failures in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Unauthenticated,
    PermissionDenied,
    Unavailable,
    Internal,
}

#[derive(Error, Diagnostic, Debug)]
pub enum MarketError {
    #[error("invalid argument: {0}")]
    #[diagnostic(code(market::invalid_argument))]
    InvalidArgument(String),

    #[error("not found: {0}")]
    #[diagnostic(code(market::not_found))]
    NotFound(String),

    #[error("failed precondition: {0}")]
    #[diagnostic(code(market::failed_precondition))]
    FailedPrecondition(String),

    #[error("unauthenticated: {0}")]
    #[diagnostic(code(market::unauthenticated))]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    #[diagnostic(code(market::permission_denied))]
    PermissionDenied(String),

    #[error("unavailable: {0}")]
    #[diagnostic(code(market::unavailable))]
    Unavailable(String),

    #[error("payment processor error: {0}")]
    #[diagnostic(code(market::processor))]
    Processor(String),

    #[error("internal error: {0}")]
    #[diagnostic(code(market::internal))]
    InternalError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            // A declined charge is a refusal, not an outage.
            Self::FailedPrecondition(_) | Self::Processor(_) => ErrorKind::FailedPrecondition,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Prefixes the message with which side effect failed, keeping the kind.
    pub fn context(self, what: &str) -> Self {
        match self {
            Self::InvalidArgument(m) => Self::InvalidArgument(format!("{what}: {m}")),
            Self::NotFound(m) => Self::NotFound(format!("{what}: {m}")),
            Self::FailedPrecondition(m) => Self::FailedPrecondition(format!("{what}: {m}")),
            Self::Unauthenticated(m) => Self::Unauthenticated(format!("{what}: {m}")),
            Self::PermissionDenied(m) => Self::PermissionDenied(format!("{what}: {m}")),
            Self::Unavailable(m) => Self::Unavailable(format!("{what}: {m}")),
            Self::Processor(m) => Self::Processor(format!("{what}: {m}")),
            other @ Self::InternalError(_) => other,
        }
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for MarketError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Unavailable(format!("rocksdb: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            MarketError::NotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MarketError::Processor("card declined".into()).kind(),
            ErrorKind::FailedPrecondition
        );
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = MarketError::Unavailable("timeout".into()).context("decorator profile sync");
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(
            err.to_string(),
            "unavailable: decorator profile sync: timeout"
        );
    }
}
