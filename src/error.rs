use crate::domain::resolution::CandidateMatch;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error taxonomy for the ledger engine.
///
/// Validation and authorization failures are raised before any side effect.
/// `Persistence` guarantees the whole unit of work rolled back, so the
/// caller may safely retry. Notification failures never surface here; the
/// dispatcher reports them through its own outcome type.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid {field}: {message}")]
    BadRequest {
        field: &'static str,
        message: String,
    },
    #[error("owner not recognized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    UnprocessableAmount(String),
    #[error("more than one customer matches the given name")]
    Ambiguous { candidates: Vec<CandidateMatch> },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("notification channel failure: {0}")]
    Notification(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn bad_request(field: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            field,
            message: message.into(),
        }
    }

    /// Stable wire code used in the structured error response.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } | Self::Csv(_) | Self::Io(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UnprocessableAmount(_) => "UNPROCESSABLE_AMOUNT",
            Self::Ambiguous { .. } => "AMBIGUOUS",
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
            Self::Notification(_) => "NOTIFICATION_FAILURE",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
