// Reading validation and persistence errors
use std::time::Duration;
use thiserror::Error;

/// Why a draft value cannot be saved. Blocks only its own row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftIssue {
    #[error("not a number")]
    NotANumber,
    #[error("reading cannot be negative")]
    Negative,
    #[error("fixed fee meters take no readings")]
    NotMetered,
    #[error("meter entered more than once")]
    Duplicate,
}

/// Non-blocking condition shown next to a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DraftWarning {
    /// Current reading below the previous one, e.g. after a meter replacement.
    ReadingRegression { previous: f64, current: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadingError {
    #[error("invalid reading for meter {meter_id}: {issue}")]
    InvalidInput { meter_id: String, issue: DraftIssue },

    #[error("unknown meter {0}")]
    UnknownMeter(String),

    #[error("save blocked: {0} row(s) have invalid input")]
    SaveBlocked(usize),

    #[error("no changed readings to save")]
    NothingToSave,

    #[error("a save is already in progress")]
    SaveInFlight,

    #[error("meter {0} has no reading awaiting approval")]
    NotAwaitingApproval(String),

    #[error("failed to persist meter {meter_id}: {message}")]
    PersistenceFailure { meter_id: String, message: String },

    #[error("saving meter {meter_id} timed out after {after:?}")]
    TimedOut { meter_id: String, after: Duration },
}

impl ReadingError {
    pub fn persistence(meter_id: &str, err: &anyhow::Error) -> Self {
        ReadingError::PersistenceFailure {
            meter_id: meter_id.to_string(),
            message: format!("{err:#}"),
        }
    }
}
