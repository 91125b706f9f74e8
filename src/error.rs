//! Unified error handling for the crowding pipeline.
//!
//! Every fallible stage returns [`Result<T>`]. Conditions that the pipeline
//! treats as non-fatal (a degenerate contingency table, an exhausted candidate
//! pool) are still modelled here or in [`crate::ExtensionStep`] so callers can
//! tell them apart from hard failures.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CrowdError>;

#[derive(Error, Debug)]
pub enum CrowdError {
    /// Input is too small or too empty for a stage to proceed.
    #[error("insufficient data for {stage}: {reason}")]
    InsufficientData { stage: &'static str, reason: String },

    /// A configuration value is outside its valid range.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The chi-square test is undefined for this table.
    #[error("degenerate contingency table: {reason}")]
    DegenerateContingencyTable { reason: String },

    /// A land-use record could not be turned into a polygon.
    #[error("invalid land-use record: {0}")]
    InvalidLandUse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrowdError {
    pub(crate) fn insufficient(stage: &'static str, reason: impl Into<String>) -> Self {
        CrowdError::InsufficientData {
            stage,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        CrowdError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        CrowdError::DegenerateContingencyTable {
            reason: reason.into(),
        }
    }

    /// Whether the pipeline may score this condition and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CrowdError::DegenerateContingencyTable { .. })
    }
}

/// Conversion helpers for optional values that signal missing input.
pub trait OptionExt<T> {
    /// Turn `None` into [`CrowdError::InsufficientData`] for `stage`.
    fn ok_or_insufficient_data(self, stage: &'static str, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_data(self, stage: &'static str, reason: &str) -> Result<T> {
        self.ok_or_else(|| CrowdError::insufficient(stage, reason))
    }
}
