//! Error taxonomy for titer computation.
//!
//! Each variant maps to a process exit code so the binary can signal the
//! failure class to scripts without parsing stderr:
//!
//! - 2: input/configuration errors (malformed CSV, bad ladder, bad flags)
//! - 3: insufficient data (too few samples to attempt a fit)
//! - 4: internal inconsistencies (impossible scan states, misused helpers)
//! - 5: curve fit failure (no finite candidate)
//!
//! "Not done" inputs are never errors: both estimators report `*` for them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TiterError {
    /// Malformed input that must not silently produce a numeric answer.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Supplied dilution steps do not match the canonical ladder.
    #[error("dilution mismatch: {0}")]
    DilutionMismatch(String),

    /// A numeric count was normalized against a non-positive control.
    #[error("non-positive control count ({0}) on a numeric path")]
    NonPositiveControl(f64),

    /// Too few samples to calibrate the requested curve shape.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The dose-response fit produced no usable candidate.
    #[error("curve fit failed: {0}")]
    CurveFit(String),

    /// A state that must never be reached on valid data; indicates a bug
    /// or a precondition violation (e.g. extrapolating an in-range titer).
    #[error("internal inconsistency: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TiterError {
    /// Process exit code for the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            TiterError::InvalidInput(_)
            | TiterError::DilutionMismatch(_)
            | TiterError::NonPositiveControl(_)
            | TiterError::Io(_)
            | TiterError::Csv(_)
            | TiterError::Json(_) => 2,
            TiterError::InsufficientData(_) => 3,
            TiterError::Internal(_) => 4,
            TiterError::CurveFit(_) => 5,
        }
    }
}
