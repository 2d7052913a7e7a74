//! Error types for the Tally engine.

use crate::RecordId;
use thiserror::Error;

/// All possible errors from the pure mutators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("record {0} has no installment plan")]
    NoInstallmentPlan(RecordId),

    #[error("installment index {index} out of range for {count} installments")]
    InstallmentOutOfRange { index: usize, count: u32 },
}

/// Result type for mutator operations.
pub type Result<T> = std::result::Result<T, Error>;
