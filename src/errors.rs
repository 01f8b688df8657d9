//! Error hierarchy for ledger observation and claim submission
//!
//! Errors are grouped by the layer they come from:
//! - [`NotFoundError`]: the ledger has no initialized record for an id
//! - [`ReadError`]: the read collaborator failed
//! - [`PreconditionError`]: a claim was refused before any work was attempted
//! - [`SubmissionError`]: a claim batch could not be submitted or confirmed

use config::ConfigError;

use crate::claim::BatchType;
use crate::claim::ClaimOutcome;
use crate::claim::ClaimWorkItem;
use crate::DealId;
use crate::TaskId;
use crate::TxHash;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Record has not been initialized on the ledger yet
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Read collaborator failure, surfaced verbatim to subscribers
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Claim refused up front, nothing was submitted
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// A single submit or confirm step failed
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Claim drain stopped part way; carries the confirmed progress
    #[error(
        "claim interrupted after {} confirmed batch(es), {} item(s) left: {}",
        .0.progress.transactions.len(),
        .0.remaining.len(),
        .0.cause
    )]
    ClaimInterrupted(Box<ClaimInterrupted>),

    /// Configuration source could not be parsed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration parsed but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NotFoundError {
    #[error("task {0} not found")]
    Task(TaskId),

    #[error("deal {0} not found")]
    Deal(DealId),
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Ledger endpoint unreachable or not answering
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// Ledger answered with something that could not be interpreted
    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    #[error("deal {deal_id} is still running until {final_time}, claim is not allowed yet")]
    DeadlineNotReached { deal_id: DealId, final_time: u64 },

    #[error("nothing to claim for deal {deal_id}")]
    NothingToClaim { deal_id: DealId },

    /// Batch size would be zero, draining could never progress
    #[error("resource ceiling {ceiling} cannot fit a single item costing {cost_per_item}")]
    CeilingTooLow { ceiling: u64, cost_per_item: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("failed to submit {batch_type} batch for indices {indices:?}: {source}")]
    Submit {
        batch_type: BatchType,
        indices: Vec<usize>,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to confirm transaction {tx_hash}: {source}")]
    Confirm {
        tx_hash: TxHash,
        #[source]
        source: Box<Error>,
    },
}

/// Partial claim result reported when a batch fails mid-drain
#[derive(Debug)]
pub struct ClaimInterrupted {
    pub cause: SubmissionError,
    /// Batches confirmed before the failure
    pub progress: ClaimOutcome,
    /// The failed batch followed by every item never submitted
    pub remaining: Vec<ClaimWorkItem>,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether the failure is worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Read(ReadError::Unavailable(_)) => true,
            Error::Submission(SubmissionError::Submit { source, .. })
            | Error::Submission(SubmissionError::Confirm { source, .. }) => source.is_retryable(),
            Error::ClaimInterrupted(interrupted) => match &interrupted.cause {
                SubmissionError::Submit { source, .. } | SubmissionError::Confirm { source, .. } => {
                    source.is_retryable()
                }
            },
            _ => false,
        }
    }
}
