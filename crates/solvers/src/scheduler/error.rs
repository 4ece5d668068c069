use std::error::Error as StdError;

use burnup_core::{BoxError, ContractViolation, config::ConfigError};

use crate::{checkpoint::CheckpointError, step_size::StepSizeError};

/// Errors that can stop a depletion run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("depletion solver error: {0}")]
    Solver(#[source] BoxError),

    #[error("coupled program error: {0}")]
    Coupling(#[source] BoxError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    StepSize(#[from] StepSizeError),

    #[error("transport returned {found} {what} tallies for {expected} materials")]
    TallyLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl Error {
    pub(crate) fn transport<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Transport(Box::new(err))
    }

    pub(crate) fn solver<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Solver(Box::new(err))
    }
}
