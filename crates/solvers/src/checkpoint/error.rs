use std::{io, string::FromUtf8Error};

use thiserror::Error;

/// Errors raised while writing or reading a checkpoint file.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("{what} {value} does not fit the checkpoint format")]
    TooLarge { what: &'static str, value: usize },

    #[error("material name is not UTF-8: {0}")]
    Name(#[from] FromUtf8Error),

    #[error("record of step {leading} ends with step {trailing}")]
    StepMismatch { leading: u32, trailing: u32 },

    #[error("checkpoint ends in the middle of a record")]
    Truncated,
}
