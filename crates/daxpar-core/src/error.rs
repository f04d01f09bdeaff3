//! Errors raised by the sequential kernels.

use thiserror::Error;

/// Precondition violations detected by the kernels and the partitioner.
///
/// These indicate a caller bug; none of them is recoverable by retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("Vector length mismatch: x has {x} elements, y has {y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("Chunk size {chunk_size} exceeds vector length {n}")]
    ChunkTooLarge { chunk_size: usize, n: usize },

    #[error("Cannot split a range into {0} parts")]
    InvalidPartCount(usize),
}
