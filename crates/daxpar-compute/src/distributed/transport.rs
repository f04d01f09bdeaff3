//! Blocking point-to-point message passing.

use thiserror::Error;

/// Failures of a send or receive. All of them are fatal to the job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Rank {peer} is outside a world of {world_size} processes")]
    InvalidPeer { peer: usize, world_size: usize },

    #[error("Rank {rank} cannot exchange messages with itself")]
    SelfMessage { rank: usize },

    #[error("Connection to rank {peer} is closed")]
    Disconnected { peer: usize },

    #[error("Message from rank {peer} has {received} values, expected {expected}")]
    LengthMismatch {
        peer: usize,
        expected: usize,
        received: usize,
    },
}

/// A process group with blocking, ordered point-to-point messaging.
///
/// Implementations must give `send` rendezvous semantics: it returns only
/// once `dest` has taken the message with a matching `receive`. Messages
/// between one ordered pair of ranks arrive in the order they were sent.
pub trait Communicator {
    /// Rank of this process, in `0..world_size()`.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn world_size(&self) -> usize;

    /// Send `payload` to `dest`, blocking until it is received.
    fn send(&self, dest: usize, payload: &[f64]) -> Result<(), TransportError>;

    /// Block until a message from `source` arrives and copy it into
    /// `buffer`, whose length must equal the message length.
    fn receive(&self, source: usize, buffer: &mut [f64]) -> Result<(), TransportError>;
}
