//! Per-process role in a distributed run.

use std::fmt;

use super::transport::{Communicator, TransportError};

/// Role of a process in the coordinator/worker protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Rank 0: distributes chunks and assembles results.
    Coordinator,
    /// Every other rank: computes on its assigned chunk.
    Worker,
}

/// Rank, participant count and role of this process.
///
/// Fixed for the lifetime of the process and passed explicitly to every
/// distributed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    role: Role,
    rank: usize,
    world_size: usize,
}

impl ExecutionContext {
    /// # Errors
    ///
    /// [`TransportError::InvalidPeer`] if `rank >= world_size`.
    pub fn new(rank: usize, world_size: usize) -> Result<Self, TransportError> {
        if rank >= world_size {
            return Err(TransportError::InvalidPeer {
                peer: rank,
                world_size,
            });
        }
        let role = if rank == 0 {
            Role::Coordinator
        } else {
            Role::Worker
        };
        Ok(Self {
            role,
            rank,
            world_size,
        })
    }

    /// Context matching the rank and size reported by `comm`.
    pub fn from_communicator<C: Communicator>(comm: &C) -> Result<Self, TransportError> {
        Self::new(comm.rank(), comm.world_size())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn world_size(&self) -> usize {
        self.world_size
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }

    /// Number of equal chunks the range is split into. A single-process run
    /// still has one chunk, processed by the coordinator itself.
    pub fn num_workers(&self) -> usize {
        (self.world_size - 1).max(1)
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}/{}", self.role, self.rank, self.world_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_zero_coordinates() {
        let ctx = ExecutionContext::new(0, 4).unwrap();
        assert_eq!(ctx.role(), Role::Coordinator);
        assert_eq!(ctx.num_workers(), 3);
        assert_eq!(ExecutionContext::new(2, 4).unwrap().role(), Role::Worker);
    }

    #[test]
    fn test_single_process_has_one_chunk() {
        assert_eq!(ExecutionContext::new(0, 1).unwrap().num_workers(), 1);
    }

    #[test]
    fn test_rank_outside_world_is_rejected() {
        assert!(ExecutionContext::new(4, 4).is_err());
        assert!(ExecutionContext::new(0, 0).is_err());
    }
}
