//! Coordinator/worker protocol for AXPY and compensated summation.

use daxpar_core::axpy::{axpy_unchecked, check_lengths};
use daxpar_core::{neumaier_sum, KernelError, Partition};
use thiserror::Error;

use super::context::{ExecutionContext, Role};
use super::transport::{Communicator, TransportError};
use crate::backend::{BackendType, DeviceInfo};

const COORDINATOR: usize = 0;

/// Errors from a distributed operation. All of them are fatal to the job.
#[derive(Debug, Error)]
pub enum DistributedError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("Coordinator vector has {actual} elements, expected {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("Context {context} does not match communicator rank {rank} of {world_size}")]
    ContextMismatch {
        context: ExecutionContext,
        rank: usize,
        world_size: usize,
    },

    #[error("Rank {rank} is a {actual:?}, operation requires the {required:?}")]
    WrongRole {
        required: Role,
        actual: Role,
        rank: usize,
    },
}

/// Runs the coordinator or worker side of each operation, depending on the
/// role in its [`ExecutionContext`].
///
/// Every rank must call the same operations in the same order with the same
/// `n` (and `a`); only the coordinator holds the full vectors.
pub struct DistributedExecutor<C: Communicator> {
    ctx: ExecutionContext,
    comm: C,
}

impl<C: Communicator> DistributedExecutor<C> {
    /// Bind `comm` to the context derived from its rank and size.
    pub fn new(comm: C) -> Result<Self, DistributedError> {
        let ctx = ExecutionContext::from_communicator(&comm)?;
        Ok(Self { ctx, comm })
    }

    /// Bind `comm` to an explicit context, which must agree with it.
    pub fn with_context(ctx: ExecutionContext, comm: C) -> Result<Self, DistributedError> {
        if ctx.rank() != comm.rank() || ctx.world_size() != comm.world_size() {
            return Err(DistributedError::ContextMismatch {
                context: ctx,
                rank: comm.rank(),
                world_size: comm.world_size(),
            });
        }
        Ok(Self { ctx, comm })
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// One compute unit per rank, coordinator included.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("Distributed ({} ranks)", self.ctx.world_size()),
            backend_type: BackendType::Distributed,
            compute_units: self.ctx.world_size(),
        }
    }

    fn require(&self, required: Role) -> Result<(), DistributedError> {
        if self.ctx.role() != required {
            return Err(DistributedError::WrongRole {
                required,
                actual: self.ctx.role(),
                rank: self.ctx.rank(),
            });
        }
        Ok(())
    }

    fn layout(&self, n: usize) -> Result<Partition, DistributedError> {
        Ok(Partition::across(n, self.ctx.num_workers())?)
    }

    /// Distributed AXPY over a vector of length `n`.
    ///
    /// On the coordinator `x` and `y` must hold all `n` elements and `y` holds
    /// the assembled result on return. Workers ignore both slices (pass empty
    /// ones) and use their own scratch buffers.
    pub fn axpy(&self, n: usize, a: f64, x: &[f64], y: &mut [f64]) -> Result<(), DistributedError> {
        match self.ctx.role() {
            Role::Coordinator => {
                let len = check_lengths(x, y)?;
                if len != n {
                    return Err(DistributedError::BufferLength {
                        expected: n,
                        actual: len,
                    });
                }
                self.coordinate_axpy(a, x, y)
            }
            Role::Worker => self.serve_axpy(n, a),
        }
    }

    /// Distributed compensated sum of a vector of length `n`.
    ///
    /// Returns `Some(total)` on the coordinator, `None` on workers. Workers
    /// ignore `x`.
    pub fn sum(&self, n: usize, x: &[f64]) -> Result<Option<f64>, DistributedError> {
        match self.ctx.role() {
            Role::Coordinator => {
                if x.len() != n {
                    return Err(DistributedError::BufferLength {
                        expected: n,
                        actual: x.len(),
                    });
                }
                self.coordinate_sum(x).map(Some)
            }
            Role::Worker => self.serve_sum(n).map(|()| None),
        }
    }

    /// Coordinator side of [`axpy`](Self::axpy).
    ///
    /// Processes the remainder locally, sends each worker its `x` and `y`
    /// chunks, then writes the returned chunks into `y` in rank order.
    /// Fails with [`DistributedError::WrongRole`] on a worker.
    pub fn coordinate_axpy(&self, a: f64, x: &[f64], y: &mut [f64]) -> Result<(), DistributedError> {
        self.require(Role::Coordinator)?;
        let n = check_lengths(x, y)?;
        if n == 0 || a == 0.0 {
            return Ok(());
        }
        if self.ctx.world_size() == 1 {
            axpy_unchecked(a, x, y);
            return Ok(());
        }

        let partition = self.layout(n)?;
        log::debug!(
            "{}: axpy n={} remainder={} chunk={}",
            self.ctx,
            n,
            partition.remainder(),
            partition.chunk_len()
        );
        let rem = partition.remainder_chunk().range();
        axpy_unchecked(a, &x[rem.clone()], &mut y[rem]);

        for (worker, chunk) in (1..self.ctx.world_size()).zip(partition.chunks()) {
            self.comm.send(worker, &x[chunk.range()])?;
            self.comm.send(worker, &y[chunk.range()])?;
        }
        for (worker, chunk) in (1..self.ctx.world_size()).zip(partition.chunks()) {
            self.comm.receive(worker, &mut y[chunk.range()])?;
        }
        Ok(())
    }

    /// Worker side of [`axpy`](Self::axpy). Fails with
    /// [`DistributedError::WrongRole`] on the coordinator.
    pub fn serve_axpy(&self, n: usize, a: f64) -> Result<(), DistributedError> {
        self.require(Role::Worker)?;
        if n == 0 || a == 0.0 {
            return Ok(());
        }
        let chunk_len = self.layout(n)?.chunk_len();
        let mut x = vec![0.0; chunk_len];
        let mut y = vec![0.0; chunk_len];

        self.comm.receive(COORDINATOR, &mut x)?;
        self.comm.receive(COORDINATOR, &mut y)?;
        axpy_unchecked(a, &x, &mut y);
        self.comm.send(COORDINATOR, &y)?;
        Ok(())
    }

    /// Coordinator side of [`sum`](Self::sum).
    ///
    /// Partial slot 0 holds the remainder's sum, slot `r` the sum returned by
    /// worker `r`. The `world_size` partials are reduced in rank order.
    /// Fails with [`DistributedError::WrongRole`] on a worker.
    pub fn coordinate_sum(&self, x: &[f64]) -> Result<f64, DistributedError> {
        self.require(Role::Coordinator)?;
        let n = x.len();
        if n == 0 {
            return Ok(0.0);
        }
        if self.ctx.world_size() == 1 {
            return Ok(neumaier_sum(x));
        }

        let partition = self.layout(n)?;
        log::debug!(
            "{}: sum n={} remainder={} chunk={}",
            self.ctx,
            n,
            partition.remainder(),
            partition.chunk_len()
        );
        for (worker, chunk) in (1..self.ctx.world_size()).zip(partition.chunks()) {
            self.comm.send(worker, &x[chunk.range()])?;
        }

        let mut partials = vec![0.0; self.ctx.world_size()];
        partials[0] = neumaier_sum(&x[partition.remainder_chunk().range()]);
        for (worker, slot) in partials.iter_mut().enumerate().skip(1) {
            self.comm.receive(worker, std::slice::from_mut(slot))?;
        }
        Ok(neumaier_sum(&partials))
    }

    /// Worker side of [`sum`](Self::sum).
    ///
    /// Fails with [`DistributedError::WrongRole`] on the coordinator.
    pub fn serve_sum(&self, n: usize) -> Result<(), DistributedError> {
        self.require(Role::Worker)?;
        if n == 0 {
            return Ok(());
        }
        let mut chunk = vec![0.0; self.layout(n)?.chunk_len()];
        self.comm.receive(COORDINATOR, &mut chunk)?;
        let local = neumaier_sum(&chunk);
        self.comm.send(COORDINATOR, &[local])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::{run_local, LocalWorld};

    #[test]
    fn test_context_must_match_communicator() {
        let comm = LocalWorld::new(2).unwrap().into_communicators().remove(1);
        let wrong = ExecutionContext::new(0, 2).unwrap();
        assert!(matches!(
            DistributedExecutor::with_context(wrong, comm),
            Err(DistributedError::ContextMismatch { .. })
        ));
    }

    #[test]
    fn test_coordinator_buffer_length_is_checked() {
        let comm = LocalWorld::new(1).unwrap().into_communicators().remove(0);
        let exec = DistributedExecutor::new(comm).unwrap();
        assert!(matches!(
            exec.sum(5, &[1.0; 4]),
            Err(DistributedError::BufferLength {
                expected: 5,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_fewer_elements_than_workers() {
        let x = [1.0, 2.0];
        let results = run_local(4, |comm| {
            let exec = DistributedExecutor::new(comm).unwrap();
            let mut y = if exec.context().is_coordinator() {
                vec![10.0, 20.0]
            } else {
                Vec::new()
            };
            let xs: &[f64] = if exec.context().is_coordinator() { &x } else { &[] };
            exec.axpy(2, 1.0, xs, &mut y).unwrap();
            let sum = exec.sum(2, &y).unwrap();
            (y, sum)
        })
        .unwrap();
        assert_eq!(results[0].0, vec![11.0, 22.0]);
        assert_eq!(results[0].1, Some(33.0));
        assert!(results[1..].iter().all(|(_, s)| s.is_none()));
    }

    #[test]
    fn test_device_info_counts_every_rank() {
        let infos = run_local(3, |comm| {
            DistributedExecutor::new(comm).unwrap().device_info()
        })
        .unwrap();
        for info in infos {
            assert_eq!(info.backend_type, BackendType::Distributed);
            assert_eq!(info.backend_type.to_string(), "distributed");
            assert_eq!(info.compute_units, 3);
        }
    }

    #[test]
    fn test_role_sides_reject_the_wrong_rank() {
        let results = run_local(2, |comm| {
            let exec = DistributedExecutor::new(comm).unwrap();
            if exec.context().is_coordinator() {
                (
                    exec.serve_sum(4).unwrap_err(),
                    exec.serve_axpy(4, 1.0).unwrap_err(),
                )
            } else {
                let mut y = [0.0; 4];
                (
                    exec.coordinate_sum(&[1.0; 4]).unwrap_err(),
                    exec.coordinate_axpy(1.0, &[1.0; 4], &mut y).unwrap_err(),
                )
            }
        })
        .unwrap();

        for err in [&results[0].0, &results[0].1] {
            assert!(matches!(
                err,
                DistributedError::WrongRole {
                    required: Role::Worker,
                    actual: Role::Coordinator,
                    rank: 0
                }
            ));
        }
        for err in [&results[1].0, &results[1].1] {
            assert!(matches!(
                err,
                DistributedError::WrongRole {
                    required: Role::Coordinator,
                    actual: Role::Worker,
                    rank: 1
                }
            ));
        }
    }

    #[test]
    fn test_worker_failure_aborts_coordinator() {
        let results = run_local(3, |comm| {
            let exec = DistributedExecutor::new(comm).unwrap();
            if exec.context().rank() == 2 {
                // Leaves without taking part.
                return Ok(None);
            }
            let x = vec![1.0; 10];
            let xs: &[f64] = if exec.context().is_coordinator() { &x } else { &[] };
            exec.sum(10, xs)
        })
        .unwrap();
        assert!(matches!(
            results[0],
            Err(DistributedError::Transport(TransportError::Disconnected { peer: 2 }))
        ));
    }
}
