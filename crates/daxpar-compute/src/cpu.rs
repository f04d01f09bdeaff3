//! CPU compute backend using Rayon for shared-memory parallelism.
//!
//! Work is split with the remainder-first [`Partition`]: the short remainder
//! chunk runs on the calling thread, the equal full chunks are fanned out
//! across the pool. Each task owns a disjoint `&mut` slice of the output (or
//! one slot of the partial-results array), so no locks are needed. Rayon's
//! join acts as the barrier before the final sequential reduction.

use daxpar_core::axpy::{axpy_unchecked, check_lengths};
use daxpar_core::{neumaier_sum, NeumaierSum, Partition};
use rayon::prelude::*;

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// CPU backend that parallelises chunks across threads via Rayon.
pub struct CpuBackend {
    num_threads: usize,
    /// Dedicated pool; `None` runs on Rayon's global pool.
    pool: Option<rayon::ThreadPool>,
}

impl CpuBackend {
    /// Create a new CPU backend on the global pool (all available threads).
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
            pool: None,
        }
    }

    /// Create a CPU backend with its own pool of `num_threads` threads.
    ///
    /// `0` lets Rayon pick the hardware concurrency.
    pub fn with_threads(num_threads: usize) -> Result<Self, ComputeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("daxpar-worker-{i}"))
            .build()
            .map_err(|e| ComputeError::ThreadPool(e.to_string()))?;
        Ok(Self {
            num_threads: pool.current_num_threads(),
            pool: Some(pool),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Chunked parallel AXPY.
    ///
    /// The remainder chunk is processed sequentially first so the parallel
    /// region only sees equal-sized chunks.
    pub fn daxpy_chunked_parallel(
        &self,
        a: f64,
        x: &[f64],
        y: &mut [f64],
        chunk_size: usize,
    ) -> Result<(), ComputeError> {
        let n = check_lengths(x, y)?;
        if n == 0 || a == 0.0 {
            return Ok(());
        }
        let partition = Partition::new(n, chunk_size)?;
        let rem = partition.remainder();

        let (x_rem, x_body) = x.split_at(rem);
        let (y_rem, y_body) = y.split_at_mut(rem);
        axpy_unchecked(a, x_rem, y_rem);

        let chunk_len = partition.chunk_len();
        log::debug!(
            "axpy: {} chunks of {} on {} threads",
            partition.num_chunks(),
            chunk_len,
            self.num_threads
        );
        self.install(|| {
            y_body
                .par_chunks_mut(chunk_len)
                .zip(x_body.par_chunks(chunk_len))
                .for_each(|(yc, xc)| axpy_unchecked(a, xc, yc));
        });
        Ok(())
    }

    /// Chunked parallel compensated sum.
    ///
    /// The remainder's sum goes into the last partial slot, full chunk `k`
    /// into slot `k`. The partials are reduced sequentially in array order
    /// once every chunk has finished.
    pub fn sum_chunked_parallel(&self, x: &[f64], chunk_size: usize) -> Result<f64, ComputeError> {
        if x.is_empty() {
            return Ok(0.0);
        }
        let partition = Partition::new(x.len(), chunk_size)?;
        let mut partials = vec![0.0; partition.num_partials()];

        let x_rem = &x[partition.remainder_chunk().range()];
        let x_body = &x[partition.body()];
        let (chunk_slots, remainder_slot) = partials.split_at_mut(partition.num_chunks());
        if let Some(slot) = remainder_slot.first_mut() {
            *slot = neumaier_sum(x_rem);
        }

        let chunk_len = partition.chunk_len();
        self.install(|| {
            chunk_slots
                .par_iter_mut()
                .zip(x_body.par_chunks(chunk_len))
                .for_each(|(slot, chunk)| *slot = neumaier_sum(chunk));
        });

        Ok(neumaier_sum(&partials))
    }

    /// Element-parallel AXPY with no explicit chunking; Rayon decides the
    /// split.
    pub fn daxpy_parallel(&self, a: f64, x: &[f64], y: &mut [f64]) -> Result<(), ComputeError> {
        let n = check_lengths(x, y)?;
        if n == 0 || a == 0.0 {
            return Ok(());
        }
        self.install(|| {
            y.par_iter_mut()
                .zip(x.par_iter())
                .for_each(|(yi, &xi)| *yi += a * xi);
        });
        Ok(())
    }

    /// Parallel compensated sum: per-thread [`NeumaierSum`] accumulators
    /// merged pairwise.
    ///
    /// Accurate to the same class as [`neumaier_sum`], but the merge tree
    /// depends on work stealing, so the result is not bit-reproducible.
    pub fn sum_parallel(&self, x: &[f64]) -> f64 {
        self.install(|| {
            x.par_iter()
                .fold(NeumaierSum::new, |mut acc, &v| {
                    acc.add(v);
                    acc
                })
                .reduce(NeumaierSum::new, |mut left, right| {
                    left.merge(right);
                    left
                })
                .value()
        })
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: self.num_threads,
        }
    }

    fn axpy_chunked(
        &self,
        a: f64,
        x: &[f64],
        y: &mut [f64],
        chunk_size: usize,
    ) -> Result<(), ComputeError> {
        self.daxpy_chunked_parallel(a, x, y, chunk_size)
    }

    fn sum_chunked(&self, x: &[f64], chunk_size: usize) -> Result<f64, ComputeError> {
        self.sum_chunked_parallel(x, chunk_size)
    }
}
