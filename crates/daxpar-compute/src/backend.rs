//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over shared-memory execution
//! environments (a single thread, or a Rayon thread pool) so that drivers
//! such as the CLI runner can sweep chunk sizes without knowing how the work
//! is scheduled.

use daxpar_core::KernelError;
use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: usize,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Serial,
    Cpu,
    Distributed,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendType::Serial => "serial",
            BackendType::Cpu => "cpu",
            BackendType::Distributed => "distributed",
        };
        f.write_str(name)
    }
}

/// Abstraction over shared-memory backends.
///
/// Both operations use the remainder-first decomposition of
/// [`daxpar_core::Partition`], so a given `chunk_size` yields the same chunks
/// on every backend.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Chunked in-place AXPY, `y += a * x`.
    ///
    /// Empty vectors and `a == 0.0` are no-ops. Chunks are disjoint, so the
    /// result does not depend on how they are scheduled.
    fn axpy_chunked(
        &self,
        a: f64,
        x: &[f64],
        y: &mut [f64],
        chunk_size: usize,
    ) -> Result<(), ComputeError>;

    /// Chunked compensated sum of `x`.
    ///
    /// Each chunk is reduced independently; the partial results are then
    /// reduced in array order, whatever order the chunks finished in.
    fn sum_chunked(&self, x: &[f64], chunk_size: usize) -> Result<f64, ComputeError>;
}
