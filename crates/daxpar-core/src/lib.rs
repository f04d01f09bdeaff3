//! # Daxpar Core
//!
//! The sequential building blocks of the daxpar framework: a compensated
//! summation, the chunk partitioner shared by every execution path, and the
//! AXPY kernel $\mathbf{y} \leftarrow a\mathbf{x} + \mathbf{y}$.
//!
//! Nothing in this crate spawns threads or performs I/O. The parallel and
//! distributed executors in `daxpar-compute` dispatch these kernels over the
//! chunks produced by [`partition::Partition`].
//!
//! ## Modules
//!
//! - [`summation`] — Kahan-Babushka-Neumaier summation and comparison baselines.
//! - [`partition`] — Remainder-first chunk decomposition of `[0, n)`.
//! - [`axpy`] — The AXPY kernel and sequential chunked drivers.
//! - [`error`] — Precondition violations reported by the kernels.

pub mod axpy;
pub mod error;
pub mod partition;
pub mod summation;

pub use axpy::{axpy, axpy_chunked, sum_chunked};
pub use error::KernelError;
pub use partition::{Chunk, Partition};
pub use summation::{kahan_sum, naive_sum, neumaier_sum, NeumaierSum};
