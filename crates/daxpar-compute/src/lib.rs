//! # Daxpar Compute
//!
//! Execution backends for the chunked AXPY and summation kernels of
//! `daxpar-core`. Shared-memory backends implement the
//! [`ComputeBackend`](backend::ComputeBackend) trait; the distributed
//! executor runs a coordinator/worker protocol over a caller-supplied
//! [`Communicator`](distributed::Communicator).
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Model |
//! |---------|-------------|-------|
//! | Serial | always | Calling thread only |
//! | CPU (Rayon) | `cpu` (default) | Fork-join over a thread pool |
//! | Distributed | `distributed` (default) | Blocking message passing between ranks |

pub mod backend;
pub mod serial;

#[cfg(feature = "cpu")]
pub mod cpu;

#[cfg(feature = "distributed")]
pub mod distributed;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};
pub use serial::SerialBackend;

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;

#[cfg(feature = "distributed")]
pub use distributed::{
    run_local, Communicator, DistributedError, DistributedExecutor, ExecutionContext, LocalWorld,
    Role,
};
