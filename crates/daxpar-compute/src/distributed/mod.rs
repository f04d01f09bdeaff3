//! Distributed-memory executor for chunked AXPY and summation.
//!
//! Rank 0 is the coordinator; every other rank is a worker. The strategy is:
//!
//! - **Remainder-first split**: `[0, n)` is cut into `max(world_size - 1, 1)`
//!   equal chunks plus a leading remainder. Worker rank `r` owns chunk
//!   `r - 1`; the coordinator owns the remainder.
//! - **Blocking point-to-point messages**: the coordinator sends each worker
//!   its chunk, then receives results back in rank order. Every send is a
//!   rendezvous, so the merge order is fixed regardless of which worker
//!   finishes first.
//! - **No recovery**: a failed send or receive aborts the operation with a
//!   [`DistributedError`]; callers are expected to tear the whole job down.
//!
//! The process group itself is supplied by the caller through a
//! [`Communicator`]. [`LocalWorld`] provides an in-process group of threads.

mod context;
mod executor;
mod local;
mod transport;

pub use context::{ExecutionContext, Role};
pub use executor::{DistributedError, DistributedExecutor};
pub use local::{run_local, LocalCommunicator, LocalWorld};
pub use transport::{Communicator, TransportError};
