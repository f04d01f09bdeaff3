//! Single-threaded backend over the sequential chunked drivers.

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// Runs every chunk on the calling thread, in partition order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial (1 thread)".into(),
            backend_type: BackendType::Serial,
            compute_units: 1,
        }
    }

    fn axpy_chunked(
        &self,
        a: f64,
        x: &[f64],
        y: &mut [f64],
        chunk_size: usize,
    ) -> Result<(), ComputeError> {
        Ok(daxpar_core::axpy_chunked(a, x, y, chunk_size)?)
    }

    fn sum_chunked(&self, x: &[f64], chunk_size: usize) -> Result<f64, ComputeError> {
        Ok(daxpar_core::sum_chunked(x, chunk_size)?)
    }
}
