//! The AXPY kernel $\mathbf{y} \leftarrow a\mathbf{x} + \mathbf{y}$ and the
//! sequential chunked drivers.
//!
//! The chunked drivers walk a [`Partition`] in the same order the parallel
//! executors use: remainder first, then full chunks by index. AXPY has no
//! reduction, so chunking never changes its output; summation reduces each
//! chunk with [`neumaier_sum`] and then reduces the partials the same way.

use crate::error::KernelError;
use crate::partition::Partition;
use crate::summation::neumaier_sum;

/// Check that `x` and `y` have the same length and return it.
pub fn check_lengths(x: &[f64], y: &[f64]) -> Result<usize, KernelError> {
    if x.len() != y.len() {
        return Err(KernelError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    Ok(x.len())
}

/// In-place AXPY: `y[i] += a * x[i]` for every `i`.
///
/// Empty vectors and `a == 0.0` are no-ops. Repeated calls keep accumulating
/// into `y`.
///
/// # Errors
///
/// [`KernelError::LengthMismatch`] if `x.len() != y.len()`.
pub fn axpy(a: f64, x: &[f64], y: &mut [f64]) -> Result<(), KernelError> {
    let n = check_lengths(x, y)?;
    if n == 0 || a == 0.0 {
        return Ok(());
    }
    axpy_unchecked(a, x, y);
    Ok(())
}

/// AXPY over two slices already known to have equal length.
///
/// This is the per-chunk body every executor dispatches.
#[inline]
pub fn axpy_unchecked(a: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}

/// Sequential chunked AXPY.
///
/// Processes the remainder chunk, then every full chunk in order. The result
/// is bit-identical to [`axpy`] for any valid `chunk_size`.
///
/// # Errors
///
/// [`KernelError::LengthMismatch`] on unequal lengths, or
/// [`KernelError::ChunkTooLarge`] if `chunk_size` exceeds the vector length.
pub fn axpy_chunked(
    a: f64,
    x: &[f64],
    y: &mut [f64],
    chunk_size: usize,
) -> Result<(), KernelError> {
    let n = check_lengths(x, y)?;
    if n == 0 || a == 0.0 {
        return Ok(());
    }
    let partition = Partition::new(n, chunk_size)?;

    let rem = partition.remainder_chunk().range();
    axpy_unchecked(a, &x[rem.clone()], &mut y[rem]);

    for chunk in partition.chunks() {
        let r = chunk.range();
        axpy_unchecked(a, &x[r.clone()], &mut y[r]);
    }
    Ok(())
}

/// Sequential chunked compensated sum.
///
/// Full chunk `k` is reduced into partial slot `k`; the remainder is reduced
/// into the last slot. The partials are then reduced in array order.
///
/// # Errors
///
/// [`KernelError::ChunkTooLarge`] if `chunk_size` exceeds `x.len()`.
pub fn sum_chunked(x: &[f64], chunk_size: usize) -> Result<f64, KernelError> {
    if x.is_empty() {
        return Ok(0.0);
    }
    let partition = Partition::new(x.len(), chunk_size)?;
    let mut partials = vec![0.0; partition.num_partials()];

    if partition.remainder() > 0 {
        partials[partition.num_chunks()] = neumaier_sum(&x[partition.remainder_chunk().range()]);
    }
    for (slot, chunk) in partials.iter_mut().zip(partition.chunks()) {
        *slot = neumaier_sum(&x[chunk.range()]);
    }

    Ok(neumaier_sum(&partials))
}
