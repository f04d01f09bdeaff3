//! Integration tests for the distributed executor on an in-process world.
//!
//! - Single-rank runs match the sequential kernels
//! - Multi-rank AXPY reassembles the same vector as single-process AXPY
//! - Multi-rank sums agree with the flat compensated sum of the reference

use approx::assert_abs_diff_eq;

use daxpar_compute::{run_local, DistributedExecutor, Role};
use daxpar_core::{axpy, neumaier_sum};

/// Run one AXPY followed by one sum on every rank and return the
/// coordinator's vector and total.
fn run_axpy_then_sum(world_size: usize, a: f64, x: &[f64], y0: &[f64]) -> (Vec<f64>, f64) {
    let n = x.len();
    let mut results = run_local(world_size, |comm| {
        let exec = DistributedExecutor::new(comm).unwrap();
        match exec.context().role() {
            Role::Coordinator => {
                let mut y = y0.to_vec();
                exec.axpy(n, a, x, &mut y).unwrap();
                let total = exec.sum(n, &y).unwrap();
                Some((y, total.unwrap()))
            }
            Role::Worker => {
                exec.axpy(n, a, &[], &mut []).unwrap();
                assert_eq!(exec.sum(n, &[]).unwrap(), None);
                None
            }
        }
    })
    .unwrap();
    results.swap_remove(0).unwrap()
}

fn test_vectors(n: usize) -> (Vec<f64>, Vec<f64>) {
    let x = (0..n).map(|i| 0.1 + (i % 7) as f64 * 0.01).collect();
    let y = (0..n).map(|i| 7.1 - (i % 5) as f64 * 0.2).collect();
    (x, y)
}

#[test]
fn test_single_rank_sum_equals_sequential_sum() {
    let (x, y0) = test_vectors(1234);
    let (y, total) = run_axpy_then_sum(1, 3.0, &x, &y0);

    let mut reference = y0.clone();
    axpy(3.0, &x, &mut reference).unwrap();
    assert_eq!(y, reference);
    assert_eq!(total, neumaier_sum(&reference));
}

#[test]
fn test_four_ranks_axpy_matches_single_process() {
    let (x, y0) = test_vectors(1000);
    let (y, _) = run_axpy_then_sum(4, 3.0, &x, &y0);

    let mut reference = y0.clone();
    axpy(3.0, &x, &mut reference).unwrap();
    assert_eq!(y, reference);
}

#[test]
fn test_multi_rank_results_match_single_process() {
    for world_size in [2usize, 3, 4, 7, 9] {
        for n in [1usize, 7, 10, 999, 1001, 10_000] {
            let (x, y0) = test_vectors(n);
            let (y, total) = run_axpy_then_sum(world_size, 3.0, &x, &y0);

            let mut reference = y0.clone();
            axpy(3.0, &x, &mut reference).unwrap();
            assert_eq!(y, reference, "world_size={world_size} n={n}");
            assert_abs_diff_eq!(total, neumaier_sum(&reference), epsilon = 1e-9);
        }
    }
}

#[test]
fn test_closed_form_verification() {
    let n = 100_000;
    let x = vec![0.1; n];
    let y0 = vec![7.1; n];
    let (y, total) = run_axpy_then_sum(4, 3.0, &x, &y0);
    assert!(y.iter().all(|&v| (v - 7.4).abs() < 1e-10));
    assert!((total - n as f64 * 7.4).abs() < n as f64 * 1e-10);
}

#[test]
fn test_degenerate_inputs_exchange_no_messages() {
    let (x, y0) = test_vectors(16);
    let (y, _) = run_axpy_then_sum(3, 0.0, &x, &y0);
    assert_eq!(y, y0);

    let (y, total) = run_axpy_then_sum(3, 3.0, &[], &[]);
    assert!(y.is_empty());
    assert_eq!(total, 0.0);
}
