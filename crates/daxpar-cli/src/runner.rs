//! Benchmark runner: ties together the backends, the distributed executor
//! and closed-form verification.

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use daxpar_compute::{
    run_local, ComputeBackend, CpuBackend, DistributedExecutor, Role, SerialBackend,
};
use daxpar_core::{kahan_sum, naive_sum, neumaier_sum};

use crate::config::{JobConfig, RunConfig};

/// One timed, verified kernel invocation.
#[derive(Debug, Clone, Serialize)]
pub struct TimingRecord {
    pub n: usize,
    /// `None` for unchunked and distributed runs.
    pub chunk_size: Option<usize>,
    pub backend: String,
    pub operation: Operation,
    pub seconds: f64,
    /// The computed total, for sums.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Axpy,
    Sum,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Axpy => f.write_str("axpy"),
            Operation::Sum => f.write_str("sum"),
        }
    }
}

/// Expected values every verification compares against.
#[derive(Debug, Clone, Copy)]
struct Expected {
    element: f64,
    tolerance: f64,
}

impl Expected {
    fn from_run(run: &RunConfig) -> Self {
        Self {
            element: run.y_value + run.a * run.x_value,
            tolerance: run.tolerance,
        }
    }

    fn check_axpy(&self, y: &[f64], label: &str) -> Result<()> {
        if let Some((i, v)) = y
            .iter()
            .enumerate()
            .find(|(_, v)| (**v - self.element).abs() > self.tolerance)
        {
            bail!(
                "{label}: AXPY result at index {i} is {v}, expected {}",
                self.element
            );
        }
        Ok(())
    }

    fn check_sum(&self, sum: f64, n: usize, label: &str) -> Result<()> {
        let expected = n as f64 * self.element;
        if (sum - expected).abs() > n as f64 * self.tolerance {
            bail!("{label}: sum is {sum}, expected {expected}");
        }
        Ok(())
    }
}

fn timed<T>(op: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let out = op();
    (out, start.elapsed().as_secs_f64())
}

/// Run the full sweep described by `job`, verifying every result.
///
/// Any verification failure or kernel error aborts the sweep.
pub fn run_benchmark(job: &JobConfig) -> Result<Vec<TimingRecord>> {
    let run = &job.run;
    let expected = Expected::from_run(run);

    let serial = SerialBackend;
    let cpu = match run.backend.as_str() {
        "cpu" => Some(
            CpuBackend::with_threads(run.threads).context("Failed to build the Rayon pool")?,
        ),
        _ => None,
    };
    let parallel: &dyn ComputeBackend = match &cpu {
        Some(cpu) => cpu,
        None => &serial,
    };
    println!("Backend: {}", parallel.device_info().name);

    let mut records = Vec::new();

    for &n in &run.array_sizes {
        println!("----------------------------------------");
        println!("Testing with n = {n}");

        let x = vec![run.x_value; n];
        let mut y = vec![run.y_value; n];

        for &chunk_size in &run.chunk_sizes {
            if chunk_size > n {
                log::info!("Skipping chunk size {chunk_size} for n = {n}");
                continue;
            }
            println!("chunk size {chunk_size}");
            for backend in [&serial as &dyn ComputeBackend, parallel] {
                let info = backend.device_info();
                let label = format!("{} n={n} chunk={chunk_size}", info.backend_type);

                y.fill(run.y_value);
                let (res, secs) = timed(|| backend.axpy_chunked(run.a, &x, &mut y, chunk_size));
                res?;
                expected.check_axpy(&y, &label)?;
                println!("\t {} axpy time: {secs:.6e} seconds", info.backend_type);
                records.push(TimingRecord {
                    n,
                    chunk_size: Some(chunk_size),
                    backend: info.backend_type.to_string(),
                    operation: Operation::Axpy,
                    seconds: secs,
                    value: None,
                });

                let (sum, secs) = timed(|| backend.sum_chunked(&y, chunk_size));
                let sum = sum?;
                expected.check_sum(sum, n, &label)?;
                println!("\t {} sum time: {secs:.6e} seconds", info.backend_type);
                records.push(TimingRecord {
                    n,
                    chunk_size: Some(chunk_size),
                    backend: info.backend_type.to_string(),
                    operation: Operation::Sum,
                    seconds: secs,
                    value: Some(sum),
                });
            }
        }

        if let Some(cpu) = &cpu {
            records.extend(run_unchunked(cpu, run, &expected, &x, &mut y)?);
        }

        if job.distributed.enabled {
            records.extend(run_distributed(job.distributed.ranks, run, &expected, n)?);
        }
    }
    println!("----------------------------------------");

    Ok(records)
}

/// Element-parallel AXPY and accumulator-merging sum, no explicit chunks.
fn run_unchunked(
    cpu: &CpuBackend,
    run: &RunConfig,
    expected: &Expected,
    x: &[f64],
    y: &mut [f64],
) -> Result<Vec<TimingRecord>> {
    let n = x.len();
    let label = format!("cpu n={n} unchunked");

    y.fill(run.y_value);
    let (res, axpy_secs) = timed(|| cpu.daxpy_parallel(run.a, x, y));
    res?;
    expected.check_axpy(y, &label)?;
    println!("parallel daxpy time: {axpy_secs:.6e} seconds");

    let (sum, sum_secs) = timed(|| cpu.sum_parallel(y));
    expected.check_sum(sum, n, &label)?;
    println!("parallel sum time: {sum_secs:.6e} seconds");

    Ok(vec![
        TimingRecord {
            n,
            chunk_size: None,
            backend: "cpu-unchunked".into(),
            operation: Operation::Axpy,
            seconds: axpy_secs,
            value: None,
        },
        TimingRecord {
            n,
            chunk_size: None,
            backend: "cpu-unchunked".into(),
            operation: Operation::Sum,
            seconds: sum_secs,
            value: Some(sum),
        },
    ])
}

/// Coordinator-side timings of one distributed run.
struct DistributedTimings {
    axpy_secs: f64,
    sum_secs: f64,
    sum: f64,
    backend: String,
}

/// AXPY then sum over an in-process world of `ranks` ranks.
///
/// Only the coordinator allocates the full vectors. An error on any rank
/// fails the whole run.
fn run_distributed(
    ranks: usize,
    run: &RunConfig,
    expected: &Expected,
    n: usize,
) -> Result<Vec<TimingRecord>> {
    let label = format!("distributed n={n} ranks={ranks}");

    let outcomes = run_local(ranks, |comm| -> Result<Option<DistributedTimings>> {
        let exec = DistributedExecutor::new(comm)?;
        match exec.context().role() {
            Role::Coordinator => {
                let x = vec![run.x_value; n];
                let mut y = vec![run.y_value; n];

                let (res, axpy_secs) = timed(|| exec.axpy(n, run.a, &x, &mut y));
                res?;
                expected.check_axpy(&y, &label)?;

                let (sum, sum_secs) = timed(|| exec.sum(n, &y));
                let sum = sum?.context("Coordinator returned no total")?;
                expected.check_sum(sum, n, &label)?;

                let info = exec.device_info();
                Ok(Some(DistributedTimings {
                    axpy_secs,
                    sum_secs,
                    sum,
                    backend: format!("{}-{}", info.backend_type, info.compute_units),
                }))
            }
            Role::Worker => {
                exec.axpy(n, run.a, &[], &mut [])?;
                exec.sum(n, &[])?;
                Ok(None)
            }
        }
    })?;

    let mut coordinator = None;
    let mut first_error = None;
    for (rank, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(Some(timings)) => coordinator = Some(timings),
            Ok(None) => {}
            Err(e) => {
                log::error!("rank {rank}: {e:#}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e.context(format!("Distributed run aborted ({label})")));
    }
    let timings = coordinator.context("Coordinator produced no result")?;

    println!("distributed ({ranks} ranks) daxpy time: {:.6e} seconds", timings.axpy_secs);
    println!("distributed ({ranks} ranks) sum time: {:.6e} seconds", timings.sum_secs);

    Ok(vec![
        TimingRecord {
            n,
            chunk_size: None,
            backend: timings.backend.clone(),
            operation: Operation::Axpy,
            seconds: timings.axpy_secs,
            value: None,
        },
        TimingRecord {
            n,
            chunk_size: None,
            backend: timings.backend,
            operation: Operation::Sum,
            seconds: timings.sum_secs,
            value: Some(timings.sum),
        },
    ])
}

/// Print naive, Kahan and Kahan-Babushka-Neumaier sums of an
/// ill-conditioned sequence.
pub fn print_sum_comparison() {
    let values = [1.0, 1.0e16, -1.0e16, -0.5];
    println!("Summing {values:?} (exact result: 0.5)");
    println!("  Naive sum:                   {}", naive_sum(&values));
    println!("  Kahan sum:                   {}", kahan_sum(&values));
    println!("  Kahan-Babushka-Neumaier sum: {}", neumaier_sum(&values));
}

/// Write timing records to a CSV file.
pub fn write_timings_csv(records: &[TimingRecord], path: &Path) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "n,chunk_size,backend,operation,seconds,value")?;
    for r in records {
        writeln!(
            file,
            "{},{},{},{},{:.6e},{}",
            r.n,
            r.chunk_size.map(|c| c.to_string()).unwrap_or_default(),
            r.backend,
            r.operation,
            r.seconds,
            r.value.map(|v| format!("{v:.17e}")).unwrap_or_default(),
        )?;
    }

    println!("Timings written to: {}", path.display());
    Ok(())
}

/// Write timing records to a JSON file.
pub fn write_timings_json(records: &[TimingRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(records)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Timings (JSON) written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn small_job(extra: &str) -> JobConfig {
        parse_config(&format!(
            r#"
            [run]
            array_sizes = [10, 1000]
            chunk_sizes = [1, 4, 8, 10, 5000]
            {extra}

            [distributed]
            ranks = 3
            "#
        ))
        .unwrap()
    }

    #[test]
    fn test_sweep_produces_verified_records() {
        let records = run_benchmark(&small_job("")).unwrap();
        // Chunk 5000 is skipped for both sizes: 2 sizes x 4 chunks x 2 backends x 2 ops,
        // plus unchunked and distributed axpy/sum per size.
        assert_eq!(records.len(), 2 * 4 * 2 * 2 + 2 * 2 + 2 * 2);
        for r in records.iter().filter(|r| r.operation == Operation::Sum) {
            let sum = r.value.unwrap();
            assert!((sum - r.n as f64 * 7.4).abs() < r.n as f64 * 1e-10);
        }
    }

    #[test]
    fn test_serial_backend_skips_unchunked_pass() {
        let records = run_benchmark(&small_job(r#"backend = "serial""#)).unwrap();
        assert!(records.iter().all(|r| r.backend != "cpu-unchunked"));
        assert!(records.iter().any(|r| r.backend == "distributed-3"));
    }

    #[test]
    fn test_failed_verification_aborts() {
        let expected = Expected {
            element: 7.4,
            tolerance: 1e-10,
        };
        assert!(expected.check_axpy(&[7.4, 7.5], "test").is_err());
        assert!(expected.check_sum(7.4 * 3.0 + 1.0, 3, "test").is_err());
        assert!(expected.check_sum(7.4 * 3.0, 3, "test").is_ok());
    }

    #[test]
    fn test_reports_are_written() {
        let records = vec![TimingRecord {
            n: 10,
            chunk_size: Some(4),
            backend: "serial".into(),
            operation: Operation::Sum,
            seconds: 1e-6,
            value: Some(74.0),
        }];
        let dir = std::env::temp_dir().join(format!("daxpar-report-{}", std::process::id()));
        write_timings_csv(&records, &dir.join("timings.csv")).unwrap();
        write_timings_json(&records, &dir.join("timings.json")).unwrap();

        let csv = std::fs::read_to_string(dir.join("timings.csv")).unwrap();
        assert!(csv.starts_with("n,chunk_size,backend,operation,seconds,value"));
        assert!(csv.contains("10,4,serial,sum,"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("timings.json")).unwrap())
                .unwrap();
        assert_eq!(json[0]["operation"], "sum");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
