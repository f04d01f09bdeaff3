//! TOML configuration deserialisation for benchmark jobs.

use anyhow::{bail, Context};
use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub run: RunConfig,
    #[serde(default)]
    pub distributed: DistributedConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Kernel inputs and sweep parameters.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// The AXPY scalar.
    #[serde(default = "default_a")]
    pub a: f64,
    /// Value every element of `x` is initialised to.
    #[serde(default = "default_x_value")]
    pub x_value: f64,
    /// Value every element of `y` is (re)initialised to before each AXPY.
    #[serde(default = "default_y_value")]
    pub y_value: f64,
    pub array_sizes: Vec<usize>,
    /// Chunk sizes to sweep; values above `n` are skipped for that `n`.
    pub chunk_sizes: Vec<usize>,
    /// Per-element tolerance; sums are checked against `n * tolerance`.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Shared-memory backend: "serial" or "cpu". Default: "cpu".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Rayon thread count; 0 uses the hardware concurrency.
    #[serde(default)]
    pub threads: usize,
}

fn default_a() -> f64 {
    3.0
}
fn default_x_value() -> f64 {
    0.1
}
fn default_y_value() -> f64 {
    7.1
}
fn default_tolerance() -> f64 {
    1e-10
}
fn default_backend() -> String {
    "cpu".into()
}

/// In-process distributed run.
#[derive(Debug, Deserialize)]
pub struct DistributedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of ranks, coordinator included.
    #[serde(default = "default_ranks")]
    pub ranks: usize,
}

impl Default for DistributedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ranks: default_ranks(),
        }
    }
}

fn default_ranks() -> usize {
    4
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save timings as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also save timings as JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

impl JobConfig {
    /// Reject configurations that would make every run meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.run.array_sizes.is_empty() {
            bail!("run.array_sizes must list at least one vector length");
        }
        if self.run.chunk_sizes.is_empty() {
            bail!("run.chunk_sizes must list at least one chunk size");
        }
        if self.run.tolerance.is_nan() || self.run.tolerance <= 0.0 {
            bail!("run.tolerance must be positive, got {}", self.run.tolerance);
        }
        if !matches!(self.run.backend.as_str(), "serial" | "cpu") {
            bail!(
                "Unknown backend '{}'. Valid: serial, cpu",
                self.run.backend
            );
        }
        if self.distributed.enabled && self.distributed.ranks == 0 {
            bail!("distributed.ranks must be at least 1");
        }
        Ok(())
    }
}

/// Parse and validate a TOML job configuration.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load, parse and validate a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid configuration {}", path.display()))
}
