//! Job runners for the execution-time demos
//!
//! The host measures how long it takes to run the same summation as many
//! independent jobs, either one after another, interleaved on a single
//! thread, or spread across a worker pool. An idle variant replaces the
//! summation with a sleep so scheduling overhead can be seen on its own.
//!
//! Volume estimation runs fuzzy connectedness on every slice of an image
//! sequence, serially or on the rayon pool, and sums the alpha-cut counts.

use demoapp_core::{alpha_cut_volume, DemoError, GrayImage, Roi, Strategy};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Tag the host logs execution times under
pub const LOG_TAG: &str = "ExecutionTime";

/// Configuration for a job run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobConfig {
    /// Number of independent jobs
    pub job_count: usize,
    /// Operation count handed to every job
    pub ops: i64,
    /// Sleep per job for idle runs, in milliseconds
    pub idle_ms: u64,
    /// Summation kernel each job runs
    pub strategy: Strategy,
}

impl JobConfig {
    /// Create config for `job_count` jobs of `ops` operations each
    pub fn new(job_count: usize, ops: i64) -> Self {
        Self {
            job_count,
            ops,
            ..Self::default()
        }
    }

    /// Set operation count per job
    pub fn with_ops(mut self, ops: i64) -> Self {
        self.ops = ops;
        self
    }

    /// Set idle time per job
    pub fn with_idle_ms(mut self, idle_ms: u64) -> Self {
        self.idle_ms = idle_ms;
        self
    }

    /// Set the summation kernel
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reject configs that cannot run
    pub fn validate(&self) -> Result<(), JobError> {
        if self.job_count == 0 {
            return Err(JobError::Core(DemoError::InvalidJobCount));
        }
        Ok(())
    }

    #[cfg(feature = "async")]
    fn idle_duration(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            job_count: 8,
            ops: 1_000_000,
            idle_ms: 100,
            strategy: Strategy::Native,
        }
    }
}

/// How jobs are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionMode {
    /// One after another on the calling thread
    Sequential,
    /// Interleaved tasks on a single-threaded runtime
    Concurrent,
    /// Spread across a worker pool
    Parallel,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "Sequential"),
            ExecutionMode::Concurrent => write!(f, "Concurrency"),
            ExecutionMode::Parallel => write!(f, "Parallel"),
        }
    }
}

/// What each job does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobKind {
    /// Runs the summation
    Compute,
    /// Sleeps for the configured idle time
    Idle,
}

/// Outcome of one run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunReport {
    pub mode: ExecutionMode,
    pub kind: JobKind,
    pub job_count: usize,
    pub ops: i64,
    pub idle_ms: u64,
    pub elapsed: Duration,
    /// Per-job return values, in job order
    pub results: Vec<i64>,
}

impl RunReport {
    /// True when every job returned `expected`
    pub fn all_equal(&self, expected: i64) -> bool {
        self.results.iter().all(|&r| r == expected)
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ms = self.elapsed.as_millis();
        match self.kind {
            JobKind::Compute => write!(
                f,
                "Execution time ({}), {} jobs, {} ops: {ms} ms",
                self.mode, self.job_count, self.ops
            ),
            JobKind::Idle => write!(
                f,
                "Execution time ({}), {} jobs, {} idle time: {ms} ms",
                self.mode, self.job_count, self.idle_ms
            ),
        }
    }
}

/// Errors from a job run
#[derive(Debug)]
pub enum JobError {
    /// A summation kernel or the config rejected its input
    Core(DemoError),
    /// The async runtime could not be started
    Runtime(std::io::Error),
    /// A spawned task panicked or was cancelled
    #[cfg(feature = "async")]
    Join(tokio::task::JoinError),
    /// The mode needs a cargo feature that is disabled
    Unsupported(ExecutionMode),
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::Core(e) => write!(f, "{e}"),
            JobError::Runtime(e) => write!(f, "Failed to start runtime: {e}"),
            #[cfg(feature = "async")]
            JobError::Join(e) => write!(f, "Job failed: {e}"),
            JobError::Unsupported(mode) => {
                write!(f, "{mode} mode requires the 'async' feature")
            }
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobError::Core(e) => Some(e),
            JobError::Runtime(e) => Some(e),
            #[cfg(feature = "async")]
            JobError::Join(e) => Some(e),
            JobError::Unsupported(_) => None,
        }
    }
}

impl From<DemoError> for JobError {
    fn from(e: DemoError) -> Self {
        JobError::Core(e)
    }
}

impl From<std::io::Error> for JobError {
    fn from(e: std::io::Error) -> Self {
        JobError::Runtime(e)
    }
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for JobError {
    fn from(e: tokio::task::JoinError) -> Self {
        JobError::Join(e)
    }
}

fn report(
    config: &JobConfig,
    mode: ExecutionMode,
    kind: JobKind,
    elapsed: Duration,
    results: Vec<i64>,
) -> RunReport {
    RunReport {
        mode,
        kind,
        job_count: config.job_count,
        ops: config.ops,
        idle_ms: config.idle_ms,
        elapsed,
        results,
    }
}

/// Run summation jobs in the given mode
pub fn run(config: &JobConfig, mode: ExecutionMode) -> Result<RunReport, JobError> {
    match mode {
        ExecutionMode::Sequential => run_sequential(config),
        ExecutionMode::Parallel => run_parallel(config),
        #[cfg(feature = "async")]
        ExecutionMode::Concurrent => run_concurrent(config),
        #[cfg(not(feature = "async"))]
        ExecutionMode::Concurrent => Err(JobError::Unsupported(mode)),
    }
}

/// Run every job on the calling thread, one after another
pub fn run_sequential(config: &JobConfig) -> Result<RunReport, JobError> {
    config.validate()?;
    let start = Instant::now();
    let results = (0..config.job_count)
        .map(|_| config.strategy.apply(config.ops))
        .collect::<Result<Vec<_>, _>>()?;
    let elapsed = start.elapsed();
    Ok(report(config, ExecutionMode::Sequential, JobKind::Compute, elapsed, results))
}

/// Run jobs across the rayon thread pool
pub fn run_parallel(config: &JobConfig) -> Result<RunReport, JobError> {
    config.validate()?;
    let strategy = config.strategy;
    let ops = config.ops;
    let start = Instant::now();
    let results = (0..config.job_count)
        .into_par_iter()
        .map(|_| strategy.apply(ops))
        .collect::<Result<Vec<_>, _>>()?;
    let elapsed = start.elapsed();
    Ok(report(config, ExecutionMode::Parallel, JobKind::Compute, elapsed, results))
}

/// Run jobs as tasks on a single-threaded tokio runtime
///
/// Tasks never yield inside the summation, so they complete one by one;
/// the run shows the cost of task scheduling rather than any speedup.
#[cfg(feature = "async")]
pub fn run_concurrent(config: &JobConfig) -> Result<RunReport, JobError> {
    config.validate()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let strategy = config.strategy;
    let ops = config.ops;

    let start = Instant::now();
    let results = runtime.block_on(async {
        let handles: Vec<_> = (0..config.job_count)
            .map(|_| tokio::spawn(async move { strategy.apply(ops) }))
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await??);
        }
        Ok::<_, JobError>(results)
    })?;
    let elapsed = start.elapsed();
    Ok(report(config, ExecutionMode::Concurrent, JobKind::Compute, elapsed, results))
}

/// Run jobs that only sleep for `idle_ms`
///
/// Each job returns the number of milliseconds it slept.
#[cfg(feature = "async")]
pub fn run_idle(config: &JobConfig, mode: ExecutionMode) -> Result<RunReport, JobError> {
    config.validate()?;
    let idle = config.idle_duration();
    let value = config.idle_ms as i64;

    let runtime = match mode {
        ExecutionMode::Sequential => {
            let start = Instant::now();
            let results = (0..config.job_count)
                .map(|_| {
                    std::thread::sleep(idle);
                    value
                })
                .collect();
            let elapsed = start.elapsed();
            return Ok(report(config, mode, JobKind::Idle, elapsed, results));
        }
        ExecutionMode::Concurrent => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?,
        ExecutionMode::Parallel => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?,
    };

    let start = Instant::now();
    let results = runtime.block_on(async {
        let handles: Vec<_> = (0..config.job_count)
            .map(|_| {
                tokio::spawn(async move {
                    tokio::time::sleep(idle).await;
                    value
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await?);
        }
        Ok::<_, JobError>(results)
    })?;
    let elapsed = start.elapsed();
    Ok(report(config, mode, JobKind::Idle, elapsed, results))
}

/// One image slice with the ROI and seed to segment it from
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slice {
    pub pixels: Vec<u32>,
    pub width: usize,
    pub height: usize,
    pub roi: Roi,
    /// Seed as `(x, y)`
    pub seed: (usize, usize),
}

impl Slice {
    /// Borrow the pixels as an image, checking dimensions
    pub fn image(&self) -> Result<GrayImage<'_>, DemoError> {
        GrayImage::new(&self.pixels, self.width, self.height)
    }

    /// Segmented pixel count at `alpha_percent`
    pub fn volume(&self, alpha_percent: f32) -> Result<usize, DemoError> {
        alpha_cut_volume(self.image()?, self.roi, self.seed, alpha_percent)
    }
}

/// Square slice of `size` pixels a side holding a bright disc
///
/// The disc of `radius` is centred, at intensity 200 on a background of 50.
/// The ROI is the disc's bounding box and the seed its centre.
pub fn phantom_slice(size: usize, radius: usize) -> Slice {
    let c = size / 2;
    let r2 = radius * radius;
    let pixels = (0..size * size)
        .map(|i| {
            let dx = (i % size).abs_diff(c);
            let dy = (i / size).abs_diff(c);
            if dx * dx + dy * dy <= r2 {
                200
            } else {
                50
            }
        })
        .collect();
    let last = size.saturating_sub(1);
    Slice {
        pixels,
        width: size,
        height: size,
        roi: Roi::new(
            c.saturating_sub(radius),
            (c + radius).min(last),
            c.saturating_sub(radius),
            (c + radius).min(last),
        ),
        seed: (c, c),
    }
}

/// Outcome of a volume estimate
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VolumeReport {
    pub mode: ExecutionMode,
    pub alpha_percent: f32,
    /// Sum of the per-slice counts
    pub volume: usize,
    /// Segmented pixel count per slice, in slice order
    pub per_slice: Vec<usize>,
    pub elapsed: Duration,
}

impl std::fmt::Display for VolumeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.mode {
            ExecutionMode::Parallel => "FuzzySystem",
            _ => "SerialFuzzySystem",
        };
        write!(
            f,
            "Execution time ({label}), {} images: {} ms",
            self.per_slice.len(),
            self.elapsed.as_millis()
        )
    }
}

fn volume_report(
    mode: ExecutionMode,
    alpha_percent: f32,
    elapsed: Duration,
    per_slice: Vec<usize>,
) -> VolumeReport {
    VolumeReport {
        mode,
        alpha_percent,
        volume: per_slice.iter().sum(),
        per_slice,
        elapsed,
    }
}

/// Segment every slice on the calling thread
pub fn estimate_volume_serial(
    slices: &[Slice],
    alpha_percent: f32,
) -> Result<VolumeReport, JobError> {
    let start = Instant::now();
    let per_slice = slices
        .iter()
        .map(|slice| slice.volume(alpha_percent))
        .collect::<Result<Vec<_>, _>>()?;
    let elapsed = start.elapsed();
    Ok(volume_report(ExecutionMode::Sequential, alpha_percent, elapsed, per_slice))
}

/// Segment slices across the rayon thread pool
pub fn estimate_volume_parallel(
    slices: &[Slice],
    alpha_percent: f32,
) -> Result<VolumeReport, JobError> {
    let start = Instant::now();
    let per_slice = slices
        .par_iter()
        .map(|slice| slice.volume(alpha_percent))
        .collect::<Result<Vec<_>, _>>()?;
    let elapsed = start.elapsed();
    Ok(volume_report(ExecutionMode::Parallel, alpha_percent, elapsed, per_slice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = JobConfig::new(4, 1)
            .with_ops(10)
            .with_idle_ms(5)
            .with_strategy(Strategy::Loop);
        assert_eq!(config.job_count, 4);
        assert_eq!(config.ops, 10);
        assert_eq!(config.idle_ms, 5);
        assert_eq!(config.strategy, Strategy::Loop);

        let default = JobConfig::default();
        assert_eq!(default.job_count, 8);
        assert_eq!(default.strategy, Strategy::Native);
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let config = JobConfig::new(0, 100);
        assert!(matches!(
            run_sequential(&config),
            Err(JobError::Core(DemoError::InvalidJobCount))
        ));
        assert!(matches!(
            run_parallel(&config),
            Err(JobError::Core(DemoError::InvalidJobCount))
        ));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let config = JobConfig::new(6, 100);
        let sequential = run_sequential(&config).unwrap();
        let parallel = run_parallel(&config).unwrap();

        assert_eq!(sequential.results.len(), 6);
        assert!(sequential.all_equal(4950));
        assert_eq!(sequential.results, parallel.results);
        assert_eq!(parallel.mode, ExecutionMode::Parallel);
    }

    #[test]
    fn test_strategy_error_propagates() {
        let config = JobConfig::new(3, i64::MAX).with_strategy(Strategy::Checked);
        assert!(matches!(
            run_parallel(&config),
            Err(JobError::Core(DemoError::Overflow))
        ));
    }

    #[test]
    fn test_report_log_line() {
        let report = RunReport {
            mode: ExecutionMode::Concurrent,
            kind: JobKind::Compute,
            job_count: 10,
            ops: 5000,
            idle_ms: 0,
            elapsed: Duration::from_millis(42),
            results: vec![],
        };
        assert_eq!(
            report.to_string(),
            "Execution time (Concurrency), 10 jobs, 5000 ops: 42 ms"
        );

        let idle = RunReport {
            mode: ExecutionMode::Parallel,
            kind: JobKind::Idle,
            idle_ms: 100,
            ..report
        };
        assert_eq!(
            idle.to_string(),
            "Execution time (Parallel), 10 jobs, 100 idle time: 42 ms"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_report_serializes() {
        let report = run_sequential(&JobConfig::new(2, 5)).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "Sequential");
        assert_eq!(json["kind"], "Compute");
        assert_eq!(json["results"], serde_json::json!([10, 10]));
    }

    fn disc_area(radius: usize) -> usize {
        let r = radius as i64;
        (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .count()
    }

    #[test]
    fn test_phantom_volume() {
        let slice = phantom_slice(21, 5);
        assert_eq!(slice.seed, (10, 10));
        assert_eq!(slice.roi, Roi::new(5, 15, 5, 15));
        assert_eq!(slice.volume(50.0), Ok(disc_area(5)));
        // Every pixel has strength 0 or more
        assert_eq!(slice.volume(0.0), Ok(21 * 21));
    }

    #[test]
    fn test_serial_and_parallel_volume_agree() {
        let slices = vec![phantom_slice(16, 3), phantom_slice(24, 6), phantom_slice(9, 2)];
        let serial = estimate_volume_serial(&slices, 50.0).unwrap();
        let parallel = estimate_volume_parallel(&slices, 50.0).unwrap();

        let expected = vec![disc_area(3), disc_area(6), disc_area(2)];
        assert_eq!(serial.per_slice, expected);
        assert_eq!(parallel.per_slice, expected);
        assert_eq!(serial.volume, expected.iter().sum::<usize>());
        assert_eq!(parallel.volume, serial.volume);
        assert_eq!(parallel.mode, ExecutionMode::Parallel);
    }

    #[test]
    fn test_volume_rejects_bad_slice() {
        let mut slice = phantom_slice(10, 2);
        slice.pixels.pop();
        assert!(matches!(
            estimate_volume_parallel(&[slice], 50.0),
            Err(JobError::Core(DemoError::InvalidImage))
        ));

        let mut slice = phantom_slice(10, 2);
        slice.seed = (10, 0);
        assert!(matches!(
            estimate_volume_serial(&[slice], 50.0),
            Err(JobError::Core(DemoError::SeedOutOfBounds))
        ));
    }

    #[test]
    fn test_volume_report_log_line() {
        let report = volume_report(ExecutionMode::Parallel, 50.0, Duration::from_millis(7), vec![3, 4]);
        assert_eq!(report.volume, 7);
        assert_eq!(report.to_string(), "Execution time (FuzzySystem), 2 images: 7 ms");

        let serial = estimate_volume_serial(&[], 50.0).unwrap();
        assert_eq!(serial.volume, 0);
        assert!(serial.to_string().starts_with("Execution time (SerialFuzzySystem), 0 images"));
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_concurrent_run() {
        let config = JobConfig::new(5, 5);
        let report = run(&config, ExecutionMode::Concurrent).unwrap();
        assert_eq!(report.mode, ExecutionMode::Concurrent);
        assert_eq!(report.results, vec![10; 5]);
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_idle_runs_overlap() {
        let config = JobConfig::new(4, 0).with_idle_ms(50);

        let concurrent = run_idle(&config, ExecutionMode::Concurrent).unwrap();
        assert_eq!(concurrent.kind, JobKind::Idle);
        assert!(concurrent.all_equal(50));

        let sequential = run_idle(&config, ExecutionMode::Sequential).unwrap();
        assert!(sequential.elapsed >= Duration::from_millis(200));
        // Sleeping tasks overlap, serial sleeps add up
        assert!(concurrent.elapsed < sequential.elapsed / 2);
    }
}
