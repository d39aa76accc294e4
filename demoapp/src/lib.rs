//! demoapp - native library behind the host app's `doOps` call
//!
//! The host invokes one pure function across JNI: given `ops`, it returns
//! `0 + 1 + ... + (ops - 1)`, accumulated in the platform's C `long` and
//! wrapping on overflow. Non-positive counts return 0.
//!
//! ## Architecture
//!
//! - **demoapp-core**: summation kernels, accumulator widths, parsing and
//!   fuzzy connectedness (no I/O)
//! - **demoapp**: the JNI and C ABI exports, plus the job runners used by the
//!   host's execution-time demos and its serial and parallel volume estimates
//!
//! ## Quick Start
//!
//! ```rust
//! use demoapp::{run, ExecutionMode, JobConfig};
//!
//! fn example() -> Result<(), demoapp::JobError> {
//!     assert_eq!(demoapp::native_sum_below(100), 4950);
//!
//!     let report = run(&JobConfig::new(4, 10_000), ExecutionMode::Parallel)?;
//!     println!("{report}");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! ## Features
//!
//! - **jni**: `Java_com_example_demoapp_HomeScreen_doOps` export
//! - **async**: tokio-backed concurrent and idle job runners
//! - **serde**: serializable configs and reports
//! - **cli**: dependencies of the `ops_cli` example

// Re-export core kernels and error handling
pub use demoapp_core::{
    // Kernels
    checked_sum_below, exact_sum_below, narrow_sum_below, native_sum_below, sum_below,
    sum_below_closed, sum_below_with, Strategy,
    // Accumulators
    Accumulator, AccumulatorWidth,
    // Error handling
    DemoError, ErrorCategory, Result,
    // Parsing
    parse_ops, parse_range,
    // Segmentation
    alpha_cut_volume, AffinityStats, ConnectednessMap, FuzzyConnectedness, GrayImage, Roi,
};

pub mod ffi;
pub mod jobs;
#[cfg(feature = "jni")]
pub mod jni_bridge;

pub use jobs::{ExecutionMode, JobConfig, JobError, JobKind, RunReport, LOG_TAG};
pub use jobs::{run, run_parallel, run_sequential};
pub use jobs::{estimate_volume_parallel, estimate_volume_serial, phantom_slice, Slice, VolumeReport};

#[cfg(feature = "async")]
pub use jobs::{run_concurrent, run_idle};
