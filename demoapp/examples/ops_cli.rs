use clap::{Parser, Subcommand, ValueEnum};
use demoapp::{
    estimate_volume_parallel, estimate_volume_serial, parse_ops, parse_range, phantom_slice, run,
    run_idle, ExecutionMode, JobConfig, RunReport, Strategy, LOG_TAG,
};

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "demoapp CLI - run the doOps summation and the execution-time demos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sum 0..COUNT with one kernel
    Ops {
        /// Exclusive upper bound, e.g. 1_000_000 or -10
        #[arg(value_parser = parse_ops, allow_hyphen_values = true)]
        count: i64,

        /// Summation kernel
        #[arg(long, default_value = "native")]
        strategy: Strategy,
    },
    /// Sum 0..n for every n in a range (format: start:end)
    Sweep {
        #[arg(allow_hyphen_values = true)]
        range: String,

        /// Summation kernel
        #[arg(long, default_value = "native")]
        strategy: Strategy,
    },
    /// Run many jobs and report how long they took
    Jobs {
        /// Number of jobs
        #[arg(long, default_value_t = 8)]
        jobs: usize,

        /// Operation count per job
        #[arg(long, value_parser = parse_ops, default_value = "1000000")]
        ops: i64,

        /// Scheduling mode
        #[arg(long, value_enum, default_value_t = ModeArg::All)]
        mode: ModeArg,

        /// Sleep instead of summing
        #[arg(long)]
        idle: bool,

        /// Sleep per job in milliseconds, for --idle
        #[arg(long, default_value_t = 100)]
        idle_ms: u64,

        /// Summation kernel
        #[arg(long, default_value = "native")]
        strategy: Strategy,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate a segmented volume over synthetic disc slices
    Volume {
        /// Number of slices
        #[arg(long, default_value_t = 16)]
        slices: usize,

        /// Slice width and height in pixels
        #[arg(long, default_value_t = 256)]
        size: usize,

        /// Disc radius in pixels
        #[arg(long, default_value_t = 60)]
        radius: usize,

        /// Alpha cut in percent
        #[arg(long, default_value_t = 50.0)]
        alpha: f32,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Sequential,
    Concurrent,
    Parallel,
    All,
}

impl ModeArg {
    fn modes(self) -> Vec<ExecutionMode> {
        match self {
            ModeArg::Sequential => vec![ExecutionMode::Sequential],
            ModeArg::Concurrent => vec![ExecutionMode::Concurrent],
            ModeArg::Parallel => vec![ExecutionMode::Parallel],
            ModeArg::All => vec![
                ExecutionMode::Sequential,
                ExecutionMode::Concurrent,
                ExecutionMode::Parallel,
            ],
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let start_time = std::time::Instant::now();

    match cli.command {
        Commands::Ops { count, strategy } => {
            let sum = strategy.apply(count)?;
            println!("{sum}");
        }
        Commands::Sweep { range, strategy } => {
            let range = parse_range(&range)?;
            for ops in range {
                println!("{ops}\t{}", strategy.apply(ops)?);
            }
        }
        Commands::Jobs {
            jobs,
            ops,
            mode,
            idle,
            idle_ms,
            strategy,
            json,
        } => {
            let config = JobConfig::new(jobs, ops)
                .with_idle_ms(idle_ms)
                .with_strategy(strategy);
            let expected = if idle {
                idle_ms as i64
            } else {
                strategy.apply(ops)?
            };

            for mode in mode.modes() {
                let report = if idle {
                    run_idle(&config, mode)?
                } else {
                    run(&config, mode)?
                };
                if !report.all_equal(expected) {
                    eprintln!("Warning: {mode} run returned unexpected results");
                }
                print_report(&report, json)?;
            }
        }
        Commands::Volume {
            slices,
            size,
            radius,
            alpha,
            json,
        } => {
            let slices: Vec<_> = (0..slices)
                .map(|i| phantom_slice(size, radius.saturating_sub(i % 4)))
                .collect();
            for report in [
                estimate_volume_serial(&slices, alpha)?,
                estimate_volume_parallel(&slices, alpha)?,
            ] {
                if json {
                    println!("{}", serde_json::to_string(&report)?);
                } else {
                    println!("{LOG_TAG}: {report}");
                    println!("Volume: {} pixels", report.volume);
                }
            }
        }
    }

    eprintln!("Completed in {:.2?}", start_time.elapsed());

    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!("{LOG_TAG}: {report}");
    }
    Ok(())
}
