pub mod check;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use recwatch_common::config::{LatencyPolicy, MonitorConfig, PhaseConfig, WorkerBounds};

#[derive(Parser)]
#[command(name = "recwatch")]
#[command(about = "Adaptive TCP health monitor for recorder fleets.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single health-check cycle and print the results
    #[command(alias = "c")]
    Check {
        #[command(flatten)]
        args: CheckArgs,
    },
    /// Poll the fleet on an interval and render a refreshing dashboard
    #[command(alias = "w")]
    Watch {
        #[command(flatten)]
        args: CheckArgs,

        /// Seconds between cycles
        #[arg(long, default_value_t = 120)]
        interval: u64,

        /// Disable the 'q'-to-quit key listener between refreshes
        #[arg(long)]
        no_input: bool,
    },
}

#[derive(Args)]
pub struct CheckArgs {
    /// Inventory CSV: name,host,port[,site[,region[,active]]]
    pub inventory: PathBuf,

    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(flatten)]
    pub view: ViewArgs,
}

/// Tuning surface of the two-phase engine. Defaults match
/// `MonitorConfig::default()`.
#[derive(Args)]
pub struct TuningArgs {
    /// Sweep-phase connect timeout, milliseconds
    #[arg(long, default_value_t = 2_000)]
    pub sweep_timeout_ms: u64,

    /// Confirm-phase connect timeout, milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub confirm_timeout_ms: u64,

    /// Sweep-phase worker bounds as min:max:start
    #[arg(long, default_value = "16:64:32", value_parser = parse_bounds)]
    pub sweep_workers: WorkerBounds,

    /// Confirm-phase worker bounds as min:max:start
    #[arg(long, default_value = "4:16:8", value_parser = parse_bounds)]
    pub confirm_workers: WorkerBounds,

    /// Error rate above which a phase sheds workers
    #[arg(long, default_value_t = 0.12)]
    pub upper_threshold: f64,

    /// Error rate below which a phase gains workers
    #[arg(long, default_value_t = 0.03)]
    pub lower_threshold: f64,

    /// Workers added or removed per adaptation
    #[arg(long, default_value_t = 10)]
    pub worker_step: usize,

    /// Which attempts count toward avg/p95 latency
    #[arg(long, value_enum, default_value_t = LatencyArg::All)]
    pub latency: LatencyArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LatencyArg {
    /// Every measured attempt, failures included
    All,
    /// Reachable targets only
    Online,
}

#[derive(Args)]
pub struct ViewArgs {
    /// Show only targets whose name or host contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Show only targets with this status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Row ordering
    #[arg(long, value_enum, default_value_t = SortArg::Status)]
    pub sort: SortArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Online,
    Offline,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    /// Offline first, then by name
    Status,
    /// By name
    Name,
    /// Fastest first
    Latency,
    /// Slowest first
    LatencyDesc,
}

impl TuningArgs {
    pub fn to_config(&self, interval: Duration) -> MonitorConfig {
        MonitorConfig {
            sweep: PhaseConfig {
                timeout: Duration::from_millis(self.sweep_timeout_ms),
                workers: self.sweep_workers.clone(),
            },
            confirm: PhaseConfig {
                timeout: Duration::from_millis(self.confirm_timeout_ms),
                workers: self.confirm_workers.clone(),
            },
            adaptive: recwatch_common::config::AdaptiveConfig {
                upper_threshold: self.upper_threshold,
                lower_threshold: self.lower_threshold,
                step: self.worker_step,
            },
            latency_policy: match self.latency {
                LatencyArg::All => LatencyPolicy::AllAttempts,
                LatencyArg::Online => LatencyPolicy::OnlineOnly,
            },
            cycle_interval: interval,
        }
    }
}

fn parse_bounds(s: &str) -> Result<WorkerBounds, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected min:max:start, got '{s}'"));
    }
    let parse = |part: &str| -> Result<usize, String> {
        part.parse::<usize>()
            .map_err(|e| format!("invalid worker count '{part}': {e}"))
    };
    let (min, max, start) = (parse(parts[0])?, parse(parts[1])?, parse(parts[2])?);
    if min == 0 || min > max {
        return Err(format!("bounds must satisfy 0 < min <= max, got '{s}'"));
    }
    Ok(WorkerBounds::new(min, max, start))
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
