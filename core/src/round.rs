//! # Round Executor
//!
//! Runs the probe concurrently over a batch of targets under a worker
//! budget and folds the outcomes into aggregate statistics.
//!
//! One task per target, gated by a semaphore sized to the worker budget.
//! Outcomes are collected in completion order; consumers must key on the
//! target name and never assume input order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use recwatch_common::config::LatencyPolicy;
use recwatch_common::target::Target;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::probe::{ProbeOutcome, Prober};

/// Advisory progress feed: `(completed, total)` per landed outcome.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Which of the two passes a round belongs to; carried on its stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Sweep,
    Confirm,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Sweep => write!(f, "sweep"),
            Phase::Confirm => write!(f, "confirm"),
        }
    }
}

/// Aggregate view of one round.
#[derive(Clone, Debug)]
pub struct RoundStats {
    pub phase: Phase,
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub errors: usize,
    pub avg_ms: f64,
    pub p95_ms: f64,
    pub timeout: Duration,
    pub workers: usize,
}

impl RoundStats {
    /// Zero-filled stats for a round that probed nothing.
    pub fn empty(phase: Phase, timeout: Duration) -> Self {
        Self {
            phase,
            total: 0,
            online: 0,
            offline: 0,
            errors: 0,
            avg_ms: 0.0,
            p95_ms: 0.0,
            timeout,
            workers: 0,
        }
    }

    /// Fraction of outcomes flagged as systemic error; 0 for empty rounds.
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.errors as f64 / self.total as f64
        }
    }
}

/// Effective worker count for a round: never more workers than targets,
/// never zero.
pub fn workers_for(configured: usize, targets: usize) -> usize {
    configured.min(targets).max(1)
}

/// Probe every target once, bounded by `configured_workers` concurrent
/// attempts, and aggregate the results.
///
/// Unprobeable targets (inactive, empty host, zero port) are reported
/// offline inline without spawning a task. An empty target list returns
/// immediately with zero-filled stats.
pub async fn run_round(
    prober: Arc<dyn Prober>,
    targets: &[Target],
    timeout: Duration,
    configured_workers: usize,
    phase: Phase,
    policy: LatencyPolicy,
    progress: Option<ProgressFn>,
) -> (HashMap<String, ProbeOutcome>, RoundStats) {
    if targets.is_empty() {
        return (HashMap::new(), RoundStats::empty(phase, timeout));
    }

    let total: usize = targets.len();
    let workers: usize = workers_for(configured_workers, total);
    debug!(%phase, total, workers, ?timeout, "starting round");

    let mut outcomes: HashMap<String, ProbeOutcome> = HashMap::with_capacity(total);
    let mut completed: usize = 0;

    let semaphore: Arc<Semaphore> = Arc::new(Semaphore::new(workers));
    let mut tasks: JoinSet<(String, ProbeOutcome)> = JoinSet::new();

    for target in targets {
        if !target.probeable() {
            outcomes.insert(target.name.clone(), ProbeOutcome::skipped());
            completed += 1;
            if let Some(cb) = &progress {
                cb(completed, total);
            }
            continue;
        }

        let prober = Arc::clone(&prober);
        let semaphore = Arc::clone(&semaphore);
        let name: String = target.name.clone();
        let host: String = target.host.clone();
        let port: u16 = target.port;

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                // Semaphore is never closed while tasks run.
                return (name, ProbeOutcome::skipped());
            };
            let outcome = prober.probe(&host, port, timeout).await;
            (name, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, outcome)) => {
                outcomes.insert(name, outcome);
                completed += 1;
                if let Some(cb) = &progress {
                    cb(completed, total);
                }
            }
            Err(err) => {
                error!("probe task failed to join: {err}");
            }
        }
    }

    let stats = aggregate(phase, &outcomes, timeout, workers, policy);
    debug!(
        %phase,
        online = stats.online,
        offline = stats.offline,
        errors = stats.errors,
        "round finished"
    );
    (outcomes, stats)
}

fn aggregate(
    phase: Phase,
    outcomes: &HashMap<String, ProbeOutcome>,
    timeout: Duration,
    workers: usize,
    policy: LatencyPolicy,
) -> RoundStats {
    let total: usize = outcomes.len();
    let online: usize = outcomes.values().filter(|o| o.reachable).count();
    let errors: usize = outcomes.values().filter(|o| o.error).count();

    let mut durations_ms: Vec<f64> = outcomes
        .values()
        .filter(|o| match policy {
            LatencyPolicy::AllAttempts => true,
            LatencyPolicy::OnlineOnly => o.reachable,
        })
        .filter_map(|o| o.elapsed_ms())
        .collect();
    durations_ms.sort_by(|a, b| a.total_cmp(b));

    let (avg_ms, p95_ms) = if durations_ms.is_empty() {
        (0.0, 0.0)
    } else {
        let avg: f64 = durations_ms.iter().sum::<f64>() / durations_ms.len() as f64;
        let rank: usize = ((durations_ms.len() as f64) * 0.95).floor() as usize;
        let p95: f64 = durations_ms[rank.min(durations_ms.len() - 1)];
        (avg, p95)
    };

    RoundStats {
        phase,
        total,
        online,
        offline: total - online,
        errors,
        avg_ms,
        p95_ms,
        timeout,
        workers,
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
