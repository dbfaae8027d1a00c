//! # Two-Phase Orchestrator
//!
//! One health-check cycle is two sequential rounds plus a merge:
//!
//! 1. **Sweep**: the whole active fleet, short timeout, wide worker budget.
//!    Optimized to find failures fast; a congested link or an aggressive
//!    timeout produces false offlines here.
//! 2. **Confirm**: only the sweep's offline (and still probeable) targets,
//!    long timeout, narrow budget. Authoritative wherever it ran.
//!
//! After each phase its error rate feeds the concurrency controller, so the
//! next cycle's worker counts track observed network health. At most one
//! cycle runs at a time; a second caller is rejected without disturbing the
//! one in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use recwatch_common::config::MonitorConfig;
use recwatch_common::target::Target;
use tokio::sync::Mutex;
use tracing::info;

use crate::adapt::{ConcurrencyState, next_workers};
use crate::probe::{ProbeOutcome, Prober, TcpProber};
use crate::round::{Phase, ProgressFn, RoundStats, run_round};

/// Final status of a target after the merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Online,
    Offline,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Online => write!(f, "ONLINE"),
            Status::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// One row of the merged per-target table.
#[derive(Clone, Debug)]
pub struct TargetReport {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub site: Option<String>,
    pub region: Option<String>,
    pub status: Status,
    /// Present only for online targets.
    pub latency_ms: Option<f64>,
    pub checked_at: DateTime<Utc>,
}

/// Merged output of one full cycle. Replaced wholesale each cycle.
#[derive(Clone, Debug)]
pub struct CycleResult {
    /// Inventory order; key on `name` for lookups.
    pub reports: Vec<TargetReport>,
    pub sweep_stats: RoundStats,
    pub confirm_stats: RoundStats,
    pub next_sweep_workers: usize,
    pub next_confirm_workers: usize,
    pub completed_at: DateTime<Utc>,
}

impl CycleResult {
    pub fn online(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status == Status::Online)
            .count()
    }

    pub fn offline(&self) -> usize {
        self.reports.len() - self.online()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("a health-check cycle is already in flight")]
    CycleInFlight,
}

/// The engine. Owns the cross-cycle `ConcurrencyState` behind the same
/// mutex that rejects overlapping cycles, so the state has exactly one
/// writer at a time.
pub struct Monitor {
    config: MonitorConfig,
    prober: Arc<dyn Prober>,
    state: Mutex<ConcurrencyState>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_prober(config, Arc::new(TcpProber))
    }

    /// Swap in a different prober (tests use scripted ones).
    pub fn with_prober(config: MonitorConfig, prober: Arc<dyn Prober>) -> Self {
        let state = Mutex::new(ConcurrencyState::new(&config));
        Self {
            config,
            prober,
            state,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one full sweep + confirm cycle over `targets`.
    ///
    /// Per-target failures are data, never errors; the only error is an
    /// overlapping invocation. An empty target list yields an empty result
    /// immediately.
    pub async fn run_cycle(
        &self,
        targets: &[Target],
        progress: Option<ProgressFn>,
    ) -> Result<CycleResult, MonitorError> {
        let mut state = self.state.try_lock().map_err(|_| MonitorError::CycleInFlight)?;

        if targets.is_empty() {
            return Ok(CycleResult {
                reports: Vec::new(),
                sweep_stats: RoundStats::empty(Phase::Sweep, self.config.sweep.timeout),
                confirm_stats: RoundStats::empty(Phase::Confirm, self.config.confirm.timeout),
                next_sweep_workers: state.sweep_workers,
                next_confirm_workers: state.confirm_workers,
                completed_at: Utc::now(),
            });
        }

        // Phase 1: fast sweep over the whole fleet.
        let (sweep_outcomes, sweep_stats) = run_round(
            Arc::clone(&self.prober),
            targets,
            self.config.sweep.timeout,
            state.sweep_workers,
            Phase::Sweep,
            self.config.latency_policy,
            progress.clone(),
        )
        .await;

        state.sweep_workers = next_workers(
            state.sweep_workers,
            sweep_stats.error_rate(),
            &self.config.sweep.workers,
            &self.config.adaptive,
        );

        // Phase 2: re-test the sweep's failures with the tolerant timeout.
        // Unprobeable targets can never change status, so they are not
        // re-listed; they keep their sweep row in the merge.
        let suspects: Vec<Target> = targets
            .iter()
            .filter(|t| {
                t.probeable()
                    && sweep_outcomes
                        .get(&t.name)
                        .is_some_and(|outcome| !outcome.reachable)
            })
            .cloned()
            .collect();

        let (confirm_outcomes, confirm_stats) = if suspects.is_empty() {
            (
                HashMap::new(),
                RoundStats::empty(Phase::Confirm, self.config.confirm.timeout),
            )
        } else {
            let (outcomes, stats) = run_round(
                Arc::clone(&self.prober),
                &suspects,
                self.config.confirm.timeout,
                state.confirm_workers,
                Phase::Confirm,
                self.config.latency_policy,
                progress,
            )
            .await;

            // An idle confirm phase carries no error-rate signal, so the
            // controller only runs when the phase actually probed.
            state.confirm_workers = next_workers(
                state.confirm_workers,
                stats.error_rate(),
                &self.config.confirm.workers,
                &self.config.adaptive,
            );

            (outcomes, stats)
        };

        // Merge: confirm is authoritative wherever it re-tested.
        let reports: Vec<TargetReport> = targets
            .iter()
            .map(|target| {
                let outcome = confirm_outcomes
                    .get(&target.name)
                    .or_else(|| sweep_outcomes.get(&target.name));
                report_for(target, outcome)
            })
            .collect();

        let result = CycleResult {
            reports,
            sweep_stats,
            confirm_stats,
            next_sweep_workers: state.sweep_workers,
            next_confirm_workers: state.confirm_workers,
            completed_at: Utc::now(),
        };

        info!(
            online = result.online(),
            offline = result.offline(),
            retested = suspects.len(),
            next_sweep_workers = result.next_sweep_workers,
            next_confirm_workers = result.next_confirm_workers,
            "cycle complete"
        );

        Ok(result)
    }
}

fn report_for(target: &Target, outcome: Option<&ProbeOutcome>) -> TargetReport {
    let (status, latency_ms, checked_at) = match outcome {
        Some(o) if o.reachable => (Status::Online, o.elapsed_ms(), o.checked_at),
        Some(o) => (Status::Offline, None, o.checked_at),
        // Unreachable arm in practice; every target gets an outcome.
        None => (Status::Offline, None, Utc::now()),
    };

    TargetReport {
        name: target.name.clone(),
        host: target.host.clone(),
        port: target.port,
        site: target.site.clone(),
        region: target.region.clone(),
        status,
        latency_ms,
        checked_at,
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
