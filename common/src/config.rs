//! Monitor configuration.
//!
//! Plain values, no mechanism: the CLI maps its flags onto these structs and
//! the core reads them. Defaults follow the reference tuning: a fast,
//! wide sweep pass and a slow, narrow confirmation pass.

use std::time::Duration;

/// Bounds for one phase's adaptive worker count.
#[derive(Clone, Debug)]
pub struct WorkerBounds {
    /// Floor for the adapted worker count.
    pub min: usize,
    /// Ceiling for the adapted worker count.
    pub max: usize,
    /// Worker count used by the first cycle.
    pub start: usize,
}

impl WorkerBounds {
    pub fn new(min: usize, max: usize, start: usize) -> Self {
        Self { min, max, start }
    }

    /// Clamp a candidate worker count into `[min, max]`.
    pub fn clamp(&self, workers: usize) -> usize {
        workers.clamp(self.min, self.max)
    }
}

/// Timeout and worker budget for one of the two phases.
#[derive(Clone, Debug)]
pub struct PhaseConfig {
    pub timeout: Duration,
    pub workers: WorkerBounds,
}

/// Hysteresis band for the concurrency controller.
///
/// Error rates above `upper_threshold` shrink the worker count by `step`,
/// rates below `lower_threshold` grow it by `step`, and anything in between
/// leaves it unchanged. The band exists to avoid oscillation.
#[derive(Clone, Debug)]
pub struct AdaptiveConfig {
    pub upper_threshold: f64,
    pub lower_threshold: f64,
    pub step: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            upper_threshold: 0.12,
            lower_threshold: 0.03,
            step: 10,
        }
    }
}

/// Whether failed (timed-out or refused) attempts contribute their measured
/// duration to a round's avg/p95 latency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatencyPolicy {
    /// Every measured attempt counts, including failures. Failed attempts
    /// are bounded by the phase timeout, so this surfaces slow rounds.
    AllAttempts,
    /// Only reachable targets count.
    OnlineOnly,
}

/// Full tuning surface of the two-phase engine.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Fast full-fleet pass: short timeout, wide worker budget.
    pub sweep: PhaseConfig,
    /// Confirmation pass over sweep failures: long timeout, narrow budget.
    pub confirm: PhaseConfig,
    pub adaptive: AdaptiveConfig,
    pub latency_policy: LatencyPolicy,
    /// Delay between cycles in watch mode.
    pub cycle_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sweep: PhaseConfig {
                timeout: Duration::from_secs(2),
                workers: WorkerBounds::new(16, 64, 32),
            },
            confirm: PhaseConfig {
                timeout: Duration::from_secs(10),
                workers: WorkerBounds::new(4, 16, 8),
            },
            adaptive: AdaptiveConfig::default(),
            latency_policy: LatencyPolicy::AllAttempts,
            cycle_interval: Duration::from_secs(120),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_tune_sweep_fast_and_confirm_tolerant() {
        let config = MonitorConfig::default();
        assert!(config.sweep.timeout < config.confirm.timeout);
        assert!(config.sweep.workers.max > config.confirm.workers.max);
        assert_eq!(config.adaptive.upper_threshold, 0.12);
        assert_eq!(config.adaptive.lower_threshold, 0.03);
        assert_eq!(config.adaptive.step, 10);
    }

    #[test]
    fn worker_bounds_clamp() {
        let bounds = WorkerBounds::new(20, 60, 50);
        assert_eq!(bounds.clamp(5), 20);
        assert_eq!(bounds.clamp(50), 50);
        assert_eq!(bounds.clamp(70), 60);
    }
}
