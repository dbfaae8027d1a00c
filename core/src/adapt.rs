//! # Concurrency Controller
//!
//! Adapts each phase's worker count between cycles from the error rate the
//! phase just observed. A hysteresis band keeps the count stable under
//! normal noise: only rates outside [lower, upper] move it, one step at a
//! time, clamped to the phase's configured bounds.

use recwatch_common::config::{AdaptiveConfig, MonitorConfig, WorkerBounds};

/// The only state that survives across cycles besides the inventory:
/// the current worker count of each phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConcurrencyState {
    pub sweep_workers: usize,
    pub confirm_workers: usize,
}

impl ConcurrencyState {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            sweep_workers: config.sweep.workers.clamp(config.sweep.workers.start),
            confirm_workers: config.confirm.workers.clamp(config.confirm.workers.start),
        }
    }
}

/// Next round's worker count for one phase.
pub fn next_workers(
    current: usize,
    error_rate: f64,
    bounds: &WorkerBounds,
    adaptive: &AdaptiveConfig,
) -> usize {
    if error_rate > adaptive.upper_threshold {
        current.saturating_sub(adaptive.step).max(bounds.min)
    } else if error_rate < adaptive.lower_threshold {
        (current + adaptive.step).min(bounds.max)
    } else {
        current
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

    fn adaptive() -> AdaptiveConfig {
        AdaptiveConfig {
            upper_threshold: 0.12,
            lower_threshold: 0.03,
            step: 10,
        }
    }

    #[test]
    fn high_error_rate_backs_off_by_one_step() {
        let bounds = WorkerBounds::new(20, 60, 50);
        assert_eq!(next_workers(50, 0.20, &bounds, &adaptive()), 40);
    }

    #[test]
    fn low_error_rate_grows_capped_at_max() {
        let bounds = WorkerBounds::new(20, 60, 50);
        assert_eq!(next_workers(50, 0.01, &bounds, &adaptive()), 60);
        assert_eq!(next_workers(60, 0.01, &bounds, &adaptive()), 60);
    }

    #[test]
    fn stable_band_leaves_the_count_unchanged() {
        let bounds = WorkerBounds::new(20, 60, 50);
        assert_eq!(next_workers(50, 0.08, &bounds, &adaptive()), 50);
        // Band edges are inclusive of "unchanged".
        assert_eq!(next_workers(50, 0.12, &bounds, &adaptive()), 50);
        assert_eq!(next_workers(50, 0.03, &bounds, &adaptive()), 50);
    }

    #[test]
    fn back_off_is_floored_at_min() {
        let bounds = WorkerBounds::new(20, 60, 50);
        assert_eq!(next_workers(25, 0.50, &bounds, &adaptive()), 20);
        assert_eq!(next_workers(20, 0.50, &bounds, &adaptive()), 20);
    }

    #[test]
    fn initial_state_clamps_start_into_bounds() {
        let mut config = MonitorConfig::default();
        config.sweep.workers = WorkerBounds::new(16, 64, 200);
        let state = ConcurrencyState::new(&config);
        assert_eq!(state.sweep_workers, 64);
        assert_eq!(state.confirm_workers, 8);
    }
}
