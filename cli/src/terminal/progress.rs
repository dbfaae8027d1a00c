//! Per-round progress bar, fed from the core's `(completed, total)`
//! callback. One bar serves both phases of a cycle; the length is reset
//! when a new round starts with a different total.

use indicatif::{ProgressBar, ProgressStyle};
use recwatch_core::ProgressFn;
use std::sync::Arc;

pub struct CycleProgress {
    bar: ProgressBar,
}

impl CycleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::no_length();
        let style = ProgressStyle::with_template("{spinner:.blue} probing {pos}/{len} {bar:30}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    /// Callback handed to `Monitor::run_cycle`.
    pub fn callback(&self) -> ProgressFn {
        let bar = self.bar.clone();
        Arc::new(move |completed, total| {
            if bar.length() != Some(total as u64) {
                bar.set_length(total as u64);
                bar.set_position(0);
            }
            bar.set_position(completed as u64);
        })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
