use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use recwatch_common::{inventory, target::Target};
use recwatch_core::Monitor;
use tracing::info;

use crate::commands::CheckArgs;
use crate::terminal::{progress::CycleProgress, table};

/// Run one cycle and print the dashboard once.
pub async fn check(args: CheckArgs) -> anyhow::Result<()> {
    let targets: Vec<Target> = inventory::load(&args.inventory)
        .with_context(|| format!("loading inventory {}", args.inventory.display()))?;
    info!("loaded {} targets", targets.len());

    let config = args.tuning.to_config(Duration::ZERO);
    let monitor = Arc::new(Monitor::new(config));

    let started: Instant = Instant::now();
    let progress = CycleProgress::new();
    let result = monitor
        .run_cycle(&targets, Some(progress.callback()))
        .await?;
    progress.finish();

    table::render(&result, &args.view);
    info!("cycle took {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}
