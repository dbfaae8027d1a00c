//! The scheduling loop: run a cycle, redraw the dashboard, wait out the
//! interval (watching for 'q'), repeat. The core guards against overlap on
//! its own; this loop is strictly sequential so the guard never trips here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use console::Term;
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use recwatch_common::{inventory, target::Target};
use recwatch_core::Monitor;
use tracing::{info, warn};

use crate::commands::CheckArgs;
use crate::terminal::{progress::CycleProgress, table};

pub async fn watch(args: CheckArgs, interval_secs: u64, no_input: bool) -> anyhow::Result<()> {
    let targets: Vec<Target> = inventory::load(&args.inventory)
        .with_context(|| format!("loading inventory {}", args.inventory.display()))?;
    info!("watching {} targets every {}s", targets.len(), interval_secs);

    let config = args
        .tuning
        .to_config(Duration::from_secs(interval_secs.max(1)));
    let interval: Duration = config.cycle_interval;
    let monitor = Arc::new(Monitor::new(config));
    let term = Term::stdout();

    loop {
        let progress = CycleProgress::new();
        let result = monitor
            .run_cycle(&targets, Some(progress.callback()))
            .await?;
        progress.finish();

        term.clear_screen().ok();
        table::render(&result, &args.view);
        println!();
        if no_input {
            println!("refreshing every {}s", interval.as_secs());
        } else {
            println!("refreshing every {}s, press 'q' to quit", interval.as_secs());
        }

        if wait_or_quit(interval, no_input).await? {
            info!("stopping watch loop");
            return Ok(());
        }
    }
}

/// Sleep out the interval. Returns true if the user asked to quit.
///
/// Key polling needs raw mode; when that is unavailable (pipes, dumb
/// terminals) we fall back to a plain sleep.
async fn wait_or_quit(interval: Duration, no_input: bool) -> anyhow::Result<bool> {
    if no_input {
        tokio::time::sleep(interval).await;
        return Ok(false);
    }

    if enable_raw_mode().is_err() {
        warn!("no interactive terminal, disabling the quit key");
        tokio::time::sleep(interval).await;
        return Ok(false);
    }

    let quit = tokio::task::spawn_blocking(move || poll_quit_key(interval)).await?;
    disable_raw_mode().ok();
    Ok(quit)
}

fn poll_quit_key(interval: Duration) -> bool {
    let deadline = std::time::Instant::now() + interval;
    loop {
        let now = std::time::Instant::now();
        if now >= deadline {
            return false;
        }
        let slice = (deadline - now).min(Duration::from_millis(250));
        match event::poll(slice) {
            Ok(true) => {
                if let Ok(Event::Key(key)) = event::read() {
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
                        return true;
                    }
                }
            }
            Ok(false) => {}
            Err(_) => return false,
        }
    }
}
