//! End-to-end cycle tests: real loopback listeners where sockets suffice,
//! scripted probers where the scenario needs controlled timing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use recwatch_common::config::MonitorConfig;
use recwatch_common::inventory;
use recwatch_common::target::Target;
use recwatch_core::{Monitor, MonitorError, ProbeOutcome, Prober, Status};
use tokio::net::TcpListener;

fn quick_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.sweep.timeout = Duration::from_millis(500);
    config.confirm.timeout = Duration::from_millis(1500);
    config
}

/// Bind a loopback listener that keeps accepting for the test's lifetime.
async fn live_listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// A loopback port that is known to be closed.
async fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn cycle_against_real_sockets() {
    let (_a, port_a) = live_listener().await;
    let (_b, port_b) = live_listener().await;
    let closed = dead_port().await;

    let targets = vec![
        Target::new("cam-a", "127.0.0.1", port_a),
        Target::new("cam-b", "127.0.0.1", port_b),
        Target::new("cam-dead", "127.0.0.1", closed),
    ];

    let monitor = Monitor::new(quick_config());
    let result = monitor.run_cycle(&targets, None).await.unwrap();

    assert_eq!(result.sweep_stats.total, 3);
    assert_eq!(result.sweep_stats.online, 2);
    assert_eq!(result.sweep_stats.offline, 1);
    // Refusals are expected downtime, not systemic errors.
    assert_eq!(result.sweep_stats.errors, 0);

    // Only the dead target is re-confirmed, and it stays offline.
    assert_eq!(result.confirm_stats.total, 1);
    assert_eq!(result.confirm_stats.online, 0);

    assert_eq!(result.online(), 2);
    assert_eq!(result.offline(), 1);

    let dead = result
        .reports
        .iter()
        .find(|r| r.name == "cam-dead")
        .unwrap();
    assert_eq!(dead.status, Status::Offline);
    assert_eq!(dead.latency_ms, None);

    let alive = result.reports.iter().find(|r| r.name == "cam-a").unwrap();
    assert_eq!(alive.status, Status::Online);
    assert!(alive.latency_ms.is_some());
}

#[tokio::test]
async fn repeated_cycles_share_no_state_but_worker_counts() {
    let (_a, port_a) = live_listener().await;
    let targets = vec![Target::new("cam-a", "127.0.0.1", port_a)];
    let monitor = Monitor::new(quick_config());

    let first = monitor.run_cycle(&targets, None).await.unwrap();
    let second = monitor.run_cycle(&targets, None).await.unwrap();

    assert_eq!(first.online(), 1);
    assert_eq!(second.online(), 1);
    // Healthy fleet: sweep worker count keeps growing toward its max.
    assert!(second.next_sweep_workers >= first.next_sweep_workers);
}

#[tokio::test]
async fn inventory_file_drives_a_cycle() -> anyhow::Result<()> {
    let (_a, port_a) = live_listener().await;
    let raw = format!(
        "name,host,port,site,region,active\n\
         cam-live,127.0.0.1,{port_a},lab,local,true\n\
         cam-parked,127.0.0.1,{port_a},lab,local,false\n"
    );
    let targets = inventory::parse(&raw)?;

    let monitor = Monitor::new(quick_config());
    let result = monitor.run_cycle(&targets, None).await?;

    assert_eq!(result.online(), 1);
    let parked = result
        .reports
        .iter()
        .find(|r| r.name == "cam-parked")
        .expect("parked report missing");
    assert_eq!(parked.status, Status::Offline);
    assert_eq!(parked.site.as_deref(), Some("lab"));
    Ok(())
}

/// Prober that parks every probe until released, to hold a cycle open.
struct StalledProber {
    release: tokio::sync::Notify,
}

#[async_trait]
impl Prober for StalledProber {
    async fn probe(&self, _host: &str, _port: u16, _limit: Duration) -> ProbeOutcome {
        self.release.notified().await;
        ProbeOutcome {
            reachable: true,
            elapsed: Some(Duration::from_millis(1)),
            error: false,
            checked_at: Utc::now(),
        }
    }
}

#[tokio::test]
async fn overlapping_cycles_are_rejected() {
    let prober = Arc::new(StalledProber {
        release: tokio::sync::Notify::new(),
    });
    let monitor = Arc::new(Monitor::with_prober(quick_config(), prober.clone()));
    let targets = vec![Target::new("cam-a", "10.0.0.1", 50000)];

    let running = {
        let monitor = Arc::clone(&monitor);
        let targets = targets.clone();
        tokio::spawn(async move { monitor.run_cycle(&targets, None).await })
    };

    // Give the first cycle time to take the guard and park in its probe.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = monitor.run_cycle(&targets, None).await;
    assert!(matches!(second, Err(MonitorError::CycleInFlight)));

    // The first cycle is undisturbed and completes once released.
    prober.release.notify_waiters();
    let first = running.await.unwrap().unwrap();
    assert_eq!(first.online(), 1);

    // And the guard is free again afterwards.
    prober.release.notify_one();
    let third = monitor.run_cycle(&targets, None).await;
    assert!(third.is_ok());
}
