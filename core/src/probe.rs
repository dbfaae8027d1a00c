//! # TCP Reachability Probe
//!
//! One bounded connection attempt against one target. The probe never
//! blocks past its timeout and never propagates a failure: every outcome
//! collapses into a `(reachable, elapsed, error)` triple.
//!
//! The distinction between the `reachable == false` cases matters upstream:
//! a timeout or refusal is expected per-device downtime, while a systemic
//! failure (DNS, network unreachable, descriptor exhaustion) raises the
//! error flag that drives the concurrency controller's back-off.

use std::io;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Result of one TCP attempt against one target.
#[derive(Clone, Copy, Debug)]
pub struct ProbeOutcome {
    pub reachable: bool,
    /// Measured duration of the attempt. `None` only when the target was
    /// skipped without a network attempt.
    pub elapsed: Option<Duration>,
    /// Set when the failure was exceptional rather than a plain
    /// timeout/refusal.
    pub error: bool,
    pub checked_at: DateTime<Utc>,
}

impl ProbeOutcome {
    /// Outcome for a target that was never attempted (inactive, empty host
    /// or zero port): offline, no error, no measured duration.
    pub fn skipped() -> Self {
        Self {
            reachable: false,
            elapsed: None,
            error: false,
            checked_at: Utc::now(),
        }
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        self.elapsed.map(|d| d.as_secs_f64() * 1000.0)
    }
}

/// Seam between the round executor and the network, so rounds can be
/// exercised with scripted probers in tests.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &str, port: u16, limit: Duration) -> ProbeOutcome;
}

/// Production prober: a plain `TcpStream::connect` bounded by the phase
/// timeout. The stream is dropped as soon as the connection lands, so no
/// descriptor outlives the probe on any path.
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, host: &str, port: u16, limit: Duration) -> ProbeOutcome {
        let started: Instant = Instant::now();
        let attempt = timeout(limit, TcpStream::connect((host, port))).await;
        let elapsed: Duration = started.elapsed();
        let checked_at = Utc::now();

        match attempt {
            Ok(Ok(_stream)) => ProbeOutcome {
                reachable: true,
                elapsed: Some(elapsed),
                error: false,
                checked_at,
            },
            Ok(Err(err)) => ProbeOutcome {
                reachable: false,
                elapsed: Some(elapsed),
                error: is_systemic(&err),
                checked_at,
            },
            Err(_elapsed) => ProbeOutcome {
                reachable: false,
                elapsed: Some(limit),
                error: false,
                checked_at,
            },
        }
    }
}

/// Refusals and resets are a device being down; everything else (failed
/// resolution, unreachable network, exhausted descriptors) points at the
/// prober's side of the wire.
fn is_systemic(err: &io::Error) -> bool {
    !matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
    )
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
