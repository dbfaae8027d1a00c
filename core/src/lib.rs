pub mod adapt;
pub mod monitor;
pub mod probe;
pub mod round;

pub use monitor::{CycleResult, Monitor, MonitorError, Status, TargetReport};
pub use probe::{ProbeOutcome, Prober, TcpProber};
pub use round::{ProgressFn, RoundStats};
