//! # Monitored Target Model
//!
//! Defines one device (a network video recorder) to be health-checked.
//!
//! A target is immutable for the duration of a cycle: the engine never
//! mutates the inventory, it only reads it and produces per-target outcomes.

/// One device to probe. Uniquely identified by `name` within a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    /// Display name, e.g. `RJ-RJO-MAR`. Unique within the inventory.
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    /// TCP port. A port of zero marks the target as unprobeable.
    pub port: u16,
    /// Optional site label.
    pub site: Option<String>,
    /// Optional region label.
    pub region: Option<String>,
    /// Inactive targets are skipped and always reported offline,
    /// without a network attempt.
    pub active: bool,
}

impl Target {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            site: None,
            region: None,
            active: true,
        }
    }

    /// Whether this target may actually be probed over the network.
    ///
    /// Inactive targets and targets with an empty host or a zero port are
    /// deterministically reported offline instead of attempted.
    pub fn probeable(&self) -> bool {
        self.active && !self.host.is_empty() && self.port != 0
    }

    /// `host:port` form used for logging.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
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
    fn active_target_with_address_is_probeable() {
        let target = Target::new("RJ-RJO-MAR", "201.59.252.38", 50000);
        assert!(target.probeable());
        assert_eq!(target.endpoint(), "201.59.252.38:50000");
    }

    #[test]
    fn inactive_or_malformed_targets_are_not_probeable() {
        let mut inactive = Target::new("a", "10.0.0.1", 50000);
        inactive.active = false;
        assert!(!inactive.probeable());

        let no_host = Target::new("b", "", 50000);
        assert!(!no_host.probeable());

        let no_port = Target::new("c", "10.0.0.1", 0);
        assert!(!no_port.probeable());
    }
}
