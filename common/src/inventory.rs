//! # Inventory Loading
//!
//! Parses the fleet inventory from a CSV file:
//!
//! ```text
//! name,host,port[,site[,region[,active]]]
//! RJ-RJO-MAR,201.59.252.38,50000,RJO,sudeste,true
//! ```
//!
//! Blank lines and `#` comments are skipped, as is an optional header row.
//! A malformed row is logged and dropped rather than failing the whole
//! load; an inventory that yields zero targets is an error.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::target::Target;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("failed to read inventory file: {0}")]
    Io(#[from] std::io::Error),
    #[error("inventory contains no usable targets")]
    Empty,
}

/// Load and parse an inventory file.
pub fn load(path: &Path) -> Result<Vec<Target>, InventoryError> {
    let raw: String = fs::read_to_string(path)?;
    parse(&raw)
}

/// Parse inventory text. Row order is preserved; duplicate names keep the
/// last occurrence.
pub fn parse(raw: &str) -> Result<Vec<Target>, InventoryError> {
    let mut targets: Vec<Target> = Vec::new();
    let mut first_row: bool = true;

    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Only the first data row may be a header, wherever it falls
        // after comments and blank lines.
        if first_row {
            first_row = false;
            if is_header(line) {
                continue;
            }
        }

        match parse_row(line) {
            Ok(target) => {
                if let Some(existing) = targets.iter_mut().find(|t| t.name == target.name) {
                    warn!("duplicate target '{}', keeping the later row", target.name);
                    *existing = target;
                } else {
                    targets.push(target);
                }
            }
            Err(reason) => {
                warn!("skipping inventory line {}: {}", line_no + 1, reason);
            }
        }
    }

    if targets.is_empty() {
        return Err(InventoryError::Empty);
    }
    Ok(targets)
}

fn is_header(line: &str) -> bool {
    line.split(',')
        .next()
        .map(|field| field.trim().eq_ignore_ascii_case("name"))
        .unwrap_or(false)
}

fn parse_row(line: &str) -> Result<Target, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(format!("expected at least name,host,port: '{line}'"));
    }

    let name = fields[0];
    let host = fields[1];
    if name.is_empty() {
        return Err("empty name".to_string());
    }

    let port: u16 = fields[2]
        .parse()
        .map_err(|e| format!("invalid port '{}': {e}", fields[2]))?;

    let mut target = Target::new(name, host, port);
    target.site = fields.get(3).filter(|s| !s.is_empty()).map(|s| s.to_string());
    target.region = fields.get(4).filter(|s| !s.is_empty()).map(|s| s.to_string());
    if let Some(flag) = fields.get(5).filter(|s| !s.is_empty()) {
        target.active = parse_flag(flag)?;
    }

    Ok(target)
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(format!("invalid active flag '{other}'")),
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
