//! Dashboard rendering: the per-target table, summary counts and the
//! per-phase stat lines. Pure formatting over a `CycleResult`; filtering
//! and ordering happen here so the core stays presentation-free.

use chrono::Local;
use colored::*;
use recwatch_core::round::RoundStats;
use recwatch_core::{CycleResult, Status, TargetReport};
use unicode_width::UnicodeWidthStr;

use crate::commands::{SortArg, StatusArg, ViewArgs};

const HEADERS: [&str; 8] = [
    "NAME", "HOST", "PORT", "SITE", "REGION", "STATUS", "LATENCY", "CHECKED",
];

/// Select and order the rows to display.
pub fn view<'a>(result: &'a CycleResult, view: &ViewArgs) -> Vec<&'a TargetReport> {
    let needle: Option<String> = view.filter.as_ref().map(|f| f.trim().to_lowercase());

    let mut rows: Vec<&TargetReport> = result
        .reports
        .iter()
        .filter(|r| match &needle {
            Some(text) => {
                r.name.to_lowercase().contains(text) || r.host.to_lowercase().contains(text)
            }
            None => true,
        })
        .filter(|r| match view.status {
            Some(StatusArg::Online) => r.status == Status::Online,
            Some(StatusArg::Offline) => r.status == Status::Offline,
            None => true,
        })
        .collect();

    match view.sort {
        SortArg::Status => {
            rows.sort_by(|a, b| {
                let rank = |r: &TargetReport| match r.status {
                    Status::Offline => 0,
                    Status::Online => 1,
                };
                rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
            });
        }
        SortArg::Name => rows.sort_by(|a, b| a.name.cmp(&b.name)),
        SortArg::Latency => sort_by_latency(&mut rows, false),
        SortArg::LatencyDesc => sort_by_latency(&mut rows, true),
    }
    rows
}

// Rows without a latency (offline) sort last in both directions.
fn sort_by_latency(rows: &mut [&TargetReport], slowest_first: bool) {
    rows.sort_by(|a, b| match (a.latency_ms, b.latency_ms) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some(_), None) => std::cmp::Ordering::Less,
        (Some(x), Some(y)) => {
            if slowest_first {
                y.total_cmp(&x)
            } else {
                x.total_cmp(&y)
            }
        }
    });
}

/// Print the dashboard for one cycle.
pub fn render(result: &CycleResult, args: &ViewArgs) {
    let rows: Vec<&TargetReport> = view(result, args);

    let checked = result
        .completed_at
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M:%S");
    println!(
        "{} {}",
        "recorder fleet".bold(),
        format!("(checked {checked})").bright_black()
    );
    println!();

    print_table(&rows);
    println!();
    print_summary(result, rows.len());
}

fn print_table(rows: &[&TargetReport]) {
    let cells: Vec<[String; 8]> = rows.iter().map(|r| row_cells(r)).collect();

    let mut widths: [usize; 8] = HEADERS.map(UnicodeWidthStr::width);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let header_cells: [String; 8] = HEADERS.map(str::to_string);
    print_row(&header_cells.clone().map(|h| h.bright_black().bold()), &header_cells, &widths);
    for (row, report) in cells.iter().zip(rows.iter()) {
        let colored_row: [ColoredString; 8] = [
            row[0].as_str().bold(),
            row[1].as_str().normal(),
            row[2].as_str().normal(),
            row[3].as_str().bright_black(),
            row[4].as_str().bright_black(),
            badge(report),
            row[6].as_str().cyan(),
            row[7].as_str().bright_black(),
        ];
        print_row(&colored_row, row, &widths);
    }
}

fn row_cells(report: &TargetReport) -> [String; 8] {
    [
        report.name.clone(),
        report.host.clone(),
        report.port.to_string(),
        report.site.clone().unwrap_or_else(|| "—".to_string()),
        report.region.clone().unwrap_or_else(|| "—".to_string()),
        format!("● {}", report.status),
        report
            .latency_ms
            .map(|ms| format!("{ms:.1} ms"))
            .unwrap_or_else(|| "—".to_string()),
        report
            .checked_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string(),
    ]
}

fn badge(report: &TargetReport) -> ColoredString {
    match report.status {
        Status::Online => "● ONLINE".green().bold(),
        Status::Offline => "● OFFLINE".red().bold(),
    }
}

// Pad by the plain text's display width; colour escape codes are invisible
// to the terminal but not to `format!` width specifiers.
fn print_row(colored: &[ColoredString; 8], plain: &[String; 8], widths: &[usize; 8]) {
    let mut line = String::new();
    for ((cell, text), width) in colored.iter().zip(plain.iter()).zip(widths.iter()) {
        let visible: usize = UnicodeWidthStr::width(text.as_str());
        line.push_str(&format!("{cell}"));
        line.push_str(&" ".repeat(width.saturating_sub(visible) + 2));
    }
    println!("{}", line.trim_end());
}

fn print_summary(result: &CycleResult, shown: usize) {
    let online = result.online().to_string().green().bold();
    let offline = result.offline().to_string().red().bold();
    let total = result.reports.len();
    println!(
        "{} online  {} offline  {total} total  ({shown} shown)",
        online, offline
    );
    print_phase_line(&result.sweep_stats);
    print_phase_line(&result.confirm_stats);
    println!(
        "{}",
        format!(
            "next workers: sweep {}, confirm {}",
            result.next_sweep_workers, result.next_confirm_workers
        )
        .bright_black()
    );
}

fn print_phase_line(stats: &RoundStats) {
    println!(
        "{}",
        format!(
            "{:>7}: {} probed, {} online, {} errors, avg {:.1} ms, p95 {:.1} ms, \
             timeout {:.1}s, {} workers",
            stats.phase.to_string(),
            stats.total,
            stats.online,
            stats.errors,
            stats.avg_ms,
            stats.p95_ms,
            stats.timeout.as_secs_f64(),
            stats.workers
        )
        .bright_black()
    );
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
    use chrono::Utc;
    use recwatch_core::round::{Phase, RoundStats};
    use std::time::Duration;

    fn report(name: &str, status: Status, latency_ms: Option<f64>) -> TargetReport {
        TargetReport {
            name: name.to_string(),
            host: format!("{name}.example"),
            port: 50000,
            site: None,
            region: None,
            status,
            latency_ms,
            checked_at: Utc::now(),
        }
    }

    fn result(reports: Vec<TargetReport>) -> CycleResult {
        CycleResult {
            reports,
            sweep_stats: RoundStats::empty(Phase::Sweep, Duration::from_secs(2)),
            confirm_stats: RoundStats::empty(Phase::Confirm, Duration::from_secs(10)),
            next_sweep_workers: 32,
            next_confirm_workers: 8,
            completed_at: Utc::now(),
        }
    }

    fn args(sort: SortArg, filter: Option<&str>, status: Option<StatusArg>) -> ViewArgs {
        ViewArgs {
            filter: filter.map(str::to_string),
            status,
            sort,
        }
    }

    #[test]
    fn status_sort_puts_offline_first_then_names() {
        let cycle = result(vec![
            report("b", Status::Online, Some(10.0)),
            report("c", Status::Offline, None),
            report("a", Status::Offline, None),
        ]);
        let rows = view(&cycle, &args(SortArg::Status, None, None));
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }

    #[test]
    fn latency_sort_puts_missing_latency_last() {
        let cycle = result(vec![
            report("slow", Status::Online, Some(90.0)),
            report("down", Status::Offline, None),
            report("fast", Status::Online, Some(5.0)),
        ]);
        let rows = view(&cycle, &args(SortArg::Latency, None, None));
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["fast", "slow", "down"]);

        // Offline rows also sort last when ordering slowest-first.
        let rows = view(&cycle, &args(SortArg::LatencyDesc, None, None));
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast", "down"]);
    }

    #[test]
    fn filter_matches_name_or_host_case_insensitively() {
        let cycle = result(vec![
            report("RJ-RJO-MAR", Status::Online, Some(12.0)),
            report("DF-STMK", Status::Online, Some(15.0)),
        ]);
        let rows = view(&cycle, &args(SortArg::Name, Some("rj-rjo"), None));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "RJ-RJO-MAR");

        let by_host = view(&cycle, &args(SortArg::Name, Some("df-stmk.example"), None));
        assert_eq!(by_host.len(), 1);
    }

    #[test]
    fn status_filter_keeps_only_the_requested_state() {
        let cycle = result(vec![
            report("up", Status::Online, Some(8.0)),
            report("down", Status::Offline, None),
        ]);
        let rows = view(&cycle, &args(SortArg::Name, None, Some(StatusArg::Offline)));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "down");
    }
}
