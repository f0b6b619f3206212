//! Output formatting utilities for the CLI
//!
//! Tables for the process overview, settings and batch reports, the host
//! snapshot block, and coloured status lines.

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{
    settings::{Style, Width},
    Table, Tabled,
};

use gc_core::system::SystemSnapshot;
use gc_core::LogicalId;
use gc_orchestrator::{BatchEvent, BatchReport, ItemOutcome, Observation, PauseKind};

const MASK: &str = "********";

/// Format observed processes as a table
///
/// Returns "No estates found" when the slice is empty.
pub fn format_overview(observations: &[Observation]) -> String {
    if observations.is_empty() {
        return "No estates found".to_string();
    }

    #[derive(Tabled)]
    struct ProcessRow {
        #[tabled(rename = "TARGET")]
        target: String,
        #[tabled(rename = "STATE")]
        state: String,
        #[tabled(rename = "SESSION")]
        session: String,
    }

    let rows: Vec<ProcessRow> = observations
        .iter()
        .map(|o| ProcessRow {
            target: match &o.id {
                LogicalId::Robust => "Robust".to_string(),
                LogicalId::Estate(name) => name.clone(),
            },
            state: o.state.to_string(),
            session: o.handle.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format settings as a KEY/VALUE table, masking the password
pub fn format_settings(entries: &[(&'static str, String)]) -> String {
    #[derive(Tabled)]
    struct SettingRow {
        #[tabled(rename = "KEY")]
        key: &'static str,
        #[tabled(rename = "VALUE")]
        value: String,
    }

    let rows: Vec<SettingRow> = entries
        .iter()
        .map(|(key, value)| SettingRow {
            key: *key,
            value: display_setting(key, value),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Width::wrap(100))
        .to_string()
}

/// Value of a setting as shown to the operator
pub fn display_setting(key: &str, value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else if key.ends_with("PASSWORD") {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

/// Format the host snapshot as aligned lines
pub fn format_snapshot(snapshot: &SystemSnapshot) -> String {
    let cpu = snapshot
        .cpu_percent
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "CPU:  {}\nRAM:  {}\nDisk: {}\n",
        cpu,
        snapshot.ram.as_deref().unwrap_or("-"),
        snapshot.disk.as_deref().unwrap_or("-"),
    )
}

/// Format a finished batch as a table of estates and results
pub fn format_batch_report(report: &BatchReport) -> String {
    if report.items.is_empty() {
        return format!("{}: nothing to do", report.op);
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ESTATE")]
        estate: String,
        #[tabled(rename = "RESULT")]
        result: String,
    }

    let rows: Vec<ItemRow> = report
        .items
        .iter()
        .map(|item| ItemRow {
            estate: item.estate.clone(),
            result: item.outcome.to_string(),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Width::wrap(100))
        .to_string()
}

/// Print one batch progress event
pub fn print_batch_event(event: &BatchEvent) {
    match event {
        BatchEvent::ItemStarted {
            index,
            total,
            estate,
        } => print_info(&format!("[{}/{}] {}", index + 1, total, estate)),
        BatchEvent::ItemFinished { item, .. } => match &item.outcome {
            ItemOutcome::Failed { message, .. } => print_error(message),
            outcome => print_success(&format!("{}: {}", item.estate, outcome)),
        },
        BatchEvent::Pausing {
            kind: PauseKind::Cooldown,
            duration,
        } => print_info(&format!("Cooling down for {}s", duration.as_secs())),
        BatchEvent::Pausing { .. } => {}
        BatchEvent::Cancelled { remaining } => {
            print_warning(&format!("Cancelled, {} estate(s) skipped", remaining))
        }
    }
}

fn print_status(mut out: impl Write, color: Color, symbol: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(symbol),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    print_status(std::io::stdout(), Color::Green, "✓ ", msg);
}

/// Print an error message in red, to stderr
pub fn print_error(msg: &str) {
    print_status(std::io::stderr(), Color::Red, "✗ ", msg);
}

/// Print a warning in yellow, to stderr
pub fn print_warning(msg: &str) {
    print_status(std::io::stderr(), Color::Yellow, "⚠ ", msg);
}

pub fn print_info(msg: &str) {
    print_status(std::io::stdout(), Color::Cyan, "ℹ ", msg);
}
