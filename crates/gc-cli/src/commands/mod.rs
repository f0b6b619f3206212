//! CLI command implementations

mod console;
mod estate;
mod login;
mod robust;
mod settings;
mod status;

pub use console::{clear_session_command, console_command};
pub use estate::{
    estate_args, estate_list, estate_reload, estate_restart, estate_start, estate_start_all,
    estate_stop, estate_stop_all,
};
pub use login::login_command;
pub use robust::{robust_restart, robust_start, robust_stop};
pub use settings::{settings_path, settings_set, settings_show};
pub use status::{status_command, sysinfo_command};

use anyhow::Result;

use gc_core::LogicalId;
use gc_orchestrator::{StartOutcome, StopOutcome};

use crate::output::{print_success, print_warning};

/// Parse a `robust` / `estate:<name>` / `<name>` target
pub fn parse_target(input: &str) -> Result<LogicalId> {
    LogicalId::parse(input).ok_or_else(|| anyhow::anyhow!("Invalid target: {:?}", input))
}

/// Ask the operator to confirm on stdin
pub fn confirm(question: &str) -> Result<bool> {
    print_warning(question);
    print!("Continue? [y/N] ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn report_start(id: &LogicalId, outcome: &StartOutcome) {
    match outcome {
        StartOutcome::Started { .. } => print_success(&format!("{}: {}", id, outcome)),
        StartOutcome::AlreadyRunning => print_warning(&format!("{}: {}", id, outcome)),
    }
}

fn report_stop(id: &LogicalId, outcome: &StopOutcome) {
    if outcome.acted() {
        print_success(&format!("{}: {}", id, outcome));
    } else {
        print_warning(&format!("{}: {}", id, outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("robust").unwrap(), LogicalId::Robust);
        assert_eq!(parse_target("estate:Harbor").unwrap(), LogicalId::estate("Harbor"));
        assert!(parse_target("").is_err());
        assert!(parse_target("../etc").is_err());
    }
}
