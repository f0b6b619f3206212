//! Console view, attach and marker maintenance

use anyhow::Result;

use gc_core::transport::shell_join;
use gc_orchestrator::Orchestrator;

use super::parse_target;
use crate::output::{print_info, print_success, print_warning};

/// Print the tail of a console, or attach the terminal to it
pub async fn console_command(
    orch: &Orchestrator,
    target: &str,
    lines: Option<usize>,
    attach: bool,
) -> Result<()> {
    let id = parse_target(target)?;

    if attach {
        let argv = orch.attach_command(&id)?;
        print_info(&format!("Running: {}", shell_join(&argv)));
        let code = orch.attach(&id).await?;
        if code != 0 {
            print_warning(&format!("Attach exited with status {}", code));
        }
        return Ok(());
    }

    let lines = lines.unwrap_or(orch.context().panel.capture_lines);
    let output = orch.capture_output(&id, lines).await?;
    if output.trim().is_empty() {
        print_info(&format!("{}: console is empty", id));
    } else {
        print!("{}", output);
    }
    Ok(())
}

/// Forget the session marker of a target without touching its process
pub fn clear_session_command(orch: &Orchestrator, target: &str) -> Result<()> {
    let id = parse_target(target)?;
    orch.clear_session(&id)?;
    print_success(&format!("{}: session marker cleared", id));
    Ok(())
}
