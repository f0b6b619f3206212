//! Login administration commands

use anyhow::Result;

use gc_orchestrator::{LoginAction, Orchestrator};

use super::parse_target;
use crate::output::{print_error, print_info, print_success};

/// Send a login command to one target, or to every running estate with `all`
pub async fn login_command(
    orch: &Orchestrator,
    action: LoginAction,
    target: Option<&str>,
    all: bool,
) -> Result<()> {
    if all {
        if !matches!(
            action,
            LoginAction::Enable | LoginAction::Disable | LoginAction::Status
        ) {
            anyhow::bail!("--all only supports enable, disable and status");
        }
        return login_all(orch, &action).await;
    }

    let Some(target) = target else {
        anyhow::bail!("A target is required (or use --all)");
    };
    let id = parse_target(target)?;
    match orch.login(&id, &action).await? {
        Some(status) => println!("{}: logins {}", id, status),
        None => print_success(&format!("{}: sent '{}'", id, action.command())),
    }
    Ok(())
}

async fn login_all(orch: &Orchestrator, action: &LoginAction) -> Result<()> {
    let results = orch.login_all(action).await;
    if results.is_empty() {
        print_info("No running estates");
        return Ok(());
    }

    let mut failed = 0;
    for result in &results {
        match &result.result {
            Ok(Some(status)) => println!("estate:{}: logins {}", result.estate, status),
            Ok(None) => print_success(&format!("estate:{}: sent '{}'", result.estate, action.command())),
            Err(e) => {
                print_error(&e.to_string());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} estate(s) failed", failed, results.len());
    }
    Ok(())
}
