//! Console commands for login administration
//!
//! These only type a command into a running process's console; there is no
//! state of their own. A target without a session marker is refused.

use serde::Serialize;
use std::fmt;

use gc_core::types::ProcessState;
use gc_core::{LifecycleError, LogicalId};

use crate::lifecycle::Orchestrator;

/// Command that makes a simulator re-read its configuration
pub const CONFIG_RELOAD_COMMAND: &str = "config reload";

/// A `login ...` console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAction {
    Enable,
    Disable,
    Status,
    /// Minimum user level allowed to log in
    Level(u32),
    /// Message shown to users at login
    Text(String),
    Reset,
}

impl LoginAction {
    /// Console text for this action
    pub fn command(&self) -> String {
        match self {
            LoginAction::Enable => "login enable".to_string(),
            LoginAction::Disable => "login disable".to_string(),
            LoginAction::Status => "login status".to_string(),
            LoginAction::Level(level) => format!("login level {}", level),
            LoginAction::Text(message) => format!("login text {}", message),
            LoginAction::Reset => "login reset".to_string(),
        }
    }
}

/// Login state read back from a console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoginStatus {
    Enabled,
    Disabled,
    Unknown,
}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStatus::Enabled => write!(f, "ENABLED"),
            LoginStatus::Disabled => write!(f, "DISABLED"),
            LoginStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify console output. The last line mentioning logins wins.
pub fn classify_login_output(output: &str) -> LoginStatus {
    output
        .lines()
        .rev()
        .map(str::to_ascii_lowercase)
        .filter(|line| line.contains("logins"))
        .find_map(|line| {
            if line.contains("disable") {
                Some(LoginStatus::Disabled)
            } else if line.contains("enable") {
                Some(LoginStatus::Enabled)
            } else {
                None
            }
        })
        .unwrap_or(LoginStatus::Unknown)
}

/// Per-estate result of a bulk login command
#[derive(Debug)]
pub struct LoginResult {
    pub estate: String,
    /// `Some` only for [`LoginAction::Status`]
    pub result: Result<Option<LoginStatus>, LifecycleError>,
}

impl Orchestrator {
    /// Send `action` to `id`. Status requests read the console back.
    pub async fn login(&self, id: &LogicalId, action: &LoginAction) -> Result<Option<LoginStatus>, LifecycleError> {
        self.send_command(id, &action.command()).await?;
        if *action != LoginAction::Status {
            return Ok(None);
        }

        // Give the console a moment to print the answer
        tokio::time::sleep(self.context().panel.pacing.settle_delay).await;
        let output = self
            .capture_output(id, self.context().panel.capture_lines)
            .await?;
        let status = classify_login_output(&output);
        tracing::info!("Login status of {}: {}", id, status);
        Ok(Some(status))
    }

    /// Send `action` to every running estate, continuing past failures
    pub async fn login_all(&self, action: &LoginAction) -> Vec<LoginResult> {
        let mut results = Vec::new();
        for estate in self.estates_in(ProcessState::Running).await {
            let result = self.login(&LogicalId::estate(estate.as_str()), action).await;
            if let Err(e) = &result {
                tracing::warn!("{}", e);
            }
            results.push(LoginResult { estate, result });
        }
        results
    }

    /// Make estate `name` re-read its configuration
    pub async fn reload_config(&self, name: &str) -> Result<String, LifecycleError> {
        self.send_command(&LogicalId::estate(name), CONFIG_RELOAD_COMMAND)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands() {
        assert_eq!(LoginAction::Enable.command(), "login enable");
        assert_eq!(LoginAction::Level(200).command(), "login level 200");
        assert_eq!(
            LoginAction::Text("Welcome to the grid".into()).command(),
            "login text Welcome to the grid"
        );
        assert_eq!(LoginAction::Reset.command(), "login reset");
    }

    #[test]
    fn test_classify_last_match_wins() {
        let pane = "Region (Harbor) # login status\n\
                    Logins are disabled\n\
                    Region (Harbor) # login enable\n\
                    Logins are enabled\n";
        assert_eq!(classify_login_output(pane), LoginStatus::Enabled);
    }

    #[test]
    fn test_classify_disabled() {
        let pane = "12:00:01 - [LOGIN]: Logins are disabled for region Harbor\nRegion (Harbor) #\n";
        assert_eq!(classify_login_output(pane), LoginStatus::Disabled);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify_login_output(""), LoginStatus::Unknown);
        assert_eq!(
            classify_login_output("login status\nRegion (Harbor) #\n"),
            LoginStatus::Unknown
        );
    }
}
