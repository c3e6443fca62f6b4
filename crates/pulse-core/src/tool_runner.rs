//! Subprocess invocation for the external `jira` and `gh` command-line tools.
//!
//! Both tools are treated as black boxes: pulse passes arguments, optionally
//! feeds stdin, and reads stdout. All adapters go through [`CommandRunner`] so
//! tests can replace the real binaries with scripted output.
//!
//! # Failure classification
//! - binary missing from `PATH` → [`PulseError::ToolNotFound`]
//! - non-zero exit mentioning an auth problem → [`PulseError::ToolAuth`]
//! - any other non-zero exit → [`PulseError::ToolFailed`]

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{PulseError, Result};

/// The external tools pulse drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Jira,
    Gh,
}

impl Tool {
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Jira => "jira",
            Tool::Gh => "gh",
        }
    }

    /// Command that (re)establishes credentials for the tool.
    pub fn login_hint(&self) -> &'static str {
        match self {
            Tool::Jira => "jira init",
            Tool::Gh => "gh auth login",
        }
    }
}

/// Runs one external tool invocation and returns its stdout.
pub trait CommandRunner {
    fn run(&self, tool: Tool, args: &[String], stdin: Option<&str>) -> Result<String>;
}

/// Runs the real binaries found on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, tool: Tool, args: &[String], stdin: Option<&str>) -> Result<String> {
        let bin = which::which(tool.binary()).map_err(|_| PulseError::ToolNotFound {
            tool: tool.binary().to_string(),
            hint: tool.login_hint().to_string(),
        })?;

        tracing::debug!(tool = tool.binary(), ?args, "running external tool");

        let mut cmd = Command::new(&bin);
        cmd.args(args);
        if stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| PulseError::ToolFailed {
            tool: tool.binary().to_string(),
            message: format!("failed to spawn: {e}"),
        })?;

        if let Some(input) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(input.as_bytes())
                    .map_err(|e| PulseError::ToolFailed {
                        tool: tool.binary().to_string(),
                        message: format!("failed to write stdin: {e}"),
                    })?;
            }
        }

        let output = child.wait_with_output().map_err(|e| PulseError::ToolFailed {
            tool: tool.binary().to_string(),
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(tool, &stderr, &stdout));
        }
        Ok(stdout)
    }
}

/// Map a failed invocation to an advisory error.
pub fn classify_failure(tool: Tool, stderr: &str, stdout: &str) -> PulseError {
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    if looks_like_auth_failure(text) {
        tracing::warn!(tool = tool.binary(), "authentication failure reported");
        return PulseError::ToolAuth {
            tool: tool.binary().to_string(),
            hint: tool.login_hint().to_string(),
        };
    }
    let message: String = text.trim().chars().take(500).collect();
    PulseError::ToolFailed {
        tool: tool.binary().to_string(),
        message: if message.is_empty() {
            "exited with a non-zero status".to_string()
        } else {
            message
        },
    }
}

fn looks_like_auth_failure(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    [
        "401",
        "unauthorized",
        "authentication",
        "not logged in",
        "auth login",
        "invalid credentials",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

/// Build an owned argument vector from string slices.
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_and_hints_are_stable() {
        assert_eq!(Tool::Jira.binary(), "jira");
        assert_eq!(Tool::Gh.binary(), "gh");
        assert_eq!(Tool::Jira.login_hint(), "jira init");
        assert_eq!(Tool::Gh.login_hint(), "gh auth login");
    }

    #[test]
    fn auth_failures_suggest_login() {
        let err = classify_failure(Tool::Jira, "Error: 401 Unauthorized", "");
        match err {
            PulseError::ToolAuth { tool, hint } => {
                assert_eq!(tool, "jira");
                assert_eq!(hint, "jira init");
            }
            other => panic!("expected ToolAuth, got {other:?}"),
        }
        let err = classify_failure(Tool::Gh, "", "You are not logged into any GitHub hosts. Run gh auth login");
        assert!(matches!(err, PulseError::ToolAuth { .. }));
    }

    #[test]
    fn other_failures_keep_message() {
        let err = classify_failure(Tool::Gh, "  no pull requests found  ", "");
        match err {
            PulseError::ToolFailed { message, .. } => {
                assert_eq!(message, "no pull requests found")
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn failure_message_is_truncated() {
        let long = "x".repeat(2000);
        match classify_failure(Tool::Jira, &long, "") {
            PulseError::ToolFailed { message, .. } => assert_eq!(message.len(), 500),
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn empty_failure_output_has_default_message() {
        match classify_failure(Tool::Jira, "", "") {
            PulseError::ToolFailed { message, .. } => {
                assert!(message.contains("non-zero"))
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn args_helper_builds_owned_vec() {
        let v = args(["issue", "list"]);
        assert_eq!(v, vec!["issue".to_string(), "list".to_string()]);
    }
}
