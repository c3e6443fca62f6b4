//! Adapter over the `jira` CLI: projects, sprints, issue search, comments.

use crate::error::{PulseError, Result};
use crate::tool_runner::{args, CommandRunner, Tool};
use crate::types::StatusCategory;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub issue_type: String,
    pub status: String,
    pub status_category: StatusCategory,
    pub created: Option<NaiveDate>,
    pub resolved: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Deserialize, Default)]
struct RawFields {
    summary: Option<String>,
    issuetype: Option<Named>,
    status: Option<RawStatus>,
    created: Option<String>,
    resolutiondate: Option<String>,
    assignee: Option<RawUser>,
    priority: Option<Named>,
}

#[derive(Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawStatus {
    name: Option<String>,
    #[serde(rename = "statusCategory")]
    status_category: Option<RawCategory>,
}

#[derive(Deserialize)]
struct RawCategory {
    key: Option<String>,
}

#[derive(Deserialize)]
struct RawUser {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        let f = raw.fields;
        let (status, status_category) = match f.status {
            Some(s) => (
                s.name.unwrap_or_default(),
                s.status_category
                    .and_then(|c| c.key)
                    .map(|k| StatusCategory::from_key(&k))
                    .unwrap_or_default(),
            ),
            None => (String::new(), StatusCategory::Unknown),
        };
        Issue {
            key: raw.key,
            summary: f.summary.unwrap_or_default(),
            issue_type: f.issuetype.and_then(|t| t.name).unwrap_or_default(),
            status,
            status_category,
            created: f.created.as_deref().and_then(parse_jira_date),
            resolved: f.resolutiondate.as_deref().and_then(parse_jira_date),
            assignee: f.assignee.and_then(|a| a.display_name),
            priority: f.priority.and_then(|p| p.name),
        }
    }
}

/// Parse a Jira timestamp (`2026-01-05T10:15:30.000+0000`, RFC 3339, or a
/// bare date) down to its calendar date.
pub fn parse_jira_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    s.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// Parse `jira issue list --raw` output: either a bare array of issues or a
/// search response object with an `issues` array.
pub fn parse_issues(stdout: &str) -> Result<Vec<Issue>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value =
        serde_json::from_str(trimmed).map_err(|e| PulseError::ToolOutput {
            tool: "jira".to_string(),
            message: e.to_string(),
        })?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("issues") {
            Some(serde_json::Value::Array(items)) => items,
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(PulseError::ToolOutput {
                    tool: "jira".to_string(),
                    message: "'issues' is not an array".to_string(),
                })
            }
        },
        _ => {
            return Err(PulseError::ToolOutput {
                tool: "jira".to_string(),
                message: "expected a JSON array or object".to_string(),
            })
        }
    };
    items
        .into_iter()
        .map(|v| {
            serde_json::from_value::<RawIssue>(v)
                .map(Issue::from)
                .map_err(|e| PulseError::ToolOutput {
                    tool: "jira".to_string(),
                    message: format!("bad issue record: {e}"),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Project / Sprint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sprint {
    pub id: u64,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub state: String,
}

static COLUMN_SEP_RE: OnceLock<Regex> = OnceLock::new();

fn column_sep_re() -> &'static Regex {
    COLUMN_SEP_RE.get_or_init(|| Regex::new(r"\t+|\s{2,}").unwrap())
}

fn columns(line: &str) -> Vec<&str> {
    column_sep_re()
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

/// Parse `jira project list` plain output. The first column is the key.
pub fn parse_projects(stdout: &str) -> Vec<Project> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let cols = columns(line);
            let key = cols.first()?.to_string();
            if key.eq_ignore_ascii_case("key") {
                return None;
            }
            Some(Project {
                key,
                name: cols.get(1).map(|s| s.to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

/// Parse `jira sprint list ... --columns id,name,start,end,state` output.
pub fn parse_sprints(stdout: &str) -> Vec<Sprint> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let cols = columns(line);
            let id = cols.first()?.parse::<u64>().ok()?;
            let date = |i: usize| cols.get(i).and_then(|s| parse_jira_date(s));
            Some(Sprint {
                id,
                name: cols.get(1).map(|s| s.to_string()).unwrap_or_default(),
                start: date(2),
                end: date(3),
                state: cols.get(4).map(|s| s.to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JiraClient
// ---------------------------------------------------------------------------

fn is_no_result(message: &str) -> bool {
    message.to_ascii_lowercase().contains("no result found")
}

pub struct JiraClient<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> JiraClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let out = self.runner.run(
            Tool::Jira,
            &args(["project", "list", "--plain", "--no-headers"]),
            None,
        )?;
        Ok(parse_projects(&out))
    }

    /// Fail with the list of valid keys when `key` is not a known project.
    pub fn ensure_project(&self, key: &str) -> Result<Project> {
        let projects = self.list_projects()?;
        if let Some(p) = projects.iter().find(|p| p.key.eq_ignore_ascii_case(key)) {
            return Ok(p.clone());
        }
        Err(PulseError::UnknownProject {
            key: key.to_string(),
            valid: projects.into_iter().map(|p| p.key).collect(),
        })
    }

    pub fn active_sprint(&self, project: &str) -> Result<Option<Sprint>> {
        let out = self.runner.run(
            Tool::Jira,
            &args([
                "sprint",
                "list",
                "-p",
                project,
                "--state",
                "active",
                "--table",
                "--plain",
                "--no-headers",
                "--columns",
                "id,name,start,end,state",
            ]),
            None,
        )?;
        Ok(parse_sprints(&out).into_iter().next())
    }

    /// Every issue matching `jql`, fetched `page_size` at a time until a
    /// short page comes back.
    pub fn search(&self, project: &str, jql: &str, page_size: u32) -> Result<Vec<Issue>> {
        let page_size = page_size.max(1);
        let mut issues: Vec<Issue> = Vec::new();
        let mut start = 0u32;
        loop {
            let page = self.search_page(project, jql, start, page_size)?;
            let fetched = page.len();
            if let (Some(first), true) = (page.first(), start > 0) {
                if issues.iter().any(|i| i.key == first.key) {
                    tracing::warn!(project, start, "jira returned a page already seen; stopping");
                    break;
                }
            }
            issues.extend(page);
            if fetched < page_size as usize {
                break;
            }
            start += page_size;
        }
        tracing::debug!(project, total = issues.len(), "search complete");
        Ok(issues)
    }

    /// One `--paginate START:LIMIT` page. The jira CLI exits non-zero with
    /// "No result found" when nothing matches; that is an empty page.
    fn search_page(&self, project: &str, jql: &str, start: u32, limit: u32) -> Result<Vec<Issue>> {
        tracing::debug!(project, jql, start, limit, "searching issues");
        let out = self.runner.run(
            Tool::Jira,
            &args([
                "issue".to_string(),
                "list".to_string(),
                "-p".to_string(),
                project.to_string(),
                "-q".to_string(),
                jql.to_string(),
                "--raw".to_string(),
                "--paginate".to_string(),
                format!("{start}:{limit}"),
            ]),
            None,
        );
        match out {
            Ok(stdout) => parse_issues(&stdout),
            Err(PulseError::ToolFailed { message, .. }) if is_no_result(&message) => {
                tracing::debug!(project, "jira reported no matching issues");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn fetch_issue(&self, key: &str) -> Result<Issue> {
        let project = crate::paths::project_of(key).unwrap_or(key);
        let jql = format!("key = {key}");
        self.search_page(project, &jql, 0, 1)?
            .into_iter()
            .find(|i| i.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| PulseError::IssueNotFound(key.to_string()))
    }

    /// Post `body` as a comment. The body travels on stdin so markdown and
    /// newlines survive untouched.
    pub fn add_comment(&self, key: &str, body: &str) -> Result<()> {
        self.runner.run(
            Tool::Jira,
            &args(["issue", "comment", "add", key, "--template", "-", "--no-input"]),
            Some(body),
        )?;
        tracing::info!(key, "comment posted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
