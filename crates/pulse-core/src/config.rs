use crate::error::{PulseError, Result};
use crate::paths;
use crate::types::{StatusBucket, StatusCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Category name used for issue types no configured category claims.
pub const OTHER_CATEGORY: &str = "Other";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// JiraConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Default project key when `--project` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default = "default_done_statuses")]
    pub done_statuses: Vec<String>,
    #[serde(default = "default_in_progress_statuses")]
    pub in_progress_statuses: Vec<String>,
    /// Page size for `jira issue list --paginate`; every page is fetched.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_done_statuses() -> Vec<String> {
    vec!["Done".into(), "Closed".into(), "Resolved".into()]
}

fn default_in_progress_statuses() -> Vec<String> {
    vec!["In Progress".into(), "In Review".into(), "Code Review".into()]
}

fn default_max_results() -> u32 {
    100
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            project: None,
            done_statuses: default_done_statuses(),
            in_progress_statuses: default_in_progress_statuses(),
            max_results: default_max_results(),
        }
    }
}

impl JiraConfig {
    /// Status names win over Jira's status category; a workflow may put
    /// "Resolved" under an indeterminate category.
    pub fn bucket_for(&self, status: &str, category: StatusCategory) -> StatusBucket {
        let matches = |list: &[String]| list.iter().any(|s| s.eq_ignore_ascii_case(status));
        if matches(&self.done_statuses) {
            return StatusBucket::Done;
        }
        if matches(&self.in_progress_statuses) {
            return StatusBucket::InProgress;
        }
        match category {
            StatusCategory::Done => StatusBucket::Done,
            StatusCategory::Indeterminate => StatusBucket::InProgress,
            StatusCategory::New | StatusCategory::Unknown => StatusBucket::ToDo,
        }
    }
}

// ---------------------------------------------------------------------------
// CategoryRule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub issue_types: Vec<String>,
}

impl CategoryRule {
    fn new(name: &str, issue_types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            issue_types: issue_types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Features", &["Story", "Feature", "Epic"]),
        CategoryRule::new("Bugs", &["Bug", "Defect"]),
        CategoryRule::new("Tasks", &["Task", "Sub-task", "Subtask"]),
        CategoryRule::new("Improvements", &["Improvement"]),
    ]
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_window_days")]
    pub fallback_window_days: u32,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_window_days() -> u32 {
    14
}

fn default_title() -> String {
    "Project Progress Report".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            fallback_window_days: default_window_days(),
            title: default_title(),
        }
    }
}

// ---------------------------------------------------------------------------
// GithubConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Restrict PR search to one user or organisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_search_limit() -> u32 {
    30
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: None,
            search_limit: default_search_limit(),
        }
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryRule>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            jira: JiraConfig::default(),
            categories: default_categories(),
            report: ReportConfig::default(),
            github: GithubConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Config {
    pub fn with_project(project: Option<String>) -> Self {
        let mut cfg = Self::default();
        cfg.jira.project = project;
        cfg
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(PulseError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load the project config, or the built-in defaults when none exists.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(PulseError::NotInitialized) => {
                tracing::debug!(root = %root.display(), "no config found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Category name for a Jira issue type, case-insensitively, falling back
    /// to [`OTHER_CATEGORY`].
    pub fn category_for(&self, issue_type: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.issue_types.iter().any(|t| t.eq_ignore_ascii_case(issue_type)))
            .map(|c| c.name.as_str())
            .unwrap_or(OTHER_CATEGORY)
    }

    /// Configured category names in display order, followed by `Other`.
    pub fn category_order(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.iter().map(|c| c.name.as_str()).collect();
        if !names.contains(&OTHER_CATEGORY) {
            names.push(OTHER_CATEGORY);
        }
        names
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Category names must be non-empty
        for (i, rule) in self.categories.iter().enumerate() {
            if rule.name.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("category #{} has an empty name", i + 1),
                });
            }
            if rule.issue_types.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("category '{}' lists no issue types", rule.name),
                });
            }
        }

        // 2. An issue type claimed by two categories only ever lands in the first
        let mut claimed: HashMap<String, &str> = HashMap::new();
        for rule in &self.categories {
            for t in &rule.issue_types {
                let key = t.to_ascii_lowercase();
                match claimed.get(&key) {
                    Some(first) if *first != rule.name => warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "issue type '{}' is listed in both '{}' and '{}'; '{}' wins",
                            t, first, rule.name, first
                        ),
                    }),
                    Some(_) => {}
                    None => {
                        claimed.insert(key, rule.name.as_str());
                    }
                }
            }
        }

        // 3. Status listed as both done and in progress
        for s in &self.jira.done_statuses {
            if self
                .jira
                .in_progress_statuses
                .iter()
                .any(|p| p.eq_ignore_ascii_case(s))
            {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "status '{}' is listed as both done and in progress; it counts as done",
                        s
                    ),
                });
            }
        }

        // 4. Numeric bounds
        if self.report.fallback_window_days == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "report.fallback_window_days must be at least 1".to_string(),
            });
        }
        if self.jira.max_results == 0 || self.jira.max_results > 100 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "jira.max_results={} is outside 1..=100; jira limits each page to 100",
                    self.jira.max_results
                ),
            });
        }
        if self.github.search_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "github.search_limit=0 will never find pull requests".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
