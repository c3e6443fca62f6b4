//! Adapter over the `gh` CLI: pull request search, view, and diff.

use crate::error::{PulseError, Result};
use crate::tool_runner::{args, CommandRunner, Tool};
use crate::types::PrState;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrRef {
    /// `owner/name`
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub body: String,
}

#[derive(Deserialize)]
struct RawSearchHit {
    repository: RawRepository,
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Deserialize)]
struct RawRepository {
    #[serde(rename = "nameWithOwner")]
    name_with_owner: Option<String>,
    name: Option<String>,
}

pub fn parse_search(stdout: &str) -> Result<Vec<PrRef>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let hits: Vec<RawSearchHit> = serde_json::from_str(stdout).map_err(gh_output)?;
    Ok(hits
        .into_iter()
        .filter_map(|h| {
            let repo = h.repository.name_with_owner.or(h.repository.name)?;
            Some(PrRef {
                repo,
                number: h.number,
                title: h.title,
                url: h.url,
                body: h.body.unwrap_or_default(),
            })
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Pull request details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

impl FileChange {
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    pub oid: String,
    pub headline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub state: PrState,
    pub url: String,
    pub author: Option<String>,
    pub body: String,
    pub head_ref: String,
    pub base_ref: String,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub files: Vec<FileChange>,
    pub commits: Vec<Commit>,
    pub merged_at: Option<String>,
}

impl PullRequest {
    /// Files sorted by churn, largest first; path breaks ties.
    pub fn top_files(&self, n: usize) -> Vec<&FileChange> {
        let mut files: Vec<&FileChange> = self.files.iter().collect();
        files.sort_by(|a, b| b.churn().cmp(&a.churn()).then(a.path.cmp(&b.path)));
        files.truncate(n);
        files
    }

    /// Distinct top-level directories touched (`(root)` for files at the top).
    pub fn areas(&self) -> Vec<String> {
        let mut areas: Vec<String> = self
            .files
            .iter()
            .map(|f| match f.path.split_once('/') {
                Some((dir, _)) => dir.to_string(),
                None => "(root)".to_string(),
            })
            .collect();
        areas.sort();
        areas.dedup();
        areas
    }

    /// Replace missing file data with stats parsed from the diff.
    pub fn apply_diff_stat(&mut self, stat: DiffStat) {
        if !self.files.is_empty() {
            return;
        }
        self.additions = stat.additions();
        self.deletions = stat.deletions();
        self.changed_files = stat.files.len() as u64;
        self.files = stat.files;
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPullRequest {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    url: String,
    author: Option<RawAuthor>,
    body: Option<String>,
    #[serde(default)]
    head_ref_name: String,
    #[serde(default)]
    base_ref_name: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    changed_files: u64,
    #[serde(default)]
    files: Option<Vec<FileChange>>,
    #[serde(default)]
    commits: Option<Vec<RawCommit>>,
    merged_at: Option<String>,
}

#[derive(Deserialize)]
struct RawAuthor {
    login: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommit {
    #[serde(default)]
    oid: String,
    #[serde(default)]
    message_headline: String,
}

pub const VIEW_FIELDS: &str = "number,title,state,url,author,body,headRefName,baseRefName,additions,deletions,changedFiles,files,commits,mergedAt";

pub fn parse_view(repo: &str, stdout: &str) -> Result<PullRequest> {
    let raw: RawPullRequest = serde_json::from_str(stdout).map_err(gh_output)?;
    let state = match raw.state.parse::<PrState>() {
        Ok(s) => s,
        Err(_) if raw.merged_at.is_some() => PrState::Merged,
        Err(_) => PrState::Open,
    };
    Ok(PullRequest {
        repo: repo.to_string(),
        number: raw.number,
        title: raw.title,
        state,
        url: raw.url,
        author: raw.author.and_then(|a| a.login),
        body: raw.body.unwrap_or_default(),
        head_ref: raw.head_ref_name,
        base_ref: raw.base_ref_name,
        additions: raw.additions,
        deletions: raw.deletions,
        changed_files: raw.changed_files,
        files: raw.files.unwrap_or_default(),
        commits: raw
            .commits
            .unwrap_or_default()
            .into_iter()
            .map(|c| Commit {
                oid: c.oid,
                headline: c.message_headline,
            })
            .collect(),
        merged_at: raw.merged_at.filter(|m| !m.is_empty()),
    })
}

fn gh_output(e: serde_json::Error) -> PulseError {
    PulseError::ToolOutput {
        tool: "gh".to_string(),
        message: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// DiffStat
// ---------------------------------------------------------------------------

/// Per-file line counts parsed from a unified diff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffStat {
    pub files: Vec<FileChange>,
}

impl DiffStat {
    pub fn parse(diff: &str) -> Self {
        let mut files: Vec<FileChange> = Vec::new();
        for line in diff.lines() {
            if let Some(rest) = line.strip_prefix("diff --git ") {
                let path = rest
                    .rsplit_once(" b/")
                    .map(|(_, p)| p)
                    .unwrap_or(rest)
                    .to_string();
                files.push(FileChange {
                    path,
                    additions: 0,
                    deletions: 0,
                });
                continue;
            }
            let Some(current) = files.last_mut() else {
                continue;
            };
            if line.starts_with("+++") || line.starts_with("---") {
                continue;
            }
            if line.starts_with('+') {
                current.additions += 1;
            } else if line.starts_with('-') {
                current.deletions += 1;
            }
        }
        DiffStat { files }
    }

    pub fn additions(&self) -> u64 {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn deletions(&self) -> u64 {
        self.files.iter().map(|f| f.deletions).sum()
    }
}

// ---------------------------------------------------------------------------
// Key matching
// ---------------------------------------------------------------------------

/// Matcher for one issue key. `PROJ-12` matches `proj-12`, `[PROJ-12]` and
/// `feature/PROJ-12-login`, but not `PROJ-123` or `XPROJ-12`.
pub struct KeyMatcher {
    key: String,
}

impl KeyMatcher {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_ascii_uppercase(),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        if self.key.is_empty() {
            return false;
        }
        let haystack = text.to_ascii_uppercase();
        let bytes = haystack.as_bytes();
        haystack.match_indices(self.key.as_str()).any(|(start, m)| {
            let end = start + m.len();
            let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
            let after_ok = end == bytes.len() || !bytes[end].is_ascii_digit();
            before_ok && after_ok
        })
    }

    /// Pure field match over the PR's title, body, and head branch.
    pub fn references(&self, pr: &PullRequest) -> bool {
        self.is_match(&pr.title) || self.is_match(&pr.body) || self.is_match(&pr.head_ref)
    }
}

// ---------------------------------------------------------------------------
// GhClient
// ---------------------------------------------------------------------------

pub struct GhClient<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> GhClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn search_prs(&self, key: &str, owner: Option<&str>, limit: u32) -> Result<Vec<PrRef>> {
        let mut argv = args([
            "search".to_string(),
            "prs".to_string(),
            format!("\"{key}\""),
            "--json".to_string(),
            "repository,number,title,url,body".to_string(),
            "--limit".to_string(),
            limit.to_string(),
        ]);
        if let Some(owner) = owner {
            argv.push("--owner".to_string());
            argv.push(owner.to_string());
        }
        let out = self.runner.run(Tool::Gh, &argv, None)?;
        parse_search(&out)
    }

    pub fn view_pr(&self, repo: &str, number: u64) -> Result<PullRequest> {
        let out = self.runner.run(
            Tool::Gh,
            &args([
                "pr".to_string(),
                "view".to_string(),
                number.to_string(),
                "--repo".to_string(),
                repo.to_string(),
                "--json".to_string(),
                VIEW_FIELDS.to_string(),
            ]),
            None,
        )?;
        parse_view(repo, &out)
    }

    pub fn pr_diff(&self, repo: &str, number: u64) -> Result<DiffStat> {
        let out = self.runner.run(
            Tool::Gh,
            &args([
                "pr".to_string(),
                "diff".to_string(),
                number.to_string(),
                "--repo".to_string(),
                repo.to_string(),
            ]),
            None,
        )?;
        Ok(DiffStat::parse(&out))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
