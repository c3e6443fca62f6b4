//! Summarise the pull requests that reference an issue and post the summary
//! back to the issue as a comment, gated on human confirmation.

use crate::error::{PulseError, Result};
use crate::github::{GhClient, KeyMatcher, PullRequest};
use crate::jira::JiraClient;
use crate::template::{TemplateEngine, COMMENT_TEMPLATE};
use crate::types::PrState;
use serde::Serialize;

const TOP_FILES: usize = 5;
const MAX_COMMITS: usize = 5;
const MAX_BODY_CHARS: usize = 400;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CollectOptions<'a> {
    pub owner: Option<&'a str>,
    pub limit: u32,
}

/// Search, view, and filter the pull requests that reference `key`.
///
/// Search hits are only candidates; a PR is kept when the key appears in its
/// title, body, or head branch. Results are sorted by repository then number.
pub fn collect(gh: &GhClient<'_>, key: &str, opts: &CollectOptions<'_>) -> Result<Vec<PullRequest>> {
    let matcher = KeyMatcher::new(key);
    let hits = gh.search_prs(key, opts.owner, opts.limit)?;
    tracing::debug!(key, hits = hits.len(), "pull request search returned");

    let mut prs = Vec::new();
    for hit in hits {
        let mut pr = gh.view_pr(&hit.repo, hit.number)?;
        if !matcher.references(&pr) {
            tracing::debug!(repo = %hit.repo, number = hit.number, "search hit does not reference key");
            continue;
        }
        if pr.files.is_empty() {
            match gh.pr_diff(&hit.repo, hit.number) {
                Ok(stat) => pr.apply_diff_stat(stat),
                Err(e @ PulseError::ToolAuth { .. }) => return Err(e),
                Err(e) => tracing::warn!(repo = %hit.repo, number = hit.number, error = %e, "diff unavailable"),
            }
        }
        prs.push(pr);
    }
    prs.sort_by(|a, b| a.repo.cmp(&b.repo).then(a.number.cmp(&b.number)));
    prs.dedup_by(|a, b| a.repo == b.repo && a.number == b.number);
    Ok(prs)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn first_paragraph(body: &str) -> Option<String> {
    let para = body
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with("<!--"))?;
    let flat = para.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > MAX_BODY_CHARS {
        let cut: String = flat.chars().take(MAX_BODY_CHARS).collect();
        return Some(format!("{}...", cut.trim_end()));
    }
    Some(flat)
}

fn plural(n: u64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

#[derive(Serialize)]
struct CommentView<'a> {
    key: &'a str,
    headline: String,
    prs: Vec<PrView<'a>>,
}

#[derive(Serialize)]
struct PrView<'a> {
    repo: &'a str,
    number: u64,
    url: &'a str,
    title: &'a str,
    state: String,
    author: Option<&'a str>,
    branch: Option<String>,
    changes: String,
    commit_count: String,
    areas: Option<String>,
    summary: Option<String>,
    files: Vec<String>,
    commits: Vec<String>,
    more_commits: Option<usize>,
}

impl<'a> PrView<'a> {
    fn new(pr: &'a PullRequest) -> Self {
        let mut state = pr.state.label().to_string();
        if let (PrState::Merged, Some(at)) = (pr.state, pr.merged_at.as_deref()) {
            if let Some(day) = at.get(..10) {
                state = format!("{state} on {day}");
            }
        }
        let branch = (!pr.head_ref.is_empty() && !pr.base_ref.is_empty())
            .then(|| format!("`{}` → `{}`", pr.head_ref, pr.base_ref));
        let areas = pr.areas();
        PrView {
            repo: &pr.repo,
            number: pr.number,
            url: &pr.url,
            title: &pr.title,
            state,
            author: pr.author.as_deref(),
            branch,
            changes: format!(
                "+{} / -{} across {}",
                pr.additions,
                pr.deletions,
                plural(pr.changed_files, "file", "files")
            ),
            commit_count: plural(pr.commits.len() as u64, "commit", "commits"),
            areas: (!areas.is_empty()).then(|| areas.join(", ")),
            summary: first_paragraph(&pr.body),
            files: pr
                .top_files(TOP_FILES)
                .into_iter()
                .map(|f| format!("`{}` (+{} / -{})", f.path, f.additions, f.deletions))
                .collect(),
            commits: pr
                .commits
                .iter()
                .take(MAX_COMMITS)
                .map(|c| {
                    let short: String = c.oid.chars().take(7).collect();
                    format!("`{short}` {}", c.headline)
                })
                .collect(),
            more_commits: pr.commits.len().checked_sub(MAX_COMMITS).filter(|n| *n > 0),
        }
    }
}

/// Markdown comment summarising `prs` for issue `key`.
pub fn render_comment(key: &str, prs: &[PullRequest]) -> Result<String> {
    let merged = prs.iter().filter(|p| p.state == PrState::Merged).count();
    let open = prs.iter().filter(|p| p.state == PrState::Open).count();
    let additions: u64 = prs.iter().map(|p| p.additions).sum();
    let deletions: u64 = prs.iter().map(|p| p.deletions).sum();
    let headline = format!(
        "{} {} {key} ({merged} merged, {open} open). Total change: +{additions} / -{deletions}.",
        plural(prs.len() as u64, "pull request", "pull requests"),
        if prs.len() == 1 { "references" } else { "reference" },
    );
    let view = CommentView {
        key,
        headline,
        prs: prs.iter().map(PrView::new).collect(),
    };
    TemplateEngine::new()?.render_markdown(COMMENT_TEMPLATE, &view)
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Asks a human whether a prepared comment may be posted.
pub trait Confirm {
    /// Show `preview` and return true only on an explicit yes.
    fn confirm(&mut self, key: &str, preview: &str) -> Result<bool>;
}

/// Parse a typed answer; only `y` / `yes` (any case) count as yes.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishOutcome {
    Posted,
    Declined,
}

/// Post `body` to `key` only after `confirm` answers yes.
pub fn publish(
    jira: &JiraClient<'_>,
    key: &str,
    body: &str,
    confirm: &mut dyn Confirm,
) -> Result<PublishOutcome> {
    if !confirm.confirm(key, body)? {
        tracing::info!(key, "comment declined");
        return Ok(PublishOutcome::Declined);
    }
    jira.add_comment(key, body)?;
    Ok(PublishOutcome::Posted)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
