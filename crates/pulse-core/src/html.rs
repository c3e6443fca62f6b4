//! Fixed-layout HTML rendering of a [`Report`], suitable for email clients.
//!
//! Everything is inline-styled; email clients strip `<style>` blocks. Section
//! order is fixed by `templates/report.html.hbs`: header, notice, summary
//! cards, category breakdown, completed, in progress, not started, footer.
//! Escaping is left to the template engine.

use crate::error::Result;
use crate::paths;
use crate::period::PeriodSource;
use crate::stats::{CategoryCount, Report, ReportIssue};
use crate::template::{TemplateEngine, REPORT_TEMPLATE};
use crate::types::StatusBucket;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

const TEXT: &str = "#172B4D";
const BRAND: &str = "#0052CC";
const DONE: &str = "#36B37E";
const IN_PROGRESS: &str = "#0065FF";
const TO_DO: &str = "#97A0AF";

fn bucket_color(bucket: StatusBucket) -> &'static str {
    match bucket {
        StatusBucket::Done => DONE,
        StatusBucket::InProgress => IN_PROGRESS,
        StatusBucket::ToDo => TO_DO,
    }
}

// ---------------------------------------------------------------------------
// Template context
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReportView<'a> {
    title: &'a str,
    project: &'a str,
    period: String,
    source: &'static str,
    notice: Option<&'a str>,
    empty: bool,
    jql: &'a str,
    cards: Vec<Card>,
    created_in_period: usize,
    resolved_in_period: usize,
    categories: &'a [CategoryCount],
    sections: Vec<Section<'a>>,
    generated_on: String,
}

#[derive(Serialize)]
struct Card {
    label: &'static str,
    value: String,
    color: &'static str,
}

#[derive(Serialize)]
struct Section<'a> {
    heading: &'static str,
    color: &'static str,
    count: usize,
    rows: Vec<Row<'a>>,
}

#[derive(Serialize)]
struct Row<'a> {
    key: &'a str,
    summary: &'a str,
    category: &'a str,
    assignee: &'a str,
    status: &'a str,
    color: &'static str,
}

impl<'a> Row<'a> {
    fn from_issue(i: &'a ReportIssue) -> Self {
        Row {
            key: &i.issue.key,
            summary: &i.issue.summary,
            category: &i.category,
            assignee: i.issue.assignee.as_deref().unwrap_or("Unassigned"),
            status: &i.issue.status,
            color: bucket_color(i.bucket),
        }
    }
}

fn section<'a>(report: &'a Report, bucket: StatusBucket, heading: &'static str) -> Section<'a> {
    let rows: Vec<Row<'a>> = report.in_bucket(bucket).map(Row::from_issue).collect();
    Section {
        heading,
        color: bucket_color(bucket),
        count: rows.len(),
        rows,
    }
}

impl<'a> ReportView<'a> {
    fn new(report: &'a Report) -> Self {
        let s = &report.stats;
        let source = match &report.period.source {
            PeriodSource::Sprint { .. } => "Active sprint",
            PeriodSource::Window { .. } => "Rolling window",
            PeriodSource::Explicit => "Custom range",
        };
        let card = |label, value: String, color| Card {
            label,
            value,
            color,
        };
        ReportView {
            title: &report.title,
            project: &report.project,
            period: report.period.describe(),
            source,
            notice: report.notice.as_deref(),
            empty: report.is_empty(),
            jql: &report.jql,
            cards: vec![
                card("Total", s.total.to_string(), TEXT),
                card("Done", s.done.to_string(), DONE),
                card("In Progress", s.in_progress.to_string(), IN_PROGRESS),
                card("To Do", s.to_do.to_string(), TO_DO),
                card("Completion", format!("{:.1}%", s.completion_rate), BRAND),
            ],
            created_in_period: s.created_in_period,
            resolved_in_period: s.resolved_in_period,
            categories: &s.categories,
            sections: vec![
                section(report, StatusBucket::Done, "Completed"),
                section(report, StatusBucket::InProgress, "In Progress"),
                section(report, StatusBucket::ToDo, "Not Started"),
            ],
            generated_on: report.generated_on.format("%Y-%m-%d").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_report(report: &Report) -> Result<String> {
    TemplateEngine::new()?.render_html(REPORT_TEMPLATE, &ReportView::new(report))
}

/// Write `html` to `dir/jira-report-YYYY-MM-DD.html` and return the path.
pub fn write_report(dir: &Path, date: NaiveDate, html: &str) -> Result<PathBuf> {
    let path = paths::report_path(dir, date);
    crate::io::atomic_write(&path, html.as_bytes())?;
    tracing::info!(path = %path.display(), "report written");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::jira::Issue;
    use crate::period::ReportPeriod;
    use crate::stats::ReportInput;
    use crate::types::StatusCategory;
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn issue(key: &str, ty: &str, status: &str, summary: &str) -> Issue {
        Issue {
            key: key.into(),
            summary: summary.into(),
            issue_type: ty.into(),
            status: status.into(),
            status_category: StatusCategory::Unknown,
            created: Some(d(2)),
            resolved: None,
            assignee: Some("Ana".into()),
            priority: None,
        }
    }

    fn report(issues: Vec<Issue>, notice: Option<String>) -> Report {
        Report::build(
            &Config::default(),
            ReportInput {
                project: "PROJ",
                period: ReportPeriod::explicit(d(1), d(14)).unwrap(),
                notice,
                issues,
                generated_on: d(14),
            },
        )
    }

    #[test]
    fn sections_render_in_fixed_order() {
        let html = render_report(&report(
            vec![
                issue("PROJ-1", "Story", "Done", "Ship login"),
                issue("PROJ-2", "Bug", "In Progress", "Fix crash"),
                issue("PROJ-3", "Task", "To Do", "Write docs"),
            ],
            None,
        ))
        .unwrap();
        let pos = |needle: &str| html.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
        let order = [
            pos("Project Progress Report"),
            pos(">Summary<"),
            pos("Breakdown by Category"),
            pos("Completed (1)"),
            pos("In Progress (1)"),
            pos("Not Started (1)"),
            pos("Generated by pulse on 2026-01-14"),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");
        assert!(html.contains("33.3%"));
        assert!(html.contains("font-family:Arial, Helvetica, sans-serif"));
    }

    #[test]
    fn issue_text_is_escaped() {
        let html = render_report(&report(
            vec![issue("PROJ-1", "Story", "Done", "<script>alert(1)</script>")],
            None,
        ))
        .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_bucket_says_none() {
        let html = render_report(&report(
            vec![issue("PROJ-1", "Story", "Done", "Ship login")],
            None,
        ))
        .unwrap();
        assert!(html.contains("In Progress (0)"));
        assert!(html.contains("None this period."));
        assert!(html.contains("Ana"));
    }

    #[test]
    fn notice_is_rendered() {
        let html = render_report(&report(
            vec![issue("PROJ-1", "Story", "Done", "x")],
            Some("No active sprint found for PROJ".into()),
        ))
        .unwrap();
        assert!(html.contains("No active sprint found for PROJ"));
    }

    #[test]
    fn empty_report_explains_query() {
        let html = render_report(&report(Vec::new(), None)).unwrap();
        assert!(html.contains("No issues found"));
        assert!(html.contains("updated &gt;"));
        assert!(html.contains("&quot;2026-01-01&quot;"));
        assert!(!html.contains("updated >="));
        assert!(!html.contains("Breakdown by Category"));
    }

    #[test]
    fn write_report_uses_dated_name() {
        let dir = TempDir::new().unwrap();
        let path = write_report(dir.path(), d(6), "<html></html>").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "jira-report-2026-01-06.html"
        );
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
