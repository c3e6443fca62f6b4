use crate::cmd::send;
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use pulse_core::config::Config;
use pulse_core::html;
use pulse_core::jira::{self, JiraClient};
use pulse_core::period::{resolve_period, PeriodRequest, ResolvedPeriod};
use pulse_core::stats::{Report, ReportInput};
use pulse_core::tool_runner::SystemRunner;
use pulse_core::types::StatusBucket;
use pulse_core::PulseError;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ReportArgs {
    /// Jira project key (default: jira.project from config)
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// First day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the period, inclusive (YYYY-MM-DD; default: today)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Report on the last N days instead of the active sprint
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub days: Option<u32>,

    /// Directory for the HTML file (default: report.output_dir from config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Render from saved `jira issue list --raw` output instead of querying Jira
    #[arg(long)]
    pub issues_file: Option<PathBuf>,

    /// Open the report in the default browser
    #[arg(long)]
    pub open: bool,

    /// Email the report after writing it
    #[arg(long)]
    pub send: bool,

    /// Comma-separated recipients for --send
    #[arg(long, requires = "send")]
    pub recipients: Option<String>,
}

pub fn run(root: &Path, args: ReportArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let project = args
        .project
        .clone()
        .or_else(|| config.jira.project.clone())
        .map(|p| p.trim().to_ascii_uppercase())
        .filter(|p| !p.is_empty())
        .ok_or(PulseError::NoProject)?;

    // Fail on missing SMTP settings or recipients before any Jira traffic.
    let mail = if args.send {
        let settings = send::smtp_settings()?;
        let recipients = send::recipients_for(&config, args.recipients.as_deref())?;
        Some((settings, recipients))
    } else {
        None
    };

    let today = chrono::Local::now().date_naive();
    let request = PeriodRequest {
        from: args.from,
        to: args.to,
        days: args.days,
    };
    let fallback_days = config.report.fallback_window_days;

    let runner = SystemRunner;
    let client = JiraClient::new(&runner);

    let (resolved, issues) = match &args.issues_file {
        Some(file) => {
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let issues = jira::parse_issues(&raw)?;
            let resolved = resolve_period(None, &project, &request, fallback_days, today)?;
            (resolved, issues)
        }
        None => {
            client.ensure_project(&project)?;
            let resolved = resolve_period(Some(&client), &project, &request, fallback_days, today)?;
            let jql = resolved.period.jql(&project);
            let issues = client
                .search(&project, &jql, config.jira.max_results)
                .context("failed to search Jira issues")?;
            (resolved, issues)
        }
    };
    let ResolvedPeriod { period, notice } = resolved;

    let report = Report::build(
        &config,
        ReportInput {
            project: &project,
            period,
            notice,
            issues,
            generated_on: today,
        },
    );

    let out_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| root.join(&config.report.output_dir));
    let page = html::render_report(&report).context("failed to render report")?;
    let path = html::write_report(&out_dir, today, &page)
        .with_context(|| format!("failed to write report to {}", out_dir.display()))?;

    let delivery = match mail {
        Some((settings, recipients)) => Some(send::deliver(&settings, recipients, &page, today)?),
        None => None,
    };

    if args.open {
        if let Err(e) = open::that(&path) {
            tracing::warn!(error = %e, path = %path.display(), "could not open report in browser");
        }
    }

    if json {
        return print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "report": report,
            "sent": delivery,
        }));
    }

    print_summary(&report);
    println!();
    println!("Report written: {}", path.display());
    if let Some(d) = delivery {
        println!("Emailed to: {}", d.recipients.join(", "));
    }
    Ok(())
}

fn print_summary(report: &Report) {
    if let Some(notice) = &report.notice {
        println!("{notice}");
    }
    println!("{} - {}", report.project, report.period.describe());

    if report.is_empty() {
        println!("No issues found for this period.");
        println!("Query used: {}", report.jql);
        return;
    }

    let s = &report.stats;
    println!(
        "{} issues: {} done, {} in progress, {} not started ({:.1}% complete)",
        s.total, s.done, s.in_progress, s.to_do, s.completion_rate
    );
    println!(
        "Created in period: {}   Resolved in period: {}",
        s.created_in_period, s.resolved_in_period
    );
    println!();

    let rows = s
        .categories
        .iter()
        .map(|c| vec![c.name.clone(), c.count.to_string(), format!("{}%", c.percent)])
        .collect();
    print_table(&["CATEGORY", "ISSUES", "SHARE"], rows);

    let open_count = report.in_bucket(StatusBucket::InProgress).count();
    if open_count > 0 {
        println!();
        println!("{}:", StatusBucket::InProgress.label());
        for item in report.in_bucket(StatusBucket::InProgress) {
            println!("  {}  {}", item.issue.key, item.issue.summary);
        }
    }
}
