use crate::confirm::{AssumeYes, StdinConfirm};
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use pulse_core::config::Config;
use pulse_core::github::GhClient;
use pulse_core::jira::JiraClient;
use pulse_core::pr_summary::{self, CollectOptions, Confirm, PublishOutcome};
use pulse_core::tool_runner::SystemRunner;
use pulse_core::{paths, types::PrState};
use std::path::Path;

#[derive(Args)]
pub struct CommentArgs {
    /// Issue key, e.g. PROJ-123
    pub key: String,

    /// Only search pull requests owned by this user or organisation
    #[arg(long)]
    pub owner: Option<String>,

    /// Maximum number of search hits to inspect
    #[arg(long)]
    pub limit: Option<u32>,

    /// Post without the interactive prompt
    #[arg(long, short = 'y', conflicts_with = "dry_run")]
    pub yes: bool,

    /// Print the comment without posting it
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(root: &Path, args: CommentArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let key = paths::normalize_issue_key(&args.key)?;

    let runner = SystemRunner;
    let jira = JiraClient::new(&runner);
    let gh = GhClient::new(&runner);

    let issue = jira.fetch_issue(&key)?;
    if !json {
        println!("{}: {}", issue.key, issue.summary);
    }

    let owner = args.owner.as_deref().or(config.github.owner.as_deref());
    let opts = CollectOptions {
        owner,
        limit: args.limit.unwrap_or(config.github.search_limit),
    };
    let prs = pr_summary::collect(&gh, &key, &opts)
        .with_context(|| format!("failed to collect pull requests for {key}"))?;
    let merged = prs.iter().filter(|p| p.state == PrState::Merged).count();
    tracing::debug!(key = %key, count = prs.len(), merged, "pull requests collected");

    let body = pr_summary::render_comment(&key, &prs).context("failed to render comment")?;

    if args.dry_run {
        if json {
            return print_json(&serde_json::json!({
                "key": key,
                "pull_requests": prs.len(),
                "outcome": "dry_run",
                "body": body,
            }));
        }
        println!();
        print!("{body}");
        if !body.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    };
    let outcome = pr_summary::publish(&jira, &key, &body, confirm.as_mut())
        .with_context(|| format!("failed to comment on {key}"))?;

    if json {
        return print_json(&serde_json::json!({
            "key": key,
            "pull_requests": prs.len(),
            "outcome": outcome,
            "body": body,
        }));
    }
    match outcome {
        PublishOutcome::Posted => println!("Comment posted to {key}."),
        PublishOutcome::Declined => println!("Comment not posted."),
    }
    Ok(())
}
