use crate::output::print_json;
use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use pulse_core::config::Config;
use pulse_core::email::{self, SmtpSettings};
use pulse_core::PulseError;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct SendArgs {
    /// HTML report to send
    pub file: PathBuf,

    /// Report date for the subject (YYYY-MM-DD); defaults to the date in the file name
    #[arg(long)]
    pub date: Option<String>,

    /// Comma-separated recipients (overrides SMTP_RECIPIENTS and config)
    #[arg(long)]
    pub recipients: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Delivery {
    pub subject: String,
    pub recipients: Vec<String>,
}

pub fn run(root: &Path, args: SendArgs, json: bool) -> anyhow::Result<()> {
    let settings = smtp_settings()?;

    if !args.file.is_file() {
        anyhow::bail!("report file not found: {}", args.file.display());
    }
    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let config = Config::load_or_default(root).context("failed to load config")?;

    let today = chrono::Local::now().date_naive();
    let date = email::report_date_for(&args.file, args.date.as_deref(), today)?;

    let recipients = recipients_for(&config, args.recipients.as_deref())?;

    if !json {
        println!("Sending report for {}", date.format("%Y-%m-%d"));
    }
    let delivery = deliver(&settings, recipients, &html, date)?;

    if json {
        print_json(&delivery)?;
    } else {
        println!("Recipients: {}", delivery.recipients.join(", "));
        println!("Email sent.");
    }
    Ok(())
}

/// Read SMTP settings from the environment. When variables are missing,
/// list every required one with its meaning before failing.
pub fn smtp_settings() -> anyhow::Result<SmtpSettings> {
    match SmtpSettings::from_env() {
        Ok(settings) => {
            tracing::debug!(?settings, "SMTP settings loaded");
            Ok(settings)
        }
        Err(e @ PulseError::MissingEnv(_)) => {
            eprintln!("Required environment variables:");
            for (name, description) in email::REQUIRED_ENV {
                eprintln!("  {name:<18} {description}");
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Recipients from `--recipients`, else `SMTP_RECIPIENTS`, else config.
pub fn recipients_for(config: &Config, cli: Option<&str>) -> anyhow::Result<Vec<String>> {
    let env_recipients = std::env::var(email::RECIPIENTS_ENV).ok();
    Ok(email::resolve_recipients(
        cli,
        env_recipients.as_deref(),
        &config.email.recipients,
    )?)
}

/// Send `html` as the report for `date`.
pub fn deliver(
    settings: &SmtpSettings,
    recipients: Vec<String>,
    html: &str,
    date: NaiveDate,
) -> anyhow::Result<Delivery> {
    let subject = email::subject_for(date);
    email::send_report(settings, html, &subject, &recipients).context("failed to send report")?;
    Ok(Delivery {
        subject,
        recipients,
    })
}
