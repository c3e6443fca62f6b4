//! SMTP delivery of a rendered HTML report.

use crate::error::{PulseError, Result};
use crate::paths;
use chrono::NaiveDate;
use lettre::message::{Mailbox, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt;
use std::path::Path;

/// Environment variables that must all be set to send mail.
pub const REQUIRED_ENV: &[(&str, &str)] = &[
    ("SMTP_SERVER", "SMTP server hostname"),
    ("SMTP_PORT", "SMTP server port"),
    ("SMTP_USERNAME", "SMTP authentication username"),
    ("SMTP_PASSWORD", "SMTP authentication password"),
    ("SMTP_FROM", "Email sender address"),
    ("SMTP_REQUIRE_TLS", "Use STARTTLS (true/false)"),
];

pub const RECIPIENTS_ENV: &str = "SMTP_RECIPIENTS";

// ---------------------------------------------------------------------------
// SmtpSettings
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    /// STARTTLS on a plain connection; otherwise implicit TLS from the start.
    pub starttls: bool,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("from", &self.from)
            .field("starttls", &self.starttls)
            .finish()
    }
}

impl SmtpSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source. Every missing
    /// variable is reported at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let missing: Vec<String> = REQUIRED_ENV
            .iter()
            .filter(|(name, _)| get(*name).is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PulseError::MissingEnv(missing));
        }
        let value = |name: &str| get(name).unwrap_or_default();

        let port_raw = value("SMTP_PORT");
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| PulseError::InvalidEnv {
                name: "SMTP_PORT".to_string(),
                reason: format!("'{port_raw}' is not a port number"),
            })?;

        Ok(Self {
            server: value("SMTP_SERVER").trim().to_string(),
            port,
            username: value("SMTP_USERNAME"),
            password: value("SMTP_PASSWORD"),
            from: value("SMTP_FROM").trim().to_string(),
            starttls: is_truthy(&value("SMTP_REQUIRE_TLS")),
        })
    }
}

fn is_truthy(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

// ---------------------------------------------------------------------------
// Message details
// ---------------------------------------------------------------------------

/// Report date: explicit value, else the first date in the path, else today.
pub fn report_date_for(path: &Path, explicit: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    if let Some(s) = explicit {
        return paths::parse_date(s);
    }
    Ok(paths::date_in_path(path).unwrap_or(today))
}

/// `JIRA Progress Report - Jan 06, 2026`
pub fn subject_for(date: NaiveDate) -> String {
    format!("JIRA Progress Report - {}", date.format("%b %d, %Y"))
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn parse_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Recipients from the command line, else `SMTP_RECIPIENTS`, else config.
pub fn resolve_recipients(
    cli: Option<&str>,
    env: Option<&str>,
    configured: &[String],
) -> Result<Vec<String>> {
    let from_list = |s: Option<&str>| s.map(parse_recipients).filter(|v| !v.is_empty());
    if let Some(v) = from_list(cli) {
        return Ok(v);
    }
    if let Some(v) = from_list(env) {
        return Ok(v);
    }
    let cfg: Vec<String> = configured
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if cfg.is_empty() {
        return Err(PulseError::NoRecipients);
    }
    Ok(cfg)
}

fn mailbox(addr: &str) -> Result<Mailbox> {
    addr.parse::<Mailbox>()
        .map_err(|e| PulseError::Smtp(format!("invalid address '{addr}': {e}")))
}

/// Build the MIME message without sending it.
pub fn build_message(from: &str, recipients: &[String], subject: &str, html: &str) -> Result<Message> {
    if recipients.is_empty() {
        return Err(PulseError::NoRecipients);
    }
    let mut builder = Message::builder().from(mailbox(from)?).subject(subject);
    for r in recipients {
        builder = builder.to(mailbox(r)?);
    }
    builder
        .singlepart(SinglePart::html(html.to_string()))
        .map_err(|e| PulseError::Smtp(e.to_string()))
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

pub fn send_report(
    settings: &SmtpSettings,
    html: &str,
    subject: &str,
    recipients: &[String],
) -> Result<()> {
    let message = build_message(&settings.from, recipients, subject, html)?;

    tracing::info!(server = %settings.server, port = settings.port, starttls = settings.starttls, "connecting to SMTP server");
    let builder = if settings.starttls {
        SmtpTransport::starttls_relay(&settings.server)
    } else {
        SmtpTransport::relay(&settings.server)
    }
    .map_err(|e| PulseError::Smtp(e.to_string()))?;

    let transport = builder
        .port(settings.port)
        .credentials(Credentials::new(
            settings.username.clone(),
            settings.password.clone(),
        ))
        .build();

    transport.send(&message).map_err(|e| {
        let status = e.status().map(|code| code.to_string());
        smtp_failure(status.as_deref(), e.to_string())
    })?;
    tracing::info!(recipients = recipients.len(), "report email sent");
    Ok(())
}

/// Map an SMTP reply code to an error; 535 is a rejected login.
fn smtp_failure(status: Option<&str>, message: String) -> PulseError {
    match status {
        Some(code) if code.starts_with("535") => PulseError::SmtpAuth,
        _ => PulseError::Smtp(message),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn rejected_login_is_auth_failure() {
        assert!(matches!(
            smtp_failure(Some("535"), "5.7.8 bad credentials".into()),
            PulseError::SmtpAuth
        ));
    }

    #[test]
    fn other_replies_keep_the_message() {
        assert!(matches!(
            smtp_failure(Some("550"), "mailbox unavailable".into()),
            PulseError::Smtp(m) if m == "mailbox unavailable"
        ));
        assert!(matches!(
            smtp_failure(None, "connection refused".into()),
            PulseError::Smtp(m) if m == "connection refused"
        ));
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SMTP_SERVER", "smtp.example.com"),
            ("SMTP_PORT", "587"),
            ("SMTP_USERNAME", "reports"),
            ("SMTP_PASSWORD", "hunter2"),
            ("SMTP_FROM", "reports@example.com"),
            ("SMTP_REQUIRE_TLS", "True"),
        ]
    }

    #[test]
    fn settings_from_complete_env() {
        let s = SmtpSettings::from_lookup(env(&full_env())).unwrap();
        assert_eq!(s.server, "smtp.example.com");
        assert_eq!(s.port, 587);
        assert!(s.starttls);
        assert!(!format!("{s:?}").contains("hunter2"));
    }

    #[test]
    fn all_missing_variables_reported() {
        let err = SmtpSettings::from_lookup(env(&[("SMTP_SERVER", "x"), ("SMTP_PORT", " ")]))
            .unwrap_err();
        match err {
            PulseError::MissingEnv(missing) => assert_eq!(
                missing,
                vec![
                    "SMTP_PORT",
                    "SMTP_USERNAME",
                    "SMTP_PASSWORD",
                    "SMTP_FROM",
                    "SMTP_REQUIRE_TLS"
                ]
            ),
            other => panic!("expected MissingEnv, got {other:?}"),
        }
    }

    #[test]
    fn bad_port_is_invalid_env() {
        let mut vars = full_env();
        vars[1] = ("SMTP_PORT", "smtp");
        assert!(matches!(
            SmtpSettings::from_lookup(env(&vars)),
            Err(PulseError::InvalidEnv { name, .. }) if name == "SMTP_PORT"
        ));
    }

    #[test]
    fn tls_flag_values() {
        for (v, expected) in [("true", true), ("1", true), ("YES", true), ("false", false), ("no", false)] {
            let mut vars = full_env();
            vars[5] = ("SMTP_REQUIRE_TLS", v);
            assert_eq!(SmtpSettings::from_lookup(env(&vars)).unwrap().starttls, expected, "{v}");
        }
    }

    #[test]
    fn subject_uses_short_month() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        assert_eq!(subject_for(date), "JIRA Progress Report - Jan 06, 2026");
    }

    #[test]
    fn report_date_priority() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let named = Path::new("jira-report-2026-01-06.html");
        assert_eq!(
            report_date_for(named, Some("2026-01-10"), today).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
        );
        assert_eq!(
            report_date_for(named, None, today).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 6).unwrap()
        );
        assert_eq!(report_date_for(Path::new("report.html"), None, today).unwrap(), today);
        assert!(matches!(
            report_date_for(named, Some("Jan 10"), today),
            Err(PulseError::InvalidDate(_))
        ));
    }

    #[test]
    fn recipients_parse_and_resolve() {
        assert_eq!(
            parse_recipients(" a@x.com, ,b@x.com "),
            vec!["a@x.com", "b@x.com"]
        );
        let cfg = vec!["cfg@x.com".to_string()];
        assert_eq!(
            resolve_recipients(Some("cli@x.com"), Some("env@x.com"), &cfg).unwrap(),
            vec!["cli@x.com"]
        );
        assert_eq!(
            resolve_recipients(None, Some("env@x.com"), &cfg).unwrap(),
            vec!["env@x.com"]
        );
        assert_eq!(resolve_recipients(Some(" , "), None, &cfg).unwrap(), vec!["cfg@x.com"]);
        assert!(matches!(
            resolve_recipients(None, None, &[]),
            Err(PulseError::NoRecipients)
        ));
    }

    #[test]
    fn message_carries_html_and_all_recipients() {
        let msg = build_message(
            "reports@example.com",
            &["a@example.com".to_string(), "b@example.com".to_string()],
            "JIRA Progress Report - Jan 06, 2026",
            "<h1>Report</h1>",
        )
        .unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("Subject: JIRA Progress Report - Jan 06, 2026"));
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn invalid_address_is_rejected() {
        let err = build_message("not an address", &["a@example.com".to_string()], "s", "h")
            .unwrap_err();
        assert!(err.to_string().contains("invalid address"));
    }
}
