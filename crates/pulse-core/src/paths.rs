use crate::error::{PulseError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PULSE_DIR: &str = ".pulse";
pub const CONFIG_FILE: &str = ".pulse/config.yaml";

pub const REPORT_PREFIX: &str = "jira-report-";
pub const REPORT_EXT: &str = "html";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pulse_dir(root: &Path) -> PathBuf {
    root.join(PULSE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// `jira-report-YYYY-MM-DD.html`
pub fn report_file_name(date: NaiveDate) -> String {
    format!("{REPORT_PREFIX}{}.{REPORT_EXT}", date.format("%Y-%m-%d"))
}

pub fn report_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(report_file_name(date))
}

// ---------------------------------------------------------------------------
// Dates embedded in file names
// ---------------------------------------------------------------------------

static DATE_RE: OnceLock<Regex> = OnceLock::new();

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap())
}

/// First `YYYY-MM-DD` anywhere in `path`, as given, that is a real calendar
/// date. Directory components count: `reports/2025-12-01/report.html` is
/// dated 2025-12-01.
pub fn date_in_path(path: &Path) -> Option<NaiveDate> {
    let text = path.to_string_lossy();
    date_re()
        .captures_iter(&text)
        .find_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| PulseError::InvalidDate(s.to_string()))
}

// ---------------------------------------------------------------------------
// Issue key validation
// ---------------------------------------------------------------------------

static ISSUE_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn issue_key_re() -> &'static Regex {
    ISSUE_KEY_RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*-[0-9]+$").unwrap())
}

/// Normalise an issue key to upper case and check it looks like `PROJ-123`.
pub fn normalize_issue_key(key: &str) -> Result<String> {
    let upper = key.trim().to_ascii_uppercase();
    if !issue_key_re().is_match(&upper) {
        return Err(PulseError::InvalidIssueKey(key.to_string()));
    }
    Ok(upper)
}

/// Project part of an issue key (`PROJ` for `PROJ-123`).
pub fn project_of(key: &str) -> Option<&str> {
    key.rsplit_once('-').map(|(p, _)| p)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.pulse/config.yaml")
        );
        let date = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        assert_eq!(
            report_path(Path::new("out"), date),
            PathBuf::from("out/jira-report-2026-01-06.html")
        );
    }

    #[test]
    fn date_extracted_from_report_name() {
        let date = date_in_path(Path::new("/x/jira-report-2026-01-06.html"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 6));
    }

    #[test]
    fn date_in_directory_component_counts() {
        let date = date_in_path(Path::new("/reports/2025-12-01/report.html"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 1));
    }

    #[test]
    fn first_date_in_path_wins() {
        let date = date_in_path(Path::new("reports/2025-12-01/jira-report-2026-01-06.html"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 1));
    }

    #[test]
    fn impossible_dates_are_skipped() {
        let date = date_in_path(Path::new("2026-13-45-then-2026-02-03.html"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 3));
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("2026-01-06").is_ok());
        assert!(matches!(
            parse_date("06/01/2026"),
            Err(PulseError::InvalidDate(_))
        ));
    }

    #[test]
    fn issue_keys_are_normalized() {
        assert_eq!(normalize_issue_key(" proj-42 ").unwrap(), "PROJ-42");
        assert_eq!(normalize_issue_key("AB2_X-7").unwrap(), "AB2_X-7");
        for bad in ["", "PROJ", "PROJ-", "-12", "12-PROJ", "PROJ 12"] {
            assert!(normalize_issue_key(bad).is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn project_of_key() {
        assert_eq!(project_of("PROJ-42"), Some("PROJ"));
        assert_eq!(project_of("nodash"), None);
    }
}
