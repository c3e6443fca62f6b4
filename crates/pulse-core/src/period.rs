use crate::error::{PulseError, Result};
use crate::jira::JiraClient;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

// ---------------------------------------------------------------------------
// ReportPeriod
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeriodSource {
    Sprint { id: u64, name: String },
    Window { days: u32 },
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    pub source: PeriodSource,
}

impl ReportPeriod {
    pub fn explicit(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PulseError::InvalidPeriod(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self {
            start,
            end,
            source: PeriodSource::Explicit,
        })
    }

    /// The `days`-day range ending on `today`, inclusive of both ends.
    pub fn window(days: u32, today: NaiveDate) -> Result<Self> {
        if days == 0 {
            return Err(PulseError::InvalidPeriod(
                "window must cover at least one day".to_string(),
            ));
        }
        Ok(Self {
            start: today - Duration::days(i64::from(days) - 1),
            end: today,
            source: PeriodSource::Window { days },
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Human description, e.g. `Sprint 7 (2026-01-05 to 2026-01-18)`.
    pub fn describe(&self) -> String {
        let range = format!(
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        );
        match &self.source {
            PeriodSource::Sprint { name, .. } => format!("{name} ({range})"),
            PeriodSource::Window { days } => format!("Last {days} days ({range})"),
            PeriodSource::Explicit => range,
        }
    }

    /// JQL selecting the issues this period reports on.
    pub fn jql(&self, project: &str) -> String {
        let scope = match &self.source {
            PeriodSource::Sprint { id, .. } => format!("sprint = {id}"),
            _ => format!(
                "updated >= \"{}\" AND updated < \"{}\"",
                self.start.format("%Y-%m-%d"),
                (self.end + Duration::days(1)).format("%Y-%m-%d")
            ),
        };
        format!("project = \"{project}\" AND {scope} ORDER BY created DESC")
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// How the caller asked for the period.
#[derive(Debug, Clone, Default)]
pub struct PeriodRequest {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub days: Option<u32>,
}

/// A resolved period plus any advisory notice to show the user.
#[derive(Debug, Clone)]
pub struct ResolvedPeriod {
    pub period: ReportPeriod,
    pub notice: Option<String>,
}

/// Resolve the reporting period.
///
/// Priority:
/// 1. explicit `from`/`to` (a missing `to` means today)
/// 2. `days` window ending today
/// 3. the project's active sprint (when a Jira client is available)
/// 4. the fallback window, with a notice saying so
pub fn resolve_period(
    jira: Option<&JiraClient<'_>>,
    project: &str,
    request: &PeriodRequest,
    fallback_days: u32,
    today: NaiveDate,
) -> Result<ResolvedPeriod> {
    if let Some(from) = request.from {
        let to = request.to.unwrap_or(today);
        return Ok(ResolvedPeriod {
            period: ReportPeriod::explicit(from, to)?,
            notice: None,
        });
    }
    if request.to.is_some() {
        return Err(PulseError::InvalidPeriod(
            "--to requires --from".to_string(),
        ));
    }
    if let Some(days) = request.days {
        return Ok(ResolvedPeriod {
            period: ReportPeriod::window(days, today)?,
            notice: None,
        });
    }

    if let Some(client) = jira {
        match client.active_sprint(project) {
            Ok(Some(sprint)) => {
                let start = sprint.start.unwrap_or(today);
                let end = sprint.end.unwrap_or(today).max(start);
                tracing::info!(sprint = %sprint.name, "using active sprint");
                return Ok(ResolvedPeriod {
                    period: ReportPeriod {
                        start,
                        end,
                        source: PeriodSource::Sprint {
                            id: sprint.id,
                            name: sprint.name,
                        },
                    },
                    notice: None,
                });
            }
            Ok(None) => tracing::info!(project, "no active sprint"),
            Err(e @ PulseError::ToolAuth { .. }) | Err(e @ PulseError::ToolNotFound { .. }) => {
                return Err(e)
            }
            Err(e) => tracing::warn!(project, error = %e, "sprint lookup failed"),
        }
    }

    let period = ReportPeriod::window(fallback_days, today)?;
    let range = format!(
        "{} to {}",
        period.start.format("%Y-%m-%d"),
        period.end.format("%Y-%m-%d")
    );
    let notice = if jira.is_some() {
        let notice = format!(
            "No active sprint found for {project}; using the last {fallback_days} days ({range})."
        );
        tracing::warn!("{notice}");
        notice
    } else {
        tracing::info!(project, "no sprint lookup for offline issues");
        format!("No period given for offline issues; using the last {fallback_days} days ({range}).")
    };
    Ok(ResolvedPeriod {
        period,
        notice: Some(notice),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_runner::testing::ScriptedRunner;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_is_inclusive() {
        let p = ReportPeriod::window(14, d(2026, 1, 14)).unwrap();
        assert_eq!(p.start, d(2026, 1, 1));
        assert_eq!(p.days(), 14);
        assert!(p.contains(d(2026, 1, 1)));
        assert!(p.contains(d(2026, 1, 14)));
        assert!(!p.contains(d(2026, 1, 15)));
    }

    #[test]
    fn zero_window_rejected() {
        assert!(ReportPeriod::window(0, d(2026, 1, 1)).is_err());
    }

    #[test]
    fn explicit_rejects_reversed_range() {
        assert!(matches!(
            ReportPeriod::explicit(d(2026, 2, 1), d(2026, 1, 1)),
            Err(PulseError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn window_jql_uses_exclusive_upper_bound() {
        let p = ReportPeriod::explicit(d(2026, 1, 1), d(2026, 1, 14)).unwrap();
        assert_eq!(
            p.jql("PROJ"),
            "project = \"PROJ\" AND updated >= \"2026-01-01\" AND updated < \"2026-01-15\" ORDER BY created DESC"
        );
    }

    #[test]
    fn sprint_jql_uses_sprint_id() {
        let p = ReportPeriod {
            start: d(2026, 1, 5),
            end: d(2026, 1, 18),
            source: PeriodSource::Sprint {
                id: 42,
                name: "Sprint 7".into(),
            },
        };
        assert_eq!(
            p.jql("PROJ"),
            "project = \"PROJ\" AND sprint = 42 ORDER BY created DESC"
        );
        assert_eq!(p.describe(), "Sprint 7 (2026-01-05 to 2026-01-18)");
    }

    #[test]
    fn explicit_request_skips_sprint_lookup() {
        let runner = ScriptedRunner::new();
        let client = JiraClient::new(&runner);
        let req = PeriodRequest {
            from: Some(d(2026, 1, 1)),
            to: None,
            days: None,
        };
        let resolved = resolve_period(Some(&client), "PROJ", &req, 14, d(2026, 1, 10)).unwrap();
        assert_eq!(resolved.period.end, d(2026, 1, 10));
        assert_eq!(resolved.period.source, PeriodSource::Explicit);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn to_without_from_is_rejected() {
        let req = PeriodRequest {
            from: None,
            to: Some(d(2026, 1, 1)),
            days: None,
        };
        assert!(resolve_period(None, "PROJ", &req, 14, d(2026, 1, 10)).is_err());
    }

    #[test]
    fn active_sprint_wins_over_window() {
        let runner = ScriptedRunner::new()
            .respond("42\tSprint 7\t2026-01-05 09:00\t2026-01-18 17:00\tactive\n");
        let client = JiraClient::new(&runner);
        let resolved =
            resolve_period(Some(&client), "PROJ", &PeriodRequest::default(), 14, d(2026, 1, 10))
                .unwrap();
        assert!(resolved.notice.is_none());
        assert_eq!(resolved.period.start, d(2026, 1, 5));
        assert!(matches!(
            resolved.period.source,
            PeriodSource::Sprint { id: 42, .. }
        ));
    }

    #[test]
    fn missing_sprint_falls_back_with_notice() {
        let runner = ScriptedRunner::new().respond("");
        let client = JiraClient::new(&runner);
        let resolved =
            resolve_period(Some(&client), "PROJ", &PeriodRequest::default(), 14, d(2026, 1, 14))
                .unwrap();
        assert_eq!(resolved.period.source, PeriodSource::Window { days: 14 });
        assert_eq!(resolved.period.start, d(2026, 1, 1));
        let notice = resolved.notice.unwrap();
        assert!(notice.contains("No active sprint found for PROJ"));
        assert!(notice.contains("14 days"));
    }

    #[test]
    fn offline_fallback_does_not_mention_a_sprint() {
        let today = d(2026, 1, 14);
        let resolved =
            resolve_period(None, "PROJ", &PeriodRequest::default(), 14, today).unwrap();
        assert_eq!(resolved.period.source, PeriodSource::Window { days: 14 });
        let notice = resolved.notice.unwrap();
        assert!(!notice.contains("sprint"), "{notice}");
        assert!(notice.contains("last 14 days (2026-01-01 to 2026-01-14)"));
    }

    #[test]
    fn sprint_lookup_failure_falls_back() {
        let runner = ScriptedRunner::new().fail(PulseError::ToolFailed {
            tool: "jira".into(),
            message: "board not found".into(),
        });
        let client = JiraClient::new(&runner);
        let resolved =
            resolve_period(Some(&client), "PROJ", &PeriodRequest::default(), 7, d(2026, 1, 14))
                .unwrap();
        assert_eq!(resolved.period.source, PeriodSource::Window { days: 7 });
        assert!(resolved.notice.is_some());
    }

    #[test]
    fn sprint_lookup_auth_failure_propagates() {
        let runner = ScriptedRunner::new().fail(PulseError::ToolAuth {
            tool: "jira".into(),
            hint: "jira init".into(),
        });
        let client = JiraClient::new(&runner);
        let err =
            resolve_period(Some(&client), "PROJ", &PeriodRequest::default(), 14, d(2026, 1, 14))
                .unwrap_err();
        assert!(err.to_string().contains("jira init"));
    }
}
