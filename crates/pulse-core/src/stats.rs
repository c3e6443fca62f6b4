use crate::config::Config;
use crate::jira::Issue;
use crate::period::ReportPeriod;
use crate::types::StatusBucket;
use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Report model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
    /// Whole percent of all issues; the list always sums to 100 when non-empty.
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportStats {
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
    pub to_do: usize,
    /// `done / total * 100`, one decimal place; `0.0` for an empty report.
    pub completion_rate: f64,
    pub categories: Vec<CategoryCount>,
    pub created_in_period: usize,
    pub resolved_in_period: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportIssue {
    #[serde(flatten)]
    pub issue: Issue,
    pub category: String,
    pub bucket: StatusBucket,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub project: String,
    pub period: ReportPeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub jql: String,
    pub generated_on: NaiveDate,
    pub stats: ReportStats,
    pub issues: Vec<ReportIssue>,
}

pub struct ReportInput<'a> {
    pub project: &'a str,
    pub period: ReportPeriod,
    pub notice: Option<String>,
    pub issues: Vec<Issue>,
    pub generated_on: NaiveDate,
}

impl Report {
    pub fn build(config: &Config, input: ReportInput<'_>) -> Self {
        let jql = input.period.jql(input.project);
        let issues: Vec<ReportIssue> = input
            .issues
            .into_iter()
            .map(|issue| ReportIssue {
                category: config.category_for(&issue.issue_type).to_string(),
                bucket: config.jira.bucket_for(&issue.status, issue.status_category),
                issue,
            })
            .collect();
        let stats = ReportStats::compute(config, &issues, &input.period);
        Report {
            title: config.report.title.clone(),
            project: input.project.to_string(),
            period: input.period,
            notice: input.notice,
            jql,
            generated_on: input.generated_on,
            stats,
            issues,
        }
    }

    pub fn in_bucket(&self, bucket: StatusBucket) -> impl Iterator<Item = &ReportIssue> {
        self.issues.iter().filter(move |i| i.bucket == bucket)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

impl ReportStats {
    pub fn compute(config: &Config, issues: &[ReportIssue], period: &ReportPeriod) -> Self {
        let total = issues.len();
        let count = |b: StatusBucket| issues.iter().filter(|i| i.bucket == b).count();
        let done = count(StatusBucket::Done);
        let in_progress = count(StatusBucket::InProgress);
        let to_do = count(StatusBucket::ToDo);

        let order = config.category_order();
        let counts: Vec<(String, usize)> = order
            .iter()
            .map(|name| {
                let n = issues.iter().filter(|i| i.category == *name).count();
                (name.to_string(), n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();
        let raw: Vec<usize> = counts.iter().map(|(_, n)| *n).collect();
        let percents = largest_remainder_percents(&raw);
        let categories = counts
            .into_iter()
            .zip(percents)
            .map(|((name, count), percent)| CategoryCount {
                name,
                count,
                percent,
            })
            .collect();

        let created_in_period = issues
            .iter()
            .filter(|i| i.issue.created.is_some_and(|d| period.contains(d)))
            .count();
        let resolved_in_period = issues
            .iter()
            .filter(|i| i.issue.resolved.is_some_and(|d| period.contains(d)))
            .count();

        ReportStats {
            total,
            done,
            in_progress,
            to_do,
            completion_rate: completion_rate(done, total),
            categories,
            created_in_period,
            resolved_in_period,
        }
    }
}

pub fn completion_rate(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (done as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Whole-number percentages of `counts` that sum to exactly 100 (or are all
/// zero when the counts are). Leftover points go to the largest fractional
/// remainders; ties go to the earlier entry.
pub fn largest_remainder_percents(counts: &[usize]) -> Vec<u32> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0; counts.len()];
    }
    let mut percents: Vec<u32> = counts.iter().map(|c| (c * 100 / total) as u32).collect();
    let assigned: u32 = percents.iter().sum();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = counts[a] * 100 % total;
        let rb = counts[b] * 100 % total;
        rb.cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take((100 - assigned) as usize) {
        percents[i] += 1;
    }
    percents
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodSource;
    use crate::types::StatusCategory;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn issue(key: &str, ty: &str, status: &str, created: NaiveDate, resolved: Option<NaiveDate>) -> Issue {
        Issue {
            key: key.into(),
            summary: format!("summary of {key}"),
            issue_type: ty.into(),
            status: status.into(),
            status_category: StatusCategory::Unknown,
            created: Some(created),
            resolved,
            assignee: None,
            priority: None,
        }
    }

    fn period() -> ReportPeriod {
        ReportPeriod {
            start: d(1, 1),
            end: d(1, 14),
            source: PeriodSource::Window { days: 14 },
        }
    }

    fn build(issues: Vec<Issue>) -> Report {
        Report::build(
            &Config::default(),
            ReportInput {
                project: "PROJ",
                period: period(),
                notice: None,
                issues,
                generated_on: d(1, 14),
            },
        )
    }

    #[test]
    fn completion_rate_rounds_to_one_decimal() {
        assert_eq!(completion_rate(1, 3), 33.3);
        assert_eq!(completion_rate(2, 3), 66.7);
        assert_eq!(completion_rate(3, 3), 100.0);
        assert_eq!(completion_rate(0, 0), 0.0);
    }

    #[test]
    fn percents_sum_to_hundred() {
        for counts in [
            vec![1, 1, 1],
            vec![2, 1],
            vec![7, 3, 5, 1],
            vec![1; 7],
            vec![33, 33, 34],
            vec![99, 1],
            vec![5],
        ] {
            let p = largest_remainder_percents(&counts);
            assert_eq!(p.iter().sum::<u32>(), 100, "counts {counts:?} gave {p:?}");
        }
    }

    #[test]
    fn percents_favor_largest_remainder_then_order() {
        assert_eq!(largest_remainder_percents(&[1, 1, 1]), vec![34, 33, 33]);
        assert_eq!(largest_remainder_percents(&[2, 1]), vec![67, 33]);
        assert_eq!(largest_remainder_percents(&[1, 2]), vec![33, 67]);
    }

    #[test]
    fn percents_of_nothing_are_zero() {
        assert_eq!(largest_remainder_percents(&[0, 0]), vec![0, 0]);
        assert!(largest_remainder_percents(&[]).is_empty());
    }

    #[test]
    fn report_buckets_and_categories() {
        let report = build(vec![
            issue("PROJ-1", "Story", "Done", d(1, 2), Some(d(1, 5))),
            issue("PROJ-2", "Bug", "In Progress", d(1, 3), None),
            issue("PROJ-3", "Bug", "To Do", d(1, 4), None),
            issue("PROJ-4", "Spike", "Closed", d(12, 1), Some(d(1, 10))),
        ]);
        let s = &report.stats;
        assert_eq!(s.total, 4);
        assert_eq!(s.done, 2);
        assert_eq!(s.in_progress, 1);
        assert_eq!(s.to_do, 1);
        assert_eq!(s.completion_rate, 50.0);
        assert_eq!(s.done + s.in_progress + s.to_do, s.total);

        let names: Vec<&str> = s.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Features", "Bugs", "Other"]);
        let percents: Vec<u32> = s.categories.iter().map(|c| c.percent).collect();
        assert_eq!(percents, vec![25, 50, 25]);
        assert_eq!(s.categories.iter().map(|c| c.count).sum::<usize>(), 4);

        assert_eq!(s.created_in_period, 3);
        assert_eq!(s.resolved_in_period, 2);
    }

    #[test]
    fn empty_report_has_zero_stats() {
        let report = build(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.stats.completion_rate, 0.0);
        assert!(report.stats.categories.is_empty());
        assert!(report.jql.contains("project = \"PROJ\""));
    }

    #[test]
    fn in_bucket_filters() {
        let report = build(vec![
            issue("PROJ-1", "Task", "Done", d(1, 2), Some(d(1, 3))),
            issue("PROJ-2", "Task", "Backlog", d(1, 2), None),
        ]);
        let done: Vec<&str> = report
            .in_bucket(StatusBucket::Done)
            .map(|i| i.issue.key.as_str())
            .collect();
        assert_eq!(done, vec!["PROJ-1"]);
        assert_eq!(report.in_bucket(StatusBucket::ToDo).count(), 1);
        assert_eq!(report.in_bucket(StatusBucket::InProgress).count(), 0);
    }
}
