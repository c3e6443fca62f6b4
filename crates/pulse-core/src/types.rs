use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StatusBucket
// ---------------------------------------------------------------------------

/// Coarse progress state an issue is counted under in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Done,
    InProgress,
    ToDo,
}

impl StatusBucket {
    pub fn all() -> &'static [StatusBucket] {
        &[
            StatusBucket::Done,
            StatusBucket::InProgress,
            StatusBucket::ToDo,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusBucket::Done => "done",
            StatusBucket::InProgress => "in_progress",
            StatusBucket::ToDo => "to_do",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusBucket::Done => "Done",
            StatusBucket::InProgress => "In Progress",
            StatusBucket::ToDo => "To Do",
        }
    }
}

impl fmt::Display for StatusBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StatusCategory
// ---------------------------------------------------------------------------

/// Jira's own status category (`statusCategory.key`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    New,
    Indeterminate,
    Done,
    #[default]
    Unknown,
}

impl StatusCategory {
    pub fn from_key(key: &str) -> Self {
        match key.to_ascii_lowercase().as_str() {
            "new" | "to do" => StatusCategory::New,
            "indeterminate" | "in progress" => StatusCategory::Indeterminate,
            "done" => StatusCategory::Done,
            _ => StatusCategory::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// PrState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

impl PrState {
    pub fn as_str(self) -> &'static str {
        match self {
            PrState::Open => "OPEN",
            PrState::Merged => "MERGED",
            PrState::Closed => "CLOSED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrState::Open => "Open",
            PrState::Merged => "Merged",
            PrState::Closed => "Closed",
        }
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PrState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(PrState::Open),
            "MERGED" => Ok(PrState::Merged),
            "CLOSED" => Ok(PrState::Closed),
            other => Err(format!("unknown pull request state '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_order_is_done_first() {
        let all = StatusBucket::all();
        assert_eq!(all[0], StatusBucket::Done);
        assert_eq!(all[2], StatusBucket::ToDo);
    }

    #[test]
    fn bucket_serializes_snake_case() {
        let json = serde_json::to_string(&StatusBucket::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn status_category_from_key() {
        assert_eq!(StatusCategory::from_key("done"), StatusCategory::Done);
        assert_eq!(StatusCategory::from_key("NEW"), StatusCategory::New);
        assert_eq!(
            StatusCategory::from_key("indeterminate"),
            StatusCategory::Indeterminate
        );
        assert_eq!(StatusCategory::from_key("weird"), StatusCategory::Unknown);
    }

    #[test]
    fn pr_state_parses_any_case() {
        assert_eq!("merged".parse::<PrState>().unwrap(), PrState::Merged);
        assert_eq!("OPEN".parse::<PrState>().unwrap(), PrState::Open);
        assert!("draft".parse::<PrState>().is_err());
    }

    #[test]
    fn pr_state_json_uppercase() {
        let parsed: PrState = serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(parsed, PrState::Closed);
    }
}
