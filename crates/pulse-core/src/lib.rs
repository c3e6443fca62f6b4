pub mod config;
pub mod email;
pub mod error;
pub mod github;
pub mod html;
pub mod io;
pub mod jira;
pub mod paths;
pub mod period;
pub mod pr_summary;
pub mod stats;
pub mod template;
pub mod tool_runner;
pub mod types;

pub use error::{PulseError, Result};
