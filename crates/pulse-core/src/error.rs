use thiserror::Error;

#[derive(Debug, Error)]
pub enum PulseError {
    #[error("not initialized: run 'pulse init'")]
    NotInitialized,

    #[error("no project given: pass --project or set jira.project in .pulse/config.yaml")]
    NoProject,

    #[error("unknown project '{key}'; valid projects: {}", .valid.join(", "))]
    UnknownProject { key: String, valid: Vec<String> },

    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("invalid issue key '{0}': expected PROJECT-123")]
    InvalidIssueKey(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error("'{tool}' not found on PATH; install it and run '{hint}'")]
    ToolNotFound { tool: String, hint: String },

    #[error("'{tool}' is not authenticated; run '{hint}' and try again")]
    ToolAuth { tool: String, hint: String },

    #[error("'{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("could not parse '{tool}' output: {message}")]
    ToolOutput { tool: String, message: String },

    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("invalid environment variable {name}: {reason}")]
    InvalidEnv { name: String, reason: String },

    #[error("no recipients specified: use --recipients, SMTP_RECIPIENTS, or email.recipients in config")]
    NoRecipients,

    #[error("SMTP authentication failed: check SMTP_USERNAME and SMTP_PASSWORD")]
    SmtpAuth,

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PulseError>;
