mod cmd;
mod confirm;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{comment::CommentArgs, config::ConfigSubcommand, report::ReportArgs, send::SendArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pulse",
    about = "Jira progress reports and pull request summaries, driven through the jira and gh CLIs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .pulse/ or .git/)
    #[arg(long, global = true, env = "PULSE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log debug output to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .pulse/config.yaml in the current project
    Init {
        /// Default Jira project key
        #[arg(long)]
        project: Option<String>,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// List the Jira projects visible to the jira CLI
    Projects,

    /// Build the HTML progress report for a project
    Report(ReportArgs),

    /// Summarise pull requests referencing an issue and post it as a comment
    Comment(CommentArgs),

    /// Email a rendered HTML report over SMTP
    Send(SendArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { project } => cmd::init::run(&root, project.as_deref(), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Projects => cmd::projects::run(cli.json),
        Commands::Report(args) => cmd::report::run(&root, args, cli.json),
        Commands::Comment(args) => cmd::comment::run(&root, args, cli.json),
        Commands::Send(args) => cmd::send::run(&root, args, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
