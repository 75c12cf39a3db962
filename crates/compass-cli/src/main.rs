mod cmd;
mod handlers;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "compass",
    about = "Directive flow graph — guide agents through orchestration directives over MCP",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .compass/ or .git/)
    #[arg(long, global = true, env = "COMPASS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize compass in the current project
    Init {
        /// Project name (default: root directory name)
        #[arg(long)]
        project: Option<String>,
    },

    /// Run as an MCP stdio server
    Serve,

    /// List the registered tools and their parameters
    Catalog,

    /// Sequential next steps from a directive
    Next {
        /// Directive to query (omit to use the active one)
        #[arg(long = "for")]
        directive: Option<String>,

        /// Show conditional paths instead of sequential steps
        #[arg(long)]
        conditional: bool,
    },

    /// Search wildcard reference consultations
    Refs {
        /// Intent keyword to match against directive keywords
        #[arg(long)]
        keyword: Option<String>,

        /// Filter by directive category (orchestration or reference)
        #[arg(long)]
        category: Option<String>,

        /// Regex over directive name and description
        #[arg(long)]
        pattern: Option<String>,
    },

    /// Show project state
    State,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // Logs go to stderr: stdout is the JSON-RPC transport when serving.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let result = match cli.command {
        Commands::Init { project } => cmd::init::run(&root, project.as_deref()),
        Commands::Serve => cmd::serve::run(&root),
        Commands::Catalog => cmd::catalog::run(&root, cli.json),
        Commands::Next {
            directive,
            conditional,
        } => cmd::next::run(&root, directive.as_deref(), conditional, cli.json),
        Commands::Refs {
            keyword,
            category,
            pattern,
        } => cmd::refs::run(
            &root,
            keyword.as_deref(),
            category.as_deref(),
            pattern.as_deref(),
            cli.json,
        ),
        Commands::State => cmd::state::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
