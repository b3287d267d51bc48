pub mod api;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod model;
pub mod search;
pub mod session;
pub mod ui;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{ClientConfig, ConfigOverrides};
use search::query::Category;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "studyscope",
    version,
    about = "Search clinical studies, indications and procedures and collect their data products"
)]
pub struct Cli {
    /// Backend origin, e.g. https://studies.example.org
    #[arg(long, global = true, env = "STUDYSCOPE_BASE_URL")]
    pub base_url: Option<String>,

    /// Directory for credentials, logs and UI state
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch interactive TUI
    Tui {
        /// Render once and exit (headless-friendly)
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Forget persisted UI preferences before starting
        #[arg(long, default_value_t = false)]
        reset_state: bool,
    },
    /// Run a search and print one page of results
    Search(SearchArgs),
    /// Show autosuggestions for partial input
    Suggest {
        /// Partial text; fewer than two characters yields nothing
        text: String,
    },
    /// Manage collections
    #[command(subcommand)]
    Collections(CollectionsCommand),
    /// Run a search and record it as a saved search
    SaveSearch(QueryArgs),
    /// Saved searches
    #[command(subcommand)]
    Saved(SavedCommand),
    /// Recorded search history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Store a bearer token, either given directly or obtained with email/password
    Login {
        #[arg(long, conflicts_with = "token", requires = "password")]
        email: Option<String>,
        #[arg(long, env = "STUDYSCOPE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Store this token as-is
        #[arg(long)]
        token: Option<String>,
    },
    /// Create an account and store its token
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "STUDYSCOPE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Remove the stored token
    Logout,
    /// Check that the backend answers
    Health,
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

/// Terms, category and filters shared by `search` and `save-search`.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Up to three terms, OR-joined
    #[arg(required = true, num_args = 1..)]
    pub terms: Vec<String>,

    #[arg(long, value_enum, default_value_t = Category::All)]
    pub category: Category,

    /// Filter as name=value (e.g. phase=III, risk_level=high); repeatable
    #[arg(long = "filter", value_name = "NAME=VALUE")]
    pub filters: Vec<String>,

    /// 1-based page
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Check a data product from the results; repeatable
    #[arg(long = "select", value_name = "PRODUCT_ID")]
    pub select: Vec<i64>,

    /// Add the checked products to this collection
    #[arg(long, value_name = "COLLECTION_ID", requires = "select")]
    pub add_to: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum CollectionsCommand {
    /// List your collections
    List,
    /// Create a collection
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add data products to a collection
    Add {
        collection_id: i64,
        #[arg(required = true, num_args = 1..)]
        product_ids: Vec<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SavedCommand {
    List,
    /// Execute a saved search and print its results
    Run { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    List,
    /// Mark a history entry as saved
    Save { id: i64 },
}

/// Stderr logging for one-shot commands; a daily log file under the data
/// dir for the TUI, which owns the terminal.
fn init_tracing(config: &ClientConfig, to_file: bool) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studyscope=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let log_dir = config.log_dir();
    if to_file && std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "studyscope.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .try_init();
        Some(guard)
    } else {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
        None
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = ClientConfig::load(&ConfigOverrides {
        config_path: cli.config.clone(),
        base_url: cli.base_url.clone(),
        data_dir: cli.data_dir.clone(),
    })?;
    let _log_guard = init_tracing(&config, matches!(cli.command, Commands::Tui { .. }));
    let ctx = commands::CliContext {
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::Tui { once, reset_state } => {
            ui::tui::run_tui(&ctx.config, once, reset_state).await
        }
        Commands::Search(args) => commands::search(&ctx, args).await,
        Commands::Suggest { text } => commands::suggest(&ctx, &text).await,
        Commands::Collections(cmd) => commands::collections(&ctx, cmd).await,
        Commands::SaveSearch(args) => commands::save_search(&ctx, args).await,
        Commands::Saved(cmd) => commands::saved(&ctx, cmd).await,
        Commands::History(cmd) => commands::history(&ctx, cmd).await,
        Commands::Login {
            email,
            password,
            token,
        } => commands::login(&ctx, email, password, token).await,
        Commands::Register {
            email,
            username,
            password,
        } => {
            let account = model::types::NewAccount {
                email,
                username,
                password,
            };
            commands::register(&ctx, &account).await
        }
        Commands::Logout => commands::logout(&ctx),
        Commands::Health => commands::health(&ctx).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "studyscope", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}
