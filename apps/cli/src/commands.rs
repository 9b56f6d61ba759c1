//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use catfeed_core::{ImportConfig, ImportResult, ProgressReporter};
use catfeed_shared::{AppConfig, expand_home, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Catfeed: import vendor XML product catalogs.
#[derive(Parser)]
#[command(
    name = "catfeed",
    version,
    about = "Import vendor XML product catalogs into a local database.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Parse a catalog file and upsert its contents into the database.
    Import {
        /// Path to the vendor catalog XML file.
        file: PathBuf,

        /// Parse and print a summary without saving anything.
        #[arg(short, long)]
        dry_run: bool,

        /// Database file path (overrides the configured default).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "catfeed=info",
        1 => "catfeed=debug",
        _ => "catfeed=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import { file, dry_run, db } => cmd_import(file, dry_run, db).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_import(file: PathBuf, dry_run: bool, db: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;

    let db_path = db.unwrap_or_else(|| expand_home(&config.defaults.db_path));

    let import_config = ImportConfig {
        file_path: file.clone(),
        db_path,
        dry_run,
        continue_on_error: config.import.continue_on_error,
    };

    info!(file = %file.display(), dry_run, "importing catalog");

    let reporter = CliProgress::new();
    let result = catfeed_core::run_import(&import_config, &reporter).await?;

    println!();
    if dry_run {
        println!("  Dry run: nothing was saved.");
    } else {
        println!("  Catalog imported successfully!");
    }
    println!("  Groups parsed:   {}", result.groups_parsed);
    println!("  Articles parsed: {}", result.articles_parsed);
    if !dry_run {
        println!("  Groups saved:    {}", result.groups_saved);
        println!("  Articles saved:  {}", result.articles_saved);
        if !result.errors.is_empty() {
            println!("  Failed records:  {}", result.errors.len());
            for (key, error) in &result.errors {
                println!("    {key}: {error}");
            }
        }
    }
    println!("  Time:            {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_saved(&self, key: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Saving [{current}/{total}] {key}"));
    }

    fn done(&self, _result: &ImportResult) {
        self.spinner.finish_and_clear();
    }
}
