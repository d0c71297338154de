//! deploy-view CLI - watch a blueprint deployment

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deploy_view::config::DeployViewConfig;
use deploy_view::engine::{demo_changeset, EventSource, DEMO_INSTANCE_ID};
use deploy_view::{
    run_headless, tui, BlueprintChanges, DeployEngine, DeployTree, DeployViewError, FixSuggestion,
    MockEngine, ReplayEngine,
};

#[derive(Parser)]
#[command(name = "deploy-view")]
#[command(about = "Watch blueprint deployments from the terminal")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded deploy event stream (NDJSON, one event per line)
    Watch {
        /// Events file, or `-` for stdin
        #[arg(short, long)]
        events: PathBuf,

        /// Changeset that was deployed (JSON or YAML)
        #[arg(short, long)]
        changeset: Option<PathBuf>,

        /// Instance state JSON shown once the deployment finishes
        #[arg(long)]
        instance_state: Option<PathBuf>,

        /// Root instance ID (taken from the first event when omitted)
        #[arg(long)]
        instance_id: Option<String>,

        /// Delay between replayed events
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Watch a simulated deployment
    Demo {
        /// Simulate a failing update followed by a rollback
        #[arg(long)]
        fail: bool,

        /// Delay between simulated events
        #[arg(long, default_value_t = 350)]
        pace_ms: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Print a line log instead of the interactive view
    #[arg(long)]
    headless: bool,

    /// Disable colours in headless output
    #[arg(long)]
    no_color: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(suggestion) = e
                .downcast_ref::<DeployViewError>()
                .and_then(|e| e.fix_suggestion())
            {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded (a failed deployment is `Ok(false)`)
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(DeployViewConfig::config_path);
    let mut config = DeployViewConfig::load_from(&config_path)?.with_env();

    match cli.command {
        Commands::Watch {
            events,
            changeset,
            instance_state,
            instance_id,
            pace_ms,
            output,
        } => {
            let changes = match &changeset {
                Some(path) => BlueprintChanges::load(path)
                    .with_context(|| format!("loading changeset {}", path.display()))?,
                None => BlueprintChanges::default(),
            };
            let tree = DeployTree::from_changeset(instance_id, &changes);

            let mut engine = ReplayEngine::new(EventSource::from_arg(&events))
                .with_pace(Duration::from_millis(pace_ms));
            if let Some(path) = instance_state {
                engine = engine.with_instance_state(path);
            }

            let headless = apply_output_args(&mut config, &output);
            view(Arc::new(engine), tree, &config, headless).await
        }
        Commands::Demo {
            fail,
            pace_ms,
            output,
        } => {
            let engine = MockEngine::new()
                .with_pace(Duration::from_millis(pace_ms))
                .with_failure(fail);
            let tree = DeployTree::from_changeset(Some(DEMO_INSTANCE_ID.into()), &demo_changeset());

            let headless = apply_output_args(&mut config, &output);
            view(Arc::new(engine), tree, &config, headless).await
        }
        Commands::Config { action } => {
            match action.unwrap_or(ConfigAction::Show) {
                ConfigAction::Show => print!("{}", config.to_toml()?),
                ConfigAction::Path => println!("{}", config_path.display()),
                ConfigAction::Init { force } => {
                    if config_path.exists() && !force {
                        anyhow::bail!(
                            "{} already exists (use --force to overwrite)",
                            config_path.display()
                        );
                    }
                    DeployViewConfig::default().save_to(&config_path)?;
                    println!("{} Wrote {}", "✓".green(), config_path.display());
                }
            }
            Ok(true)
        }
    }
}

/// Fold CLI output flags into the config; returns whether to run headless
fn apply_output_args(config: &mut DeployViewConfig, output: &OutputArgs) -> bool {
    if output.no_color {
        config.headless.color = false;
    }
    if !config.headless.color {
        colored::control::set_override(false);
    }
    output.headless || config.headless.always || !io::stdout().is_terminal()
}

async fn view(
    engine: Arc<dyn DeployEngine>,
    tree: DeployTree,
    config: &DeployViewConfig,
    headless: bool,
) -> anyhow::Result<bool> {
    init_tracing(config, headless);

    let tree = if headless {
        run_headless(engine.as_ref(), tree, &config.headless, io::stdout()).await?
    } else {
        tui::run(engine, tree, config.ui.clone()).await?
    };

    let succeeded = tree.succeeded();
    info!(succeeded, items = tree.items().len(), "deployment view closed");
    Ok(succeeded)
}

/// Headless logs go to stderr; the interactive view logs to a file so
/// nothing is written over the screen it draws
fn init_tracing(config: &DeployViewConfig, headless: bool) {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(io::stderr)
            .init();
        return;
    }

    let path = config.log_file();
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(e) => {
            // No subscriber: logging is dropped rather than drawn over the TUI
            eprintln!("{} cannot open log file {}: {}", "Warning:".yellow(), path.display(), e);
        }
    }
}
