mod config;
mod plan_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;
mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use planbuddy_core::{ApiClient, GeminiModel, PlanGenerator, PlanSource};
use planbuddy_store::{FileStore, Horizon, PlanStore, PriorityFilter};

use config::{CliOverrides, PlanbuddyConfig};

#[derive(Parser)]
#[command(name = "planbuddy", about = "AI day/week planner: plan relay and client")]
struct Cli {
    /// Relay base URL used by client commands (overrides PLANBUDDY_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the stored plan (overrides PLANBUDDY_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a planbuddy config file
    Init {
        /// Gemini API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Model name (default: gemini-2.5-flash)
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the plan relay HTTP service
    Serve {
        /// Address to bind (overrides PLANBUDDY_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check that the relay is up
    Health,
    /// Generate a new plan for a goal and store it
    Generate {
        /// What you want to get done
        goal: String,
        /// Planning horizon: today or week
        #[arg(long, default_value = "today")]
        horizon: Horizon,
        /// Call the model directly instead of going through the relay
        #[arg(long)]
        direct: bool,
        /// Replace an existing plan without asking (kept if generation fails)
        #[arg(long)]
        force: bool,
    },
    /// Show the stored plan
    Show {
        /// Priority filter: all, high, medium, low
        #[arg(long, default_value = "all")]
        filter: PriorityFilter,
    },
    /// Flip a task between done and not done
    Toggle {
        /// Task ID to toggle
        task_id: String,
    },
    /// Delete the stored plan
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Launch the interactive planner
    App,
}

/// Execute `planbuddy init`: write the config file.
fn cmd_init(api_key: Option<String>, model: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        model: config::ModelSection {
            api_key: api_key.clone(),
            name: model,
            base_url: None,
        },
        ..Default::default()
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    match api_key.as_deref() {
        Some(key) => println!("  model.api_key = {}", mask_key(key)),
        None => println!("  model.api_key not set (GEMINI_API_KEY will be used)"),
    }
    if let Some(name) = &cfg.model.name {
        println!("  model.name = {name}");
    }
    println!();
    println!("Next: run `planbuddy serve` to start the relay.");

    Ok(())
}

/// First and last four characters of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Build the generator that talks to the configured model.
fn build_generator(resolved: &PlanbuddyConfig) -> anyhow::Result<PlanGenerator> {
    let model = GeminiModel::from_config(resolved.require_model()?)?;
    Ok(PlanGenerator::new(Arc::new(model)))
}

/// Where the client gets plans from: the relay, or the model directly.
fn build_source(resolved: &PlanbuddyConfig, direct: bool) -> anyhow::Result<Arc<dyn PlanSource>> {
    if direct {
        Ok(Arc::new(build_generator(resolved)?))
    } else {
        Ok(Arc::new(ApiClient::new(resolved.api_base_url.clone())))
    }
}

fn open_store(resolved: &PlanbuddyConfig) -> PlanStore {
    PlanStore::new(Arc::new(FileStore::from_config(&resolved.store)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so keep log output down to warnings there.
    let default_level = match cli.command {
        Commands::App => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut overrides = CliOverrides {
        api_url: cli.api_url,
        data_dir: cli.data_dir,
        ..Default::default()
    };

    match cli.command {
        Commands::Init {
            api_key,
            model,
            force,
        } => {
            cmd_init(api_key, model, force)?;
        }
        Commands::Serve { bind, port } => {
            overrides.bind = bind;
            overrides.port = port;
            let resolved = PlanbuddyConfig::resolve(&overrides)?;
            let generator = Arc::new(build_generator(&resolved)?);
            serve_cmd::run_serve(generator, &resolved.bind, resolved.port).await?;
        }
        Commands::Health => {
            let resolved = PlanbuddyConfig::resolve(&overrides)?;
            plan_cmds::run_health(&ApiClient::new(resolved.api_base_url)).await?;
        }
        Commands::Generate {
            goal,
            horizon,
            direct,
            force,
        } => {
            let resolved = PlanbuddyConfig::resolve(&overrides)?;
            let source = build_source(&resolved, direct)?;
            plan_cmds::run_generate(open_store(&resolved), source, &goal, horizon, force).await?;
        }
        Commands::Show { filter } => {
            let resolved = PlanbuddyConfig::resolve(&overrides)?;
            plan_cmds::run_show(&open_store(&resolved), filter).await?;
        }
        Commands::Toggle { task_id } => {
            let resolved = PlanbuddyConfig::resolve(&overrides)?;
            plan_cmds::run_toggle(&open_store(&resolved), &task_id).await?;
        }
        Commands::Clear { yes } => {
            let resolved = PlanbuddyConfig::resolve(&overrides)?;
            plan_cmds::run_clear(&open_store(&resolved), yes).await?;
        }
        Commands::App => {
            let resolved = PlanbuddyConfig::resolve(&overrides)?;
            let source = build_source(&resolved, false)?;
            tui::run_app(open_store(&resolved), source).await?;
        }
    }

    Ok(())
}
