//! index-provisioner CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use index_provisioner::{
    commands::{
        cmd_check, cmd_provision, cmd_templates, print_check, print_report, wait_until_ready,
        ProvisionOptions,
    },
    config::Config,
    engine::HttpEngineClient,
    error::{Error, Result},
    progress::LogWriterFactory,
    schema::address_places,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "index-provisioner")]
#[command(version, about = "Provision search index schemas and query templates", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Search engine base URL, e.g. http://localhost:9200
    #[arg(long, global = true, env = "ES_URL")]
    es_url: Option<String>,

    /// Target index name
    #[arg(long, global = true, env = "ES_INDEX")]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for the engine, reconcile the index, and upsert query templates
    Init {
        /// Delete an existing index before creating it (stop writers first)
        #[arg(long)]
        force_recreate: bool,

        /// Do not upsert query templates
        #[arg(long)]
        skip_templates: bool,

        /// Skip the readiness gate
        #[arg(long)]
        no_wait: bool,
    },

    /// Report whether the live index matches the desired schema
    Check,

    /// Upsert the query templates only
    Templates {
        /// Skip the readiness gate
        #[arg(long)]
        no_wait: bool,
    },

    /// Wait until the search engine is ready
    Wait,

    /// Print the desired create-index body
    Schema,

    /// Show or write the effective configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the effective configuration to a file
    Init {
        /// Destination (defaults to the user config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Machine-readable runs log JSON lines on stderr, reports go to stdout
    let log_layer = if cli.json {
        fmt::layer()
            .json()
            .with_writer(LogWriterFactory::default())
            .boxed()
    } else {
        fmt::layer().with_writer(LogWriterFactory::default()).boxed()
    };

    tracing_subscriber::registry()
        .with(log_layer)
        .with(filter)
        .init();

    let load_config = || -> Result<Config> {
        let config = Config::load_or_default(cli.config.as_deref())?
            .with_overrides(cli.es_url.clone(), cli.index.clone());
        config.validate()?;
        Ok(config)
    };

    let show_progress = !cli.json;

    match cli.command {
        Commands::Init {
            force_recreate,
            skip_templates,
            no_wait,
        } => {
            let config = load_config()?;
            let client = HttpEngineClient::new(&config)?;
            let options = ProvisionOptions {
                force_recreate,
                manage_templates: config.templates.enabled && !skip_templates,
                wait: !no_wait,
                show_progress,
            };

            let report = cmd_provision(&config, &client, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Check => {
            let config = load_config()?;
            let client = HttpEngineClient::new(&config)?;
            let report = cmd_check(&config, &client).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_check(&report);
            }

            if let Some(e) = report.status_error() {
                std::process::exit(e.exit_code());
            }
        }

        Commands::Templates { no_wait } => {
            let config = load_config()?;
            let client = HttpEngineClient::new(&config)?;
            let applied = cmd_templates(&config, &client, !no_wait, show_progress).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&applied)?);
            } else {
                println!("✓ Templates upserted: {}", applied.join(", "));
            }
        }

        Commands::Wait => {
            let config = load_config()?;
            let client = HttpEngineClient::new(&config)?;
            let status = wait_until_ready(&config, &client, show_progress).await?;

            if cli.json {
                println!(r#"{{"status": "{}"}}"#, status);
            } else {
                println!("✓ Search engine ready (cluster status {})", status);
            }
        }

        Commands::Schema => {
            let config = load_config()?;
            let desired = address_places(&config.index_name, &config.schema)?;
            println!("{}", serde_json::to_string_pretty(&desired.create_body())?);
        }

        Commands::Config { action } => handle_config_action(&load_config()?, action)?,

        // Completions need no configuration
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "index-provisioner", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn handle_config_action(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Init { path, force } => {
            let path = path.unwrap_or_else(Config::default_config_path);
            if path.exists() && !force {
                return Err(Error::Config(format!(
                    "Config file already exists at: {}. Use --force to overwrite.",
                    path.display()
                )));
            }
            config.save(&path)?;
            println!("✓ Config written to {}", path.display());
        }
    }

    Ok(())
}
