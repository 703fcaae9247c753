use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use rusty_canvas_core::config::{Config, GatewayConfig, LoggingConfig};
use rusty_canvas_gateway::GatewayState;

#[derive(Parser)]
#[command(
    name = "rusty-canvas",
    about = "HTTP canvas server: create canvases, draw shapes and text, export HTML or PNG",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the canvas server
    Serve {
        /// Port to listen on (default: $PORT, then config, then 6969)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,

        /// Only allow this CORS origin
        #[arg(long)]
        cors_origin: Option<String>,
    },

    /// Show resolved settings
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a specific config value
    Get { key: String },
    /// Check the configuration for problems
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);

    let mut config = Config::load(&config_path)?;

    init_logging(cli.verbose, config.logging.as_ref());

    match cli.command {
        Commands::Serve {
            port,
            bind,
            cors_origin,
        } => {
            let port = config.listen_port(port);
            let bind = bind.unwrap_or_else(|| config.bind_addr());
            if let Some(origin) = cors_origin {
                config
                    .gateway
                    .get_or_insert_with(|| GatewayConfig {
                        port,
                        bind: None,
                        cors_origin: None,
                    })
                    .cors_origin = Some(origin);
            }

            let (warnings, errors) = config.validate();
            for warning in &warnings {
                tracing::warn!("Config: {warning}");
            }
            if !errors.is_empty() {
                anyhow::bail!("Invalid configuration: {}", errors.join("; "));
            }

            tracing::info!(config = %config_path.display(), "Starting Rusty Canvas on {bind}:{port}");
            let state = Arc::new(GatewayState::new(config)?);
            rusty_canvas_gateway::start_gateway(state, &bind, port).await?;
        }
        Commands::Status => {
            println!("Rusty Canvas v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", config_path.display());
            println!("Port: {}", config.listen_port(None));
            println!("Bind: {}", config.bind_addr());
            let (max_width, max_height) = config.max_dimensions();
            println!("Max canvas size: {max_width}x{max_height}");
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
            ConfigAction::Get { key } => match config.get_path(&key) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => anyhow::bail!("No config value at '{key}'"),
            },
            ConfigAction::Validate => {
                let (warnings, errors) = config.validate();
                for warning in &warnings {
                    println!("warning: {warning}");
                }
                for error in &errors {
                    println!("error: {error}");
                }
                if !errors.is_empty() {
                    anyhow::bail!("{} configuration error(s)", errors.len());
                }
                println!("Config OK: {}", config_path.display());
            }
        },
    }

    Ok(())
}

/// Install the global tracing subscriber.
fn init_logging(verbose: bool, logging: Option<&LoggingConfig>) {
    let directives = filter_directives(std::env::var("RUST_LOG").ok(), verbose, logging);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{directives}': {e}");
        EnvFilter::new("info")
    });

    let writer = match logging.map(|l| l.output.as_str()) {
        Some("stdout") => BoxMakeWriter::new(std::io::stdout),
        _ => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    if logging.is_some_and(|l| l.format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level. Config filters are appended.
fn filter_directives(rust_log: Option<String>, verbose: bool, logging: Option<&LoggingConfig>) -> String {
    let base = rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| {
            if verbose {
                "debug".to_string()
            } else {
                logging
                    .and_then(|l| l.level.clone())
                    .unwrap_or_else(|| "info".to_string())
            }
        });

    let mut directives = vec![base];
    if let Some(logging) = logging {
        directives.extend(logging.filters.iter().cloned());
    }
    directives.join(",")
}
