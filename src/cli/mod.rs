use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;

use crate::infra::config::Config;
use crate::tools::registry::ToolRegistry;

#[derive(Parser)]
#[command(name = "mcp-db-gateway")]
#[command(about = "MCP gateway for PocketBase and MySQL")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Health check a running gateway
    Health {
        /// Gateway URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Print the tool table of one variant as JSON
    Tools {
        #[arg(short, long, value_enum)]
        variant: Variant,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting the server
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    Pocketbase,
    Mysql,
}

impl Variant {
    fn registry(self) -> &'static ToolRegistry {
        match self {
            Variant::Pocketbase => &crate::tools::pocketbase::REGISTRY,
            Variant::Mysql => &crate::tools::mysql::REGISTRY,
        }
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => {
            let cfg = match Config::load() {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("❌ Failed to load configuration: {e:#}");
                    return ExitCode::FAILURE;
                }
            };
            match crate::infra::boot::run_server(cfg).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "server exited with error");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Tools { variant } => {
            println!("{}", tool_table(variant));
            ExitCode::SUCCESS
        }
        Commands::Config { validate: _ } => match validate_config() {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("  Port: {}", cfg.port);
                println!(
                    "  MySQL default: {}@{}:{}/{}",
                    cfg.mysql.user, cfg.mysql.host, cfg.mysql.port, cfg.mysql.dbname
                );
                println!(
                    "  HTTP timeouts: connect {}ms, total {}ms",
                    cfg.http.connect_timeout_ms, cfg.http.timeout_ms
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url.trim_end_matches('/')))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn tool_table(variant: Variant) -> String {
    let listing = variant.registry().list();
    serde_json::to_string_pretty(&listing).unwrap_or_else(|_| listing.to_string())
}

fn validate_config() -> Result<Config, Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    cfg.validate()?;
    Ok(cfg)
}
