mod agent;
mod config;
mod error;
mod handlers;
mod routes;
mod state;
mod sweep;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::agent::AgentFactory;
use crate::config::Config;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "text3d-agent", version, about = "Turn object descriptions into structured 3D generation prompts")]
struct Cli {
    /// Path to a YAML or JSON config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Run the pipeline once and print the result
    Generate {
        text: String,
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// Run the pipeline once per temperature and report the results
    Sweep {
        text: String,
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        temperatures: Vec<f32>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("text3d_agent=debug,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let factory = AgentFactory::from_config(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, factory).await,
        Command::Generate { text, temperature } => {
            let temperature = temperature.unwrap_or(config.llm_config.temperature);
            let cancel = cancel_on_ctrl_c();
            let outcome = factory
                .create_agent()
                .generate(&text, temperature, &cancel)
                .await;
            println!("{}", serde_json::to_string_pretty(&outcome.to_dict())?);
            println!("{}", outcome.record.conditioning_string());
            Ok(())
        }
        Command::Sweep {
            text,
            temperatures,
            output,
        } => {
            let temperatures = if temperatures.is_empty() {
                sweep::default_temperatures()
            } else {
                temperatures
            };
            let cancel = cancel_on_ctrl_c();
            let agent = factory.create_agent();
            let rows = sweep::run_sweep(agent.as_ref(), &text, &temperatures, &cancel).await;
            print!("{}", sweep::render_table(&rows));
            if let Some(path) = output {
                sweep::write_report(&path, &rows)?;
            }
            Ok(())
        }
    }
}

async fn serve(config: Config, factory: AgentFactory) -> Result<()> {
    let app_state = AppState::new(config.clone(), factory);
    let shutdown = app_state.shutdown.clone();

    tokio::spawn(app_state.clone().run_eviction());

    let app = routes::build_app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.system_config.host, config.system_config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.system_config.host))?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_ctrl_c().await;
            shutdown.cancel();
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Token cancelled on Ctrl-C, for the one-shot commands.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        wait_for_ctrl_c().await;
        token.cancel();
    });
    cancel
}
