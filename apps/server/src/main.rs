use anyhow::Context;
use clap::{Parser, Subcommand};
use gatehouse_api::{build_router, AppState};
use gatehouse_config::load as load_config;
use gatehouse_runtime::{check_jwt_secret, telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "gatehouse-server")]
#[command(about = "Gatehouse registration and approval server (serves by default)")]
struct Cli {
    /// Start even when the built-in development JWT secret is configured
    #[arg(long, global = true)]
    allow_dev_secret: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(cli.allow_dev_secret).await,
    }
}

async fn run_server(allow_dev_secret: bool) -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Gatehouse server");

    let config = load_config().context("failed to load configuration")?;
    check_jwt_secret(&config, allow_dev_secret)?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = AppState::new(services.authenticator.clone());
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(gatehouse_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("server shut down");
    Ok(())
}
