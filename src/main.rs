use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use pdf_converter::{config::Config, create_router, local::convert_local, utils::init_logger, AppState};

/// Convert office documents to PDF with LibreOffice.
#[derive(Parser, Debug)]
#[command(name = "pdf-converter", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Bind address, overrides HOST.
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Convert local files without starting the server.
    Convert {
        /// Documents to convert, in output order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Where to write the PDF or ZIP (defaults to the download name in the current directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let _log_guard = init_logger(&config.logging);

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Convert { files, output } => {
            let state = AppState::new(config);
            let cwd = std::env::current_dir()?;
            convert_local(&state, &files, output, &cwd).await?;
            Ok(())
        }
    }
}

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    info!("Configuration loaded: {:?}", config.server);

    // Create shared state
    let state = AppState::new(config.clone());

    let converter = state.pipeline.converter().status().await;
    if converter.available {
        info!(
            converter = %converter.name,
            version = converter.version.as_deref().unwrap_or("unknown"),
            "Converter available"
        );
    } else {
        warn!(
            program = %config.converter.program.display(),
            detail = converter.detail.as_deref().unwrap_or(""),
            "Converter not available, conversions will fail until it is installed"
        );
    }

    // Create router
    let app = create_router(state);

    // Start server
    let bind = (config.server.host.as_str(), config.server.port);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind.0, bind.1))?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
