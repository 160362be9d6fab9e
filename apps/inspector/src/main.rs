use inspector::connection_info::ConnectionInfo;
use inspector::error::InspectorAppError;
use inspector::logger::initialize as LoggerInitialize;
use inspector::paths::{detect_inspector_paths, load_dotenv};

use inspector_core::config::InspectorConfig;
use inspector_core::console::ConsoleHandle;
use inspector_core::ipc::start_ipc_server;
use inspector_core::transport::ChannelTransport;

use common::ErrorLocation;

use std::panic::Location;
use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The logger may not be up yet
            eprintln!("{e}");
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), InspectorAppError> {
    let dotenv_path = load_dotenv();

    let paths = detect_inspector_paths()?;
    paths.ensure_exist()?;

    // Initialize logger FIRST
    LoggerInitialize(&paths.log_dir)?;

    info!("A2A inspector starting");
    info!("Config directory: {}", paths.config_dir.display());
    info!("Log directory: {}", paths.log_dir.display());
    if let Some(path) = dotenv_path {
        info!("Loaded .env from: {:?}", path);
    }

    let config = InspectorConfig::load(&paths.config_dir).map_err(|e| InspectorAppError::Core {
        message: format!("Failed to load config: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    if !InspectorConfig::path(&paths.config_dir).exists() {
        if let Err(e) = config.save(&paths.config_dir) {
            warn!("Could not write default config: {e}");
        }
    }

    let transport = ChannelTransport::new();
    let console = ConsoleHandle::spawn(&config.console, Arc::new(transport.clone()));

    info!("Starting IPC server on port {}", config.ipc.port);

    let ipc_handle = start_ipc_server(
        config.ipc.port,
        config.ipc.auth_token.clone(),
        console.clone(),
        transport,
    )
    .await
    .map_err(|e| InspectorAppError::Core {
        message: format!("Failed to start IPC server: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("IPC server started successfully");
    info!("IPC auth token: {}", ipc_handle.auth_token().expose());

    let connection_info = ConnectionInfo::new(
        ipc_handle.port(),
        ipc_handle.auth_token().expose().to_string(),
    );
    let connection_path = connection_info.write(&paths.config_dir)?;
    info!("Connection info written to {}", connection_path.display());

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| InspectorAppError::Inspector {
            message: format!("Failed to listen for shutdown signal: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Shutting down");
    ipc_handle.shutdown();
    if let Err(e) = console.dispose().await {
        warn!("Console already stopped: {e}");
    }
    ConnectionInfo::remove(&paths.config_dir)?;

    Ok(())
}
