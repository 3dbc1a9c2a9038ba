/// Flowver: versioned flow definitions with cross-version node comparison
///
/// Main entry point for the flowver server. Initializes configuration and
/// starts the HTTP server with version management and comparison endpoints.

use flowver::{config::Config, server::start_server};

/// Application entry point
///
/// Initializes the server with default configuration and starts listening
/// for requests. The server provides:
/// - Version management API at /api/flows/* and /api/versions/*
/// - Batch comparison at /api/flows/compare
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3006 and a local SQLite file)
    let config = Config::default();

    // Start the server
    start_server(config).await?;

    Ok(())
}
