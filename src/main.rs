use std::sync::Arc;

use tracing::{error, info};

use sharebox::{Config, Database, WebServer};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = sharebox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        sharebox::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Fatal: {e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> sharebox::Result<()> {
    config.validate()?;

    info!("sharebox {}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(&config.database.path).await?;
    info!("Database opened at {}", config.database.path);

    let server = WebServer::new(&config, Arc::new(db))?;
    info!("Server configured on {}", server.addr());

    server.run().await?;
    Ok(())
}
