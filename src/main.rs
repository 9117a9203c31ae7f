//! Snowflake Exporter Binary Entry Point
//!
//! Loads configuration, builds the collector and serves metrics over HTTP.
//! Core functionality is provided by the `snowflake_exporter` library crate.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use snowflake_exporter::{
    collector::SnowflakeCollector,
    config::AppConfig,
    exposition::build_info_registry,
    server::{AppState, create_router},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Snowflake Exporter - Prometheus metrics for Snowflake account usage
#[derive(Parser, Debug)]
#[command(name = "snowflake-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SNOWFLAKE_EXPORTER_CONFIG")]
    config: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "SNOWFLAKE_EXPORTER_LOG_FORMAT")]
    log_format: LogFormat,

    /// Server bind address (overrides config file)
    #[arg(long, env = "SNOWFLAKE_EXPORTER_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "SNOWFLAKE_EXPORTER_SERVER_PORT")]
    server_port: Option<u16>,

    /// Path under which to expose metrics (overrides config file)
    #[arg(long, env = "SNOWFLAKE_EXPORTER_WEB_TELEMETRY_PATH")]
    telemetry_path: Option<String>,

    /// Snowflake account identifier
    #[arg(long, env = "SNOWFLAKE_EXPORTER_ACCOUNT")]
    account: Option<String>,

    /// Snowflake user
    #[arg(long, env = "SNOWFLAKE_EXPORTER_USERNAME")]
    username: Option<String>,

    /// Snowflake password
    #[arg(long, env = "SNOWFLAKE_EXPORTER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to a PKCS#8 PEM private key for key-pair authentication
    #[arg(long, env = "SNOWFLAKE_EXPORTER_PRIVATE_KEY_PATH")]
    private_key_path: Option<String>,

    /// Passphrase of an encrypted private key
    #[arg(
        long,
        env = "SNOWFLAKE_EXPORTER_PRIVATE_KEY_PASSWORD",
        hide_env_values = true
    )]
    private_key_password: Option<String>,

    /// Role used when querying
    #[arg(long, env = "SNOWFLAKE_EXPORTER_ROLE")]
    role: Option<String>,

    /// Warehouse used when querying
    #[arg(long, env = "SNOWFLAKE_EXPORTER_WAREHOUSE")]
    warehouse: Option<String>,

    /// Skip deleted tables when collecting table storage
    #[arg(long, env = "SNOWFLAKE_EXPORTER_EXCLUDE_DELETED_TABLES")]
    exclude_deleted_tables: Option<bool>,

    /// Log every request sent to Snowflake
    #[arg(long, env = "SNOWFLAKE_EXPORTER_ENABLE_TRACING")]
    enable_tracing: Option<bool>,

    /// Per-statement timeout (e.g. "60s", "2m")
    #[arg(long, env = "SNOWFLAKE_EXPORTER_QUERY_TIMEOUT", value_parser = humantime::parse_duration)]
    query_timeout: Option<Duration>,
}

impl Cli {
    /// Apply CLI/env overrides (CLI > ENV > config file).
    fn apply(self, config: &mut AppConfig) {
        if let Some(bind) = self.server_bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.server_port {
            config.server.port = port;
        }
        if let Some(path) = self.telemetry_path {
            config.server.telemetry_path = path;
        }

        let snowflake = &mut config.snowflake;
        if let Some(account) = self.account {
            snowflake.account_name = account;
        }
        if let Some(username) = self.username {
            snowflake.username = username;
        }
        if let Some(password) = self.password {
            snowflake.password = Some(password);
        }
        if let Some(path) = self.private_key_path {
            snowflake.private_key_path = Some(path);
        }
        if let Some(password) = self.private_key_password {
            snowflake.private_key_password = Some(password);
        }
        if let Some(role) = self.role {
            snowflake.role = role;
        }
        if let Some(warehouse) = self.warehouse {
            snowflake.warehouse = warehouse;
        }
        if let Some(exclude) = self.exclude_deleted_tables {
            snowflake.exclude_deleted_tables = exclude;
        }
        if let Some(enable) = self.enable_tracing {
            snowflake.enable_tracing = enable;
        }
        if let Some(timeout) = self.query_timeout {
            snowflake.query_timeout = timeout;
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,snowflake_exporter=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting snowflake_exporter");

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Exporter failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from file
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    cli.apply(&mut config);
    config.validate()?;
    config.snowflake.require_key_pair()?;

    tracing::info!(
        account = %config.snowflake.account_name,
        warehouse = %config.snowflake.warehouse,
        role = %config.snowflake.role,
        exclude_deleted_tables = config.snowflake.exclude_deleted_tables,
        "Configuration loaded"
    );

    let collector = SnowflakeCollector::new(config.snowflake.clone())?;
    let app_state = AppState {
        collector: Arc::new(collector),
        registry: build_info_registry()?,
        telemetry_path: config.server.telemetry_path.clone(),
    };

    // Build Axum router
    let app = create_router(app_state);

    let addr = config.server.socket_addr()?;

    tracing::info!(
        "Listening on: http://{}{}",
        addr,
        config.server.telemetry_path
    );

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
