use clap::Parser;
use finquest_advisor::{LlmClient, LlmError};
use finquest_runtime_config::ServerConfig;
use finquest_server::{AppState, Advisor, router, storage};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "finquest-server", version, about = "FinQuest personal-finance API server")]
struct Cli {
    /// Path to finquest.toml
    #[arg(long, env = "FINQUEST_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finquest_server=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    match &cli.config {
        Some(path) => tracing::info!("config loaded from {}", path.display()),
        None => tracing::info!("no config file given, using defaults and environment"),
    }

    tracing::info!("data directory: {}", config.server.data_dir.display());
    let db = storage::init_db(&config.server.data_dir)?;
    tracing::info!("database initialized");

    if config.auth.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET not set, every authenticated request will be rejected");
    }

    let advisor = match LlmClient::from_config(&config.llm) {
        Ok(client) => {
            tracing::info!(
                "AI advisors enabled: provider {}, model {}",
                config.llm.provider,
                config.llm.model()
            );
            Advisor::new(Some(client))
        }
        Err(LlmError::NotConfigured(reason)) => {
            tracing::warn!("AI advisors disabled ({reason})");
            Advisor::new(None)
        }
        Err(e) => return Err(e.into()),
    };

    let app = router(AppState::new(db, &config, advisor));

    tracing::info!("starting server at {}", config.server.base_url);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
