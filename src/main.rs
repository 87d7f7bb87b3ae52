use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vertilog::{router, storage, AppConfig, AppState, TokenConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vertilog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VertiLog server");

    let config = AppConfig::from_env()?;
    let token_config = TokenConfig::from_config(&config);

    // Storage is selected by DATABASE_URL
    let app_state = match &config.database_url {
        Some(database_url) => {
            let pool = storage::connect_postgres(database_url).await?;
            AppState::postgres(pool, token_config)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            AppState::in_memory(token_config)
        }
    };

    let app = router::routes(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
