use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readmate::infrastructure::AppState;
use readmate::{config, db, server};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readmate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    if config.aladin_ttb_key.is_none() {
        tracing::warn!("ALADIN_TTB_KEY not set, catalog endpoints will fail");
    }

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(db, config);

    if let Err(e) = server::serve(state).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
