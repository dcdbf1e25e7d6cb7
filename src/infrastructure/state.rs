//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{BookRepository, CatalogGateway};
use crate::infrastructure::SeaOrmBookRepository;
use crate::infrastructure::config::Config;
use crate::modules::integrations::aladin::AladinClient;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection used by the service functions
    db: DatabaseConnection,
    /// Book repository (reconciliation target)
    pub book_repo: Arc<dyn BookRepository>,
    /// External catalog gateway
    pub catalog: Arc<dyn CatalogGateway>,
    /// Loaded configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState with the SeaORM repository and the Aladin gateway
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let catalog = Arc::new(AladinClient::from_config(&config));
        Self::with_catalog(db, config, catalog)
    }

    /// Create a new AppState around a caller-supplied catalog gateway
    pub fn with_catalog(
        db: DatabaseConnection,
        config: Config,
        catalog: Arc<dyn CatalogGateway>,
    ) -> Self {
        let book_repo = Arc::new(SeaOrmBookRepository::new(db.clone()));

        Self {
            db,
            book_repo,
            catalog,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}

// Implement FromRef to allow extracting DatabaseConnection from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
