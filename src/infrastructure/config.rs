use std::env;

pub const DEFAULT_ALADIN_BASE_URL: &str = "http://www.aladin.co.kr/ttb/api";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub aladin_ttb_key: Option<String>,
    pub aladin_base_url: String,
    pub catalog_max_results: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, falling back to the development secret");
            "secret".to_string()
        });

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://readmate.db?mode=rwc".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
            jwt_secret,
            aladin_ttb_key: env::var("ALADIN_TTB_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            aladin_base_url: env::var("ALADIN_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ALADIN_BASE_URL.to_string()),
            catalog_max_results: env::var("CATALOG_MAX_RESULTS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(20),
        }
    }
}
