use std::env;

/// Runtime configuration, loaded once at startup. All values pass through
/// unchanged apart from port parsing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub neynar_api_key: String,
    pub neynar_base_url: String,
    pub app_base_url: String,
    pub base_rpc_url: Option<String>,
    pub allowed_origins: Option<String>,
    pub debug_mode: bool,
    pub skip_migrations: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            neynar_api_key: env::var("NEYNAR_API_KEY")
                .map_err(|_| anyhow::anyhow!("NEYNAR_API_KEY must be set"))?,
            neynar_base_url: env::var("NEYNAR_BASE_URL")
                .unwrap_or_else(|_| "https://api.neynar.com".to_string()),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "https://educonnect.app".to_string()),
            base_rpc_url: env::var("BASE_RPC_URL").ok(),
            allowed_origins: env::var("ALLOWED_ORIGINS").ok(),
            debug_mode: flag("DEBUG_MODE"),
            skip_migrations: flag("SKIP_MIGRATIONS"),
        })
    }
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}
