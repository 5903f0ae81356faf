use cja::{color_eyre::eyre::Context, server::cookies::CookieKey};
use db::{setup_db_pool, SqlitePool};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub base_url: Url,
    pub session_ttl_days: i64,
}

impl AppConfig {
    #[instrument(name = "AppConfig::from_env")]
    pub fn from_env() -> cja::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(port) => port.parse().wrap_err("PORT is not a valid port number")?,
            Err(_) => DEFAULT_PORT,
        };

        let base_url = std::env::var("APP_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));
        let base_url = Url::parse(&base_url).wrap_err("Invalid APP_BASE_URL not parsable")?;

        let session_ttl_days = match std::env::var("SESSION_TTL_DAYS") {
            Ok(days) => days
                .parse()
                .wrap_err("SESSION_TTL_DAYS must be a whole number of days")?,
            Err(_) => DEFAULT_SESSION_TTL_DAYS,
        };

        Ok(Self {
            base_url,
            session_ttl_days,
        })
    }

    pub fn app_url(&self, path: &str) -> String {
        let mut url = self.base_url.clone();

        url.set_path(path);

        url.into()
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub app: AppConfig,
    pub db: SqlitePool,
    pub cookie_key: CookieKey,
}

impl AppState {
    #[instrument(name = "AppState::from_env", err)]
    pub async fn from_env() -> cja::Result<Self> {
        let app_state = AppState {
            app: AppConfig::from_env()?,
            db: setup_db_pool().await?,
            cookie_key: CookieKey::from_env_or_generate()?,
        };

        Ok(app_state)
    }
}

impl cja::app_state::AppState for AppState {
    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn db(&self) -> &SqlitePool {
        &self.db
    }

    fn cookie_key(&self) -> &CookieKey {
        &self.cookie_key
    }

    fn session_ttl(&self) -> chrono::Duration {
        self.app.session_ttl()
    }
}
