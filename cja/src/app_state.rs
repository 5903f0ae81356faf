use crate::server::cookies::CookieKey;

pub trait AppState: Clone + Send + Sync + 'static {
    fn version(&self) -> &str;

    fn db(&self) -> &sqlx::SqlitePool;

    fn cookie_key(&self) -> &CookieKey;

    /// How long a session stays valid after it was last touched.
    fn session_ttl(&self) -> chrono::Duration;
}
