pub use sqlx;
pub use tower_cookies;
pub use uuid;

pub mod cron;
pub mod server;

pub mod app_state;
pub mod setup;

pub use color_eyre;
pub use color_eyre::Result;
