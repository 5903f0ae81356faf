use std::{fmt::Debug, ops::Deref};

use base64::Engine;
use color_eyre::eyre::{bail, Context};

#[derive(Clone)]
pub struct CookieKey(pub tower_cookies::Key);

impl Deref for CookieKey {
    type Target = tower_cookies::Key;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl CookieKey {
    pub fn from_env_or_generate() -> color_eyre::Result<Self> {
        let cookie_key = std::env::var("COOKIE_KEY");
        let cookie_key = if let Ok(cookie_key) = cookie_key {
            Self::from_base64(&cookie_key)?.0
        } else {
            tracing::warn!("COOKIE_KEY unset, generating a key. Sessions won't survive a restart");
            tower_cookies::Key::generate()
        };
        Ok(Self(cookie_key))
    }

    pub fn from_base64(encoded: &str) -> color_eyre::Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .wrap_err("COOKIE_KEY is not valid base64")?;

        if bytes.len() < 32 {
            bail!("COOKIE_KEY must decode to at least 32 bytes");
        }

        Ok(Self(tower_cookies::Key::derive_from(&bytes)))
    }
}

impl Debug for CookieKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieKey")
            .field("value", &"[omitted]")
            .finish()
    }
}
