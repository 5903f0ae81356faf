use chrono::{DateTime, Utc};
use color_eyre::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub password_hash: String,
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user as other people get to see them. Never carries password material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub user_id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: Uuid,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub username: Option<String>,
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());

    format!("{:x}", hasher.finalize())
}

fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();

    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl User {
    #[tracing::instrument(skip(pool, password), err)]
    pub async fn create(pool: &SqlitePool, username: &str, password: &str) -> Result<Self> {
        let salt = generate_salt();
        let password_hash = hash_password(password, &salt);

        let user = sqlx::query_as::<_, User>(
            "
            INSERT INTO Users (user_id, username, password_hash, password_salt)
            VALUES (?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(username.trim())
        .bind(password_hash)
        .bind(salt)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &SqlitePool, user_id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM Users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM Users WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(password, &self.password_salt) == self.password_hash
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            user_id: self.user_id,
            username: self.username.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            created_at: self.created_at,
        }
    }

    pub fn to_author(&self) -> Author {
        Author {
            id: self.user_id,
            name: self.name.clone(),
            profile_picture: self.image.clone(),
            username: Some(self.username.clone()),
        }
    }
}
