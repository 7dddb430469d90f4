use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{timed, PgStore, RepoError};

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `RepoError::Conflict` when the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, RepoError>;
    async fn get(&self, id: i64) -> Result<Option<User>, RepoError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn get_all(&self) -> Result<Vec<User>, RepoError>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (email, name, password_hash)
                VALUES ($1, $2, $3)
                RETURNING id, email, name, password_hash
                "#,
            )
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<User>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, User>(
                r#"SELECT id, email, name, password_hash FROM users WHERE id = $1"#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, User>(
                r#"SELECT id, email, name, password_hash FROM users WHERE email = $1"#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_all(&self) -> Result<Vec<User>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, User>(
                r#"SELECT id, email, name, password_hash FROM users ORDER BY id"#,
            )
            .fetch_all(&self.pool),
        )
        .await
    }
}
