use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    db::{timed, PgStore, RepoError},
    events::Event,
    users::User,
};

/// One membership edge between a user and an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
}

/// The event/user membership ledger. The store itself guarantees at most one
/// row per (event, user) pair.
#[async_trait]
pub trait AttendeeRepo: Send + Sync {
    /// Fails with `RepoError::Conflict` if the pair is already present.
    async fn insert(&self, event_id: i64, user_id: i64) -> Result<Attendance, RepoError>;
    async fn get_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Attendance>, RepoError>;
    async fn get_by_event(&self, event_id: i64) -> Result<Vec<User>, RepoError>;
    async fn get_events_by_user(&self, user_id: i64) -> Result<Vec<Event>, RepoError>;
    /// Idempotent.
    async fn delete(&self, user_id: i64, event_id: i64) -> Result<(), RepoError>;
}

#[async_trait]
impl AttendeeRepo for PgStore {
    async fn insert(&self, event_id: i64, user_id: i64) -> Result<Attendance, RepoError> {
        // attendees_event_user_key turns a lost race into a unique violation
        timed(
            self.timeout,
            sqlx::query_as::<_, Attendance>(
                r#"
                INSERT INTO attendees (event_id, user_id)
                VALUES ($1, $2)
                RETURNING id, user_id, event_id
                "#,
            )
            .bind(event_id)
            .bind(user_id)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn get_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Attendance>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, Attendance>(
                r#"
                SELECT id, user_id, event_id
                FROM attendees
                WHERE event_id = $1 AND user_id = $2
                "#,
            )
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_by_event(&self, event_id: i64) -> Result<Vec<User>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, User>(
                r#"
                SELECT u.id, u.email, u.name, u.password_hash
                  FROM users u
                  JOIN attendees a ON u.id = a.user_id
                 WHERE a.event_id = $1
                 ORDER BY a.id
                "#,
            )
            .bind(event_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn get_events_by_user(&self, user_id: i64) -> Result<Vec<Event>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, Event>(
                r#"
                SELECT e.id, e.owner_id, e.name, e.description, e.date, e.location
                  FROM events e
                  JOIN attendees a ON e.id = a.event_id
                 WHERE a.user_id = $1
                 ORDER BY a.id
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn delete(&self, user_id: i64, event_id: i64) -> Result<(), RepoError> {
        timed(
            self.timeout,
            sqlx::query(r#"DELETE FROM attendees WHERE user_id = $1 AND event_id = $2"#)
                .bind(user_id)
                .bind(event_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
