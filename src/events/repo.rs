use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;

use crate::db::{timed, PgStore, RepoError};

/// Event record. `owner_id` is stamped at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub location: String,
}

/// The client-editable part of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub name: String,
    pub description: String,
    pub date: Date,
    pub location: String,
}

#[async_trait]
pub trait EventRepo: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Event>, RepoError>;
    async fn get_all(&self) -> Result<Vec<Event>, RepoError>;
    async fn insert(&self, owner_id: i64, fields: EventFields) -> Result<Event, RepoError>;
    /// Replaces the editable fields; `None` if the event vanished meanwhile.
    async fn update(&self, id: i64, fields: EventFields) -> Result<Option<Event>, RepoError>;
    /// Deletes the event together with its attendance rows.
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
impl EventRepo for PgStore {
    async fn get(&self, id: i64) -> Result<Option<Event>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, Event>(
                r#"
                SELECT id, owner_id, name, description, date, location
                FROM events
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_all(&self) -> Result<Vec<Event>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, Event>(
                r#"
                SELECT id, owner_id, name, description, date, location
                FROM events
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn insert(&self, owner_id: i64, fields: EventFields) -> Result<Event, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, Event>(
                r#"
                INSERT INTO events (owner_id, name, description, date, location)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, owner_id, name, description, date, location
                "#,
            )
            .bind(owner_id)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.date)
            .bind(&fields.location)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn update(&self, id: i64, fields: EventFields) -> Result<Option<Event>, RepoError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, Event>(
                r#"
                UPDATE events
                   SET name = $2, description = $3, date = $4, location = $5
                 WHERE id = $1
                RETURNING id, owner_id, name, description, date, location
                "#,
            )
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(fields.date)
            .bind(&fields.location)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        // attendees.event_id is ON DELETE CASCADE
        let res = timed(
            self.timeout,
            sqlx::query(r#"DELETE FROM events WHERE id = $1"#)
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// `YYYY-MM-DD` on the wire.
pub(crate) mod iso_date {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};
    use time::{macros::format_description, Date};

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(S::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let text = String::deserialize(d)?;
        parse(&text).map_err(D::Error::custom)
    }

    pub fn parse(text: &str) -> Result<Date, time::error::Parse> {
        Date::parse(text, format_description!("[year]-[month]-[day]"))
    }
}
