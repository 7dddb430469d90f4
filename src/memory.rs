//! In-process store with the same guarantees as the Postgres schema: unique
//! emails, one row per (event, user) pair, rows only referencing existing
//! users and events, attendance cascading with events.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    attendees::{Attendance, AttendeeRepo},
    db::RepoError,
    events::{Event, EventFields, EventRepo},
    users::{NewUser, User, UserRepo},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    attendees: Vec<Attendance>,
    next_user: i64,
    next_event: i64,
    next_attendance: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut guard = self.tables.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut *guard)
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        self.with(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return Err(RepoError::Conflict);
            }
            let row = User {
                id: next(&mut t.next_user),
                email: user.email,
                name: user.name,
                password_hash: user.password_hash,
            };
            t.users.push(row.clone());
            Ok(row)
        })
    }

    async fn get(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.with(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn get_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.with(|t| t.users.clone()))
    }
}

#[async_trait]
impl EventRepo for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Event>, RepoError> {
        Ok(self.with(|t| t.events.iter().find(|e| e.id == id).cloned()))
    }

    async fn get_all(&self) -> Result<Vec<Event>, RepoError> {
        Ok(self.with(|t| t.events.clone()))
    }

    async fn insert(&self, owner_id: i64, fields: EventFields) -> Result<Event, RepoError> {
        self.with(|t| {
            if !t.users.iter().any(|u| u.id == owner_id) {
                return Err(RepoError::MissingReference);
            }
            let row = Event {
                id: next(&mut t.next_event),
                owner_id,
                name: fields.name,
                description: fields.description,
                date: fields.date,
                location: fields.location,
            };
            t.events.push(row.clone());
            Ok(row)
        })
    }

    async fn update(&self, id: i64, fields: EventFields) -> Result<Option<Event>, RepoError> {
        Ok(self.with(|t| {
            let row = t.events.iter_mut().find(|e| e.id == id)?;
            row.name = fields.name;
            row.description = fields.description;
            row.date = fields.date;
            row.location = fields.location;
            Some(row.clone())
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.with(|t| {
            let before = t.events.len();
            t.events.retain(|e| e.id != id);
            t.attendees.retain(|a| a.event_id != id);
            t.events.len() != before
        }))
    }
}

#[async_trait]
impl AttendeeRepo for MemoryStore {
    async fn insert(&self, event_id: i64, user_id: i64) -> Result<Attendance, RepoError> {
        self.with(|t| {
            let event_exists = t.events.iter().any(|e| e.id == event_id);
            let user_exists = t.users.iter().any(|u| u.id == user_id);
            if !event_exists || !user_exists {
                return Err(RepoError::MissingReference);
            }
            if t
                .attendees
                .iter()
                .any(|a| a.event_id == event_id && a.user_id == user_id)
            {
                return Err(RepoError::Conflict);
            }
            let row = Attendance {
                id: next(&mut t.next_attendance),
                user_id,
                event_id,
            };
            t.attendees.push(row.clone());
            Ok(row)
        })
    }

    async fn get_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Attendance>, RepoError> {
        Ok(self.with(|t| {
            t.attendees
                .iter()
                .find(|a| a.event_id == event_id && a.user_id == user_id)
                .cloned()
        }))
    }

    async fn get_by_event(&self, event_id: i64) -> Result<Vec<User>, RepoError> {
        Ok(self.with(|t| {
            t.attendees
                .iter()
                .filter(|a| a.event_id == event_id)
                .filter_map(|a| t.users.iter().find(|u| u.id == a.user_id).cloned())
                .collect()
        }))
    }

    async fn get_events_by_user(&self, user_id: i64) -> Result<Vec<Event>, RepoError> {
        Ok(self.with(|t| {
            t.attendees
                .iter()
                .filter(|a| a.user_id == user_id)
                .filter_map(|a| t.events.iter().find(|e| e.id == a.event_id).cloned())
                .collect()
        }))
    }

    async fn delete(&self, user_id: i64, event_id: i64) -> Result<(), RepoError> {
        self.with(|t| {
            t.attendees
                .retain(|a| !(a.user_id == user_id && a.event_id == event_id))
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn fields(name: &str) -> EventFields {
        EventFields {
            name: name.into(),
            description: "A long enough description".into(),
            date: date!(2025 - 01 - 01),
            location: "Somewhere".into(),
        }
    }

    async fn user(store: &MemoryStore, email: &str) -> User {
        UserRepo::insert(
            store,
            NewUser {
                email: email.into(),
                name: "Someone".into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn ledger_rejects_duplicate_pair() {
        let store = MemoryStore::default();
        let a = user(&store, "a@x.com").await;
        let e = EventRepo::insert(&store, a.id, fields("Party")).await.unwrap();

        AttendeeRepo::insert(&store, e.id, a.id).await.unwrap();
        let err = AttendeeRepo::insert(&store, e.id, a.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict));
        assert_eq!(store.get_by_event(e.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rows_must_reference_existing_users_and_events() {
        let store = MemoryStore::default();
        let err = EventRepo::insert(&store, 999, fields("Ghost")).await.unwrap_err();
        assert!(matches!(err, RepoError::MissingReference));

        let a = user(&store, "a@x.com").await;
        let e = EventRepo::insert(&store, a.id, fields("Party")).await.unwrap();
        let err = AttendeeRepo::insert(&store, e.id, 999).await.unwrap_err();
        assert!(matches!(err, RepoError::MissingReference));
        let err = AttendeeRepo::insert(&store, 999, a.id).await.unwrap_err();
        assert!(matches!(err, RepoError::MissingReference));
        assert!(store.get_by_event(e.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn email_is_unique_and_case_sensitive() {
        let store = MemoryStore::default();
        user(&store, "a@x.com").await;
        let dup = UserRepo::insert(
            &store,
            NewUser {
                email: "a@x.com".into(),
                name: "Other".into(),
                password_hash: "h".into(),
            },
        )
        .await;
        assert!(matches!(dup, Err(RepoError::Conflict)));
        assert!(store.get_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_event_cascades_attendance() {
        let store = MemoryStore::default();
        let a = user(&store, "a@x.com").await;
        let b = user(&store, "b@x.com").await;
        let e1 = EventRepo::insert(&store, a.id, fields("One")).await.unwrap();
        let e2 = EventRepo::insert(&store, a.id, fields("Two")).await.unwrap();
        AttendeeRepo::insert(&store, e1.id, b.id).await.unwrap();
        AttendeeRepo::insert(&store, e2.id, b.id).await.unwrap();

        assert!(EventRepo::delete(&store, e1.id).await.unwrap());
        assert!(!EventRepo::delete(&store, e1.id).await.unwrap());

        let events = store.get_events_by_user(b.id).await.unwrap();
        assert_eq!(events, vec![e2]);
        assert!(store.get_by_event_and_user(e1.id, b.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_membership_is_noop() {
        let store = MemoryStore::default();
        let a = user(&store, "a@x.com").await;
        let e = EventRepo::insert(&store, a.id, fields("Party")).await.unwrap();
        AttendeeRepo::insert(&store, e.id, a.id).await.unwrap();

        AttendeeRepo::delete(&store, 999, e.id).await.unwrap();
        assert_eq!(store.get_by_event(e.id).await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn update_preserves_id_and_owner() {
        let store = MemoryStore::default();
        let a = user(&store, "a@x.com").await;
        let e = EventRepo::insert(&store, a.id, fields("Before")).await.unwrap();

        let updated = store.update(e.id, fields("After")).await.unwrap().unwrap();
        assert_eq!(updated.id, e.id);
        assert_eq!(updated.owner_id, a.id);
        assert_eq!(updated.name, "After");
        assert!(store.update(404, fields("Nope")).await.unwrap().is_none());
    }
}
