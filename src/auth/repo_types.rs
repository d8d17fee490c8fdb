use std::fmt;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Clone, Serialize, FromRow)]
pub struct User {
    #[sqlx(rename = "user_id")]
    pub id: Uuid,                     // unique user ID
    pub full_name: String,
    pub email: String,                // stored as given, case-sensitive
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,        // Argon2 PHC string, not exposed in JSON
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// A fresh record with a new id; both timestamps share one instant.
    pub fn new(full_name: &str, email: &str, password_hash: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
