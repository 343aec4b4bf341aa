use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Subject identifier issued by the identity provider
    pub auth_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub auth_id: String,
    pub email: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            auth_id: self.auth_id,
            email: self.email,
            created_at: now,
            updated_at: now,
        }
    }
}
