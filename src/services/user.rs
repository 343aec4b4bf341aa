use serde::Deserialize;
use std::sync::Arc;

use super::{require_fields, ServiceError};
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, Repository};

/// Body of `POST /api/users/register`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub auth_id: Option<String>,
    pub email: Option<String>,
}

/// Identity-provider database webhook payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncEvent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub record: Option<SyncRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRecord {
    pub id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Ignored,
    Synced(User),
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn Repository>,
    webhook_secret: String,
}

impl UserService {
    pub fn new(repo: Arc<dyn Repository>, webhook_secret: impl Into<String>) -> Self {
        Self {
            repo,
            webhook_secret: webhook_secret.into(),
        }
    }

    pub async fn register(&self, input: RegisterUser) -> Result<User, ServiceError> {
        let missing = require_fields([
            ("authId", input.auth_id.as_deref()),
            ("email", input.email.as_deref()),
        ]);
        let (Some(auth_id), Some(email)) = (input.auth_id, input.email) else {
            return Err(ServiceError::validation("Please provide authId and email", missing));
        };
        if !missing.is_empty() {
            return Err(ServiceError::validation("Please provide authId and email", missing));
        }

        match self
            .repo
            .create_user(NewUser {
                auth_id: auth_id.trim().to_string(),
                email: email.trim().to_string(),
            })
            .await
        {
            Ok(user) => {
                tracing::info!("Registered user {}", user.id);
                Ok(user)
            }
            Err(DatabaseError::Conflict(_)) => Err(ServiceError::Duplicate(
                "User already exists in our database".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Only `INSERT` events create users; replays leave the existing row alone.
    pub async fn sync(&self, secret: Option<&str>, event: SyncEvent) -> Result<SyncOutcome, ServiceError> {
        if self.webhook_secret.is_empty() || secret != Some(self.webhook_secret.as_str()) {
            tracing::warn!("Unauthorized webhook attempt");
            return Err(ServiceError::Unauthorized("Unauthorized".to_string()));
        }

        let record = match (event.kind.as_deref(), event.record) {
            (Some("INSERT"), Some(record)) => record,
            _ => return Ok(SyncOutcome::Ignored),
        };

        let missing = require_fields([("id", record.id.as_deref()), ("email", record.email.as_deref())]);
        let (Some(auth_id), Some(email)) = (record.id, record.email) else {
            tracing::warn!("Webhook received but id or email is missing");
            return Err(ServiceError::validation("User ID and email are required.", missing));
        };
        if !missing.is_empty() {
            return Err(ServiceError::validation("User ID and email are required.", missing));
        }

        let user = self.repo.upsert_user(NewUser { auth_id, email }).await?;
        tracing::info!("[Webhook] User {} synced successfully", user.email);
        Ok(SyncOutcome::Synced(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryRepository;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryRepository::new()), "hook-secret")
    }

    fn insert(id: &str, email: &str) -> SyncEvent {
        SyncEvent {
            kind: Some("INSERT".to_string()),
            record: Some(SyncRecord {
                id: Some(id.to_string()),
                email: Some(email.to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn test_register_twice_is_duplicate() {
        let users = service();
        let input = RegisterUser {
            auth_id: Some("auth-1".to_string()),
            email: Some("a@test.com".to_string()),
        };
        users.register(input.clone()).await.unwrap();
        assert!(matches!(users.register(input).await, Err(ServiceError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_register_requires_both_fields() {
        let err = service()
            .register(RegisterUser { auth_id: Some("x".to_string()), email: None })
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert_eq!(field_errors.keys().collect::<Vec<_>>(), vec!["email"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sync_rejects_wrong_secret() {
        let result = service().sync(Some("nope"), insert("a", "a@test.com")).await;
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
        let result = service().sync(None, insert("a", "a@test.com")).await;
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_sync_ignores_non_insert_events() {
        let event = SyncEvent { kind: Some("UPDATE".to_string()), ..insert("a", "a@test.com") };
        let outcome = service().sync(Some("hook-secret"), event).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_sync_replay_keeps_first_user() {
        let users = service();
        let first = users.sync(Some("hook-secret"), insert("a", "a@test.com")).await.unwrap();
        let again = users.sync(Some("hook-secret"), insert("a", "a@test.com")).await.unwrap();
        assert_eq!(first, again);
    }
}
