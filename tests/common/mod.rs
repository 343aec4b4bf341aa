#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use study_helper_api::auth::{generate_jwt, Claims};
use study_helper_api::config::AppConfig;
use study_helper_api::content::DocumentExtractor;
use study_helper_api::database::models::{NewUser, User};
use study_helper_api::database::{MemoryRepository, Repository};
use study_helper_api::services::generation::REFUSAL_PHRASE;
use study_helper_api::services::{BlobStore, ChatTurn, GenerationError, Generator, StorageError};
use study_helper_api::{app, AppState};

pub const JWT_SECRET: &str = "test-jwt-secret-with-at-least-32-characters";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const QUIZ_QUESTIONS: usize = 5;

/// Object store backed by a map; records every delete
#[derive(Default)]
pub struct MemoryBlobs {
    files: RwLock<HashMap<String, Vec<u8>>>,
    pub deleted: Mutex<Vec<String>>,
}

impl MemoryBlobs {
    pub async fn put(&self, path: &str, bytes: &[u8]) {
        self.files.write().await.insert(path.to_string(), bytes.to_vec());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::Download {
                cause: format!("no object at {}", path),
            })
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.files.write().await.remove(path);
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

/// Canned model: summaries echo a prefix of the context, quiz prompts get a
/// well-formed quiz unless overridden, chat answers only about photosynthesis.
#[derive(Default)]
pub struct StubGenerator {
    pub calls: AtomicUsize,
    pub quiz_reply: Mutex<Option<String>>,
    pub delay: Mutex<Option<Duration>>,
}

impl StubGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reply_to_quiz_with(&self, raw: &str) {
        *self.quiz_reply.lock().unwrap() = Some(raw.to_string());
    }

    pub fn slow_down(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

pub fn valid_quiz(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| {
                json!({
                    "question": format!("Question {}?", i + 1),
                    "options": ["Chlorophyll", "Mitochondria", "Ribosome", "Nucleus"],
                    "correctAnswer": "Chlorophyll"
                })
            })
            .collect(),
    )
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let first = turns.first().map(|t| t.text.as_str()).unwrap_or_default();

        if first.contains("quiz designer") {
            let reply = self.quiz_reply.lock().unwrap().clone();
            return Ok(reply.unwrap_or_else(|| {
                format!("```json\n{}\n```", valid_quiz(QUIZ_QUESTIONS))
            }));
        }
        if first.contains("academic assistant") {
            return Ok("Summary: plants make sugar from light.".to_string());
        }

        let question = turns.last().map(|t| t.text.to_lowercase()).unwrap_or_default();
        if question.contains("photosynthesis") {
            Ok("Photosynthesis turns light into chemical energy.".to_string())
        } else {
            Ok(REFUSAL_PHRASE.to_string())
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: MemoryRepository,
    pub blobs: Arc<MemoryBlobs>,
    pub generator: Arc<StubGenerator>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.identity.supabase_url = "http://storage.invalid".to_string();
    config.identity.jwt_secret = JWT_SECRET.to_string();
    config.identity.webhook_secret = WEBHOOK_SECRET.to_string();
    config.storage.service_key = "service-key".to_string();
    config.generation.api_key = "gemini-key".to_string();
    config.generation.quiz_questions = QUIZ_QUESTIONS;
    config
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: AppConfig) -> TestApp {
    let repo = MemoryRepository::new();
    let blobs = Arc::new(MemoryBlobs::default());
    let generator = Arc::new(StubGenerator::default());

    let state = AppState::new(
        config,
        Arc::new(repo.clone()),
        blobs.clone(),
        Arc::new(DocumentExtractor::new()),
        generator.clone(),
    )
    .expect("test state");

    TestApp {
        router: app(state),
        repo,
        blobs,
        generator,
    }
}

pub fn token_for(auth_id: &str) -> String {
    generate_jwt(&Claims::new(auth_id, None, 1), JWT_SECRET).expect("sign test token")
}

impl TestApp {
    /// Create a local user and return it with a bearer token for it
    pub async fn provision(&self, auth_id: &str) -> Result<(User, String)> {
        let user = self
            .repo
            .create_user(NewUser {
                auth_id: auth_id.to_string(),
                email: format!("{}@test.com", auth_id),
            })
            .await?;
        Ok((user, token_for(auth_id)))
    }

    /// Register a txt material whose blob holds `text`; returns its id
    pub async fn txt_material(&self, token: &str, name: &str, text: &str) -> Result<String> {
        let path = format!("uploads/{}", name);
        self.blobs.put(&path, text.as_bytes()).await;

        let (status, body) = self
            .send(
                Method::POST,
                "/api/materials",
                Some(token),
                Some(json!({ "fileName": name, "storagePath": path, "fileType": "txt" })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "material create failed: {} {}", status, body);
        body["_id"]
            .as_str()
            .map(str::to_string)
            .context("material id missing")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        self.send_with_headers(method, uri, token, &[], body).await
    }

    /// Send `body` verbatim, with an optional content type
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: &str,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string()))?;
        self.dispatch(request).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).to_string())
            })
        };
        Ok((status, value))
    }
}
