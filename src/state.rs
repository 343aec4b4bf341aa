use std::sync::Arc;

use crate::auth::{AuthError, TokenVerifier};
use crate::config::AppConfig;
use crate::content::Extractor;
use crate::database::Repository;
use crate::services::{BlobStore, GenerationService, Generator, MaterialService, UserService};

/// Shared application state, built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Arc<dyn Repository>,
    pub verifier: TokenVerifier,
    pub materials: MaterialService,
    pub users: UserService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repo: Arc<dyn Repository>,
        storage: Arc<dyn BlobStore>,
        extractor: Arc<dyn Extractor>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, AuthError> {
        let verifier = TokenVerifier::new(&config.identity.jwt_secret)?;
        let materials = MaterialService::new(
            repo.clone(),
            storage,
            extractor,
            GenerationService::new(generator),
            config.generation.quiz_questions,
        );
        let users = UserService::new(repo.clone(), config.identity.webhook_secret.clone());

        Ok(Self {
            config: Arc::new(config),
            repo,
            verifier,
            materials,
            users,
        })
    }
}
