use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::generation::{ChatTurn, GenerationError, GenerationService};
use super::storage::BlobStore;
use super::{require_fields, ServiceError};
use crate::content::Extractor;
use crate::database::models::{
    ContentKind, FileType, GeneratedContent, Material, MaterialWithContent, NewGeneratedContent,
    NewMaterial, User,
};
use crate::database::{InsertOutcome, Repository};

/// Body of `POST /api/materials`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMaterial {
    pub file_name: Option<String>,
    pub storage_path: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

/// Material lifecycle, ownership gate and generated-content cache.
#[derive(Clone)]
pub struct MaterialService {
    repo: Arc<dyn Repository>,
    storage: Arc<dyn BlobStore>,
    extractor: Arc<dyn Extractor>,
    generation: GenerationService,
    quiz_questions: usize,
}

impl MaterialService {
    pub fn new(
        repo: Arc<dyn Repository>,
        storage: Arc<dyn BlobStore>,
        extractor: Arc<dyn Extractor>,
        generation: GenerationService,
        quiz_questions: usize,
    ) -> Self {
        Self {
            repo,
            storage,
            extractor,
            generation,
            quiz_questions,
        }
    }

    /// Existence first, then ownership. Ids that are not UUIDs cannot name
    /// a material and are reported as missing.
    pub async fn authorize(&self, user: &User, id: &str) -> Result<Material, ServiceError> {
        let material = match Uuid::parse_str(id) {
            Ok(id) => self.repo.find_material(id).await?,
            Err(_) => None,
        }
        .ok_or_else(|| ServiceError::NotFound("Material not found".to_string()))?;

        if !material.is_owned_by(user.id) {
            tracing::warn!("User {} denied access to material {}", user.id, material.id);
            return Err(ServiceError::Forbidden("User not authorized".to_string()));
        }
        Ok(material)
    }

    pub async fn register(&self, user: &User, input: RegisterMaterial) -> Result<Material, ServiceError> {
        let missing = require_fields([
            ("fileName", input.file_name.as_deref()),
            ("storagePath", input.storage_path.as_deref()),
            ("fileType", input.file_type.as_deref()),
        ]);
        if !missing.is_empty() {
            return Err(ServiceError::validation(
                "fileName, storagePath, and fileType are required",
                missing,
            ));
        }

        let (Some(file_name), Some(storage_path), Some(file_type)) =
            (input.file_name, input.storage_path, input.file_type)
        else {
            return Err(ServiceError::validation("Missing required fields", Default::default()));
        };

        let file_type: FileType = file_type.trim().parse().map_err(|_| {
            ServiceError::validation(
                "Unsupported file type",
                [(
                    "fileType".to_string(),
                    "Must be one of pdf, docx, txt".to_string(),
                )]
                .into_iter()
                .collect(),
            )
        })?;

        let material = self
            .repo
            .create_material(NewMaterial {
                user_id: user.id,
                file_name: file_name.trim().to_string(),
                storage_path: storage_path.trim().to_string(),
                file_type,
            })
            .await?;

        tracing::info!("Registered material {} for user {}", material.id, user.id);
        Ok(material)
    }

    pub async fn list(&self, user: &User) -> Result<Vec<Material>, ServiceError> {
        Ok(self.repo.list_materials(user.id).await?)
    }

    pub async fn list_with_content(&self, user: &User) -> Result<Vec<MaterialWithContent>, ServiceError> {
        Ok(self.repo.list_materials_with_content(user.id).await?)
    }

    pub async fn get(&self, user: &User, id: &str) -> Result<MaterialWithContent, ServiceError> {
        let material = self.authorize(user, id).await?;
        let generated_content = self.repo.list_content(material.id).await?;
        Ok(MaterialWithContent {
            material,
            generated_content,
        })
    }

    pub async fn content(&self, user: &User, id: &str) -> Result<Vec<GeneratedContent>, ServiceError> {
        let material = self.authorize(user, id).await?;
        Ok(self.repo.list_content(material.id).await?)
    }

    /// Deleting something already gone succeeds. A failed blob removal is
    /// logged and does not stop the database cleanup.
    pub async fn delete(&self, user: &User, id: &str) -> Result<DeleteOutcome, ServiceError> {
        let material = match self.authorize(user, id).await {
            Ok(material) => material,
            Err(ServiceError::NotFound(_)) => return Ok(DeleteOutcome::AlreadyGone),
            Err(e) => return Err(e),
        };

        let removed = self.repo.delete_content_for_material(material.id).await?;
        tracing::info!("Deleted {} generated content rows for material {}", removed, material.id);

        match self.storage.delete(&material.storage_path).await {
            Ok(()) => tracing::info!("Deleted file from storage: {}", material.storage_path),
            Err(e) => tracing::error!(
                "StorageDeleteFailed for {}: {:?}",
                material.storage_path,
                e
            ),
        }

        if !self.repo.delete_material(material.id).await? {
            return Ok(DeleteOutcome::AlreadyGone);
        }
        tracing::info!("Deleted material record {}", material.id);
        Ok(DeleteOutcome::Deleted)
    }

    pub async fn summarize(&self, user: &User, id: &str) -> Result<InsertOutcome, ServiceError> {
        let material = self.authorize(user, id).await?;
        self.get_or_generate(&material, ContentKind::Summary, |service, text| async move {
            service.generation.summarize(&text).await
        })
        .await
    }

    pub async fn generate_quiz(&self, user: &User, id: &str) -> Result<InsertOutcome, ServiceError> {
        let material = self.authorize(user, id).await?;
        let count = self.quiz_questions;
        self.get_or_generate(&material, ContentKind::Questions, move |service, text| async move {
            let quiz = service.generation.generate_quiz(&text, count).await?;
            serde_json::to_string(&quiz).map_err(|e| GenerationError::InvalidFormat {
                raw: e.to_string(),
            })
        })
        .await
    }

    /// Chat answers are never cached.
    pub async fn chat(
        &self,
        user: &User,
        id: &str,
        question: Option<&str>,
        history: &[ChatTurn],
    ) -> Result<String, ServiceError> {
        let question = match question.map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => {
                return Err(ServiceError::validation(
                    "A question is required.",
                    require_fields([("question", None)]),
                ))
            }
        };

        let material = self.authorize(user, id).await?;
        let context = self.extract_text(&material).await?;
        Ok(self.generation.answer(&context, history, question).await?)
    }

    async fn extract_text(&self, material: &Material) -> Result<String, ServiceError> {
        let bytes = self.storage.download(&material.storage_path).await?;
        Ok(self.extractor.extract(bytes, material.file_type).await?)
    }

    /// Cached kinds are generated at most once per material. When two
    /// requests miss at the same time the first insert wins; the other
    /// caller receives the stored row as `Existing`.
    async fn get_or_generate<F, Fut>(
        &self,
        material: &Material,
        kind: ContentKind,
        generate: F,
    ) -> Result<InsertOutcome, ServiceError>
    where
        F: FnOnce(Self, String) -> Fut,
        Fut: std::future::Future<Output = Result<String, GenerationError>>,
    {
        if let Some(existing) = self.repo.find_content(material.id, kind).await? {
            tracing::info!("CACHE HIT: {} already exists for material {}", kind, material.id);
            return Ok(InsertOutcome::Existing(existing));
        }
        tracing::info!("CACHE MISS: generating {} for material {}", kind, material.id);

        let text = self.extract_text(material).await?;
        let content = generate(self.clone(), text).await?;

        let outcome = self
            .repo
            .insert_content(NewGeneratedContent {
                material_id: material.id,
                user_id: material.user_id,
                kind,
                content,
            })
            .await?;

        if !outcome.was_created() {
            tracing::info!("Concurrent {} for material {} won; discarding ours", kind, material.id);
        }
        Ok(outcome)
    }
}
