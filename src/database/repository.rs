use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ContentKind, GeneratedContent, Material, MaterialWithContent, NewGeneratedContent, NewMaterial,
    NewUser, User,
};

/// Result of a cache-keyed insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// This call created the row
    Created(GeneratedContent),
    /// A row for the same (material, type) was already committed; the new
    /// content was discarded
    Existing(GeneratedContent),
}

impl InsertOutcome {
    pub fn into_inner(self) -> GeneratedContent {
        match self {
            InsertOutcome::Created(c) | InsertOutcome::Existing(c) => c,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}

/// Persistence seam for users, materials and generated content.
///
/// Lookups by id are unscoped so that callers can tell "missing" apart from
/// "not yours"; listing operations are always scoped to an owner.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    // Users
    async fn find_user_by_auth_id(&self, auth_id: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `Conflict` if the auth id or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Insert unless a user with the same auth id exists; the existing row is
    /// returned untouched.
    async fn upsert_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    // Materials
    /// Fails with `Conflict` if the storage path is taken.
    async fn create_material(&self, material: NewMaterial) -> Result<Material, DatabaseError>;

    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, DatabaseError>;

    /// Newest first.
    async fn list_materials(&self, user_id: Uuid) -> Result<Vec<Material>, DatabaseError>;

    /// Newest first, each with all of its generated content.
    async fn list_materials_with_content(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MaterialWithContent>, DatabaseError>;

    /// Returns false if nothing was deleted.
    async fn delete_material(&self, id: Uuid) -> Result<bool, DatabaseError>;

    // Generated content
    async fn find_content(
        &self,
        material_id: Uuid,
        kind: ContentKind,
    ) -> Result<Option<GeneratedContent>, DatabaseError>;

    async fn list_content(&self, material_id: Uuid) -> Result<Vec<GeneratedContent>, DatabaseError>;

    /// For cached kinds, at most one row per (material, type) survives; a
    /// losing concurrent insert gets the committed row back as `Existing`.
    async fn insert_content(&self, content: NewGeneratedContent) -> Result<InsertOutcome, DatabaseError>;

    async fn delete_content_for_material(&self, material_id: Uuid) -> Result<u64, DatabaseError>;
}
