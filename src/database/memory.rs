use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ContentKind, GeneratedContent, Material, MaterialWithContent, NewGeneratedContent, NewMaterial,
    NewUser, User,
};
use crate::database::repository::{InsertOutcome, Repository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    materials: Vec<Material>,
    contents: Vec<GeneratedContent>,
}

/// Process-local repository used for development without a database and in
/// tests. Uniqueness rules match the PostgreSQL schema; each check-and-insert
/// runs under one write lock.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn content_count(&self, material_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables.contents.iter().filter(|c| c.material_id == material_id).count()
    }
}

fn newest_first(materials: &mut [Material]) {
    materials.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_user_by_auth_id(&self, auth_id: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.auth_id == auth_id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.auth_id == user.auth_id || u.email == user.email)
        {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }
        let user = user.into_user();
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.users.iter().find(|u| u.auth_id == user.auth_id) {
            return Ok(existing.clone());
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }
        let user = user.into_user();
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn create_material(&self, material: NewMaterial) -> Result<Material, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables
            .materials
            .iter()
            .any(|m| m.storage_path == material.storage_path)
        {
            return Err(DatabaseError::Conflict(
                "Material with this storage path already exists".to_string(),
            ));
        }
        let material = material.into_material();
        tables.materials.push(material.clone());
        Ok(material)
    }

    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.materials.iter().find(|m| m.id == id).cloned())
    }

    async fn list_materials(&self, user_id: Uuid) -> Result<Vec<Material>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut materials: Vec<Material> = tables
            .materials
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut materials);
        Ok(materials)
    }

    async fn list_materials_with_content(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MaterialWithContent>, DatabaseError> {
        let materials = self.list_materials(user_id).await?;
        let tables = self.tables.read().await;
        Ok(materials
            .into_iter()
            .map(|material| {
                let generated_content = tables
                    .contents
                    .iter()
                    .filter(|c| c.material_id == material.id && c.user_id == user_id)
                    .cloned()
                    .collect();
                MaterialWithContent {
                    material,
                    generated_content,
                }
            })
            .collect())
    }

    async fn delete_material(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.materials.len();
        tables.materials.retain(|m| m.id != id);
        // Mirrors ON DELETE CASCADE
        tables.contents.retain(|c| c.material_id != id);
        Ok(tables.materials.len() < before)
    }

    async fn find_content(
        &self,
        material_id: Uuid,
        kind: ContentKind,
    ) -> Result<Option<GeneratedContent>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .contents
            .iter()
            .find(|c| c.material_id == material_id && c.kind == kind)
            .cloned())
    }

    async fn list_content(&self, material_id: Uuid) -> Result<Vec<GeneratedContent>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .contents
            .iter()
            .filter(|c| c.material_id == material_id)
            .cloned()
            .collect())
    }

    async fn insert_content(&self, content: NewGeneratedContent) -> Result<InsertOutcome, DatabaseError> {
        let mut tables = self.tables.write().await;
        if content.kind.is_cached() {
            if let Some(existing) = tables
                .contents
                .iter()
                .find(|c| c.material_id == content.material_id && c.kind == content.kind)
            {
                return Ok(InsertOutcome::Existing(existing.clone()));
            }
        }
        let content = content.into_content();
        tables.contents.push(content.clone());
        Ok(InsertOutcome::Created(content))
    }

    async fn delete_content_for_material(&self, material_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.contents.len();
        tables.contents.retain(|c| c.material_id != material_id);
        Ok((before - tables.contents.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::FileType;

    async fn seeded() -> (MemoryRepository, Material) {
        let repo = MemoryRepository::new();
        let user = repo
            .create_user(NewUser {
                auth_id: "auth-1".to_string(),
                email: "one@test.com".to_string(),
            })
            .await
            .unwrap();
        let material = repo
            .create_material(NewMaterial {
                user_id: user.id,
                file_name: "notes.txt".to_string(),
                storage_path: "auth-1/notes.txt".to_string(),
                file_type: FileType::Txt,
            })
            .await
            .unwrap();
        (repo, material)
    }

    fn summary_for(material: &Material, text: &str) -> NewGeneratedContent {
        NewGeneratedContent {
            material_id: material.id,
            user_id: material.user_id,
            kind: ContentKind::Summary,
            content: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_cached_insert_returns_first_row() {
        let (repo, material) = seeded().await;

        let first = repo.insert_content(summary_for(&material, "first")).await.unwrap();
        let second = repo.insert_content(summary_for(&material, "second")).await.unwrap();

        assert!(first.was_created());
        assert!(!second.was_created());
        assert_eq!(second.into_inner().content, "first");
        assert_eq!(repo.content_count(material.id).await, 1);
    }

    #[tokio::test]
    async fn test_chat_content_is_not_deduplicated() {
        let (repo, material) = seeded().await;
        for text in ["a", "b"] {
            let outcome = repo
                .insert_content(NewGeneratedContent {
                    kind: ContentKind::Chat,
                    ..summary_for(&material, text)
                })
                .await
                .unwrap();
            assert!(outcome.was_created());
        }
        assert_eq!(repo.content_count(material.id).await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_storage_path_conflicts() {
        let (repo, material) = seeded().await;
        let result = repo
            .create_material(NewMaterial {
                user_id: material.user_id,
                file_name: "copy.txt".to_string(),
                storage_path: material.storage_path.clone(),
                file_type: FileType::Txt,
            })
            .await;
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_upsert_keeps_existing_user() {
        let (repo, _) = seeded().await;
        let user = repo
            .upsert_user(NewUser {
                auth_id: "auth-1".to_string(),
                email: "changed@test.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.email, "one@test.com");
    }
}
