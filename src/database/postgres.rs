use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ContentKind, GeneratedContent, Material, MaterialWithContent, NewGeneratedContent, NewMaterial,
    NewUser, User,
};
use crate::database::repository::{InsertOutcome, Repository};

/// PostgreSQL-backed repository over the shared pool.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_auth_id(&self, auth_id: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE auth_id = $1")
            .bind(auth_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = user.into_user();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, auth_id, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.auth_id)
        .bind(&user.email)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "User"))
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = user.into_user();
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, auth_id, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (auth_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.auth_id)
        .bind(&user.email)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "User"))?;

        match inserted {
            Some(user) => Ok(user),
            None => self
                .find_user_by_auth_id(&user.auth_id)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user.auth_id))),
        }
    }

    async fn create_material(&self, material: NewMaterial) -> Result<Material, DatabaseError> {
        let material = material.into_material();
        sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (id, user_id, file_name, storage_path, file_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(material.id)
        .bind(material.user_id)
        .bind(&material.file_name)
        .bind(&material.storage_path)
        .bind(material.file_type.as_str())
        .bind(material.created_at)
        .bind(material.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "Material with this storage path"))
    }

    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, DatabaseError> {
        let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(material)
    }

    async fn list_materials(&self, user_id: Uuid) -> Result<Vec<Material>, DatabaseError> {
        let materials = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(materials)
    }

    async fn list_materials_with_content(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MaterialWithContent>, DatabaseError> {
        let materials = self.list_materials(user_id).await?;
        if materials.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<Uuid> = materials.iter().map(|m| m.id).collect();
        let contents = sqlx::query_as::<_, GeneratedContent>(
            r#"
            SELECT * FROM generated_content
            WHERE material_id = ANY($1) AND user_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(&ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_material: HashMap<Uuid, Vec<GeneratedContent>> = HashMap::new();
        for content in contents {
            by_material.entry(content.material_id).or_default().push(content);
        }

        Ok(materials
            .into_iter()
            .map(|material| {
                let generated_content = by_material.remove(&material.id).unwrap_or_default();
                MaterialWithContent {
                    material,
                    generated_content,
                }
            })
            .collect())
    }

    async fn delete_material(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_content(
        &self,
        material_id: Uuid,
        kind: ContentKind,
    ) -> Result<Option<GeneratedContent>, DatabaseError> {
        let content = sqlx::query_as::<_, GeneratedContent>(
            r#"
            SELECT * FROM generated_content
            WHERE material_id = $1 AND type = $2
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(material_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(content)
    }

    async fn list_content(&self, material_id: Uuid) -> Result<Vec<GeneratedContent>, DatabaseError> {
        let contents = sqlx::query_as::<_, GeneratedContent>(
            "SELECT * FROM generated_content WHERE material_id = $1 ORDER BY created_at ASC",
        )
        .bind(material_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contents)
    }

    async fn insert_content(&self, content: NewGeneratedContent) -> Result<InsertOutcome, DatabaseError> {
        let content = content.into_content();
        let inserted = sqlx::query_as::<_, GeneratedContent>(
            r#"
            INSERT INTO generated_content (id, material_id, user_id, type, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (material_id, type) WHERE type IN ('summary', 'questions') DO NOTHING
            RETURNING *
            "#,
        )
        .bind(content.id)
        .bind(content.material_id)
        .bind(content.user_id)
        .bind(content.kind.as_str())
        .bind(&content.content)
        .bind(content.created_at)
        .bind(content.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(InsertOutcome::Created(row)),
            None => self
                .find_content(content.material_id, content.kind)
                .await?
                .map(InsertOutcome::Existing)
                .ok_or_else(|| {
                    DatabaseError::NotFound(format!(
                        "{} for material {}",
                        content.kind, content.material_id
                    ))
                }),
        }
    }

    async fn delete_content_for_material(&self, material_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM generated_content WHERE material_id = $1")
            .bind(material_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
