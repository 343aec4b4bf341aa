use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{GeneratedContent, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(FileType::Pdf),
            "docx" => Ok(FileType::Docx),
            "txt" => Ok(FileType::Txt),
            other => Err(UnknownVariant {
                kind: "file type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    /// Object-store key of the uploaded blob; unique across all materials
    pub storage_path: String,
    pub file_type: FileType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

impl<'r> FromRow<'r, PgRow> for Material {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let file_type: String = row.try_get("file_type")?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            file_name: row.try_get("file_name")?,
            storage_path: row.try_get("storage_path")?,
            file_type: file_type.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub user_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub file_type: FileType,
}

impl NewMaterial {
    pub fn into_material(self) -> Material {
        let now = Utc::now();
        Material {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            file_name: self.file_name,
            storage_path: self.storage_path,
            file_type: self.file_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A material joined with every artifact generated from it.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialWithContent {
    pub material: Material,
    pub generated_content: Vec<GeneratedContent>,
}
