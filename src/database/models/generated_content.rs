use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Summary,
    Questions,
    Flashcards,
    Chat,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Summary => "summary",
            ContentKind::Questions => "questions",
            ContentKind::Flashcards => "flashcards",
            ContentKind::Chat => "chat",
        }
    }

    /// Kinds generated at most once per material
    pub fn is_cached(&self) -> bool {
        matches!(self, ContentKind::Summary | ContentKind::Questions)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(ContentKind::Summary),
            "questions" => Ok(ContentKind::Questions),
            "flashcards" => Ok(ContentKind::Flashcards),
            "chat" => Ok(ContentKind::Chat),
            other => Err(UnknownVariant {
                kind: "content type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub id: Uuid,
    pub material_id: Uuid,
    pub user_id: Uuid,
    pub kind: ContentKind,
    /// Plain text for summaries; JSON-encoded text for quizzes
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for GeneratedContent {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("type")?;
        Ok(Self {
            id: row.try_get("id")?,
            material_id: row.try_get("material_id")?,
            user_id: row.try_get("user_id")?,
            kind: kind.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewGeneratedContent {
    pub material_id: Uuid,
    pub user_id: Uuid,
    pub kind: ContentKind,
    pub content: String,
}

impl NewGeneratedContent {
    pub fn into_content(self) -> GeneratedContent {
        let now = Utc::now();
        GeneratedContent {
            id: Uuid::new_v4(),
            material_id: self.material_id,
            user_id: self.user_id,
            kind: self.kind,
            content: self.content,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_summary_and_quiz_are_cached() {
        assert!(ContentKind::Summary.is_cached());
        assert!(ContentKind::Questions.is_cached());
        assert!(!ContentKind::Chat.is_cached());
        assert!(!ContentKind::Flashcards.is_cached());
    }

    #[test]
    fn test_kind_parses_stored_names() {
        for kind in [ContentKind::Summary, ContentKind::Questions, ContentKind::Flashcards, ContentKind::Chat] {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
        assert!("quiz".parse::<ContentKind>().is_err());
    }
}
