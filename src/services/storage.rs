use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::{IdentityConfig, StorageConfig};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to download file from storage.")]
    Download { cause: String },

    #[error("Failed to delete file from storage.")]
    Delete { cause: String },

    #[error("Object store is misconfigured.")]
    Config(String),
}

/// Object-store seam; production impl talks to Supabase Storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// Supabase Storage REST client authenticated with the service-role key.
#[derive(Clone)]
pub struct SupabaseStorage {
    http: Client,
    base_url: Url,
    bucket: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(identity: &IdentityConfig, storage: &StorageConfig) -> Result<Self, StorageError> {
        let base_url = Url::parse(&identity.supabase_url)
            .map_err(|e| StorageError::Config(format!("SUPABASE_URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Config("SUPABASE_URL must be an http(s) URL".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(storage.timeout_secs))
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            bucket: storage.bucket.clone(),
            service_key: storage.service_key.clone(),
        })
    }

    /// `{base}/storage/v1/object/{bucket}[/{path segments}]`, each segment percent-encoded
    fn object_url(&self, path: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "object", self.bucket.as_str()]);
            if let Some(path) = path {
                segments.extend(path.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(Some(path));
        tracing::debug!("Downloading {} from bucket {}", path, self.bucket);

        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(|e| StorageError::Download { cause: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Download {
                cause: format!("{} {}", status, body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Download { cause: e.to_string() })?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let url = self.object_url(None);

        let response = self
            .authorized(self.http.delete(url))
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await
            .map_err(|e| StorageError::Delete { cause: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Delete {
                cause: format!("{} {}", status, body),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(base: &str) -> SupabaseStorage {
        let identity = IdentityConfig {
            supabase_url: base.to_string(),
            ..Default::default()
        };
        let config = StorageConfig {
            service_key: "service".to_string(),
            bucket: "materials".to_string(),
            timeout_secs: 5,
        };
        SupabaseStorage::new(&identity, &config).unwrap()
    }

    #[test]
    fn test_object_url_encodes_segments() {
        let url = storage("https://project.supabase.co").object_url(Some("u1/my notes.pdf"));
        assert_eq!(
            url.as_str(),
            "https://project.supabase.co/storage/v1/object/materials/u1/my%20notes.pdf"
        );
    }

    #[test]
    fn test_bucket_url_for_delete() {
        let url = storage("https://project.supabase.co/").object_url(None);
        assert_eq!(url.as_str(), "https://project.supabase.co/storage/v1/object/materials");
    }

    #[test]
    fn test_rejects_non_http_base() {
        let identity = IdentityConfig {
            supabase_url: "mailto:ops@example.com".to_string(),
            ..Default::default()
        };
        let config = StorageConfig {
            service_key: "k".to_string(),
            bucket: "materials".to_string(),
            timeout_secs: 5,
        };
        assert!(matches!(SupabaseStorage::new(&identity, &config), Err(StorageError::Config(_))));
    }
}
