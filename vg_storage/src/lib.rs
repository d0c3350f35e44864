//! ABOUTME: Object storage for uploaded video files
//! ABOUTME: Local filesystem or S3-compatible backends with retry on transient failures

use std::path::PathBuf;

use backoff::{future::retry, ExponentialBackoff};
use bytes::Bytes;
use object_store::{
    aws::AmazonS3Builder, local::LocalFileSystem, path::Path, ObjectStore, PutPayload,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StorageError> for vg_core::Error {
    fn from(err: StorageError) -> Self {
        vg_core::Error::Storage(err.to_string())
    }
}

/// URI of a stored video, either `file://` or `s3://`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoUri {
    pub uri: String,
}

impl VideoUri {
    pub fn new(uri: impl Into<String>) -> Result<Self, StorageError> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(StorageError::InvalidUri("URI cannot be empty".to_string()));
        }
        if let Some(path) = uri.strip_prefix("file://") {
            if path.is_empty() {
                return Err(StorageError::InvalidUri(
                    "File path cannot be empty".to_string(),
                ));
            }
        } else if uri.starts_with("s3://") {
            Url::parse(&uri)?;
        } else {
            return Err(StorageError::InvalidUri(format!(
                "Unsupported URI scheme: {}",
                uri
            )));
        }
        Ok(VideoUri { uri })
    }

    pub fn scheme(&self) -> &str {
        self.uri.split("://").next().unwrap_or("unknown")
    }

    fn object_path(&self) -> Result<Path, StorageError> {
        if let Some(path) = self.uri.strip_prefix("file://") {
            Ok(Path::from(path))
        } else if self.uri.starts_with("s3://") {
            let url = Url::parse(&self.uri)?;
            Ok(Path::from(url.path().trim_start_matches('/')))
        } else {
            Err(StorageError::InvalidUri(format!(
                "Cannot extract path from URI: {}",
                self.uri
            )))
        }
    }
}

impl std::fmt::Display for VideoUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Base directory for local video files
    pub base_dir: Option<PathBuf>,
    /// Bucket the `s3://` URIs resolve against, required with credentials
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
}

/// Video file storage over local filesystem and S3 backends
pub struct VideoStorage {
    local: Option<Box<dyn ObjectStore>>,
    s3: Option<Box<dyn ObjectStore>>,
}

impl VideoStorage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let mut storage = VideoStorage {
            local: None,
            s3: None,
        };

        if let Some(base_dir) = &config.base_dir {
            std::fs::create_dir_all(base_dir)
                .map_err(|e| StorageError::Config(format!("Cannot create video dir: {}", e)))?;
            let local_fs = LocalFileSystem::new_with_prefix(base_dir)?;
            storage.local = Some(Box::new(local_fs));
            debug!("Initialized local video storage at: {:?}", base_dir);
        }

        if config.s3_access_key.is_some() && config.s3_secret_key.is_some() {
            let bucket = config.s3_bucket.as_deref().ok_or_else(|| {
                StorageError::Config(
                    "S3 credentials provided without a bucket name".to_string(),
                )
            })?;
            let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
            if let Some(region) = &config.s3_region {
                builder = builder.with_region(region);
            }
            if let Some(endpoint) = &config.s3_endpoint {
                builder = builder.with_endpoint(endpoint);
            }
            if let Some(access_key) = &config.s3_access_key {
                builder = builder.with_access_key_id(access_key);
            }
            if let Some(secret_key) = &config.s3_secret_key {
                builder = builder.with_secret_access_key(secret_key);
            }
            storage.s3 = Some(Box::new(builder.build()?));
            info!("Initialized S3 video storage");
        }

        Ok(storage)
    }

    fn store_for(&self, uri: &VideoUri) -> Result<&dyn ObjectStore, StorageError> {
        match uri.scheme() {
            "file" => self
                .local
                .as_deref()
                .ok_or_else(|| StorageError::Config("Local storage not configured".to_string())),
            "s3" => self
                .s3
                .as_deref()
                .ok_or_else(|| StorageError::Config("S3 storage not configured".to_string())),
            scheme => Err(StorageError::InvalidUri(format!(
                "Unsupported scheme: {}",
                scheme
            ))),
        }
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, StorageError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, object_store::Error>>,
    {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(std::time::Duration::from_secs(60)),
            ..Default::default()
        };

        retry(backoff, || async {
            operation().await.map_err(|e| {
                warn!("Storage operation failed, will retry: {}", e);
                backoff::Error::transient(e)
            })
        })
        .await
        .map_err(StorageError::ObjectStore)
    }

    /// Store video bytes at the given URI
    pub async fn put(&self, uri: &VideoUri, data: Bytes) -> Result<(), StorageError> {
        let store = self.store_for(uri)?;
        let path = uri.object_path()?;
        let size = data.len();
        let payload = PutPayload::from(data);

        self.with_retry(|| async { store.put(&path, payload.clone()).await })
            .await?;
        info!("Stored {} bytes at {}", size, uri);
        Ok(())
    }

    /// Retrieve video bytes from the given URI
    pub async fn get(&self, uri: &VideoUri) -> Result<Bytes, StorageError> {
        let store = self.store_for(uri)?;
        let path = uri.object_path()?;

        let result = self.with_retry(|| async { store.get(&path).await }).await?;
        Ok(result.bytes().await?)
    }

    pub async fn exists(&self, uri: &VideoUri) -> Result<bool, StorageError> {
        let store = self.store_for(uri)?;
        let path = uri.object_path()?;

        match store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::ObjectStore(e)),
        }
    }

    /// Delete the stored video. Deleting a missing object is not an error,
    /// so video-reference deletion stays idempotent.
    pub async fn delete(&self, uri: &VideoUri) -> Result<(), StorageError> {
        let store = self.store_for(uri)?;
        let path = uri.object_path()?;

        match store.delete(&path).await {
            Ok(()) => {
                debug!("Deleted stored video at {}", uri);
                Ok(())
            }
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::ObjectStore(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local_storage(temp_dir: &TempDir) -> VideoStorage {
        VideoStorage::new(StorageConfig {
            base_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_uri_validation() {
        assert!(VideoUri::new("file://videos/clip.mp4").is_ok());
        assert!(VideoUri::new("s3://bucket/videos/clip.mp4").is_ok());
        assert!(VideoUri::new("").is_err());
        assert!(VideoUri::new("ftp://host/clip.mp4").is_err());
        assert!(VideoUri::new("file://").is_err());
    }

    #[test]
    fn test_uri_scheme() {
        let uri = VideoUri::new("s3://bucket/clip.mp4").unwrap();
        assert_eq!(uri.scheme(), "s3");
    }

    #[test]
    fn test_s3_credentials_require_a_bucket() {
        let result = VideoStorage::new(StorageConfig {
            s3_region: Some("us-east-1".to_string()),
            s3_access_key: Some("key".to_string()),
            s3_secret_key: Some("secret".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[test]
    fn test_s3_backend_builds_with_bucket() {
        let storage = VideoStorage::new(StorageConfig {
            s3_bucket: Some("videos".to_string()),
            s3_region: Some("us-east-1".to_string()),
            s3_access_key: Some("key".to_string()),
            s3_secret_key: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(storage.s3.is_some());
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = local_storage(&temp_dir);
        let uri = VideoUri::new("file://videos/clip.mp4").unwrap();

        storage
            .put(&uri, Bytes::from_static(b"video bytes"))
            .await
            .unwrap();
        assert!(storage.exists(&uri).await.unwrap());

        let data = storage.get(&uri).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"video bytes"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = local_storage(&temp_dir);
        let uri = VideoUri::new("file://videos/clip.mp4").unwrap();

        storage
            .put(&uri, Bytes::from_static(b"video bytes"))
            .await
            .unwrap();
        storage.delete(&uri).await.unwrap();
        assert!(!storage.exists(&uri).await.unwrap());

        // second delete of a missing object succeeds
        storage.delete(&uri).await.unwrap();
    }

    #[tokio::test]
    async fn test_unconfigured_backend_rejected() {
        let storage = VideoStorage::new(StorageConfig::default()).unwrap();
        let uri = VideoUri::new("file://videos/clip.mp4").unwrap();

        let err = storage.get(&uri).await.unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }
}
