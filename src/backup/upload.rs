//! Remote storage for backup archives

use crate::core::{Config, ConfigError, UploadError};
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_REGION: &str = "us-east-1";

/// Remote upload settings, present only when `BACKUP_ENABLED` is true
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBackupSettings {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
}

impl RemoteBackupSettings {
    /// `None` when `BACKUP_ENABLED` is absent or false.
    ///
    /// Missing credential keys read as empty so the upload stage can report
    /// them instead of aborting the whole backup.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ConfigError> {
        if !config.contains("BACKUP_ENABLED") || !config.get_bool("BACKUP_ENABLED")? {
            return Ok(None);
        }

        let text = |key: &str| -> Result<String, ConfigError> {
            Ok(config.get_optional_str(key)?.unwrap_or_default().to_string())
        };

        Ok(Some(Self {
            access_key: text("BACKUP_S3_ACCESS_KEY")?,
            secret_key: text("BACKUP_S3_SECRET_KEY")?,
            bucket: text("BACKUP_S3_BUCKET_NAME")?,
            region: config
                .get_optional_str("BACKUP_S3_REGION")?
                .unwrap_or(DEFAULT_REGION)
                .to_string(),
            endpoint: config.get_optional_str("BACKUP_S3_ENDPOINT")?.map(str::to_string),
        }))
    }
}

/// Trait for archive uploads - allows swapping the remote store in tests
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload the file at `archive` under object key `key`
    async fn upload(&self, archive: &Path, key: &str) -> Result<(), UploadError>;
}

/// Uploads archives to any `object_store` backend (S3 in production)
pub struct ObjectStoreUploader {
    store: Arc<dyn ObjectStore>,
    description: String,
}

impl ObjectStoreUploader {
    pub fn new(store: Arc<dyn ObjectStore>, description: impl Into<String>) -> Self {
        Self {
            store,
            description: description.into(),
        }
    }

    /// Build an S3 uploader; empty credentials are rejected up front
    pub fn s3(settings: &RemoteBackupSettings) -> Result<Self, UploadError> {
        if settings.access_key.is_empty() || settings.secret_key.is_empty() {
            return Err(UploadError::CredentialsRejected(
                "BACKUP_S3_ACCESS_KEY and BACKUP_S3_SECRET_KEY must be set".to_string(),
            ));
        }
        if settings.bucket.is_empty() {
            return Err(UploadError::Remote("BACKUP_S3_BUCKET_NAME is not set".to_string()));
        }

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&settings.bucket)
            .with_region(&settings.region)
            .with_access_key_id(&settings.access_key)
            .with_secret_access_key(&settings.secret_key);

        if let Some(endpoint) = &settings.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false);
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }

        let store = builder
            .build()
            .map_err(|e| UploadError::Remote(format!("S3: {}", e)))?;

        Ok(Self::new(Arc::new(store), format!("s3://{}", settings.bucket)))
    }
}

#[async_trait]
impl Uploader for ObjectStoreUploader {
    async fn upload(&self, archive: &Path, key: &str) -> Result<(), UploadError> {
        let data = tokio::fs::read(archive).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                UploadError::ArchiveNotFound(archive.to_path_buf())
            } else {
                UploadError::Remote(format!("Failed to read {}: {}", archive.display(), e))
            }
        })?;

        debug!("Uploading {} bytes to {}/{}", data.len(), self.description, key);
        self.store
            .put(&ObjectPath::from(key), data.into())
            .await
            .map_err(classify)?;

        info!("Uploaded {} to {}/{}", archive.display(), self.description, key);
        Ok(())
    }
}

/// Authentication and authorization failures are reported as credential problems
fn classify(err: object_store::Error) -> UploadError {
    match &err {
        object_store::Error::Unauthenticated { .. } | object_store::Error::PermissionDenied { .. } => {
            UploadError::CredentialsRejected(err.to_string())
        }
        _ => UploadError::Remote(err.to_string()),
    }
}
