//! Unified access to local and S3-hosted NetCDF sources.
//!
//! Model output commonly lives in object storage, but the NetCDF library wants
//! a local path. [`stage_source`] bridges the two: local locators pass through
//! untouched, `s3://bucket/key` locators are downloaded into a temporary file
//! whose lifetime is tied to the returned [`StagedSource`] guard, so the local
//! copy is released on every exit path, including error paths.
//!
//! AWS credentials are resolved the usual way: environment variables, the
//! credentials file, or an IAM role.

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS S3 GetObject error: {0}")]
    S3GetObject(
        #[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::get_object::GetObjectError>,
    ),

    #[error("AWS S3 PutObject error: {0}")]
    S3PutObject(
        #[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::put_object::PutObjectError>,
    ),

    #[error("AWS ByteStream error: {0}")]
    ByteStream(String),

    #[error("Invalid S3 path format: {0}")]
    InvalidS3Path(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Interface shared by the storage backends
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reads the entire contents of a file.
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Writes data to a file, creating it if it doesn't exist.
    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()>;
}

/// Local filesystem backend
#[derive(Debug, Clone)]
pub struct LocalStorage;

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::PathNotFound(path.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied(path.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent).await.map_err(StorageError::Io)?;
        }

        match fs::write(path, data).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied(path.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Amazon S3 backend
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    /// Creates an S3 backend from the default AWS configuration.
    pub async fn new() -> StorageResult<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Ok(S3Storage {
            client: S3Client::new(&config),
        })
    }

    /// Splits `s3://bucket/key` into (bucket, key).
    fn parse_s3_path(s3_path: &str) -> StorageResult<(String, String)> {
        let stripped = s3_path.strip_prefix("s3://").ok_or_else(|| {
            StorageError::InvalidS3Path(format!("S3 path must start with 's3://': {s3_path}"))
        })?;

        let parts: Vec<&str> = stripped.splitn(2, '/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(StorageError::InvalidS3Path(format!(
                "Expected 's3://bucket/key': {s3_path}"
            )));
        }

        Ok((parts[0].to_string(), parts[1].to_string()))
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let (bucket, key) = Self::parse_s3_path(path)?;

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                aws_sdk_s3::error::SdkError::ServiceError(service_err)
                    if service_err.err().is_no_such_key() =>
                {
                    StorageError::PathNotFound(path.to_string())
                }
                _ => StorageError::S3GetObject(e),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ByteStream(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let (bucket, key) = Self::parse_s3_path(path)?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(StorageError::S3PutObject)?;

        Ok(())
    }
}

/// Backend selected for one locator
#[derive(Debug)]
pub enum Storage {
    Local(LocalStorage),
    S3(S3Storage),
}

#[async_trait::async_trait]
impl StorageBackend for Storage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        match self {
            Storage::Local(storage) => storage.read(path).await,
            Storage::S3(storage) => storage.read(path).await,
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        match self {
            Storage::Local(storage) => storage.write(path, data).await,
            Storage::S3(storage) => storage.write(path, data).await,
        }
    }
}

/// Picks a backend from the locator pattern: `s3://` means S3, anything else
/// is a local path.
pub struct StorageFactory;

impl StorageFactory {
    pub async fn from_path(path: &str) -> StorageResult<Storage> {
        if Self::is_s3_path(path) {
            Ok(Storage::S3(S3Storage::new().await?))
        } else {
            Ok(Storage::Local(LocalStorage))
        }
    }

    pub fn is_s3_path(path: &str) -> bool {
        path.starts_with("s3://")
    }
}

/// A source locator resolved to a readable local path.
///
/// For remote sources the downloaded copy lives in a named temp file owned by
/// this guard; dropping the guard deletes the copy. Local sources carry no
/// temp file and are never deleted.
#[derive(Debug)]
pub struct StagedSource {
    locator: String,
    local_path: PathBuf,
    _staged: Option<NamedTempFile>,
}

impl StagedSource {
    /// The original locator, used verbatim in error reports.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Local path suitable for `netcdf::open`.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

/// Resolves a locator into a [`StagedSource`], downloading `s3://` sources to
/// a temporary file first.
pub async fn stage_source(locator: &str) -> StorageResult<StagedSource> {
    if StorageFactory::is_s3_path(locator) {
        let storage = StorageFactory::from_path(locator).await?;
        let data = storage.read(locator).await?;

        let staged = NamedTempFile::new()?;
        log::debug!("staging {} to {:?}", locator, staged.path());
        fs::write(staged.path(), data).await?;

        Ok(StagedSource {
            locator: locator.to_string(),
            local_path: staged.path().to_path_buf(),
            _staged: Some(staged),
        })
    } else {
        if fs::metadata(locator).await.is_err() {
            return Err(StorageError::PathNotFound(locator.to_string()));
        }
        Ok(StagedSource {
            locator: locator.to_string(),
            local_path: PathBuf::from(locator),
            _staged: None,
        })
    }
}
