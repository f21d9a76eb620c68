use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use serde::{Deserialize, Serialize};

use super::store::{GalleryStore, StorageError};

/// Storage provider type
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Local,
    Memory,
    Aws,
}

impl Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::Local => write!(f, "local"),
            StorageProvider::Memory => write!(f, "memory"),
            StorageProvider::Aws => write!(f, "aws"),
        }
    }
}

impl std::str::FromStr for StorageProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Ok(StorageProvider::Local),
            "memory" | "mem" => Ok(StorageProvider::Memory),
            "aws" | "s3" => Ok(StorageProvider::Aws),
            _ => Err(format!("Unknown storage provider: {}", s)),
        }
    }
}

/// AWS S3 configuration
///
/// Without static credentials the default AWS credential chain applies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub use_path_style: bool,
}

impl S3Config {
    pub fn build_store(&self) -> Result<GalleryStore, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(&self.region)
            .with_bucket_name(&self.bucket);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&self.access_key_id, &self.secret_access_key)
        {
            builder = builder
                .with_access_key_id(access_key)
                .with_secret_access_key(secret_key);
        }

        if self.use_path_style {
            builder = builder.with_config(AmazonS3ConfigKey::VirtualHostedStyleRequest, "false");
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Build(format!("Failed to build S3 store: {}", e)))?;
        Ok(GalleryStore::AWS(Arc::new(store)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum StorageConfig {
    Local { root: PathBuf },
    Memory,
    Aws(S3Config),
}

impl StorageConfig {
    pub fn provider(&self) -> StorageProvider {
        match self {
            StorageConfig::Local { .. } => StorageProvider::Local,
            StorageConfig::Memory => StorageProvider::Memory,
            StorageConfig::Aws(_) => StorageProvider::Aws,
        }
    }

    pub fn build_store(&self) -> Result<GalleryStore, StorageError> {
        match self {
            StorageConfig::Local { root } => GalleryStore::local(root),
            StorageConfig::Memory => Ok(GalleryStore::memory()),
            StorageConfig::Aws(s3) => s3.build_store(),
        }
    }
}
