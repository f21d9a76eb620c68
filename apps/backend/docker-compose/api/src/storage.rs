use crate::config::Config;
use shutterlink_storage::{GalleryStore, StorageConfig, StorageError};

pub fn create_store(config: &Config) -> Result<GalleryStore, StorageError> {
    let store = config.storage.build_store()?;
    tracing::info!(provider = %config.storage.provider(), "Gallery store ready");
    Ok(store)
}

/// Directory to serve uploads from when files live on local disk.
pub fn served_root(config: &Config) -> Option<&std::path::Path> {
    match &config.storage {
        StorageConfig::Local { root } => Some(root.as_path()),
        _ => None,
    }
}
