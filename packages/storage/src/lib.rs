pub mod files;
pub mod imaging;

pub use files::config::{S3Config, StorageConfig, StorageProvider};
pub use files::store::{GalleryStore, StorageError};
pub use object_store;
pub use object_store::path::Path;
