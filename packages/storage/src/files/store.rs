use std::sync::Arc;

use futures::TryStreamExt;
use object_store::{ObjectStore, PutPayload, local::LocalFileSystem, memory::InMemory, path::Path};
use shutterlink_types::{Bytes, utils::sanitize_filename};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),
    #[error("failed to prepare storage root: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build store: {0}")]
    Build(String),
}

/// Where gallery originals and thumbnails live.
#[derive(Clone, Debug)]
pub enum GalleryStore {
    Local(Arc<LocalFileSystem>),
    AWS(Arc<object_store::aws::AmazonS3>),
    Memory(Arc<InMemory>),
}

/// Keys written for one uploaded image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageKeys {
    pub original: Path,
    pub thumbnail: Path,
}

impl GalleryStore {
    pub fn local(root: impl AsRef<std::path::Path>) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root.as_ref())?;
        let store = LocalFileSystem::new_with_prefix(root.as_ref())?;
        Ok(GalleryStore::Local(Arc::new(store)))
    }

    pub fn memory() -> Self {
        GalleryStore::Memory(Arc::new(InMemory::new()))
    }

    pub fn as_generic(&self) -> Arc<dyn ObjectStore> {
        match self {
            GalleryStore::Local(store) => store.clone() as Arc<dyn ObjectStore>,
            GalleryStore::AWS(store) => store.clone() as Arc<dyn ObjectStore>,
            GalleryStore::Memory(store) => store.clone() as Arc<dyn ObjectStore>,
        }
    }

    pub fn gallery_prefix(gallery_id: &str) -> Path {
        Path::from("galleries").child(gallery_id)
    }

    /// Builds the original and thumbnail keys for an upload. `stamp` keeps
    /// repeated uploads of the same file name apart.
    pub fn image_keys(gallery_id: &str, stamp: i64, file_name: &str) -> ImageKeys {
        let name = format!("{}-{}", stamp, sanitize_filename(file_name));
        let prefix = Self::gallery_prefix(gallery_id);
        ImageKeys {
            original: prefix.child("originals").child(name.as_str()),
            thumbnail: prefix.child("thumbnails").child(name.as_str()),
        }
    }

    pub async fn put(&self, path: &Path, data: Bytes) -> Result<(), StorageError> {
        self.as_generic()
            .put(path, PutPayload::from(data))
            .await?;
        Ok(())
    }

    pub async fn get(&self, path: &Path) -> Result<Bytes, StorageError> {
        let data = self.as_generic().get(path).await?.bytes().await?;
        Ok(data)
    }

    pub async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        match self.as_generic().delete(path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes every object stored for a gallery and returns how many went.
    pub async fn delete_gallery(&self, gallery_id: &str) -> Result<usize, StorageError> {
        let store = self.as_generic();
        let prefix = Self::gallery_prefix(gallery_id);
        let objects: Vec<_> = store.list(Some(&prefix)).try_collect().await?;

        let mut removed = 0;
        for object in objects {
            self.delete(&object.location).await?;
            removed += 1;
        }

        tracing::debug!(gallery_id, removed, "Deleted gallery objects");
        Ok(removed)
    }

    /// Public URL for a stored key under the configured files base URL.
    pub fn public_url(base_url: &str, path: &Path) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_to_the_gallery() {
        let keys = GalleryStore::image_keys("g1", 1700000000000, "My Shot.jpg");
        assert_eq!(
            keys.original.as_ref(),
            "galleries/g1/originals/1700000000000-My_Shot.jpg"
        );
        assert_eq!(
            keys.thumbnail.as_ref(),
            "galleries/g1/thumbnails/1700000000000-My_Shot.jpg"
        );
    }

    #[test]
    fn public_urls_join_cleanly() {
        let path = Path::from("galleries/g1/originals/a.jpg");
        assert_eq!(
            GalleryStore::public_url("https://cdn.example.com/files/", &path),
            "https://cdn.example.com/files/galleries/g1/originals/a.jpg"
        );
        assert_eq!(
            GalleryStore::public_url("/uploads", &path),
            "/uploads/galleries/g1/originals/a.jpg"
        );
    }

    #[tokio::test]
    async fn delete_gallery_only_touches_its_prefix() {
        let store = GalleryStore::memory();
        let a = GalleryStore::image_keys("g1", 1, "a.jpg");
        let b = GalleryStore::image_keys("g2", 1, "b.jpg");
        for path in [&a.original, &a.thumbnail, &b.original] {
            store.put(path, Bytes::from_static(b"data")).await.unwrap();
        }

        assert_eq!(store.delete_gallery("g1").await.unwrap(), 2);
        assert!(store.get(&a.original).await.is_err());
        assert_eq!(store.get(&b.original).await.unwrap(), Bytes::from_static(b"data"));

        // missing objects are not an error
        store.delete(&a.thumbnail).await.unwrap();
    }
}
