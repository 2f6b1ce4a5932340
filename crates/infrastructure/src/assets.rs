use std::path::{Path, PathBuf};

use application::{is_supported_image, AssetStore, AssetStoreError, UploadedImage};
use async_trait::async_trait;
use domain::ImageRef;
use uuid::Uuid;

/// Public path segment under which stored images are served and referenced.
pub const PUBLIC_PREFIX: &str = "images";

/// Stores post images on the local filesystem under a single root
/// directory, named by a random id so references never collide.
#[derive(Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn extension_for(content_type: &str) -> &'static str {
        match content_type.to_ascii_lowercase().as_str() {
            "image/png" => "png",
            _ => "jpg",
        }
    }

    /// Map a public reference back to a file inside the root. References
    /// that try to climb out of the root are rejected.
    fn local_path(&self, reference: &ImageRef) -> Result<PathBuf, AssetStoreError> {
        let name = reference
            .as_str()
            .strip_prefix(&format!("{PUBLIC_PREFIX}/"))
            .ok_or_else(|| {
                AssetStoreError::io(format!("unknown asset reference: {reference}"))
            })?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(AssetStoreError::io(format!(
                "refusing path outside asset root: {reference}"
            )));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, upload: UploadedImage) -> Result<Option<ImageRef>, AssetStoreError> {
        if !is_supported_image(&upload.content_type) {
            tracing::debug!(
                content_type = %upload.content_type,
                name = %upload.original_name,
                "dropping upload with unsupported content type"
            );
            return Ok(None);
        }

        let filename = format!(
            "{}.{}",
            Uuid::new_v4(),
            Self::extension_for(&upload.content_type)
        );

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| AssetStoreError::io(err.to_string()))?;
        tokio::fs::write(self.root.join(&filename), &upload.bytes)
            .await
            .map_err(|err| AssetStoreError::io(err.to_string()))?;

        let reference = ImageRef::parse(format!("{PUBLIC_PREFIX}/{filename}"))
            .map_err(|err| AssetStoreError::io(err.to_string()))?;
        Ok(Some(reference))
    }

    async fn delete(&self, reference: &ImageRef) -> Result<(), AssetStoreError> {
        let path = self.local_path(reference)?;
        tokio::fs::remove_file(path)
            .await
            .map_err(|err| AssetStoreError::io(err.to_string()))
    }
}
