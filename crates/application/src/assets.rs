use async_trait::async_trait;
use domain::ImageRef;
use thiserror::Error;

/// Content types accepted for post images. Anything else is dropped without
/// an error, per the upload policy.
pub const SUPPORTED_IMAGE_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/jpg", "image/jfif"];

pub fn is_supported_image(content_type: &str) -> bool {
    SUPPORTED_IMAGE_TYPES
        .iter()
        .any(|accepted| content_type.eq_ignore_ascii_case(accepted))
}

/// Raw upload as it arrives from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// How a mutation supplies its image: a fresh upload, an already-stored
/// reference, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Upload(UploadedImage),
    Reference(String),
    Missing,
}

#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("asset store error: {0}")]
    Io(String),
}

impl AssetStoreError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist an upload and return its stable reference. An unsupported
    /// content type yields `Ok(None)`: the file is dropped, not the request.
    async fn store(&self, upload: UploadedImage) -> Result<Option<ImageRef>, AssetStoreError>;

    /// Best-effort unlink. Callers treat failures as log-only.
    async fn delete(&self, reference: &ImageRef) -> Result<(), AssetStoreError>;
}
