//! Image capture: turn a selected file into a preview URL and an upload blob.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use nutribot_client::ImageUpload;
use nutribot_core::types::ImageRef;

/// Largest photo accepted for upload (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("could not read image file: {0}")]
    Read(#[from] std::io::Error),
    #[error("file is not a JPEG, PNG, GIF or WebP image")]
    NotAnImage,
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

impl ImageError {
    /// Short reason shown in the chat.
    pub fn user_reason(&self) -> String {
        match self {
            ImageError::Read(_) => "no se pudo leer el archivo.".to_string(),
            ImageError::NotAnImage => {
                "el archivo no es una imagen (JPEG, PNG, GIF o WebP).".to_string()
            }
            ImageError::TooLarge { limit, .. } => {
                format!("la imagen supera los {} MB.", limit / (1024 * 1024))
            }
        }
    }
}

/// Identify an image type from its leading bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// A user-selected photo: `data:` URL for the preview and raw bytes for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    preview_url: String,
    blob: Bytes,
    mime: &'static str,
}

impl CapturedImage {
    /// Validate in-memory image bytes and build the preview.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, ImageError> {
        let blob = bytes.into();
        let size = blob.len() as u64;
        if size > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge {
                size,
                limit: MAX_IMAGE_BYTES,
            });
        }
        let mime = sniff_mime(&blob).ok_or(ImageError::NotAnImage)?;
        let preview_url = format!("data:{mime};base64,{}", STANDARD.encode(&blob));
        Ok(Self {
            preview_url,
            blob,
            mime,
        })
    }

    /// Read a photo from disk. The size limit is checked before reading.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge {
                size,
                limit: MAX_IMAGE_BYTES,
            });
        }
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), size, "Image file read");
        Self::from_bytes(bytes)
    }

    pub fn preview_url(&self) -> &str {
        &self.preview_url
    }

    pub fn blob(&self) -> &Bytes {
        &self.blob
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Reference stored on the user message.
    pub fn image_ref(&self) -> ImageRef {
        ImageRef {
            preview_url: self.preview_url.clone(),
        }
    }

    /// Multipart payload for the Analysis Service.
    pub fn upload(&self) -> ImageUpload {
        ImageUpload::from_blob(self.blob.clone())
    }
}
