//! The external collaborator seam: one trait for both remote operations.

use async_trait::async_trait;
use bytes::Bytes;

use nutribot_core::types::{ConfirmationData, NutritionData};

use crate::error::Result;

/// File name the original client used for every uploaded photo.
pub const UPLOAD_FILE_NAME: &str = "food-image.jpg";
/// Content type declared for every uploaded photo.
pub const UPLOAD_MIME: &str = "image/jpeg";

/// Binary image payload ready for a multipart upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime: String,
}

impl ImageUpload {
    /// Wrap a captured blob with the upload name and type the service expects.
    pub fn from_blob(bytes: Bytes) -> Self {
        Self {
            bytes,
            file_name: UPLOAD_FILE_NAME.to_string(),
            mime: UPLOAD_MIME.to_string(),
        }
    }
}

/// What the user submitted for analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisInput {
    /// Typed text or a voice transcript, sent as JSON.
    Text(String),
    /// A photo, sent as a multipart form.
    Image(ImageUpload),
}

impl AnalysisInput {
    /// Short label for logs.
    pub fn mode(&self) -> &'static str {
        match self {
            AnalysisInput::Text(_) => "text",
            AnalysisInput::Image(_) => "image",
        }
    }
}

/// Analysis Service + Nutrition Lookup Service.
///
/// Implementations must not retry: a failure is reported once and the
/// conversation decides what the user sees.
#[async_trait]
pub trait FoodService: Send + Sync {
    /// Turn a description or photo into a candidate food and quantity.
    async fn analyze(&self, input: AnalysisInput) -> Result<ConfirmationData>;

    /// Turn a confirmed food and quantity into macros and a tip.
    async fn lookup_nutrition(&self, food: &str, quantity: &str) -> Result<NutritionData>;
}
