use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Who a chat message is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Typed text, voice transcript or image sent by the user.
    User,
    /// Greetings, errors, cancellations and nutrition reports.
    System,
    /// A candidate identification awaiting the user's accept/cancel.
    Confirmation,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Confirmation => write!(f, "confirmation"),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Unique message identifier: creation time in milliseconds plus a
/// per-conversation sequence number.
///
/// Ordering follows the sequence number, so append order holds even if the
/// wall clock steps backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    pub created_ms: i64,
    pub seq: u64,
}

impl MessageId {
    pub fn new(created_at: DateTime<Utc>, seq: u64) -> Self {
        Self {
            created_ms: created_at.timestamp_millis(),
            seq,
        }
    }
}

impl Ord for MessageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq
            .cmp(&other.seq)
            .then(self.created_ms.cmp(&other.created_ms))
    }
}

impl PartialOrd for MessageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.created_ms, self.seq)
    }
}

// =============================================================================
// Service payloads
// =============================================================================

/// Candidate identification returned by the Analysis Service.
///
/// Field names match the service's JSON body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationData {
    pub estimated_food: String,
    pub estimated_quantity: String,
    pub confirmation_message: String,
}

/// Calorie and macronutrient breakdown. Grams for protein, carbs and fat.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Result of the Nutrition Lookup Service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NutritionData {
    pub macros: Macros,
    pub tip: String,
}

// =============================================================================
// Messages
// =============================================================================

/// Reference to an image attached to a user message (a `data:` URL preview).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub preview_url: String,
}

/// Structured payload carried by a message.
///
/// A message carries confirmation data or nutrition data, never both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "data")]
pub enum Attachment {
    Confirmation(ConfirmationData),
    Nutrition(NutritionData),
}

/// A single entry of the conversation log. Immutable once appended.
///
/// `created_at` is derived from the identifier so the two never disagree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<ImageRef>,
    pub attachment: Option<Attachment>,
}

impl Message {
    fn new(id: MessageId, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            created_at: DateTime::from_timestamp_millis(id.created_ms).unwrap_or_else(Utc::now),
            image: None,
            attachment: None,
        }
    }

    /// A user-role text message.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, MessageRole::User, content)
    }

    /// A user-role message carrying an image preview.
    pub fn user_image(id: MessageId, content: impl Into<String>, image: ImageRef) -> Self {
        Self {
            image: Some(image),
            ..Self::new(id, MessageRole::User, content)
        }
    }

    /// A plain system-role message (greeting, error, cancellation).
    pub fn system(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, MessageRole::System, content)
    }

    /// A confirmation-role message carrying the analysis result verbatim.
    pub fn confirmation(
        id: MessageId,
        content: impl Into<String>,
        data: ConfirmationData,
    ) -> Self {
        Self {
            attachment: Some(Attachment::Confirmation(data)),
            ..Self::new(id, MessageRole::Confirmation, content)
        }
    }

    /// A system-role nutrition report carrying the lookup result verbatim.
    pub fn nutrition(id: MessageId, content: impl Into<String>, data: NutritionData) -> Self {
        Self {
            attachment: Some(Attachment::Nutrition(data)),
            ..Self::new(id, MessageRole::System, content)
        }
    }

    pub fn confirmation_data(&self) -> Option<&ConfirmationData> {
        match &self.attachment {
            Some(Attachment::Confirmation(data)) => Some(data),
            _ => None,
        }
    }

    pub fn nutrition_data(&self) -> Option<&NutritionData> {
        match &self.attachment {
            Some(Attachment::Nutrition(data)) => Some(data),
            _ => None,
        }
    }

    /// Local wall-clock label (`HH:MM`) shown next to the message.
    pub fn time_label(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}
