//! Conversation controller for NutriBot.
//!
//! Owns the message log, the confirmation sub-state and the voice session,
//! and turns typed text, voice transcripts and photos into analysis and
//! nutrition lookups against a [`FoodService`](nutribot_client::FoodService).

pub mod confirmation;
pub mod controller;
pub mod error;
pub mod image;
pub mod log;
pub mod state;
pub mod text;
pub mod voice;

pub use confirmation::{ConfirmedFood, PendingConfirmation};
pub use controller::{
    run_call, Applied, CallOutcome, Conversation, ConversationController, RequestId, ServiceCall,
    Submission,
};
pub use error::ChatError;
pub use image::{CapturedImage, ImageError, MAX_IMAGE_BYTES};
pub use log::ConversationLog;
pub use state::{ConversationState, StateMachine};
pub use voice::{
    CapabilityError, PermissionState, SpeechRecognizer, UnavailableRecognizer, VoiceCapability,
    VoiceErrorKind, VoiceEvent, VoiceEventSink, VoiceEvents, VoiceSession,
};
