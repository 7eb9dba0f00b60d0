//! Error types for the conversation controller.

use crate::state::ConversationState;

/// Errors from the conversation controller.
///
/// These report misuse (an action taken while its control is disabled).
/// Service, voice and image failures reach the user as chat messages instead.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("input is disabled while {0}")]
    Busy(ConversationState),
    #[error("input is disabled while recording")]
    Recording,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("no confirmation is pending")]
    NoPendingConfirmation,
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: ConversationState,
        to: ConversationState,
    },
}
