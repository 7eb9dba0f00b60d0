//! Conversation state machine.
//!
//! Enforces the confirm-then-resolve lifecycle:
//! - Idle -> AwaitingAnalysis (text or image submitted)
//! - AwaitingAnalysis -> AwaitingConfirmation (analysis succeeded)
//! - AwaitingAnalysis -> Idle (analysis failed)
//! - AwaitingConfirmation -> AwaitingNutrition (user confirmed)
//! - AwaitingConfirmation -> Idle (user cancelled)
//! - AwaitingNutrition -> Idle (lookup succeeded or failed)

use std::fmt;

use crate::error::ChatError;

/// Where a conversation stands in the confirm-then-resolve flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConversationState {
    /// Ready for a new submission.
    #[default]
    Idle,
    /// A submission was sent to the Analysis Service.
    AwaitingAnalysis,
    /// A confirmation message is waiting for accept or cancel.
    AwaitingConfirmation,
    /// The user accepted; the Nutrition Lookup Service call is pending.
    AwaitingNutrition,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationState::Idle => write!(f, "idle"),
            ConversationState::AwaitingAnalysis => write!(f, "awaiting-analysis"),
            ConversationState::AwaitingConfirmation => write!(f, "awaiting-confirmation"),
            ConversationState::AwaitingNutrition => write!(f, "awaiting-nutrition"),
        }
    }
}

impl ConversationState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ConversationState) -> bool {
        matches!(
            (self, target),
            (ConversationState::Idle, ConversationState::AwaitingAnalysis)
                | (ConversationState::AwaitingAnalysis, ConversationState::AwaitingConfirmation)
                | (ConversationState::AwaitingAnalysis, ConversationState::Idle)
                | (ConversationState::AwaitingConfirmation, ConversationState::AwaitingNutrition)
                | (ConversationState::AwaitingConfirmation, ConversationState::Idle)
                | (ConversationState::AwaitingNutrition, ConversationState::Idle)
        )
    }

    /// True while a service call is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ConversationState::AwaitingAnalysis | ConversationState::AwaitingNutrition
        )
    }
}

/// Validated holder of the current [`ConversationState`].
///
/// Owned by a single conversation; every transition is checked against
/// [`ConversationState::can_transition_to`] before it is applied.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: ConversationState,
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ConversationState {
        self.state
    }

    /// Attempt to transition to the target state.
    pub fn transition(&mut self, target: ConversationState) -> Result<(), ChatError> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Conversation state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(ChatError::InvalidTransition {
                from: self.state,
                to: target,
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ConversationState; 4] = [
        ConversationState::Idle,
        ConversationState::AwaitingAnalysis,
        ConversationState::AwaitingConfirmation,
        ConversationState::AwaitingNutrition,
    ];

    // ---- ConversationState ----

    #[test]
    fn test_state_display() {
        assert_eq!(ConversationState::Idle.to_string(), "idle");
        assert_eq!(
            ConversationState::AwaitingAnalysis.to_string(),
            "awaiting-analysis"
        );
        assert_eq!(
            ConversationState::AwaitingConfirmation.to_string(),
            "awaiting-confirmation"
        );
        assert_eq!(
            ConversationState::AwaitingNutrition.to_string(),
            "awaiting-nutrition"
        );
    }

    #[test]
    fn test_valid_transitions() {
        use ConversationState::*;
        assert!(Idle.can_transition_to(&AwaitingAnalysis));
        assert!(AwaitingAnalysis.can_transition_to(&AwaitingConfirmation));
        assert!(AwaitingAnalysis.can_transition_to(&Idle));
        assert!(AwaitingConfirmation.can_transition_to(&AwaitingNutrition));
        assert!(AwaitingConfirmation.can_transition_to(&Idle));
        assert!(AwaitingNutrition.can_transition_to(&Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        use ConversationState::*;
        assert!(!Idle.can_transition_to(&AwaitingConfirmation));
        assert!(!Idle.can_transition_to(&AwaitingNutrition));
        assert!(!AwaitingAnalysis.can_transition_to(&AwaitingNutrition));
        assert!(!AwaitingConfirmation.can_transition_to(&AwaitingAnalysis));
        assert!(!AwaitingNutrition.can_transition_to(&AwaitingAnalysis));
        assert!(!AwaitingNutrition.can_transition_to(&AwaitingConfirmation));
    }

    #[test]
    fn test_self_transitions_are_invalid() {
        for state in ALL {
            assert!(!state.can_transition_to(&state), "{state} -> {state}");
        }
    }

    #[test]
    fn test_loading_states_never_reach_each_other() {
        for from in ALL.iter().filter(|s| s.is_loading()) {
            for to in ALL.iter().filter(|s| s.is_loading()) {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_is_loading() {
        assert!(!ConversationState::Idle.is_loading());
        assert!(ConversationState::AwaitingAnalysis.is_loading());
        assert!(!ConversationState::AwaitingConfirmation.is_loading());
        assert!(ConversationState::AwaitingNutrition.is_loading());
    }

    // ---- StateMachine ----

    #[test]
    fn test_state_machine_full_cycle() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.current(), ConversationState::Idle);

        sm.transition(ConversationState::AwaitingAnalysis).unwrap();
        sm.transition(ConversationState::AwaitingConfirmation).unwrap();
        sm.transition(ConversationState::AwaitingNutrition).unwrap();
        sm.transition(ConversationState::Idle).unwrap();
        assert_eq!(sm.current(), ConversationState::Idle);
    }

    #[test]
    fn test_state_machine_rejects_invalid_transition() {
        let mut sm = StateMachine::new();
        let err = sm
            .transition(ConversationState::AwaitingNutrition)
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::InvalidTransition {
                from: ConversationState::Idle,
                to: ConversationState::AwaitingNutrition,
            }
        ));
        assert_eq!(sm.current(), ConversationState::Idle);
    }
}
