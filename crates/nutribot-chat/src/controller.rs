//! Conversation controller: the single owner of log, confirmation and voice state.
//!
//! [`Conversation`] is the synchronous core. Every user action either
//! changes state immediately or returns a [`ServiceCall`] to dispatch; the
//! call's result comes back through [`Conversation::complete`], which checks
//! the request identifier before applying anything.
//!
//! [`ConversationController`] pairs the core with a [`FoodService`] and a
//! [`SpeechRecognizer`]. Drivers run each returned call with [`run_call`]
//! and feed the outcome back through [`ConversationController::complete`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use nutribot_client::{AnalysisInput, FoodService, ServiceError};
use nutribot_core::config::VoiceConfig;
use nutribot_core::types::{ConfirmationData, Message, NutritionData};

use crate::confirmation::{ConfirmedFood, PendingConfirmation};
use crate::error::ChatError;
use crate::image::{CapturedImage, ImageError};
use crate::log::ConversationLog;
use crate::state::{ConversationState, StateMachine};
use crate::text;
use crate::voice::{
    CapabilityError, SpeechRecognizer, VoiceEvent, VoiceEventSink, VoiceEvents, VoiceSession,
};

// =============================================================================
// Calls and completions
// =============================================================================

/// Monotonic identifier of a dispatched service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the user hands to [`Conversation::submit`].
#[derive(Debug, Clone)]
pub enum Submission {
    Text(String),
    Image(CapturedImage),
}

/// A service call the conversation wants dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Analyze {
        id: RequestId,
        input: AnalysisInput,
    },
    LookupNutrition {
        id: RequestId,
        food: String,
        quantity: String,
    },
}

impl ServiceCall {
    pub fn id(&self) -> RequestId {
        match self {
            ServiceCall::Analyze { id, .. } | ServiceCall::LookupNutrition { id, .. } => *id,
        }
    }
}

/// Result of a dispatched call, ready for [`Conversation::complete`].
#[derive(Debug)]
pub enum CallOutcome {
    Analysis(Result<ConfirmationData, ServiceError>),
    Nutrition(Result<NutritionData, ServiceError>),
}

/// Whether a completion changed the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// The completion did not match the outstanding call and was dropped.
    Discarded,
}

/// Execute a call against the service. No retries.
pub async fn run_call(service: &dyn FoodService, call: ServiceCall) -> (RequestId, CallOutcome) {
    match call {
        ServiceCall::Analyze { id, input } => {
            (id, CallOutcome::Analysis(service.analyze(input).await))
        }
        ServiceCall::LookupNutrition { id, food, quantity } => (
            id,
            CallOutcome::Nutrition(service.lookup_nutrition(&food, &quantity).await),
        ),
    }
}

#[derive(Debug, Clone)]
enum InFlight {
    Analysis(RequestId),
    Nutrition {
        id: RequestId,
        confirmed: ConfirmedFood,
    },
}

impl InFlight {
    fn id(&self) -> RequestId {
        match self {
            InFlight::Analysis(id) | InFlight::Nutrition { id, .. } => *id,
        }
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// One conversation: message log, state, pending confirmation, voice session
/// and the text input field.
#[derive(Debug)]
pub struct Conversation {
    id: Uuid,
    log: ConversationLog,
    state: StateMachine,
    pending: Option<PendingConfirmation>,
    voice: VoiceSession,
    input: String,
    in_flight: Option<InFlight>,
    next_request: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Start a conversation with the greeting already in the log.
    pub fn new() -> Self {
        let mut log = ConversationLog::new();
        log.append(|id| Message::system(id, text::GREETING));
        let id = Uuid::new_v4();
        tracing::debug!(conversation = %id, "Conversation created");
        Self {
            id,
            log,
            state: StateMachine::new(),
            pending: None,
            voice: VoiceSession::Idle,
            input: String::new(),
            in_flight: None,
            next_request: 1,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConversationState {
        self.state.current()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn voice(&self) -> VoiceSession {
        self.voice
    }

    /// Identifier of the outstanding service call, if any.
    pub fn outstanding(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(InFlight::id)
    }

    // ---- input field and control flags ----

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_loading(&self) -> bool {
        self.state.current().is_loading()
    }

    pub fn input_enabled(&self) -> bool {
        !self.is_loading() && !self.voice.is_recording() && self.pending.is_none()
    }

    pub fn can_send(&self) -> bool {
        self.input_enabled() && !self.input.trim().is_empty()
    }

    pub fn voice_enabled(&self) -> bool {
        !self.is_loading() && self.pending.is_none()
    }

    pub fn image_enabled(&self) -> bool {
        !self.is_loading() && self.pending.is_none()
    }

    pub fn placeholder(&self) -> &'static str {
        if self.voice.is_recording() {
            text::PLACEHOLDER_RECORDING
        } else {
            text::PLACEHOLDER_IDLE
        }
    }

    // ---- submission ----

    /// Append the user's message and move to awaiting-analysis.
    pub fn submit(&mut self, submission: Submission) -> Result<ServiceCall, ChatError> {
        let state = self.state.current();
        if state != ConversationState::Idle {
            return Err(ChatError::Busy(state));
        }

        let input = match submission {
            Submission::Text(raw) => {
                if self.voice.is_recording() {
                    return Err(ChatError::Recording);
                }
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ChatError::EmptyMessage);
                }
                self.log.append(|id| Message::user(id, trimmed));
                self.input.clear();
                AnalysisInput::Text(trimmed.to_string())
            }
            Submission::Image(image) => {
                self.log
                    .append(|id| Message::user_image(id, text::IMAGE_SENT, image.image_ref()));
                AnalysisInput::Image(image.upload())
            }
        };

        self.state.transition(ConversationState::AwaitingAnalysis)?;
        let id = self.next_request_id();
        self.in_flight = Some(InFlight::Analysis(id));
        tracing::info!(
            conversation = %self.id,
            request = %id,
            mode = input.mode(),
            "Submitted for analysis"
        );
        Ok(ServiceCall::Analyze { id, input })
    }

    /// Report a photo the image adapter refused.
    pub fn reject_image(&mut self, err: &ImageError) {
        tracing::warn!(conversation = %self.id, error = %err, "Image rejected");
        self.log
            .append(|id| Message::system(id, text::image_rejected(&err.user_reason())));
    }

    // ---- completion ----

    /// Apply the result of the outstanding call.
    ///
    /// A completion whose identifier or kind does not match the outstanding
    /// call is discarded without touching the conversation.
    pub fn complete(
        &mut self,
        id: RequestId,
        outcome: CallOutcome,
    ) -> Result<Applied, ChatError> {
        let Some(in_flight) = self.in_flight.take() else {
            tracing::warn!(conversation = %self.id, request = %id, "Discarding completion with no outstanding call");
            return Ok(Applied::Discarded);
        };
        if in_flight.id() != id {
            tracing::warn!(
                conversation = %self.id,
                request = %id,
                outstanding = %in_flight.id(),
                "Discarding stale completion"
            );
            self.in_flight = Some(in_flight);
            return Ok(Applied::Discarded);
        }

        match (in_flight, outcome) {
            (InFlight::Analysis(_), CallOutcome::Analysis(result)) => {
                self.finish_analysis(result)?
            }
            (InFlight::Nutrition { confirmed, .. }, CallOutcome::Nutrition(result)) => {
                self.finish_nutrition(confirmed, result)?
            }
            (in_flight, _) => {
                tracing::warn!(conversation = %self.id, request = %id, "Discarding completion of the wrong kind");
                self.in_flight = Some(in_flight);
                return Ok(Applied::Discarded);
            }
        }
        Ok(Applied::Applied)
    }

    fn finish_analysis(
        &mut self,
        result: Result<ConfirmationData, ServiceError>,
    ) -> Result<(), ChatError> {
        match result {
            Ok(data) => {
                self.state.transition(ConversationState::AwaitingConfirmation)?;
                let message_id = self.log.append(|id| {
                    Message::confirmation(id, text::CONFIRMATION_PROMPT, data.clone())
                });
                self.pending = Some(PendingConfirmation::new(message_id, &data));
                tracing::info!(
                    conversation = %self.id,
                    food = %data.estimated_food,
                    quantity = %data.estimated_quantity,
                    "Analysis ready for confirmation"
                );
            }
            Err(err) => {
                tracing::warn!(conversation = %self.id, error = %err, "Analysis failed");
                self.state.transition(ConversationState::Idle)?;
                self.log
                    .append(|id| Message::system(id, text::ANALYSIS_FAILED));
            }
        }
        Ok(())
    }

    fn finish_nutrition(
        &mut self,
        confirmed: ConfirmedFood,
        result: Result<NutritionData, ServiceError>,
    ) -> Result<(), ChatError> {
        self.state.transition(ConversationState::Idle)?;
        match result {
            Ok(data) => {
                tracing::info!(
                    conversation = %self.id,
                    calories = data.macros.calories,
                    "Nutrition report received"
                );
                let summary = text::nutrition_summary(&confirmed.food, &confirmed.quantity);
                self.log
                    .append(|id| Message::nutrition(id, summary, data));
            }
            Err(err) => {
                tracing::warn!(conversation = %self.id, error = %err, "Nutrition lookup failed");
                self.log
                    .append(|id| Message::system(id, text::NUTRITION_FAILED));
            }
        }
        Ok(())
    }

    // ---- confirmation ----

    /// Revise the scratch food and/or quantity of the pending confirmation.
    pub fn edit_scratch(
        &mut self,
        food: Option<&str>,
        quantity: Option<&str>,
    ) -> Result<(), ChatError> {
        let pending = self
            .pending
            .as_mut()
            .ok_or(ChatError::NoPendingConfirmation)?;
        pending.edit(food, quantity);
        Ok(())
    }

    /// Accept the pending confirmation.
    ///
    /// Returns `Ok(None)` without changing anything when either scratch
    /// field is blank.
    pub fn confirm(&mut self) -> Result<Option<ServiceCall>, ChatError> {
        let pending = self
            .pending
            .as_ref()
            .ok_or(ChatError::NoPendingConfirmation)?;
        let Some(confirmed) = pending.accepted() else {
            tracing::debug!(conversation = %self.id, "Confirm ignored: blank food or quantity");
            return Ok(None);
        };

        self.state.transition(ConversationState::AwaitingNutrition)?;
        self.pending = None;
        self.log.remove_confirmations();

        let id = self.next_request_id();
        self.in_flight = Some(InFlight::Nutrition {
            id,
            confirmed: confirmed.clone(),
        });
        tracing::info!(
            conversation = %self.id,
            request = %id,
            food = %confirmed.food,
            quantity = %confirmed.quantity,
            "Confirmed, looking up nutrition"
        );
        Ok(Some(ServiceCall::LookupNutrition {
            id,
            food: confirmed.food,
            quantity: confirmed.quantity,
        }))
    }

    /// Drop the pending confirmation and say so in the log.
    pub fn cancel(&mut self) -> Result<(), ChatError> {
        if self.pending.is_none() {
            return Err(ChatError::NoPendingConfirmation);
        }
        self.state.transition(ConversationState::Idle)?;
        self.pending = None;
        self.log.remove_confirmations();
        self.log.append(|id| Message::system(id, text::CANCELLED));
        tracing::info!(conversation = %self.id, "Confirmation cancelled");
        Ok(())
    }

    // ---- voice ----

    /// Mark capture as starting and clear the input field.
    pub fn begin_voice(&mut self) -> Result<(), ChatError> {
        if !self.voice_enabled() {
            return Err(ChatError::Busy(self.state.current()));
        }
        self.voice = VoiceSession::ProcessingVoice;
        self.input.clear();
        Ok(())
    }

    /// Capture was stopped by the user. Nothing is submitted.
    pub fn stop_voice(&mut self) {
        self.voice = VoiceSession::Idle;
    }

    /// Capture could not begin.
    pub fn voice_unavailable(&mut self, err: &CapabilityError) {
        tracing::warn!(conversation = %self.id, error = %err, "Voice capture unavailable");
        self.voice = VoiceSession::Idle;
        self.log
            .append(|id| Message::system(id, err.user_message()));
    }

    /// Apply a recognizer event. Returns the transcript to submit, if any.
    pub fn apply_voice_event(&mut self, event: VoiceEvent) -> Option<String> {
        tracing::debug!(conversation = %self.id, ?event, "Voice event");
        match event {
            VoiceEvent::Start => {
                if self.voice == VoiceSession::ProcessingVoice {
                    self.voice = VoiceSession::Recording;
                }
                None
            }
            VoiceEvent::Result(transcript) => {
                // A result that arrives after the user stopped capture is dropped.
                if self.voice.is_idle() {
                    tracing::debug!(
                        conversation = %self.id,
                        "Discarding transcript after capture stopped"
                    );
                    return None;
                }
                self.voice = VoiceSession::Idle;
                self.input = transcript.clone();
                if transcript.trim().is_empty() {
                    None
                } else {
                    Some(transcript)
                }
            }
            VoiceEvent::Error(kind) => {
                tracing::warn!(conversation = %self.id, kind = kind.code(), "Voice capture error");
                self.voice = VoiceSession::Idle;
                self.log
                    .append(|id| Message::system(id, kind.user_message()));
                None
            }
            VoiceEvent::End => {
                self.voice = VoiceSession::Idle;
                None
            }
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }
}

// =============================================================================
// Controller
// =============================================================================

/// A [`Conversation`] wired to its collaborators.
///
/// Dropping the controller aborts any live recognizer session.
pub struct ConversationController {
    conversation: Conversation,
    service: Arc<dyn FoodService>,
    recognizer: Box<dyn SpeechRecognizer>,
    voice_config: VoiceConfig,
    voice_events: VoiceEventSink,
}

impl ConversationController {
    /// Create a controller and the receiver its recognizer reports to.
    pub fn new(
        service: Arc<dyn FoodService>,
        recognizer: Box<dyn SpeechRecognizer>,
        voice_config: VoiceConfig,
    ) -> (Self, VoiceEvents) {
        let (voice_events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            conversation: Conversation::new(),
            service,
            recognizer,
            voice_config,
            voice_events,
        };
        (controller, rx)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn service(&self) -> Arc<dyn FoodService> {
        Arc::clone(&self.service)
    }

    /// Delay between a final transcript and its submission.
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.voice_config.submit_delay_ms)
    }

    pub fn submit(&mut self, submission: Submission) -> Result<ServiceCall, ChatError> {
        self.conversation.submit(submission)
    }

    /// Read a photo from disk for submission. An unreadable or unsupported
    /// file is reported in the log and yields `Ok(None)`.
    pub async fn capture_image(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Option<CapturedImage>, ChatError> {
        if !self.conversation.image_enabled() {
            return Err(ChatError::Busy(self.conversation.state()));
        }
        match CapturedImage::from_path(path).await {
            Ok(image) => Ok(Some(image)),
            Err(err) => {
                self.conversation.reject_image(&err);
                Ok(None)
            }
        }
    }

    /// Apply the outcome of a call produced by this controller.
    pub fn complete(&mut self, id: RequestId, outcome: CallOutcome) -> Result<Applied, ChatError> {
        self.conversation.complete(id, outcome)
    }

    pub fn edit_scratch(
        &mut self,
        food: Option<&str>,
        quantity: Option<&str>,
    ) -> Result<(), ChatError> {
        self.conversation.edit_scratch(food, quantity)
    }

    /// Accept the pending confirmation. `Ok(None)` when blocked by blank fields.
    pub fn confirm(&mut self) -> Result<Option<ServiceCall>, ChatError> {
        self.conversation.confirm()
    }

    pub fn cancel(&mut self) -> Result<(), ChatError> {
        self.conversation.cancel()
    }

    /// Microphone control: stop a live capture, or check the platform and
    /// start a new one.
    pub fn toggle_voice(&mut self) -> Result<(), ChatError> {
        if self.conversation.voice().is_recording() {
            tracing::info!(conversation = %self.conversation.id(), "Stopping voice capture");
            self.recognizer.stop();
            self.conversation.stop_voice();
            return Ok(());
        }
        if !self.conversation.voice_enabled() {
            return Err(ChatError::Busy(self.conversation.state()));
        }
        if self.conversation.voice().is_processing() {
            return Ok(());
        }

        let capability = self.recognizer.capability();
        if let Err(err) = capability.check(self.voice_config.secure_context_required) {
            self.conversation.voice_unavailable(&err);
            return Ok(());
        }

        self.conversation.begin_voice()?;
        if let Err(err) = self
            .recognizer
            .start(&self.voice_config.language, self.voice_events.clone())
        {
            self.conversation.voice_unavailable(&err);
        }
        Ok(())
    }

    /// Apply a recognizer event. Returns the transcript to submit after
    /// [`submit_delay`](Self::submit_delay).
    pub fn handle_voice_event(&mut self, event: VoiceEvent) -> Option<String> {
        self.conversation.apply_voice_event(event)
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.recognizer.abort();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nutribot_core::types::{Macros, MessageRole};

    fn estimate() -> ConfirmationData {
        ConfirmationData {
            estimated_food: "manzana".into(),
            estimated_quantity: "2 unidades".into(),
            confirmation_message: "¿Confirmás 2 manzanas?".into(),
        }
    }

    fn report() -> NutritionData {
        NutritionData {
            macros: Macros {
                calories: 190.0,
                protein: 1.0,
                carbs: 50.0,
                fat: 0.6,
            },
            tip: "Buena fuente de fibra.".into(),
        }
    }

    fn server_error(endpoint: &str) -> ServiceError {
        ServiceError::Status {
            endpoint: endpoint.into(),
            status: 500,
        }
    }

    /// Drive a fresh conversation to awaiting-confirmation.
    fn awaiting_confirmation() -> Conversation {
        let mut convo = Conversation::new();
        let call = convo.submit(Submission::Text("2 manzanas".into())).unwrap();
        convo
            .complete(call.id(), CallOutcome::Analysis(Ok(estimate())))
            .unwrap();
        convo
    }

    // ---- creation ----

    #[test]
    fn test_new_conversation_has_greeting() {
        let convo = Conversation::new();
        assert_eq!(convo.state(), ConversationState::Idle);
        assert_eq!(convo.messages().len(), 1);
        assert_eq!(convo.messages()[0].role, MessageRole::System);
        assert_eq!(convo.messages()[0].content, text::GREETING);
        assert!(convo.input_enabled());
        assert!(!convo.can_send());
    }

    // ---- submit ----

    #[test]
    fn test_submit_text_moves_to_awaiting_analysis() {
        let mut convo = Conversation::new();
        convo.set_input("2 manzanas");
        assert!(convo.can_send());

        let call = convo
            .submit(Submission::Text("  2 manzanas ".into()))
            .unwrap();
        assert_eq!(
            call,
            ServiceCall::Analyze {
                id: RequestId(1),
                input: AnalysisInput::Text("2 manzanas".into()),
            }
        );
        assert_eq!(convo.state(), ConversationState::AwaitingAnalysis);
        assert_eq!(convo.outstanding(), Some(RequestId(1)));
        assert_eq!(convo.input(), "");
        assert!(convo.is_loading());
        assert!(!convo.input_enabled());
        assert!(!convo.voice_enabled());
        assert!(!convo.image_enabled());

        let last = convo.log().last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.content, "2 manzanas");
    }

    #[test]
    fn test_submit_blank_text_is_rejected() {
        let mut convo = Conversation::new();
        let err = convo.submit(Submission::Text(" \n ".into())).unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(convo.state(), ConversationState::Idle);
        assert_eq!(convo.messages().len(), 1);
    }

    #[test]
    fn test_submit_while_loading_is_busy() {
        let mut convo = Conversation::new();
        convo.submit(Submission::Text("pan".into())).unwrap();
        let err = convo.submit(Submission::Text("queso".into())).unwrap_err();
        assert!(matches!(
            err,
            ChatError::Busy(ConversationState::AwaitingAnalysis)
        ));
        assert_eq!(convo.outstanding(), Some(RequestId(1)));
    }

    #[test]
    fn test_submit_while_confirmation_pending_is_busy() {
        let mut convo = awaiting_confirmation();
        let err = convo.submit(Submission::Text("queso".into())).unwrap_err();
        assert!(matches!(
            err,
            ChatError::Busy(ConversationState::AwaitingConfirmation)
        ));
    }

    #[test]
    fn test_submit_text_while_recording_is_rejected() {
        let mut convo = Conversation::new();
        convo.begin_voice().unwrap();
        convo.apply_voice_event(VoiceEvent::Start);
        let err = convo.submit(Submission::Text("pan".into())).unwrap_err();
        assert!(matches!(err, ChatError::Recording));
        assert_eq!(convo.placeholder(), text::PLACEHOLDER_RECORDING);
    }

    #[test]
    fn test_submit_image_uses_placeholder_and_reference() {
        let mut convo = Conversation::new();
        let image = CapturedImage::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        let call = convo.submit(Submission::Image(image.clone())).unwrap();

        match call {
            ServiceCall::Analyze {
                input: AnalysisInput::Image(upload),
                ..
            } => assert_eq!(upload.bytes, image.blob().clone()),
            other => panic!("Expected image analysis, got {:?}", other),
        }
        let last = convo.log().last().unwrap();
        assert_eq!(last.content, text::IMAGE_SENT);
        assert_eq!(last.image, Some(image.image_ref()));
    }

    // ---- complete ----

    #[test]
    fn test_analysis_success_creates_pending_confirmation() {
        let convo = awaiting_confirmation();
        assert_eq!(convo.state(), ConversationState::AwaitingConfirmation);
        assert_eq!(convo.outstanding(), None);

        let pending = convo.pending().unwrap();
        assert_eq!(pending.food(), "manzana");
        assert_eq!(pending.quantity(), "2 unidades");

        let conf = convo.log().get(pending.message_id()).unwrap();
        assert_eq!(conf.role, MessageRole::Confirmation);
        assert_eq!(conf.confirmation_data(), Some(&estimate()));
        assert_eq!(convo.log().count_role(MessageRole::Confirmation), 1);
        assert!(!convo.input_enabled());
        assert!(!convo.voice_enabled());
    }

    #[test]
    fn test_analysis_failure_returns_to_idle() {
        let mut convo = Conversation::new();
        let call = convo.submit(Submission::Text("pizza".into())).unwrap();
        let applied = convo
            .complete(
                call.id(),
                CallOutcome::Analysis(Err(server_error("analyze-food"))),
            )
            .unwrap();

        assert_eq!(applied, Applied::Applied);
        assert_eq!(convo.state(), ConversationState::Idle);
        assert!(convo.pending().is_none());
        let last = convo.log().last().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert_eq!(last.content, text::ANALYSIS_FAILED);
        assert!(convo.input_enabled());
    }

    #[test]
    fn test_completion_with_wrong_id_is_discarded() {
        let mut convo = Conversation::new();
        convo.submit(Submission::Text("pizza".into())).unwrap();
        let before = convo.messages().len();

        let applied = convo
            .complete(RequestId(99), CallOutcome::Analysis(Ok(estimate())))
            .unwrap();

        assert_eq!(applied, Applied::Discarded);
        assert_eq!(convo.state(), ConversationState::AwaitingAnalysis);
        assert_eq!(convo.outstanding(), Some(RequestId(1)));
        assert_eq!(convo.messages().len(), before);
    }

    #[test]
    fn test_completion_with_wrong_kind_is_discarded() {
        let mut convo = Conversation::new();
        let call = convo.submit(Submission::Text("pizza".into())).unwrap();

        let applied = convo
            .complete(call.id(), CallOutcome::Nutrition(Ok(report())))
            .unwrap();

        assert_eq!(applied, Applied::Discarded);
        assert_eq!(convo.outstanding(), Some(call.id()));
    }

    #[test]
    fn test_completion_without_outstanding_call_is_discarded() {
        let mut convo = Conversation::new();
        let applied = convo
            .complete(RequestId(1), CallOutcome::Analysis(Ok(estimate())))
            .unwrap();
        assert_eq!(applied, Applied::Discarded);
        assert_eq!(convo.state(), ConversationState::Idle);
    }

    // ---- confirm ----

    #[test]
    fn test_confirm_issues_lookup_and_removes_confirmation() {
        let mut convo = awaiting_confirmation();
        let call = convo.confirm().unwrap().unwrap();

        assert_eq!(
            call,
            ServiceCall::LookupNutrition {
                id: RequestId(2),
                food: "manzana".into(),
                quantity: "2 unidades".into(),
            }
        );
        assert_eq!(convo.state(), ConversationState::AwaitingNutrition);
        assert!(convo.pending().is_none());
        assert_eq!(convo.log().count_role(MessageRole::Confirmation), 0);
    }

    #[test]
    fn test_confirm_with_blank_field_is_noop() {
        let mut convo = awaiting_confirmation();
        convo.edit_scratch(None, Some("   ")).unwrap();
        let before = convo.messages().len();

        assert!(convo.confirm().unwrap().is_none());
        assert_eq!(convo.state(), ConversationState::AwaitingConfirmation);
        assert!(convo.pending().is_some());
        assert_eq!(convo.outstanding(), None);
        assert_eq!(convo.messages().len(), before);
    }

    #[test]
    fn test_confirm_without_pending_is_error() {
        let mut convo = Conversation::new();
        assert!(matches!(
            convo.confirm(),
            Err(ChatError::NoPendingConfirmation)
        ));
        assert!(matches!(
            convo.edit_scratch(Some("pan"), None),
            Err(ChatError::NoPendingConfirmation)
        ));
    }

    #[test]
    fn test_nutrition_success_appends_report() {
        let mut convo = awaiting_confirmation();
        convo.edit_scratch(None, Some("3 unidades")).unwrap();
        let call = convo.confirm().unwrap().unwrap();
        convo
            .complete(call.id(), CallOutcome::Nutrition(Ok(report())))
            .unwrap();

        assert_eq!(convo.state(), ConversationState::Idle);
        let last = convo.log().last().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert_eq!(last.content, "Información nutricional para 3 unidades de manzana");
        assert_eq!(last.nutrition_data(), Some(&report()));
    }

    #[test]
    fn test_nutrition_failure_appends_error() {
        let mut convo = awaiting_confirmation();
        let call = convo.confirm().unwrap().unwrap();
        convo
            .complete(
                call.id(),
                CallOutcome::Nutrition(Err(server_error("get-nutrition-info"))),
            )
            .unwrap();

        assert_eq!(convo.state(), ConversationState::Idle);
        assert_eq!(convo.log().last().unwrap().content, text::NUTRITION_FAILED);
    }

    // ---- cancel ----

    #[test]
    fn test_cancel_replaces_confirmation_with_notice() {
        let mut convo = awaiting_confirmation();
        let system_before = convo.log().count_role(MessageRole::System);

        convo.cancel().unwrap();

        assert_eq!(convo.state(), ConversationState::Idle);
        assert!(convo.pending().is_none());
        assert_eq!(convo.log().count_role(MessageRole::Confirmation), 0);
        assert_eq!(convo.log().count_role(MessageRole::System), system_before + 1);
        assert_eq!(convo.log().last().unwrap().content, text::CANCELLED);
    }

    #[test]
    fn test_cancel_without_pending_is_error() {
        let mut convo = Conversation::new();
        assert!(matches!(
            convo.cancel(),
            Err(ChatError::NoPendingConfirmation)
        ));
    }

    // ---- voice ----

    #[test]
    fn test_voice_lifecycle() {
        let mut convo = Conversation::new();
        convo.set_input("borrador");
        convo.begin_voice().unwrap();
        assert_eq!(convo.voice(), VoiceSession::ProcessingVoice);
        assert_eq!(convo.input(), "");

        assert!(convo.apply_voice_event(VoiceEvent::Start).is_none());
        assert!(convo.voice().is_recording());
        assert!(!convo.input_enabled());
        assert!(convo.voice_enabled());

        let transcript = convo.apply_voice_event(VoiceEvent::Result("una banana".into()));
        assert_eq!(transcript.as_deref(), Some("una banana"));
        assert_eq!(convo.input(), "una banana");
        assert!(convo.voice().is_idle());

        assert!(convo.apply_voice_event(VoiceEvent::End).is_none());
        assert!(convo.voice().is_idle());
    }

    #[test]
    fn test_result_after_stop_is_dropped() {
        let mut convo = Conversation::new();
        convo.begin_voice().unwrap();
        convo.apply_voice_event(VoiceEvent::Start);
        convo.stop_voice();

        let transcript = convo.apply_voice_event(VoiceEvent::Result("una banana".into()));
        assert!(transcript.is_none());
        assert_eq!(convo.input(), "");
        assert!(convo.voice().is_idle());
    }

    #[test]
    fn test_start_after_stop_does_not_resume_recording() {
        let mut convo = Conversation::new();
        convo.begin_voice().unwrap();
        convo.stop_voice();
        convo.apply_voice_event(VoiceEvent::Start);
        assert!(convo.voice().is_idle());
        assert!(convo.input_enabled());
    }

    #[test]
    fn test_blank_transcript_is_not_submitted() {
        let mut convo = Conversation::new();
        convo.begin_voice().unwrap();
        assert!(convo
            .apply_voice_event(VoiceEvent::Result("  ".into()))
            .is_none());
    }

    #[test]
    fn test_voice_error_appends_message() {
        let mut convo = Conversation::new();
        convo.begin_voice().unwrap();
        convo.apply_voice_event(VoiceEvent::Start);
        convo.apply_voice_event(VoiceEvent::Error(crate::voice::VoiceErrorKind::NoSpeech));

        assert!(convo.voice().is_idle());
        assert_eq!(convo.state(), ConversationState::Idle);
        assert_eq!(
            convo.log().last().unwrap().content,
            "❌ No se detectó voz. Intentá hablar más claro."
        );
    }

    #[test]
    fn test_begin_voice_disabled_while_pending() {
        let mut convo = awaiting_confirmation();
        assert!(matches!(
            convo.begin_voice(),
            Err(ChatError::Busy(ConversationState::AwaitingConfirmation))
        ));
        assert!(convo.voice().is_idle());
    }

    // ---- image rejection ----

    #[test]
    fn test_reject_image_appends_message() {
        let mut convo = Conversation::new();
        convo.reject_image(&ImageError::NotAnImage);
        let last = convo.log().last().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert!(last.content.starts_with("❌ No se pudo usar la imagen"));
        assert_eq!(convo.state(), ConversationState::Idle);
    }

    // ---- request ids ----

    #[test]
    fn test_request_ids_increase() {
        let mut convo = Conversation::new();
        let first = convo.submit(Submission::Text("pan".into())).unwrap();
        convo
            .complete(
                first.id(),
                CallOutcome::Analysis(Err(server_error("analyze-food"))),
            )
            .unwrap();
        let second = convo.submit(Submission::Text("pan".into())).unwrap();
        assert!(second.id() > first.id());
        assert_eq!(second.id().to_string(), "#2");
    }
}
