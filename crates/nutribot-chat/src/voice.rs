//! Voice capture contract.
//!
//! A platform speech recognizer is reached through [`SpeechRecognizer`] and
//! reports back through four events (start, final result, error, end) sent
//! over a channel. The conversation only tracks whether capture is starting
//! or live; it never touches audio.

use tokio::sync::mpsc;

/// Microphone state. Not part of the conversation log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VoiceSession {
    #[default]
    Idle,
    /// Capture was requested; waiting for the recognizer's start event.
    ProcessingVoice,
    /// The recognizer is listening.
    Recording,
}

impl VoiceSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, VoiceSession::Idle)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, VoiceSession::ProcessingVoice)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, VoiceSession::Recording)
    }

    /// Status line shown while capture is starting or live.
    pub fn indicator(&self) -> Option<&'static str> {
        match self {
            VoiceSession::Idle => None,
            VoiceSession::ProcessingVoice => Some(crate::text::INDICATOR_PREPARING),
            VoiceSession::Recording => Some(crate::text::INDICATOR_RECORDING),
        }
    }
}

/// Events emitted by a recognizer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Start,
    /// Final transcript. Interim results are never delivered.
    Result(String),
    Error(VoiceErrorKind),
    /// The session closed, after a result, an error or an explicit stop.
    End,
}

/// Runtime failure reported by a live recognizer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceErrorKind {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    ServiceNotAllowed,
    Other(String),
}

impl VoiceErrorKind {
    /// Parse a platform error code such as `no-speech`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => VoiceErrorKind::NoSpeech,
            "audio-capture" => VoiceErrorKind::AudioCapture,
            "not-allowed" => VoiceErrorKind::NotAllowed,
            "network" => VoiceErrorKind::Network,
            "service-not-allowed" => VoiceErrorKind::ServiceNotAllowed,
            other => VoiceErrorKind::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            VoiceErrorKind::NoSpeech => "no-speech",
            VoiceErrorKind::AudioCapture => "audio-capture",
            VoiceErrorKind::NotAllowed => "not-allowed",
            VoiceErrorKind::Network => "network",
            VoiceErrorKind::ServiceNotAllowed => "service-not-allowed",
            VoiceErrorKind::Other(code) => code,
        }
    }

    /// Chat text for this failure.
    pub fn user_message(&self) -> String {
        let detail = match self {
            VoiceErrorKind::NoSpeech => "No se detectó voz. Intentá hablar más claro.".to_string(),
            VoiceErrorKind::AudioCapture => {
                "No se pudo acceder al micrófono. Verificá que esté conectado.".to_string()
            }
            VoiceErrorKind::NotAllowed => "Permisos de micrófono denegados. Hacé clic en el ícono del micrófono en la barra de direcciones y permití el acceso.".to_string(),
            VoiceErrorKind::Network => "Error de conexión. Verificá tu internet.".to_string(),
            VoiceErrorKind::ServiceNotAllowed => {
                "El servicio de reconocimiento de voz no está disponible.".to_string()
            }
            VoiceErrorKind::Other(code) => {
                format!("Error desconocido: {code}. Intentá recargar la página.")
            }
        };
        format!("❌ {detail}")
    }
}

/// Reasons voice capture cannot begin. All are handled the same way: the
/// attempt is abandoned and the user sees a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("speech recognition requires a secure context")]
    InsecureContext,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no microphone found")]
    NoMicrophone,
    #[error("recognizer failed to start: {0}")]
    StartFailed(String),
}

impl CapabilityError {
    /// Chat text for this failure.
    pub fn user_message(&self) -> String {
        let detail = match self {
            CapabilityError::Unsupported => "Tu navegador no soporta reconocimiento de voz. Probá con Chrome, Edge o Safari actualizado.",
            CapabilityError::InsecureContext => {
                "El reconocimiento de voz requiere una conexión segura (HTTPS)."
            }
            CapabilityError::PermissionDenied => "Permisos de micrófono denegados. Ve a la configuración del navegador y permite el acceso al micrófono para este sitio.",
            CapabilityError::NoMicrophone => "No se pudo acceder al micrófono. Asegurate de que esté conectado y que hayas dado permisos al navegador.",
            CapabilityError::StartFailed(_) => {
                "Error al iniciar el reconocimiento de voz. Intentá nuevamente en unos segundos."
            }
        };
        format!("❌ {detail}")
    }
}

/// Microphone permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Prompt,
    Denied,
}

/// What the platform offers before capture is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceCapability {
    pub supported: bool,
    pub secure_context: bool,
    pub permission: PermissionState,
    pub microphone: bool,
}

impl VoiceCapability {
    /// A platform with no speech recognition at all.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            secure_context: false,
            permission: PermissionState::Denied,
            microphone: false,
        }
    }

    /// A platform where capture can start.
    pub fn ready() -> Self {
        Self {
            supported: true,
            secure_context: true,
            permission: PermissionState::Granted,
            microphone: true,
        }
    }

    /// Run the pre-capture checks in order: support, secure context,
    /// permission, hardware.
    pub fn check(&self, secure_context_required: bool) -> Result<(), CapabilityError> {
        if !self.supported {
            return Err(CapabilityError::Unsupported);
        }
        if secure_context_required && !self.secure_context {
            return Err(CapabilityError::InsecureContext);
        }
        if self.permission == PermissionState::Denied {
            return Err(CapabilityError::PermissionDenied);
        }
        if !self.microphone {
            return Err(CapabilityError::NoMicrophone);
        }
        Ok(())
    }
}

/// Sending half handed to a recognizer session.
pub type VoiceEventSink = mpsc::UnboundedSender<VoiceEvent>;
/// Receiving half drained by whoever drives the conversation.
pub type VoiceEvents = mpsc::UnboundedReceiver<VoiceEvent>;

/// Platform speech-to-transcript capability.
pub trait SpeechRecognizer: Send {
    /// Report support, context, permission and hardware state.
    fn capability(&self) -> VoiceCapability;

    /// Begin a single-utterance session in `language`, emitting events to `events`.
    fn start(&mut self, language: &str, events: VoiceEventSink) -> Result<(), CapabilityError>;

    /// Stop listening. The session still emits `End`.
    fn stop(&mut self);

    /// Tear the session down without further events.
    fn abort(&mut self);
}

/// Recognizer for platforms without speech recognition.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn capability(&self) -> VoiceCapability {
        VoiceCapability::unsupported()
    }

    fn start(&mut self, _language: &str, _events: VoiceEventSink) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unsupported)
    }

    fn stop(&mut self) {}

    fn abort(&mut self) {}
}

// =============================================================================
// Tests
// =============================================================================
