//! User-facing conversation texts.

pub const GREETING: &str = "¡Hola! Soy tu asistente nutricional. Podés contarme qué comiste escribiendo, hablando 🎤 o subiendo una foto 📷 de tu comida.";
pub const IMAGE_SENT: &str = "📷 Imagen enviada";
pub const CONFIRMATION_PROMPT: &str = "Análisis completado. Por favor confirmá los datos:";
pub const ANALYSIS_FAILED: &str = "❌ Error al analizar la comida. Intentá nuevamente.";
pub const NUTRITION_FAILED: &str = "❌ Error al obtener información nutricional. Intentá nuevamente.";
pub const CANCELLED: &str = "Análisis cancelado. Podés enviar otra comida cuando quieras.";

pub const PLACEHOLDER_IDLE: &str = "¿Qué comiste hoy?";
pub const PLACEHOLDER_RECORDING: &str = "Escuchando...";
pub const INDICATOR_RECORDING: &str = "Escuchando... Hablá ahora";
pub const INDICATOR_PREPARING: &str = "Preparando micrófono...";

/// Heading of the final nutrition report.
pub fn nutrition_summary(food: &str, quantity: &str) -> String {
    format!("Información nutricional para {quantity} de {food}")
}

/// Shown when a selected file cannot be used as a photo.
pub fn image_rejected(reason: &str) -> String {
    format!("❌ No se pudo usar la imagen: {reason}")
}
