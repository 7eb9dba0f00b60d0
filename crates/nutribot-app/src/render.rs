//! Terminal rendering of the conversation.

use colored::Colorize;

use nutribot_chat::{ChatError, Conversation, ConversationState, PendingConfirmation};
use nutribot_core::types::{Message, MessageRole, NutritionData};

/// Reference maxima the macro bars are scaled against, in grams.
const PROTEIN_REF_G: f64 = 50.0;
const CARBS_REF_G: f64 = 80.0;
const FAT_REF_G: f64 = 40.0;

const BAR_WIDTH: usize = 20;

/// Whole numbers without decimals, everything else with one.
fn amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Proportional bar for `value` against `reference`, capped at full.
pub fn macro_bar(value: f64, reference: f64) -> String {
    let ratio = if reference > 0.0 {
        (value / reference).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn nutrition(data: &NutritionData) -> String {
    let macros = &data.macros;
    let rows = [
        ("Proteínas", macros.protein, PROTEIN_REF_G),
        ("Carbohidratos", macros.carbs, CARBS_REF_G),
        ("Grasas", macros.fat, FAT_REF_G),
    ];
    let mut out = format!("  🔥 {} kcal\n", amount(macros.calories).bold());
    for (label, grams, reference) in rows {
        out.push_str(&format!(
            "  {:<14}{:>6} g  {}\n",
            label,
            amount(grams),
            macro_bar(grams, reference).cyan()
        ));
    }
    out.push_str(&format!("  💡 {}", data.tip.italic()));
    out
}

/// Scratch fields and the actions available on them.
pub fn scratch(pending: &PendingConfirmation) -> String {
    format!(
        "  Comida: {}\n  Cantidad: {}\n  {}",
        pending.food().bold(),
        pending.quantity().bold(),
        "/comida <texto> · /cantidad <texto> · /confirmar · /cancelar".dimmed()
    )
}

/// One log entry, with its attachment expanded.
pub fn message(msg: &Message, pending: Option<&PendingConfirmation>) -> String {
    let time = format!("[{}]", msg.time_label()).dimmed();
    match msg.role {
        MessageRole::User => {
            let mut out = format!("{time} {} {}", "Vos:".blue().bold(), msg.content);
            if let Some(image) = &msg.image {
                let kind = image
                    .preview_url
                    .split_once(',')
                    .map(|(head, _)| head)
                    .unwrap_or("data:");
                out.push_str(&format!("\n  {}", format!("vista previa {kind}").dimmed()));
            }
            out
        }
        MessageRole::System => {
            let content = if msg.content.starts_with('❌') {
                msg.content.red().to_string()
            } else {
                msg.content.clone()
            };
            let mut out = format!("{time} {} {content}", "NutriBot:".green().bold());
            if let Some(data) = msg.nutrition_data() {
                out.push('\n');
                out.push_str(&nutrition(data));
            }
            out
        }
        MessageRole::Confirmation => {
            let mut out = format!("{time} {} {}", "NutriBot:".yellow().bold(), msg.content);
            if let Some(data) = msg.confirmation_data() {
                out.push_str(&format!("\n  {}", data.confirmation_message.italic()));
            }
            if let Some(pending) = pending.filter(|p| p.message_id() == msg.id) {
                out.push('\n');
                out.push_str(&scratch(pending));
            }
            out
        }
    }
}

/// Loading or microphone status, if any.
pub fn status(conversation: &Conversation) -> Option<String> {
    let line = match conversation.state() {
        ConversationState::AwaitingAnalysis => "⏳ Analizando tu comida...",
        ConversationState::AwaitingNutrition => "⏳ Buscando información nutricional...",
        _ => conversation.voice().indicator()?,
    };
    Some(line.dimmed().to_string())
}

/// Short notice for an action taken while its control is disabled.
pub fn rejection(err: &ChatError) -> Option<String> {
    let text = match err {
        ChatError::EmptyMessage => return None,
        ChatError::Busy(state) if state.is_loading() => {
            "Esperá a que termine la consulta en curso.".to_string()
        }
        ChatError::Busy(_) => {
            "Primero confirmá o cancelá el análisis pendiente (/confirmar o /cancelar).".to_string()
        }
        ChatError::Recording => "Estás grabando. Usá /voz para detener.".to_string(),
        ChatError::NoPendingConfirmation => "No hay ningún análisis para confirmar.".to_string(),
        other => other.to_string(),
    };
    Some(text.yellow().to_string())
}

/// Readline prompt: the input placeholder.
pub fn prompt(conversation: &Conversation) -> String {
    format!("{} › ", conversation.placeholder())
}

pub fn unknown_command(cmd: &str) -> String {
    format!("Comando desconocido: {cmd}. Escribí /ayuda para ver las opciones.")
        .yellow()
        .to_string()
}

pub fn blank_scratch() -> String {
    "Completá la comida y la cantidad antes de confirmar."
        .yellow()
        .to_string()
}

pub fn help() -> String {
    [
        "Escribí lo que comiste, por ejemplo: 2 manzanas",
        "  /foto <ruta>        enviar una foto de tu comida",
        "  /voz                iniciar o detener el micrófono",
        "  /comida <texto>     corregir la comida estimada",
        "  /cantidad <texto>   corregir la cantidad estimada",
        "  /confirmar          confirmar y ver la información nutricional",
        "  /cancelar           descartar el análisis",
        "  /ayuda              mostrar esta ayuda",
        "  /salir              terminar",
    ]
    .join("\n")
}
