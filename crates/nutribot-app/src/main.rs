//! NutriBot terminal client - composition root.
//!
//! 1. Load configuration (TOML file, `.env`, environment, flags)
//! 2. Build the HTTP food service; a missing base URL is fatal
//! 3. Run the conversation from a single event loop fed by the line reader,
//!    service completions and the voice recognizer

mod cli;
mod command;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::sync::mpsc;

use nutribot_chat::{
    run_call, CallOutcome, ChatError, ConversationController, RequestId, ServiceCall, Submission,
    UnavailableRecognizer, VoiceEvent,
};
use nutribot_client::HttpFoodService;
use nutribot_core::config::NutriConfig;
use nutribot_core::types::MessageId;

use crate::cli::CliArgs;
use crate::command::Command;

/// Everything the event loop reacts to, in arrival order.
enum AppEvent {
    Line(String),
    InputClosed,
    Completed(RequestId, CallOutcome),
    Voice(VoiceEvent),
    VoiceSubmit(String),
}

/// Read lines on a dedicated thread, one per prompt sent to the returned channel.
fn spawn_reader(events: mpsc::UnboundedSender<AppEvent>) -> std::sync::mpsc::Sender<String> {
    let (prompt_tx, prompt_rx) = std::sync::mpsc::channel::<String>();
    std::thread::spawn(move || {
        let mut rl = match Editor::<(), DefaultHistory>::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open the terminal for input");
                let _ = events.send(AppEvent::InputClosed);
                return;
            }
        };
        while let Ok(prompt) = prompt_rx.recv() {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    if events.send(AppEvent::Line(line)).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    let _ = events.send(AppEvent::InputClosed);
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read input");
                    let _ = events.send(AppEvent::InputClosed);
                    break;
                }
            }
        }
    });
    prompt_tx
}

/// Expand a leading `~/` to the home directory.
fn resolve_path(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(rest)
}

struct App {
    controller: ConversationController,
    events: mpsc::UnboundedSender<AppEvent>,
    last_shown: Option<MessageId>,
}

impl App {
    /// Print messages appended since the last call.
    fn render_new(&mut self) {
        let shown = self.last_shown;
        let convo = self.controller.conversation();
        for msg in convo.messages().iter().filter(|m| Some(m.id) > shown) {
            println!("{}", render::message(msg, convo.pending()));
            self.last_shown = Some(msg.id);
        }
    }

    fn print_status(&self) {
        if let Some(line) = render::status(self.controller.conversation()) {
            println!("{line}");
        }
    }

    fn notify(err: &ChatError) {
        tracing::debug!(error = %err, "Action rejected");
        if let Some(notice) = render::rejection(err) {
            println!("{notice}");
        }
    }

    /// Run a service call in the background; its result comes back as an event.
    fn dispatch(&self, call: ServiceCall) {
        let service = self.controller.service();
        let events = self.events.clone();
        tokio::spawn(async move {
            let (id, outcome) = run_call(service.as_ref(), call).await;
            let _ = events.send(AppEvent::Completed(id, outcome));
        });
        self.print_status();
    }

    fn submit(&mut self, submission: Submission) {
        match self.controller.submit(submission) {
            Ok(call) => {
                self.render_new();
                self.dispatch(call);
            }
            Err(e) => Self::notify(&e),
        }
    }

    async fn submit_photo(&mut self, path: &Path) {
        match self.controller.capture_image(resolve_path(path)).await {
            Ok(Some(image)) => self.submit(Submission::Image(image)),
            Ok(None) => {}
            Err(e) => Self::notify(&e),
        }
    }

    fn edit(&mut self, food: Option<&str>, quantity: Option<&str>) {
        if let Err(e) = self.controller.edit_scratch(food, quantity) {
            Self::notify(&e);
            return;
        }
        if let Some(pending) = self.controller.conversation().pending() {
            println!("{}", render::scratch(pending));
        }
    }

    fn complete(&mut self, id: RequestId, outcome: CallOutcome) {
        if let Err(e) = self.controller.complete(id, outcome) {
            tracing::error!(error = %e, "Failed to apply service result");
        }
    }

    fn voice_event(&mut self, event: VoiceEvent) {
        let Some(transcript) = self.controller.handle_voice_event(event) else {
            self.print_status();
            return;
        };
        println!("🎤 {transcript}");
        let delay = self.controller.submit_delay();
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(AppEvent::VoiceSubmit(transcript));
        });
    }

    /// Handle one typed line. Returns `false` when the user asked to quit.
    async fn line(&mut self, line: &str) -> bool {
        match Command::parse(line) {
            Command::Empty => {}
            Command::Text(text) => self.submit(Submission::Text(text)),
            Command::Photo(path) => self.submit_photo(&path).await,
            Command::Voice => {
                if let Err(e) = self.controller.toggle_voice() {
                    Self::notify(&e);
                }
                self.print_status();
            }
            Command::Food(food) => self.edit(Some(&food), None),
            Command::Quantity(quantity) => self.edit(None, Some(&quantity)),
            Command::Confirm => match self.controller.confirm() {
                Ok(Some(call)) => self.dispatch(call),
                Ok(None) => println!("{}", render::blank_scratch()),
                Err(e) => Self::notify(&e),
            },
            Command::Cancel => {
                if let Err(e) = self.controller.cancel() {
                    Self::notify(&e);
                }
            }
            Command::Help => println!("{}", render::help()),
            Command::Quit => return false,
            Command::Unknown(cmd) => println!("{}", render::unknown_command(&cmd)),
        }
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = NutriConfig::load_or_default(&config_file)
        .map_err(|e| format!("cannot load {}: {e}", config_file.display()))?
        .with_base_url(args.resolve_api_url());

    // Tracing goes to stderr so it stays out of the chat.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting NutriBot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Service.
    let service = match HttpFoodService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without a valid service base URL");
            tracing::error!(
                "Set NUTRIBOT_API_URL, pass --api-url or add [service] base_url to {}",
                config_file.display()
            );
            return Err(e.into());
        }
    };
    tracing::info!(base_url = %service.base_url(), "Food service ready");

    let (controller, mut voice_events) = ConversationController::new(
        Arc::new(service),
        Box::new(UnavailableRecognizer),
        config.voice.clone(),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();

    let voice_tx = tx.clone();
    tokio::spawn(async move {
        while let Some(event) = voice_events.recv().await {
            if voice_tx.send(AppEvent::Voice(event)).is_err() {
                break;
            }
        }
    });

    let prompts = spawn_reader(tx.clone());
    let mut app = App {
        controller,
        events: tx,
        last_shown: None,
    };

    app.render_new();
    println!("{}", render::help());

    let mut reading = false;
    loop {
        if !reading && !app.controller.conversation().is_loading() {
            let prompt = render::prompt(app.controller.conversation());
            if prompts.send(prompt).is_err() {
                break;
            }
            reading = true;
        }

        let Some(event) = rx.recv().await else {
            break;
        };
        match event {
            AppEvent::Line(line) => {
                reading = false;
                if !app.line(&line).await {
                    break;
                }
            }
            AppEvent::InputClosed => break,
            AppEvent::Completed(id, outcome) => app.complete(id, outcome),
            AppEvent::Voice(event) => app.voice_event(event),
            AppEvent::VoiceSubmit(transcript) => app.submit(Submission::Text(transcript)),
        }
        app.render_new();
    }

    tracing::info!("NutriBot shutting down");
    println!("¡Hasta luego!");
    Ok(())
}
