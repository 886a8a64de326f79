use std::sync::Arc;

use crate::codegen;
use crate::config::Settings;
use crate::constants::{commands, template};
use crate::editor::{DocumentEditor, Notifier};
use crate::session::{RequestOrdering, SessionManager, SurfaceFactory};
use crate::template::{TemplateInserter, TypingOutcome};
use crate::transport::TransportAdapter;

/// Host-visible commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    OpenPanel,
    InsertTemplate,
    StartTyping,
    StopTyping,
    ResetTyping,
    GenerateCode,
}

impl Command {
    pub fn id(&self) -> &'static str {
        match self {
            Command::OpenPanel => commands::OPEN_PANEL,
            Command::InsertTemplate => commands::INSERT_TEMPLATE,
            Command::StartTyping => commands::START_TYPING,
            Command::StopTyping => commands::STOP_TYPING,
            Command::ResetTyping => commands::RESET_TYPING,
            Command::GenerateCode => commands::GENERATE_CODE,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Command::OpenPanel => "Open conversation panel",
            Command::InsertTemplate => "Insert template",
            Command::StartTyping => "Start typing template",
            Command::StopTyping => "Stop typing template",
            Command::ResetTyping => "Reset template typing",
            Command::GenerateCode => "Generate code under selection",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.id() == id)
    }

    pub fn all() -> &'static [Command] {
        &[
            Command::OpenPanel,
            Command::InsertTemplate,
            Command::StartTyping,
            Command::StopTyping,
            Command::ResetTyping,
            Command::GenerateCode,
        ]
    }
}

/// Everything the host registers commands against: one session, one template
/// inserter, the active editor and the notification sink.
pub struct Extension {
    session: SessionManager,
    typing: TemplateInserter,
    editor: Arc<dyn DocumentEditor>,
    notifier: Arc<dyn Notifier>,
}

impl Extension {
    pub fn new(
        session: SessionManager,
        typing: TemplateInserter,
        editor: Arc<dyn DocumentEditor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            typing,
            editor,
            notifier,
        }
    }

    /// Wire everything up from settings.
    pub fn activate(
        settings: &Settings,
        factory: Arc<dyn SurfaceFactory>,
        editor: Arc<dyn DocumentEditor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let transport = Arc::new(settings.build_transport());
        Self::with_transport(settings, transport, factory, editor, notifier)
    }

    /// Like [`activate`](Self::activate) with a caller-supplied transport.
    pub fn with_transport(
        settings: &Settings,
        transport: Arc<TransportAdapter>,
        factory: Arc<dyn SurfaceFactory>,
        editor: Arc<dyn DocumentEditor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let session = SessionManager::new(transport, factory).with_ordering(
            RequestOrdering::from_serialize_flag(settings.session.serialize_requests),
        );
        let typing =
            TemplateInserter::new(template::CODE_TEMPLATE).with_interval(settings.typing_interval());
        tracing::info!("Chatbot extension active");
        Self::new(session, typing, editor, notifier)
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn typing(&self) -> &TemplateInserter {
        &self.typing
    }

    /// Run a command by id. Unknown ids are reported through the notifier.
    pub async fn execute_id(&self, id: &str) {
        match Command::parse(id) {
            Some(command) => self.execute(command).await,
            None => self.notifier.error(&format!("Unknown command: {id}")),
        }
    }

    /// Run a command. Outcomes are only visible through notifications.
    pub async fn execute(&self, command: Command) {
        tracing::debug!("Executing {}", command.id());
        match command {
            Command::OpenPanel => {
                if let Err(e) = self.session.open() {
                    self.notifier.error(&format!("Could not open the panel: {e}"));
                }
            }
            Command::InsertTemplate => match self.typing.insert_instant(self.editor.as_ref()) {
                Ok(()) => self.notifier.info("Template inserted"),
                Err(e) => self.notifier.error(&e.to_string()),
            },
            Command::StartTyping => self.start_typing(),
            Command::StopTyping => {
                if self.typing.stop() {
                    self.notifier.info("Typing stopped");
                } else {
                    self.notifier.info("Typing is not running");
                }
            }
            Command::ResetTyping => {
                self.typing.reset();
                self.notifier.info("Typing reset");
            }
            Command::GenerateCode => {
                let transport = self.session.transport();
                match codegen::generate_below_selection(self.editor.as_ref(), transport).await {
                    Ok(generated) => self.notifier.info(&format!(
                        "Generated code inserted at line {}",
                        generated.line + 1
                    )),
                    Err(e) => self.notifier.error(&e.to_string()),
                }
            }
        }
    }

    /// Host shutdown: drop the surface and stop typing.
    pub fn deactivate(&self) {
        self.session.close();
        self.typing.stop();
        tracing::info!("Chatbot extension deactivated");
    }

    fn start_typing(&self) {
        let Some(run) = self.typing.start(self.editor.clone()) else {
            self.notifier.info("Typing is already running");
            return;
        };

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match run.await {
                Ok(TypingOutcome::Finished) => notifier.info("Template typed"),
                Ok(TypingOutcome::Failed(e)) => notifier.error(&e.to_string()),
                Ok(TypingOutcome::Stopped) => {}
                Err(e) => tracing::warn!("Typing task ended abnormally: {e}"),
            }
        });
    }
}
