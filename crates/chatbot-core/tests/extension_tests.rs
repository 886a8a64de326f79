use chatbot_core::constants::prompts::ERROR_PREFIX;
use chatbot_core::codegen::generate_below_selection;
use chatbot_core::config::Settings;
use chatbot_core::constants::template::CODE_TEMPLATE;
use chatbot_core::{
    AnswerMessage, AnswerService, ChatbotError, Command, DisposeHandle, DocumentEditor,
    Extension, Notifier, Selection, Surface, SurfaceFactory, SurfaceId, TransportAdapter,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ========================================================================
// Test doubles
// ========================================================================

struct FixedService(Result<&'static str, &'static str>);

#[async_trait::async_trait]
impl AnswerService for FixedService {
    async fn answer(&self, _text: &str) -> Result<String, ChatbotError> {
        self.0
            .map(str::to_string)
            .map_err(ChatbotError::transport)
    }
}

/// Line-based document with an optional selection.
struct LineEditor {
    lines: Mutex<Option<Vec<String>>>,
    selection: Mutex<Option<Selection>>,
}

impl LineEditor {
    fn with_text(text: &str) -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(Some(text.lines().map(str::to_string).collect())),
            selection: Mutex::new(None),
        })
    }

    fn closed() -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(None),
            selection: Mutex::new(None),
        })
    }

    fn select(&self, text: &str, end_line: usize) {
        *self.selection.lock().unwrap() = Some(Selection {
            text: text.to_string(),
            end_line,
        });
    }

    fn text(&self) -> String {
        self.lines.lock().unwrap().as_ref().unwrap().join("\n")
    }
}

impl DocumentEditor for LineEditor {
    fn insert_at_cursor(&self, text: &str) -> Result<(), ChatbotError> {
        let mut lines = self.lines.lock().unwrap();
        let lines = lines.as_mut().ok_or(ChatbotError::NoActiveDocument)?;
        lines.push(text.to_string());
        Ok(())
    }

    fn insert_at_line(&self, line: usize, text: &str) -> Result<(), ChatbotError> {
        let mut lines = self.lines.lock().unwrap();
        let lines = lines.as_mut().ok_or(ChatbotError::NoActiveDocument)?;
        let at = line.min(lines.len());
        for (offset, new_line) in text.lines().enumerate() {
            lines.insert(at + offset, new_line.to_string());
        }
        Ok(())
    }

    fn selection(&self) -> Result<Option<Selection>, ChatbotError> {
        if self.lines.lock().unwrap().is_none() {
            return Err(ChatbotError::NoActiveDocument);
        }
        Ok(self.selection.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct Toasts {
    info: Mutex<Vec<String>>,
    error: Mutex<Vec<String>>,
}

impl Notifier for Toasts {
    fn info(&self, message: &str) {
        self.info.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.error.lock().unwrap().push(message.to_string());
    }
}

struct NullSurface;

impl Surface for NullSurface {
    fn post(&self, _message: AnswerMessage) -> Result<(), ChatbotError> {
        Ok(())
    }

    fn reveal(&self) {}
}

struct NullFactory;

impl SurfaceFactory for NullFactory {
    fn create(
        &self,
        _id: SurfaceId,
        _dispose: DisposeHandle,
    ) -> Result<Box<dyn Surface>, ChatbotError> {
        Ok(Box::new(NullSurface))
    }
}

fn extension(
    answer: Result<&'static str, &'static str>,
    editor: Arc<LineEditor>,
) -> (Extension, Arc<Toasts>) {
    let mut settings = Settings::default();
    settings.typing.interval_ms = 1;
    let toasts = Arc::new(Toasts::default());
    let transport = Arc::new(TransportAdapter::new(Box::new(FixedService(answer))));
    let ext = Extension::with_transport(
        &settings,
        transport,
        Arc::new(NullFactory),
        editor,
        toasts.clone(),
    );
    (ext, toasts)
}

// ========================================================================
// Command ids
// ========================================================================

#[test]
fn test_command_ids_roundtrip() {
    for command in Command::all() {
        assert_eq!(Command::parse(command.id()), Some(*command));
        assert!(command.id().starts_with("chatbot."));
        assert!(!command.title().is_empty());
    }
    assert_eq!(Command::parse("chatbot.nope"), None);
}

// ========================================================================
// Code generation
// ========================================================================

#[tokio::test]
async fn test_generate_inserts_code_block_below_selection() {
    let editor = LineEditor::with_text("def f():\n    pass\nprint(f())");
    editor.select("def f():\n    pass", 1);
    let transport = TransportAdapter::new(Box::new(FixedService(Ok(
        "Here you go:\n\n```python\ndef g():\n    return 1\n```\n",
    ))));

    let generated = generate_below_selection(editor.as_ref(), &transport)
        .await
        .unwrap();
    assert_eq!(generated.line, 2);
    assert_eq!(generated.code, "def g():\n    return 1\n");
    assert_eq!(
        editor.text(),
        "def f():\n    pass\ndef g():\n    return 1\nprint(f())"
    );
}

#[tokio::test]
async fn test_generate_without_code_block_inserts_answer() {
    let editor = LineEditor::with_text("x = 1");
    editor.select("x = 1", 0);
    let transport = TransportAdapter::new(Box::new(FixedService(Ok("y = 2"))));

    generate_below_selection(editor.as_ref(), &transport)
        .await
        .unwrap();
    assert_eq!(editor.text(), "x = 1\ny = 2");
}

#[tokio::test]
async fn test_generate_guards() {
    let transport = TransportAdapter::new(Box::new(FixedService(Ok("unused"))));

    let closed = LineEditor::closed();
    let err = generate_below_selection(closed.as_ref(), &transport)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatbotError::NoActiveDocument));

    let editor = LineEditor::with_text("x = 1");
    let err = generate_below_selection(editor.as_ref(), &transport)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatbotError::EmptySelection));

    editor.select("   ", 0);
    let err = generate_below_selection(editor.as_ref(), &transport)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatbotError::EmptySelection));
}

#[tokio::test]
async fn test_generate_transport_failure() {
    let editor = LineEditor::with_text("x = 1");
    editor.select("x = 1", 0);
    let transport = TransportAdapter::new(Box::new(FixedService(Err("timed out"))));

    let err = generate_below_selection(editor.as_ref(), &transport)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("{ERROR_PREFIX}timed out"));
    assert_eq!(editor.text(), "x = 1");
}

// ========================================================================
// Extension dispatch
// ========================================================================

#[tokio::test]
async fn test_open_panel_command() {
    let (ext, toasts) = extension(Ok("hi"), LineEditor::with_text(""));

    ext.execute(Command::OpenPanel).await;
    ext.execute_id("chatbot.openPanel").await;

    assert!(ext.session().is_open());
    assert_eq!(ext.session().surfaces_created(), 1);
    assert!(toasts.error.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_command_reports_error() {
    let (ext, toasts) = extension(Ok("hi"), LineEditor::with_text(""));

    ext.execute_id("chatbot.fly").await;
    assert_eq!(
        toasts.error.lock().unwrap().as_slice(),
        &["Unknown command: chatbot.fly".to_string()]
    );
}

#[tokio::test]
async fn test_insert_template_command() {
    let editor = LineEditor::with_text("");
    let (ext, toasts) = extension(Ok("hi"), editor.clone());

    ext.execute(Command::InsertTemplate).await;
    assert!(editor.text().contains(CODE_TEMPLATE));
    assert_eq!(
        toasts.info.lock().unwrap().as_slice(),
        &["Template inserted".to_string()]
    );
}

#[tokio::test]
async fn test_insert_template_without_document() {
    let (ext, toasts) = extension(Ok("hi"), LineEditor::closed());

    ext.execute(Command::InsertTemplate).await;
    assert_eq!(
        toasts.error.lock().unwrap().as_slice(),
        &["No active document".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_typing_commands() {
    let (ext, toasts) = extension(Ok("hi"), LineEditor::with_text(""));

    ext.execute(Command::StartTyping).await;
    assert!(ext.typing().is_running());
    ext.execute(Command::StartTyping).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    ext.execute(Command::StopTyping).await;
    assert!(!ext.typing().is_running());
    assert!(ext.typing().index() > 0);

    ext.execute(Command::ResetTyping).await;
    assert_eq!(ext.typing().index(), 0);

    let info = toasts.info.lock().unwrap().clone();
    assert_eq!(
        info,
        vec![
            "Typing is already running".to_string(),
            "Typing stopped".to_string(),
            "Typing reset".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_generate_command_reports_outcome() {
    let editor = LineEditor::with_text("a\nb");
    editor.select("a", 0);
    let (ext, toasts) = extension(Ok("```\nz\n```"), editor.clone());

    ext.execute(Command::GenerateCode).await;
    assert_eq!(editor.text(), "a\nz\nb");
    assert_eq!(
        toasts.info.lock().unwrap().as_slice(),
        &["Generated code inserted at line 2".to_string()]
    );

    let (ext, toasts) = extension(Err("down"), editor.clone());
    ext.execute(Command::GenerateCode).await;
    assert_eq!(
        toasts.error.lock().unwrap().as_slice(),
        &[format!("{ERROR_PREFIX}down")]
    );
}

#[tokio::test]
async fn test_deactivate_closes_panel() {
    let (ext, _toasts) = extension(Ok("hi"), LineEditor::with_text(""));

    ext.execute(Command::OpenPanel).await;
    ext.deactivate();
    assert!(!ext.session().is_open());
}
