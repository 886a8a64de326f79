use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::constants::{defaults, template};
use crate::editor::DocumentEditor;
use crate::error::ChatbotError;
use crate::template::TemplateCursor;

/// How an animated run ended.
#[derive(Debug)]
pub enum TypingOutcome {
    /// The whole template has been typed.
    Finished,
    /// `stop()` or `reset()` was called.
    Stopped,
    /// The editor refused a character; the index was not advanced.
    Failed(ChatbotError),
}

struct ActiveRun {
    id: u64,
    token: CancellationToken,
}

struct TypingState {
    cursor: TemplateCursor,
    run: Option<ActiveRun>,
    runs_started: u64,
}

/// Inserts a fixed template into the active document, either in one edit or
/// one character per tick.
#[derive(Clone)]
pub struct TemplateInserter {
    template: Arc<str>,
    interval: Duration,
    state: Arc<Mutex<TypingState>>,
}

impl TemplateInserter {
    pub fn new(template: impl Into<Arc<str>>) -> Self {
        let template = template.into();
        Self {
            state: Arc::new(Mutex::new(TypingState {
                cursor: TemplateCursor::new(&template),
                run: None,
                runs_started: 0,
            })),
            template,
            interval: Duration::from_millis(defaults::TYPING_INTERVAL_MS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.lock().run.is_some()
    }

    /// Characters typed so far by animated runs.
    pub fn index(&self) -> usize {
        self.lock().cursor.index()
    }

    /// Insert the whole template at the cursor in one edit.
    pub fn insert_instant(&self, editor: &dyn DocumentEditor) -> Result<(), ChatbotError> {
        let state = self.lock();
        if state.run.is_some() {
            return Err(ChatbotError::TypingInProgress);
        }
        editor.insert_at_cursor(&self.template)?;
        tracing::debug!("Inserted template ({} chars)", state.cursor.len());
        Ok(())
    }

    /// Start typing from the current index. Returns `None` if a run is
    /// already active.
    pub fn start(&self, editor: Arc<dyn DocumentEditor>) -> Option<JoinHandle<TypingOutcome>> {
        let (id, token) = {
            let mut state = self.lock();
            if state.run.is_some() {
                return None;
            }
            state.runs_started += 1;
            let id = state.runs_started;
            let token = CancellationToken::new();
            state.run = Some(ActiveRun {
                id,
                token: token.clone(),
            });
            tracing::info!("Typing run {id} started at {}", state.cursor.index());
            (id, token)
        };

        let inserter = self.clone();
        Some(tokio::spawn(async move {
            let outcome = inserter.type_until_done(editor.as_ref(), &token).await;
            inserter.finish_run(id, &outcome);
            outcome
        }))
    }

    /// Cancel the active run, keeping the index so a later `start` resumes.
    pub fn stop(&self) -> bool {
        let mut state = self.lock();
        match state.run.take() {
            Some(run) => {
                run.token.cancel();
                tracing::info!("Typing run {} stopped at {}", run.id, state.cursor.index());
                true
            }
            None => false,
        }
    }

    /// Cancel any active run and move back to the start of the template.
    pub fn reset(&self) {
        let mut state = self.lock();
        if let Some(run) = state.run.take() {
            run.token.cancel();
        }
        state.cursor.reset();
        tracing::info!("Typing reset");
    }

    async fn type_until_done(
        &self,
        editor: &dyn DocumentEditor,
        token: &CancellationToken,
    ) -> TypingOutcome {
        loop {
            tokio::select! {
                _ = token.cancelled() => return TypingOutcome::Stopped,
                _ = tokio::time::sleep(self.interval) => {}
            }

            if let Some(outcome) = self.step(editor, token) {
                return outcome;
            }
        }
    }

    /// Type one character. Check, insert and advance happen under one lock so
    /// stop/reset cannot interleave with a half-finished step.
    fn step(&self, editor: &dyn DocumentEditor, token: &CancellationToken) -> Option<TypingOutcome> {
        let mut state = self.lock();
        if token.is_cancelled() {
            return Some(TypingOutcome::Stopped);
        }
        let Some(c) = state.cursor.peek() else {
            return Some(TypingOutcome::Finished);
        };
        let mut buf = [0u8; 4];
        if let Err(e) = editor.insert_at_cursor(c.encode_utf8(&mut buf)) {
            return Some(TypingOutcome::Failed(e));
        }
        state.cursor.advance();
        state.cursor.is_finished().then_some(TypingOutcome::Finished)
    }

    fn finish_run(&self, id: u64, outcome: &TypingOutcome) {
        let mut state = self.lock();
        if state.run.as_ref().is_some_and(|run| run.id == id) {
            state.run = None;
        }
        match outcome {
            TypingOutcome::Finished => tracing::info!("Typing run {id} finished"),
            TypingOutcome::Stopped => tracing::debug!("Typing run {id} cancelled"),
            TypingOutcome::Failed(e) => tracing::warn!("Typing run {id} failed: {e}"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TypingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TemplateInserter {
    fn default() -> Self {
        Self::new(template::CODE_TEMPLATE)
    }
}
