//! Bridges the session manager's surface hooks onto the TUI event loop.
//!
//! The manager calls into these types while holding its lock, so every hook
//! only sends a [`UiEvent`]; the loop picks them up on its next tick.

use chatbot_core::{
    AnswerMessage, ChatbotError, DisposeHandle, Notifier, Surface, SurfaceFactory, SurfaceId,
};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

pub enum UiEvent {
    /// A panel was created; the UI owns `dispose` from now on.
    SurfaceCreated {
        id: SurfaceId,
        dispose: DisposeHandle,
    },
    Answer {
        id: SurfaceId,
        message: AnswerMessage,
    },
    Reveal {
        id: SurfaceId,
    },
    Notice {
        level: NoticeLevel,
        text: String,
    },
}

pub struct TuiSurface {
    id: SurfaceId,
    tx: UnboundedSender<UiEvent>,
}

impl Surface for TuiSurface {
    fn post(&self, message: AnswerMessage) -> Result<(), ChatbotError> {
        self.tx
            .send(UiEvent::Answer {
                id: self.id,
                message,
            })
            .map_err(|_| ChatbotError::SurfaceClosed)
    }

    fn reveal(&self) {
        let _ = self.tx.send(UiEvent::Reveal { id: self.id });
    }
}

pub struct TuiSurfaceFactory {
    tx: UnboundedSender<UiEvent>,
}

impl TuiSurfaceFactory {
    pub fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl SurfaceFactory for TuiSurfaceFactory {
    fn create(
        &self,
        id: SurfaceId,
        dispose: DisposeHandle,
    ) -> Result<Box<dyn Surface>, ChatbotError> {
        self.tx
            .send(UiEvent::SurfaceCreated { id, dispose })
            .map_err(|_| ChatbotError::SurfaceClosed)?;
        Ok(Box::new(TuiSurface {
            id,
            tx: self.tx.clone(),
        }))
    }
}

/// Toasts end up in the status bar.
pub struct TuiNotifier {
    tx: UnboundedSender<UiEvent>,
}

impl TuiNotifier {
    pub fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, level: NoticeLevel, text: &str) {
        let _ = self.tx.send(UiEvent::Notice {
            level,
            text: text.to_string(),
        });
    }
}

impl Notifier for TuiNotifier {
    fn info(&self, message: &str) {
        self.send(NoticeLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.send(NoticeLevel::Error, message);
    }
}
