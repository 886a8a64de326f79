use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};

use crate::conversation::AnswerMessage;
use crate::error::ChatbotError;
use crate::session::{Surface, SurfaceFactory, SurfaceId};
use crate::transport::TransportAdapter;

/// An answer waiting for a live surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelivery {
    pub text: String,
}

/// Where an answer ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Posted to the live surface.
    Shown,
    /// Queued until the next `open()`.
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new surface was built and `drained` pending answers were posted to it.
    Created { id: SurfaceId, drained: usize },
    /// A surface was already live and has been brought to the foreground.
    Revealed { id: SurfaceId },
}

/// How concurrent turns are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrdering {
    /// One request at a time, answers in submission order.
    Serialized,
    /// Every turn runs on its own task, answers in completion order.
    Concurrent,
}

impl RequestOrdering {
    pub fn from_serialize_flag(serialize: bool) -> Self {
        if serialize {
            Self::Serialized
        } else {
            Self::Concurrent
        }
    }
}

struct LiveSurface {
    id: SurfaceId,
    surface: Box<dyn Surface>,
}

#[derive(Default)]
struct SessionState {
    live: Option<LiveSurface>,
    pending: VecDeque<PendingDelivery>,
    created: u64,
}

/// State shared with dispose handles and request tasks.
struct Core {
    state: Mutex<SessionState>,
    transport: Arc<TransportAdapter>,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn deliver(&self, text: String) -> Delivery {
        let mut state = self.lock();

        let posted = state
            .live
            .as_ref()
            .map(|live| (live.id, live.surface.post(AnswerMessage::new(text.clone()))));

        match posted {
            Some((_, Ok(()))) => return Delivery::Shown,
            Some((id, Err(e))) => {
                tracing::warn!("Surface {id} rejected an answer, treating it as closed: {e}");
                state.live = None;
            }
            None => {}
        }

        state.pending.push_back(PendingDelivery { text });
        tracing::debug!("Answer buffered ({} pending)", state.pending.len());
        Delivery::Buffered
    }

    async fn answer(&self, text: &str) -> Delivery {
        let answer = self.transport.ask_or_error(text).await;
        self.deliver(answer)
    }
}

/// Post queued answers to the live surface, oldest first. Stops and closes
/// the surface at the first rejected post, keeping the rest queued.
fn drain(state: &mut SessionState) -> usize {
    let mut drained = 0;
    while let Some(front) = state.pending.front() {
        let Some(live) = state.live.as_ref() else {
            break;
        };
        match live.surface.post(AnswerMessage::new(front.text.clone())) {
            Ok(()) => {
                state.pending.pop_front();
                drained += 1;
            }
            Err(e) => {
                tracing::warn!("Surface {} rejected a queued answer: {e}", live.id);
                state.live = None;
            }
        }
    }
    drained
}

/// Handed to a surface on creation; reports that the surface went away.
#[derive(Clone)]
pub struct DisposeHandle {
    id: SurfaceId,
    core: Weak<Core>,
}

impl DisposeHandle {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Mark the surface as closed. Returns `false` if it was not the live
    /// surface (already disposed, or superseded by a newer one).
    pub fn dispose(&self) -> bool {
        let Some(core) = self.core.upgrade() else {
            return false;
        };
        let mut state = core.lock();
        let is_live = state.live.as_ref().is_some_and(|live| live.id == self.id);
        if !is_live {
            return false;
        }
        state.live = None;
        tracing::info!("Surface {} disposed", self.id);
        true
    }
}

struct Job {
    text: String,
    reply: oneshot::Sender<Delivery>,
}

/// Resolves once the answer for one submitted turn has been shown or
/// buffered. Yields `None` if the request task was dropped first.
pub struct TurnHandle {
    rx: oneshot::Receiver<Delivery>,
}

impl Future for TurnHandle {
    type Output = Option<Delivery>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

/// Mediates between one logical conversation and zero or one live surfaces.
///
/// Cloning yields another handle to the same session. Requests are spawned on
/// the ambient tokio runtime.
#[derive(Clone)]
pub struct SessionManager {
    core: Arc<Core>,
    factory: Arc<dyn SurfaceFactory>,
    ordering: RequestOrdering,
    worker: Arc<Mutex<Option<mpsc::UnboundedSender<Job>>>>,
}

impl SessionManager {
    pub fn new(transport: Arc<TransportAdapter>, factory: Arc<dyn SurfaceFactory>) -> Self {
        Self {
            core: Arc::new(Core {
                state: Mutex::new(SessionState::default()),
                transport,
            }),
            factory,
            ordering: RequestOrdering::Serialized,
            worker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_ordering(mut self, ordering: RequestOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn ordering(&self) -> RequestOrdering {
        self.ordering
    }

    pub fn transport(&self) -> &Arc<TransportAdapter> {
        &self.core.transport
    }

    /// Show the conversation: reveal the live surface, or create one and
    /// flush every buffered answer into it.
    pub fn open(&self) -> Result<OpenOutcome, ChatbotError> {
        let mut state = self.core.lock();

        if let Some(ref live) = state.live {
            live.surface.reveal();
            tracing::debug!("Surface {} revealed", live.id);
            return Ok(OpenOutcome::Revealed { id: live.id });
        }

        let id = state.created + 1;
        let dispose = DisposeHandle {
            id,
            core: Arc::downgrade(&self.core),
        };
        let surface = self.factory.create(id, dispose)?;
        state.created = id;
        state.live = Some(LiveSurface { id, surface });

        let drained = drain(&mut state);
        tracing::info!("Surface {id} created, {drained} pending answer(s) delivered");
        Ok(OpenOutcome::Created { id, drained })
    }

    /// Send user text to the answer service. Blank text is rejected without
    /// a request.
    pub fn submit_user_text(&self, text: &str) -> Result<TurnHandle, ChatbotError> {
        if text.trim().is_empty() {
            return Err(ChatbotError::EmptyInput);
        }

        let (reply, rx) = oneshot::channel();
        let job = Job {
            text: text.to_string(),
            reply,
        };

        match self.ordering {
            RequestOrdering::Serialized => self.enqueue(job),
            RequestOrdering::Concurrent => {
                let core = self.core.clone();
                tokio::spawn(async move {
                    let delivery = core.answer(&job.text).await;
                    let _ = job.reply.send(delivery);
                });
            }
        }

        Ok(TurnHandle { rx })
    }

    /// Show `text` on the live surface, or buffer it until the next `open()`.
    pub fn deliver_answer(&self, text: impl Into<String>) -> Delivery {
        self.core.deliver(text.into())
    }

    /// Drop the live surface, e.g. when the host shuts down.
    pub fn close(&self) -> bool {
        let mut state = self.core.lock();
        match state.live.take() {
            Some(live) => {
                tracing::info!("Surface {} closed by host", live.id);
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.core.lock().live.is_some()
    }

    pub fn live_surface(&self) -> Option<SurfaceId> {
        self.core.lock().live.as_ref().map(|live| live.id)
    }

    pub fn pending_len(&self) -> usize {
        self.core.lock().pending.len()
    }

    /// Number of surfaces created so far.
    pub fn surfaces_created(&self) -> u64 {
        self.core.lock().created
    }

    fn enqueue(&self, job: Job) {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());

        let job = match worker.as_ref() {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                Err(mpsc::error::SendError(job)) => job,
            },
            None => job,
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let core = self.core.clone();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let delivery = core.answer(&job.text).await;
                let _ = job.reply.send(delivery);
            }
        });

        // A fresh receiver is alive, so this cannot fail.
        let _ = tx.send(job);
        *worker = Some(tx);
    }
}
