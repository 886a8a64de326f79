use crate::conversation::AnswerMessage;
use crate::error::ChatbotError;
use crate::session::DisposeHandle;

/// Identifies one created surface. Never reused within a manager.
pub type SurfaceId = u64;

/// A rendered, user-closable conversation UI.
///
/// Both methods are called while the session lock is held, so they must only
/// hand the work over to the UI (e.g. send on a channel) and must not call
/// back into the [`SessionManager`](crate::session::SessionManager).
pub trait Surface: Send + Sync {
    /// Show an answer or error as a bot turn. An `Err` means the UI side is
    /// gone; the manager then treats the surface as disposed.
    fn post(&self, message: AnswerMessage) -> Result<(), ChatbotError>;

    /// Bring the surface to the foreground.
    fn reveal(&self);
}

/// Host hook that builds a new surface.
pub trait SurfaceFactory: Send + Sync {
    /// `dispose` must be invoked once the surface is closed by the user or
    /// torn down by the host.
    fn create(&self, id: SurfaceId, dispose: DisposeHandle)
        -> Result<Box<dyn Surface>, ChatbotError>;
}
