mod surface;
mod manager;

pub use surface::{Surface, SurfaceFactory, SurfaceId};
pub use manager::{
    Delivery, DisposeHandle, OpenOutcome, PendingDelivery, RequestOrdering, SessionManager,
    TurnHandle,
};
