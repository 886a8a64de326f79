mod traits;
mod http;
mod adapter;

pub use traits::*;
pub use http::HttpAnswerService;
pub use adapter::TransportAdapter;
