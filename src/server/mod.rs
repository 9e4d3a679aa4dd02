//! Server module - HTTP API over the session manager

mod error;
mod handlers;
mod listener;

pub use error::ApiError;
pub use handlers::{create_router, AppContext};
pub use listener::{build_context, ServerListener};
