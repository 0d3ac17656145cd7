//! HTTP API for Nile Chat

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::chat::ChatSession;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ChatSession>,
}

impl AppState {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}
