//! Nile Chat - minimal chat server in front of a locally hosted model
//!
//! The browser posts a user message, the server asks the inference provider
//! for a reply given the whole transcript, and answers with the updated
//! transcript.

pub mod api;
pub mod brainstorm;
pub mod chat;
pub mod config;
pub mod llm;
pub mod transcript;
