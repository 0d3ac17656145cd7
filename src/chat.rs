//! Chat session: the one state transition in the system
//!
//! A turn appends the user message, asks the provider for a reply given the
//! whole transcript, and appends the trimmed reply. The transcript lock is
//! held across the provider call so turns are single-flight.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService, MessageRole};
use crate::transcript::{Message, Transcript};
use std::sync::Arc;
use thiserror::Error;
use std::ops::{Deref, DerefMut};
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("inference provider failed: {0}")]
    Provider(#[from] LlmError),
}

/// Per-session generation settings
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
}

/// Owns the transcript and the provider that answers it
pub struct ChatSession {
    transcript: Mutex<Transcript>,
    llm: Arc<dyn LlmService>,
    options: SessionOptions,
}

impl ChatSession {
    pub fn new(llm: Arc<dyn LlmService>, options: SessionOptions) -> Self {
        Self {
            transcript: Mutex::new(Transcript::new()),
            llm,
            options,
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Run one turn and return the full transcript.
    ///
    /// On provider failure, or if this future is dropped mid-turn, the user
    /// message is rolled back, leaving the transcript exactly as it was
    /// before the call.
    pub async fn send_user_message(&self, content: &str) -> Result<Vec<Message>, ChatError> {
        if content.is_empty() {
            return Err(ChatError::InvalidRequest(
                "Missing role or content".to_string(),
            ));
        }

        let mut turn = PendingTurn::begin(self.transcript.lock().await);

        let user_message = turn.append(MessageRole::User, content);
        tracing::debug!(id = user_message.id, "Appended user message");

        let request = LlmRequest {
            system: self.options.system_prompt.clone(),
            messages: turn.messages().iter().map(LlmMessage::from).collect(),
            max_tokens: self.options.max_tokens,
        };

        let reply = match self.llm.complete(&request).await {
            Ok(response) => response.text.trim().to_string(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = %e.kind,
                    rolled_back_to = turn.checkpoint,
                    "Provider failed, user message rolled back"
                );
                return Err(e.into());
            }
        };

        if reply.is_empty() {
            tracing::warn!(
                rolled_back_to = turn.checkpoint,
                "Provider returned only whitespace, user message rolled back"
            );
            return Err(LlmError::empty_response("Model returned an empty reply").into());
        }

        let assistant_message = turn.append(MessageRole::Assistant, reply);
        let transcript = turn.commit();
        tracing::info!(
            user_id = user_message.id,
            assistant_id = assistant_message.id,
            transcript_len = transcript.len(),
            "Turn completed"
        );

        Ok(transcript.snapshot())
    }

    /// Current transcript in insertion order
    pub async fn snapshot(&self) -> Vec<Message> {
        self.transcript.lock().await.snapshot()
    }
}

/// Locked transcript for one turn; truncates back to `checkpoint` on drop
/// unless committed
struct PendingTurn<'a> {
    transcript: Option<MutexGuard<'a, Transcript>>,
    checkpoint: usize,
}

impl<'a> PendingTurn<'a> {
    fn begin(transcript: MutexGuard<'a, Transcript>) -> Self {
        let checkpoint = transcript.len();
        Self {
            transcript: Some(transcript),
            checkpoint,
        }
    }

    fn commit(mut self) -> MutexGuard<'a, Transcript> {
        self.transcript
            .take()
            .expect("pending turn holds the transcript until commit")
    }
}

impl Deref for PendingTurn<'_> {
    type Target = Transcript;

    fn deref(&self) -> &Transcript {
        self.transcript
            .as_deref()
            .expect("pending turn holds the transcript until commit")
    }
}

impl DerefMut for PendingTurn<'_> {
    fn deref_mut(&mut self) -> &mut Transcript {
        self.transcript
            .as_deref_mut()
            .expect("pending turn holds the transcript until commit")
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if let Some(transcript) = self.transcript.as_mut() {
            if transcript.len() > self.checkpoint {
                tracing::debug!(rolled_back_to = self.checkpoint, "Turn abandoned");
                transcript.truncate(self.checkpoint);
            }
        }
    }
}
