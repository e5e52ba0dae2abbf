use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CallError, ValidationWarning};
use crate::events::{Role, SessionEvent};
use crate::llm::CompletionClient;
use crate::transcript::Transcript;

/// Result of one accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// The trimmed user text that was recorded
    pub prompt: String,
    /// The generated reply, or why there is none
    pub reply: Result<String, CallError>,
}

impl Turn {
    /// Text recorded as the assistant entry
    pub fn reply_text(&self) -> String {
        match &self.reply {
            Ok(text) => text.clone(),
            Err(err) => err.as_reply(),
        }
    }
}

/// One user's conversation: its own transcript plus shared, read-only primer and client
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    primer: Arc<str>,
    transcript: Transcript,
    client: Arc<dyn CompletionClient>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl Session {
    pub fn new(primer: Arc<str>, client: Arc<dyn CompletionClient>) -> Self {
        let transcript = Transcript::init(&primer);
        let session = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            primer,
            transcript,
            client,
            events: None,
        };
        debug!(session = %session.id, "session started");
        session
    }

    /// Subscribe the presentation layer to refresh and warning signals
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Record the user's text, wait for the completion call, record its outcome.
    ///
    /// Empty or whitespace-only input is rejected without touching the
    /// transcript. Otherwise exactly two entries are appended, user then
    /// assistant, whether or not the call succeeds.
    pub async fn submit(&mut self, input: &str) -> Result<Turn, ValidationWarning> {
        let prompt = input.trim();
        if prompt.is_empty() {
            let warning = ValidationWarning::EmptyMessage;
            self.emit(SessionEvent::Warning {
                message: warning.to_string(),
            });
            return Err(warning);
        }

        self.transcript.append(Role::User, prompt);
        info!(
            session = %self.id,
            len = self.transcript.len(),
            "submitting user turn"
        );

        let reply = self.client.complete(self.transcript.all()).await;
        if let Err(err) = &reply {
            warn!(session = %self.id, error = %err, "completion failed; recording error as reply");
        }

        let turn = Turn {
            prompt: prompt.to_string(),
            reply,
        };
        self.transcript.append(Role::Assistant, turn.reply_text());
        self.emit(SessionEvent::Refresh {
            len: self.transcript.len(),
        });

        Ok(turn)
    }

    /// "Clear Conversation": back to the primer alone
    pub fn clear(&mut self) {
        self.transcript.reset(&self.primer);
        info!(session = %self.id, "conversation cleared");
        self.emit(SessionEvent::Refresh {
            len: self.transcript.len(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
