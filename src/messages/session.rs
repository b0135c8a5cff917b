//! Chat session: history, draft and backend round trips
//!
//! `submit` records the user's turn synchronously and starts one backend
//! request on the tokio runtime. Completed requests come back over a channel
//! and are appended by `poll` in the order they finish, so overlapping
//! requests may answer out of submission order.

use super::storage::MessageStorage;
use super::types::{ChatMessage, MessageMetadata};
use crate::backend::{extract_reply, Backend, QueryMode, QueryRequest};
use crate::speech::Language;
use crate::{Result, StudioError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A finished backend request, already appended to the history
#[derive(Debug, Clone)]
pub struct Reply {
    pub request_id: Uuid,
    pub text: String,
    pub ok: bool,
    pub elapsed: Duration,
}

struct Completion {
    request_id: Uuid,
    result: Result<serde_json::Value>,
}

pub struct ChatSession {
    storage: MessageStorage,
    draft: String,
    language: Language,
    mode: QueryMode,
    backend: Arc<dyn Backend>,
    runtime: Handle,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    in_flight: HashMap<Uuid, Instant>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn Backend>, runtime: Handle) -> Self {
        let (completion_tx, completion_rx) = unbounded();

        Self {
            storage: MessageStorage::new(),
            draft: String::new(),
            language: Language::default(),
            mode: QueryMode::default(),
            backend,
            runtime,
            completion_tx,
            completion_rx,
            in_flight: HashMap::new(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn storage(&self) -> &MessageStorage {
        &self.storage
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.storage.get_all()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: QueryMode) {
        self.mode = mode;
    }

    /// Requests sent but not yet answered
    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    /// Submit the current draft
    pub fn submit_draft(&mut self) -> Option<Uuid> {
        let text = std::mem::take(&mut self.draft);
        let id = self.submit(&text);
        if id.is_none() {
            self.draft = text;
        }
        id
    }

    /// Submit typed text
    ///
    /// Whitespace-only text is ignored. Otherwise the user's message is in
    /// the history when this returns, exactly one request is in flight for
    /// it and the draft is cleared.
    pub fn submit(&mut self, text: &str) -> Option<Uuid> {
        let id = self.submit_with(text, MessageMetadata::default());
        if id.is_some() {
            self.draft.clear();
        }
        id
    }

    /// Submit a speech transcript; the draft is left alone
    pub fn submit_transcript(&mut self, text: &str) -> Option<Uuid> {
        self.submit_with(
            text,
            MessageMetadata {
                from_speech: true,
                ..Default::default()
            },
        )
    }

    /// Text is stored and sent exactly as given
    fn submit_with(&mut self, text: &str, metadata: MessageMetadata) -> Option<Uuid> {
        if text.trim().is_empty() {
            return None;
        }

        self.storage.add(ChatMessage::user(text).with_metadata(metadata));

        let request_id = Uuid::new_v4();
        let request = QueryRequest::new(self.mode, text);
        let backend = Arc::clone(&self.backend);
        let tx = self.completion_tx.clone();

        info!("Submitting request {} ({} chars, {:?})", request_id, text.len(), self.mode);

        // The outer task turns a panicking backend into an ordinary failure
        let query = self
            .runtime
            .spawn(async move { backend.query(&request).await });
        self.runtime.spawn(async move {
            let result = match query.await {
                Ok(result) => result,
                Err(e) => Err(StudioError::BackendError(format!("Request task failed: {}", e))),
            };
            let _ = tx.send(Completion { request_id, result });
        });

        self.in_flight.insert(request_id, Instant::now());
        Some(request_id)
    }

    /// Append a bot message for every request that finished
    pub fn poll(&mut self) -> Vec<Reply> {
        let mut replies = Vec::new();

        while let Ok(Completion { request_id, result }) = self.completion_rx.try_recv() {
            let elapsed = self
                .in_flight
                .remove(&request_id)
                .map(|started| started.elapsed())
                .unwrap_or_default();

            let (message, ok) = match result {
                Ok(body) => {
                    debug!("Request {} answered in {:?}", request_id, elapsed);
                    let message = ChatMessage::bot(extract_reply(&body)).with_metadata(MessageMetadata {
                        latency_ms: Some(elapsed.as_millis() as u64),
                        ..Default::default()
                    });
                    (message, true)
                }
                Err(e) => {
                    warn!("Request {} failed: {}", request_id, e);
                    let message = ChatMessage::bot(e.user_message()).with_metadata(MessageMetadata {
                        is_error: true,
                        ..Default::default()
                    });
                    (message, false)
                }
            };

            let text = message.content().to_string();
            self.storage.add(message);

            replies.push(Reply {
                request_id,
                text,
                ok,
                elapsed,
            });
        }

        replies
    }
}
