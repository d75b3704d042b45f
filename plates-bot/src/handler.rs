//! Conversation event handler
//!
//! Drives the buffering state machine:
//!
//! | State          | Event   | Effect                                          |
//! |----------------|---------|-------------------------------------------------|
//! | Idle           | photo   | buffer, -> AwaitingPlate                        |
//! | AwaitingPlate  | photo   | append (dropped when the buffer is full)        |
//! | AwaitingPlate  | text    | valid: save all, clear, -> Idle; invalid: keep  |
//! | Idle           | text    | search, no state change                         |
//! | any            | cancel  | clear, -> Idle                                  |
//! | any            | /search | search, buffer untouched                        |
//!
//! Store failures become [`Outcome::ReportStoreError`]; nothing here returns
//! an error to the dispatcher.

use crate::session::{ConversationState, PushOutcome, SessionRegistry};
use plates_common::events::{ConversationId, InboundEvent, Outcome};
use plates_common::store::{StoreDiagnostics, StoreStats};
use plates_common::{Error, PlateKey, PlateStore, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shared handler state: store handle, buffers, store timeout
pub struct PlateHandler {
    store: Arc<dyn PlateStore>,
    sessions: SessionRegistry,
    store_timeout: Duration,
}

impl PlateHandler {
    pub fn new(store: Arc<dyn PlateStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            sessions: SessionRegistry::new(),
            store_timeout,
        }
    }

    /// Cap the number of photos one conversation may buffer
    pub fn with_photo_limit(mut self, max_photos: usize) -> Self {
        self.sessions = SessionRegistry::with_limit(max_photos);
        self
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Process one inbound event and return the effect to render
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        match event {
            InboundEvent::PhotoReceived {
                conversation,
                photo,
            } => match self.sessions.push_photo(conversation, photo).await {
                PushOutcome::Buffered { count } => Outcome::PhotoBuffered { count },
                PushOutcome::Full { limit } => {
                    warn!(
                        "Conversation {}: photo buffer full ({} photos), photo dropped",
                        conversation, limit
                    );
                    Outcome::BufferFull { limit }
                }
            },
            InboundEvent::TextReceived { conversation, text } => {
                match self.sessions.state(conversation).await {
                    ConversationState::Idle => self.search(conversation, &text).await,
                    ConversationState::AwaitingPlate { .. } => {
                        self.save_pending(conversation, &text).await
                    }
                }
            }
            InboundEvent::CancelRequested { conversation } => {
                let discarded = self.sessions.clear(conversation).await;
                info!(
                    "Conversation {}: cancelled, discarded {} photo(s)",
                    conversation, discarded
                );
                Outcome::Cancelled { discarded }
            }
            InboundEvent::SearchRequested {
                conversation,
                query,
            } => self.search(conversation, &query).await,
        }
    }

    async fn save_pending(&self, conversation: ConversationId, text: &str) -> Outcome {
        let plate = match PlateKey::parse(text) {
            Ok(plate) => plate,
            Err(e) => {
                debug!("Conversation {}: {}", conversation, e);
                return Outcome::ReportFormatError;
            }
        };

        let Some(buffer) = self.sessions.take(conversation).await else {
            // Cleared between the state check and here: nothing to save
            return self.search(conversation, text).await;
        };

        for (index, photo) in buffer.photos().iter().enumerate() {
            if let Err(e) = self.with_timeout(self.store.save(&plate, photo)).await {
                error!(
                    "Conversation {}: saving photo {}/{} for plate '{}' failed: {}",
                    conversation,
                    index + 1,
                    buffer.len(),
                    plate,
                    e
                );
                // Earlier photos of this batch stay stored, and a timed-out
                // insert may still commit. The whole buffer is kept so the
                // operator can resend the plate.
                self.sessions.restore(conversation, buffer).await;
                return Outcome::ReportStoreError;
            }
        }

        let count = buffer.len();
        info!(
            "Conversation {}: saved {} photo(s) for plate '{}'",
            conversation, count, plate
        );
        Outcome::ReportSaved { plate, count }
    }

    async fn search(&self, conversation: ConversationId, query: &str) -> Outcome {
        let plate = match PlateKey::parse(query) {
            Ok(plate) => plate,
            Err(e) => {
                debug!("Conversation {}: {}", conversation, e);
                return Outcome::ReportFormatError;
            }
        };

        match self.with_timeout(self.store.search(&plate)).await {
            Ok(photos) if photos.is_empty() => {
                info!("Conversation {}: no photos for plate '{}'", conversation, plate);
                Outcome::ReportNoResults { plate }
            }
            Ok(photos) => {
                info!(
                    "Conversation {}: found {} photo(s) for plate '{}'",
                    conversation,
                    photos.len(),
                    plate
                );
                Outcome::ReturnPhotos { plate, photos }
            }
            Err(e) => {
                error!(
                    "Conversation {}: search for '{}' failed: {}",
                    conversation, plate, e
                );
                Outcome::ReportStoreError
            }
        }
    }

    /// Record and distinct-plate counts
    pub async fn stats(&self) -> Result<StoreStats> {
        self.with_timeout(self.store.stats()).await
    }

    /// All stored plates, ascending
    pub async fn list_plates(&self) -> Result<Vec<PlateKey>> {
        self.with_timeout(self.store.list_distinct_keys()).await
    }

    /// Store connection check
    pub async fn diagnostics(&self) -> Result<StoreDiagnostics> {
        self.with_timeout(self.store.diagnostics()).await
    }

    async fn with_timeout<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.store_timeout, operation)
            .await
            .map_err(|_| Error::StoreTimeout(self.store_timeout))?
    }
}
