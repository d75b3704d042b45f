//! Per-conversation photo buffering
//!
//! Each conversation is either `Idle` or `AwaitingPlate`. The registry holds
//! an entry only while a conversation has at least one buffered photo, so the
//! absence of an entry is the `Idle` state.
//!
//! The dispatcher delivers one conversation's messages in order; the mutex
//! only protects the map itself when different conversations run at once.
//!
//! A buffer holds at most `max_photos` photos. Buffers have no expiry: an
//! abandoned one lives until `/cancel`, a plate, or restart.

use plates_common::config::DEFAULT_MAX_BUFFERED_PHOTOS;
use plates_common::events::ConversationId;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Photos waiting for a plate string, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingPhotoBuffer {
    photos: Vec<Vec<u8>>,
}

impl PendingPhotoBuffer {
    pub fn photos(&self) -> &[Vec<u8>] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

/// Buffering state of one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// No buffered photos: text is a search query
    Idle,
    /// Photos buffered: text is the plate to save them under
    AwaitingPlate { buffered: usize },
}

/// Result of buffering one photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Photo appended; `count` photos now buffered
    Buffered { count: usize },
    /// Buffer already at `limit`; the photo was dropped
    Full { limit: usize },
}

/// Mapping from conversation to its pending photos
#[derive(Debug)]
pub struct SessionRegistry {
    buffers: Mutex<HashMap<ConversationId, PendingPhotoBuffer>>,
    max_photos: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_BUFFERED_PHOTOS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose buffers hold at most `max_photos` photos each
    pub fn with_limit(max_photos: usize) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            max_photos: max_photos.max(1),
        }
    }

    pub async fn state(&self, conversation: ConversationId) -> ConversationState {
        match self.buffers.lock().await.get(&conversation) {
            Some(buffer) if !buffer.is_empty() => ConversationState::AwaitingPlate {
                buffered: buffer.len(),
            },
            _ => ConversationState::Idle,
        }
    }

    /// Append a photo, creating the buffer on the first one.
    /// A full buffer is left unchanged.
    pub async fn push_photo(&self, conversation: ConversationId, photo: Vec<u8>) -> PushOutcome {
        let mut buffers = self.buffers.lock().await;
        let buffer = buffers.entry(conversation).or_default();
        if buffer.len() >= self.max_photos {
            return PushOutcome::Full {
                limit: self.max_photos,
            };
        }

        let size = photo.len();
        buffer.photos.push(photo);
        debug!(
            "Conversation {}: buffered photo #{} ({} bytes)",
            conversation,
            buffer.len(),
            size
        );
        PushOutcome::Buffered {
            count: buffer.len(),
        }
    }

    /// Remove and return the buffer, leaving the conversation `Idle`
    pub async fn take(&self, conversation: ConversationId) -> Option<PendingPhotoBuffer> {
        self.buffers
            .lock()
            .await
            .remove(&conversation)
            .filter(|buffer| !buffer.is_empty())
    }

    /// Put a taken buffer back after a failed save.
    ///
    /// Photos buffered in the meantime stay behind the restored ones.
    pub async fn restore(&self, conversation: ConversationId, mut buffer: PendingPhotoBuffer) {
        if buffer.is_empty() {
            return;
        }
        let mut buffers = self.buffers.lock().await;
        if let Some(newer) = buffers.remove(&conversation) {
            buffer.photos.extend(newer.photos);
        }
        buffers.insert(conversation, buffer);
    }

    /// Drop all buffered photos. Returns how many were discarded.
    pub async fn clear(&self, conversation: ConversationId) -> usize {
        self.buffers
            .lock()
            .await
            .remove(&conversation)
            .map_or(0, |buffer| buffer.len())
    }
}
