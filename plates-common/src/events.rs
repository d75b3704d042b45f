//! Conversation event types
//!
//! Inbound events are what the messaging platform delivers to the handler;
//! outcomes are the effects the handler asks the platform to render.

use crate::PlateKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One end user's session with the bot
///
/// Keyed by chat and sender, so several people in one group chat each get
/// their own photo buffer. Messages without a sender (channel posts) fall
/// back to the chat alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId {
    pub chat_id: i64,
    pub user_id: Option<u64>,
}

impl ConversationId {
    pub const fn new(chat_id: i64, user_id: Option<u64>) -> Self {
        Self { chat_id, user_id }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_id {
            Some(user_id) => write!(f, "{}/{}", self.chat_id, user_id),
            None => write!(f, "{}", self.chat_id),
        }
    }
}

/// Events delivered by the messaging platform
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A photo arrived (largest resolution, raw bytes)
    PhotoReceived {
        conversation: ConversationId,
        photo: Vec<u8>,
    },

    /// Plain text arrived: a plate for buffered photos, or a search query
    TextReceived {
        conversation: ConversationId,
        text: String,
    },

    /// Operator asked to drop buffered photos
    CancelRequested { conversation: ConversationId },

    /// Explicit search, independent of buffered photos
    SearchRequested {
        conversation: ConversationId,
        query: String,
    },
}

/// Effects the platform adapter renders back to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Photo buffered; `count` photos now await a plate
    PhotoBuffered { count: usize },

    /// Text did not match any accepted plate format
    ReportFormatError,

    /// `count` photos were stored under the plate
    ReportSaved { plate: PlateKey, count: usize },

    /// Search matched nothing
    ReportNoResults { plate: PlateKey },

    /// Search results, in insertion order
    ReturnPhotos {
        plate: PlateKey,
        photos: Vec<Vec<u8>>,
    },

    /// Store unreachable, rejected the operation, or timed out
    ReportStoreError,

    /// Buffer already holds `limit` photos; the new one was dropped
    BufferFull { limit: usize },

    /// Buffered photos dropped
    Cancelled { discarded: usize },
}
