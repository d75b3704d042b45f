//! Database models

use crate::PlateKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored plate/photo association. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateRecord {
    pub guid: Uuid,
    pub plate_key: PlateKey,
    /// Opaque image bytes as received from the platform
    #[serde(skip)]
    pub photo: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Table name with its row count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub row_count: i64,
}
