//! User-facing message texts
//!
//! Pure formatting, no I/O. The Telegram layer sends whatever these return.

use plates_common::events::Outcome;
use plates_common::plate::ACCEPTED_FORMATS;
use plates_common::store::{StoreDiagnostics, StoreStats};
use plates_common::PlateKey;

/// Telegram caps messages at 4096 characters; keep a margin for the header
pub const MAX_LIST_CHUNK_CHARS: usize = 4000;

pub const PHOTO_PROCESSING_FAILED: &str = "❌ Failed to process the photo.";
pub const SAVE_FAILED: &str = "❌ Failed to save to the database. Send the plate again to retry.";
pub const SEARCH_FAILED: &str = "❌ Search failed.";
pub const STATS_FAILED: &str = "❌ Failed to read database statistics.";
pub const LIST_FAILED: &str = "❌ Failed to read the plate list from the database.";
pub const NO_PLATES: &str = "❌ No plates are stored in the database.";

/// What to send back for one outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Photos {
        caption: String,
        photos: Vec<Vec<u8>>,
    },
}

/// Render a handler outcome. `was_saving` picks the store-error wording.
pub fn render(outcome: Outcome, was_saving: bool) -> Reply {
    match outcome {
        Outcome::PhotoBuffered { count: 1 } => {
            Reply::Text("📸 Photo received. Now send the license plate.".to_string())
        }
        Outcome::PhotoBuffered { count } => Reply::Text(format!(
            "📸 {} photos received. Now send the license plate.",
            count
        )),
        Outcome::ReportFormatError => Reply::Text(format_error_text()),
        Outcome::ReportSaved { plate, count } => Reply::Text(format!(
            "✅ {} photo(s) saved for plate {}.",
            count, plate
        )),
        Outcome::ReportNoResults { plate } => {
            Reply::Text(format!("❌ No records found for plate {}.", plate))
        }
        Outcome::ReturnPhotos { plate, photos } => Reply::Photos {
            caption: photo_caption(&plate),
            photos,
        },
        Outcome::ReportStoreError if was_saving => Reply::Text(SAVE_FAILED.to_string()),
        Outcome::ReportStoreError => Reply::Text(SEARCH_FAILED.to_string()),
        Outcome::BufferFull { limit } => Reply::Text(format!(
            "⚠️ Photo not added: at most {} photos can wait for a plate. \
             Send the plate now or /cancel.",
            limit
        )),
        Outcome::Cancelled { discarded: 0 } => Reply::Text("Operation cancelled.".to_string()),
        Outcome::Cancelled { discarded } => Reply::Text(format!(
            "Operation cancelled, {} buffered photo(s) discarded.",
            discarded
        )),
    }
}

fn format_list() -> String {
    ACCEPTED_FORMATS
        .iter()
        .map(|format| format!("• {}", format))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_error_text() -> String {
    format!("❌ Invalid format. Use:\n{}", format_list())
}

pub fn photo_caption(plate: &PlateKey) -> String {
    format!("🔢 Plate: {}", plate)
}

/// Upload name of the n-th returned photo (0-based index)
pub fn photo_file_name(index: usize) -> String {
    format!("photo_{}.jpg", index + 1)
}

pub fn start_text() -> String {
    format!(
        "🤖 Welcome to the license plate bot!\n\n\
         📸 Send a photo of a car with its license plate\n\
         📋 Then send the plate number as text\n\n\
         📋 Supported formats:\n{}\n\n\
         To search, use /search or just send the plate number",
        format_list()
    )
}

pub fn help_text() -> String {
    format!(
        "🤖 License plate storage and search bot\n\n\
         Commands:\n\
         /start - show instructions\n\
         /search - search by plate\n\
         /list - list all saved plates\n\
         /stats - database statistics\n\
         /check_db - check the database connection\n\
         /help - show this help\n\
         /cancel - cancel the current operation\n\n\
         How to use:\n\
         1. Send one or more photos of a car with its plate\n\
         2. Then send the plate number as text\n\n\
         Plate formats:\n{}\n\n\
         Search example:\n\
         /search 000AB00\n\
         or just send the plate: 000AB00",
        format_list()
    )
}

pub fn search_usage_text() -> String {
    "🔍 Send the plate after /search.\n\n\
     Examples:\n\
     /search 000AB00\n\
     /search 00AB000\n\
     /search 0000000\n\n\
     Or just send the plate without /search"
        .to_string()
}

pub fn stats_text(stats: &StoreStats) -> String {
    format!(
        "📊 Database statistics:\n• Total records: {}\n• Unique plates: {}",
        stats.total_records, stats.unique_plates
    )
}

/// Plate list split into messages of at most [`MAX_LIST_CHUNK_CHARS`] body
/// characters. Lines are never split across messages.
pub fn plate_list_messages(plates: &[PlateKey]) -> Vec<String> {
    if plates.is_empty() {
        return vec![NO_PLATES.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for plate in plates {
        let line = format!("• {}", plate);
        let line_chars = line.chars().count();
        let needed = if current.is_empty() { line_chars } else { line_chars + 1 };

        if !current.is_empty() && current_chars + needed > MAX_LIST_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(&line);
        current_chars += line_chars;
    }
    chunks.push(current);

    chunks
        .into_iter()
        .map(|chunk| format!("📋 Saved plates:\n{}", chunk))
        .collect()
}

pub fn diagnostics_text(diagnostics: &StoreDiagnostics) -> String {
    let tables = if diagnostics.tables.is_empty() {
        "no tables".to_string()
    } else {
        diagnostics
            .tables
            .iter()
            .map(|table| table.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "✅ Database connection OK\n\n\
         Database: {}\n\
         Size: {:.2} MB\n\
         Tables: {}\n\n\
         Plate records: {}",
        diagnostics.database,
        diagnostics.size_bytes as f64 / (1024.0 * 1024.0),
        tables,
        diagnostics.record_count
    )
}

pub fn diagnostics_failed_text(error: &plates_common::Error) -> String {
    format!("❌ Database connection error: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plates_common::db::TableInfo;

    fn key(raw: &str) -> PlateKey {
        PlateKey::parse(raw).unwrap()
    }

    #[test]
    fn test_render_first_and_later_photo() {
        assert_eq!(
            render(Outcome::PhotoBuffered { count: 1 }, false),
            Reply::Text("📸 Photo received. Now send the license plate.".to_string())
        );
        match render(Outcome::PhotoBuffered { count: 3 }, false) {
            Reply::Text(text) => assert!(text.starts_with("📸 3 photos received")),
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_render_buffer_full_names_limit() {
        match render(Outcome::BufferFull { limit: 50 }, false) {
            Reply::Text(text) => {
                assert!(text.contains("at most 50 photos"));
                assert!(text.contains("/cancel"));
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_render_store_error_wording() {
        assert_eq!(
            render(Outcome::ReportStoreError, true),
            Reply::Text(SAVE_FAILED.to_string())
        );
        assert_eq!(
            render(Outcome::ReportStoreError, false),
            Reply::Text(SEARCH_FAILED.to_string())
        );
    }

    #[test]
    fn test_render_photos_caption_uses_normalized_key() {
        let reply = render(
            Outcome::ReturnPhotos {
                plate: key("12 ab 345"),
                photos: vec![b"x".to_vec()],
            },
            false,
        );
        assert_eq!(
            reply,
            Reply::Photos {
                caption: "🔢 Plate: 12 AB 345".to_string(),
                photos: vec![b"x".to_vec()],
            }
        );
    }

    #[test]
    fn test_format_error_lists_every_format() {
        let text = format_error_text();
        for format in ACCEPTED_FORMATS {
            assert!(text.contains(format), "missing {}", format);
        }
    }

    #[test]
    fn test_photo_file_names_are_one_based() {
        assert_eq!(photo_file_name(0), "photo_1.jpg");
        assert_eq!(photo_file_name(4), "photo_5.jpg");
    }

    #[test]
    fn test_plate_list_empty() {
        assert_eq!(plate_list_messages(&[]), vec![NO_PLATES.to_string()]);
    }

    #[test]
    fn test_plate_list_single_chunk() {
        let messages = plate_list_messages(&[key("1234567"), key("12 AB 345")]);
        assert_eq!(messages, vec!["📋 Saved plates:\n• 1234567\n• 12 AB 345".to_string()]);
    }

    #[test]
    fn test_plate_list_splits_on_line_boundaries() {
        let plates: Vec<PlateKey> = (0..1000)
            .map(|n| key(&format!("{:07}", n)))
            .collect();

        let messages = plate_list_messages(&plates);
        assert!(messages.len() > 1, "1000 plates should not fit one message");

        let mut seen = 0;
        for message in &messages {
            let body = message.strip_prefix("📋 Saved plates:\n").unwrap();
            assert!(body.chars().count() <= MAX_LIST_CHUNK_CHARS);
            for line in body.lines() {
                assert!(line.starts_with("• ") && line.len() == "• ".len() + 7);
                seen += 1;
            }
        }
        assert_eq!(seen, 1000);
    }

    #[test]
    fn test_diagnostics_text() {
        let text = diagnostics_text(&StoreDiagnostics {
            database: "avto_bot_db".to_string(),
            size_bytes: 2 * 1024 * 1024,
            tables: vec![
                TableInfo { name: "plate_records".to_string(), row_count: 4 },
                TableInfo { name: "schema_version".to_string(), row_count: 1 },
            ],
            record_count: 4,
        });
        assert!(text.contains("Database: avto_bot_db"));
        assert!(text.contains("Size: 2.00 MB"));
        assert!(text.contains("Tables: plate_records, schema_version"));
        assert!(text.contains("Plate records: 4"));
    }

    #[test]
    fn test_stats_text() {
        let text = stats_text(&StoreStats { total_records: 7, unique_plates: 3 });
        assert!(text.contains("Total records: 7"));
        assert!(text.contains("Unique plates: 3"));
    }
}
