//! plates-bot library - Telegram front end for the plate photo archive
//!
//! Operators send one or more vehicle photos followed by the license plate
//! text; the photos are stored under the normalized plate. Plain text with no
//! buffered photos is a search, answered with every stored photo of the plate.

pub mod handler;
pub mod messages;
pub mod session;
pub mod telegram;

pub use handler::PlateHandler;
