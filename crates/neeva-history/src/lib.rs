//! Neeva History
//!
//! Every page shown gets a `Site` row, one per URL, and a `Visit` row per
//! time it was shown. Visit counts are derived from the `Visit` rows.

mod error;
mod history;

pub use error::HistoryError;
pub use history::{HistoryEntry, HistoryManager};

pub type Result<T> = std::result::Result<T, HistoryError>;
