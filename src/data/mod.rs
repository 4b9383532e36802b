//! Race card loading and past-performance normalization

pub mod cache;
pub mod card;
pub mod raw;

// Re-export commonly used types
pub use cache::HistoryCache;
pub use card::{load_race_card, CardEntry, RaceCard};
pub use raw::{Loose, RawFinisher, RawRaceRecord, RecordNormalizer, HISTORY_LIMIT};
