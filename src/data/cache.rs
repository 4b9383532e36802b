//! Per-batch history cache
//!
//! Normalized histories keyed by horse name. A cache lives for one batch
//! (one card, or several cards ranked together) and is passed in explicitly;
//! the scoring engine itself never sees it.

use std::collections::HashMap;
use tracing::debug;

use super::raw::{RawRaceRecord, RecordNormalizer};
use crate::models::PastRaceRecord;

/// Normalized histories indexed by horse name
#[derive(Debug, Default)]
pub struct HistoryCache {
    /// horse name -> history, most recent first
    histories: HashMap<String, Vec<PastRaceRecord>>,
    hits: usize,
    misses: usize,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, horse: &str) -> Option<&[PastRaceRecord]> {
        self.histories.get(horse).map(Vec::as_slice)
    }

    pub fn insert(&mut self, horse: &str, history: Vec<PastRaceRecord>) {
        self.histories.insert(horse.to_string(), history);
    }

    /// Cached history, normalizing `raws` on first use
    pub fn get_or_normalize(
        &mut self,
        horse: &str,
        raws: &[RawRaceRecord],
        normalizer: &RecordNormalizer,
    ) -> Vec<PastRaceRecord> {
        if let Some(history) = self.histories.get(horse) {
            self.hits += 1;
            debug!("History cache hit for {}", horse);
            return history.clone();
        }

        self.misses += 1;
        let history = normalizer.normalize_history(raws);
        self.histories.insert(horse.to_string(), history.clone());
        history
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Number of horses in the cache
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::raw::Loose;

    fn raws(finish: f64) -> Vec<RawRaceRecord> {
        vec![RawRaceRecord {
            date: Some("2024/05/01".to_string()),
            distance: Some("芝1600".to_string()),
            finish: Some(Loose::Number(finish)),
            ..Default::default()
        }]
    }

    #[test]
    fn test_normalizes_once_per_horse() {
        let normalizer = RecordNormalizer::new();
        let mut cache = HistoryCache::new();

        let first = cache.get_or_normalize("ドウデュース", &raws(1.0), &normalizer);
        // Second call ignores the new rows and returns the cached history
        let second = cache.get_or_normalize("ドウデュース", &raws(7.0), &normalizer);

        assert_eq!(first, second);
        assert_eq!(second[0].finish_position, 1);
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_cache() {
        let cache = HistoryCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("unknown").is_none());
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = HistoryCache::new();
        cache.insert("イクイノックス", Vec::new());
        assert_eq!(cache.get("イクイノックス").map(|h| h.len()), Some(0));
    }
}
