//! JSON race card loading
//!
//! A race card is the target race plus every entrant with their raw past
//! performances:
//!
//! ```json
//! {
//!   "race_name": "日本ダービー(GI)",
//!   "race": {
//!     "course": "東京", "distance": 2400, "distance_text": "芝2400",
//!     "surface": "turf", "condition": "firm", "race_date": "2024-05-26"
//!   },
//!   "entries": [
//!     { "name": "ダノンデサイル", "horse_no": 5, "sex_age": "牡3", "impost": 57.0,
//!       "history": [ { "date": "2024/04/14", "course": "中山", "distance": "芝2000",
//!                      "finish": "中止" } ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::cache::HistoryCache;
use super::raw::{RawRaceRecord, RecordNormalizer};
use crate::error::{
    validate_distance, validate_field_size, validate_horse_no, validate_impost, CardError,
};
use crate::models::{PastRaceRecord, RaceEntrant, Surface, TargetRaceContext};

/// One entrant line of a race card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardEntry {
    #[serde(flatten)]
    pub entrant: RaceEntrant,
    /// Combined sex/age cell such as "牡4", used when sex or age is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex_age: Option<String>,
    #[serde(default)]
    pub history: Vec<RawRaceRecord>,
}

/// Target race and its field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceCard {
    #[serde(default)]
    pub race_name: String,
    pub race: TargetRaceContext,
    pub entries: Vec<CardEntry>,
}

impl RaceCard {
    /// Parse and validate a race card
    pub fn from_json(json: &str) -> Result<Self, CardError> {
        let mut card: RaceCard = serde_json::from_str(json)?;
        card.fill_defaults();
        card.validate()?;
        Ok(card)
    }

    fn fill_defaults(&mut self) {
        if self.race.surface == Surface::Unknown {
            self.race.surface = Surface::parse(&self.race.distance_text);
        }

        let normalizer = RecordNormalizer::new();
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if let Some(text) = &entry.sex_age {
                let (sex, age) = normalizer.parse_sex_age(text);
                entry.entrant.sex = entry.entrant.sex.or(sex);
                entry.entrant.age = entry.entrant.age.or(age);
            }
            if entry.entrant.horse_no == 0 {
                let assigned = u8::try_from(idx + 1).unwrap_or(u8::MAX);
                warn!(
                    "{} has no horse number, using card position {}",
                    entry.entrant.name, assigned
                );
                entry.entrant.horse_no = assigned;
            }
        }
    }

    /// Field size, distance, horse numbers, names and imposts.
    ///
    /// Histories are cached by name, so names must be present and unique.
    pub fn validate(&self) -> Result<(), CardError> {
        validate_field_size(self.entries.len())?;
        validate_distance(self.race.distance)?;

        let mut numbers = HashSet::new();
        let mut names = HashSet::new();
        for entry in &self.entries {
            validate_horse_no(entry.entrant.horse_no)?;
            validate_impost(entry.entrant.impost)?;
            if !numbers.insert(entry.entrant.horse_no) {
                return Err(CardError::Validation(format!(
                    "Duplicate horse number {}",
                    entry.entrant.horse_no
                )));
            }
            let name = entry.entrant.name.trim();
            if name.is_empty() {
                return Err(CardError::Validation(format!(
                    "Horse number {} has no name",
                    entry.entrant.horse_no
                )));
            }
            if !names.insert(name) {
                return Err(CardError::Validation(format!("Duplicate horse name {}", name)));
            }
        }
        Ok(())
    }

    pub fn field_size(&self) -> usize {
        self.entries.len()
    }

    /// Normalized history of every entrant, in card order
    pub fn histories(
        &self,
        cache: &mut HistoryCache,
        normalizer: &RecordNormalizer,
    ) -> Vec<Vec<PastRaceRecord>> {
        self.entries
            .iter()
            .map(|e| cache.get_or_normalize(&e.entrant.name, &e.history, normalizer))
            .collect()
    }
}

/// Load and validate a race card from a JSON file
pub fn load_race_card<P: AsRef<Path>>(path: P) -> Result<RaceCard, CardError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| CardError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let card = RaceCard::from_json(&json)?;
    info!(
        "Loaded race card {} ({} {}m, {} entrants)",
        if card.race_name.is_empty() { "(unnamed)" } else { card.race_name.as_str() },
        card.race.course,
        card.race.distance,
        card.field_size()
    );

    let without_history = card.entries.iter().filter(|e| e.history.is_empty()).count();
    if without_history > 0 {
        warn!("{} entrants have no past performances", without_history);
    }
    Ok(card)
}
