//! Field-level ranking
//!
//! Styles for the whole field are aggregated first and one pace prediction is
//! made for the race. Every entrant is then scored against that shared,
//! read-only pace and the field is ranked by total.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ScoringConfig;
use crate::core::breakdown::ScoreBreakdown;
use crate::core::scorer::ScoreCalculator;
use crate::core::style::{aggregate_field, predict_pace};
use crate::data::cache::HistoryCache;
use crate::data::card::RaceCard;
use crate::data::raw::RecordNormalizer;
use crate::models::{PacePrediction, PastRaceRecord, RaceEntrant, StyleClassification};

/// One scored entrant, in ranking order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntrant {
    pub rank: usize,
    pub entrant: RaceEntrant,
    pub style: StyleClassification,
    pub breakdown: ScoreBreakdown,
}

/// Styles and pace of one field
#[derive(Debug, Clone)]
pub struct FieldAnalysis {
    pub histories: Vec<Vec<PastRaceRecord>>,
    pub styles: Vec<StyleClassification>,
    pub pace: PacePrediction,
}

/// Scores and ranks every entrant of a race card
#[derive(Default)]
pub struct FieldPredictor {
    calculator: ScoreCalculator,
    normalizer: RecordNormalizer,
}

impl FieldPredictor {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            calculator: ScoreCalculator::new(config),
            normalizer: RecordNormalizer::new(),
        }
    }

    pub fn calculator(&self) -> &ScoreCalculator {
        &self.calculator
    }

    /// Normalize histories, aggregate styles and predict the pace once
    pub fn analyze(&self, card: &RaceCard, cache: &mut HistoryCache) -> FieldAnalysis {
        let histories = card.histories(cache, &self.normalizer);
        let styles = aggregate_field(&histories);
        let pace = predict_pace(&styles, card.field_size(), &card.race.course);
        info!(
            "Predicted {} pace ({:.0}% front runners)",
            pace.pace.label(),
            pace.front_ratio * 100.0
        );
        FieldAnalysis {
            histories,
            styles,
            pace,
        }
    }

    /// Rank a card with a cache scoped to this call
    pub fn rank(&self, card: &RaceCard) -> Vec<RankedEntrant> {
        let mut cache = HistoryCache::new();
        self.rank_with_cache(card, &mut cache)
    }

    /// Rank a card, sharing normalized histories through `cache`.
    ///
    /// Highest total first; ties keep the lower horse number first.
    pub fn rank_with_cache(&self, card: &RaceCard, cache: &mut HistoryCache) -> Vec<RankedEntrant> {
        let analysis = self.analyze(card, cache);

        let mut ranked: Vec<RankedEntrant> = card
            .entries
            .iter()
            .zip(analysis.histories.iter())
            .zip(analysis.styles.iter())
            .map(|((entry, history), style)| {
                let breakdown = self.calculator.compute_score(
                    &entry.entrant,
                    history,
                    &card.race,
                    Some(style),
                    Some(&analysis.pace),
                );
                debug!("{} -> {:.1}", entry.entrant.name, breakdown.total);
                RankedEntrant {
                    rank: 0,
                    entrant: entry.entrant.clone(),
                    style: *style,
                    breakdown,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.breakdown
                .total
                .total_cmp(&a.breakdown.total)
                .then(a.entrant.horse_no.cmp(&b.entrant.horse_no))
        });
        for (idx, r) in ranked.iter_mut().enumerate() {
            r.rank = idx + 1;
        }
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunningStyle;

    fn card() -> RaceCard {
        RaceCard::from_json(
            r#"{
            "race_name": "テストS",
            "race": {
                "course": "東京",
                "distance": 1600,
                "distance_text": "芝1600",
                "surface": "turf",
                "race_date": "2024-06-01"
            },
            "entries": [
                { "name": "A", "horse_no": 1, "sex_age": "牡4", "impost": 58.0, "history": [] },
                {
                    "name": "B", "horse_no": 2, "sex_age": "牡4", "impost": 57.0,
                    "history": [
                        { "date": "2024/05/05", "course": "東京", "distance": "芝1600",
                          "finish": 1, "time_gap": 0.0, "sectional": 33.2,
                          "passing": "4-4", "field_size": 16, "race_name": "3勝クラス" },
                        { "date": "2024/03/20", "course": "東京", "distance": "芝1600",
                          "finish": 2, "time_gap": 0.1, "sectional": 33.6,
                          "passing": "5-5", "field_size": 16, "race_name": "3勝クラス" }
                    ]
                },
                {
                    "name": "C", "horse_no": 3, "sex_age": "牝4", "impost": 56.0,
                    "history": [
                        { "date": "2024/05/05", "course": "大井", "distance": "ダ1600",
                          "finish": 9, "time_gap": 2.5, "race_name": "C1" }
                    ]
                }
            ]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_rank_orders_by_total() {
        let ranked = FieldPredictor::default().rank(&card());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].entrant.name, "B");
        assert_eq!(ranked[0].rank, 1);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].breakdown.total >= w[1].breakdown.total));
        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_history_entrant_scores_zero() {
        let ranked = FieldPredictor::default().rank(&card());
        let a = ranked.iter().find(|r| r.entrant.name == "A").unwrap();
        assert_eq!(a.breakdown.total, 0.0);
        assert_eq!(a.style.style, RunningStyle::Unknown);
    }

    #[test]
    fn test_analyze_shares_one_pace() {
        let predictor = FieldPredictor::default();
        let mut cache = HistoryCache::new();
        let analysis = predictor.analyze(&card(), &mut cache);
        assert_eq!(analysis.styles.len(), 3);
        assert_eq!(analysis.styles[1].style, RunningStyle::Stalker);
        assert_eq!(analysis.pace.counts.stalker, 1);
        assert_eq!(analysis.pace.straight_length, 525);
    }

    #[test]
    fn test_rank_with_shared_cache() {
        let predictor = FieldPredictor::default();
        let mut cache = HistoryCache::new();
        predictor.rank_with_cache(&card(), &mut cache);
        predictor.rank_with_cache(&card(), &mut cache);
        assert_eq!(cache.stats(), (3, 3));
    }
}
