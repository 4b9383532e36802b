//! Keiba - explainable horse race entrant scoring
//!
//! This library provides:
//! - Course profiles (inner/outer loop, baseline 3F, course records)
//! - Race grade classification and regional race detection
//! - Running style classification and field pace prediction
//! - A composite score per entrant with a line-by-line breakdown
//! - Race card loading and past-performance normalization
//!
//! # Example
//!
//! ```no_run
//! use keiba::data::load_race_card;
//! use keiba::predictor::FieldPredictor;
//!
//! let card = load_race_card("cards/derby.json").unwrap();
//! for r in FieldPredictor::default().rank(&card) {
//!     println!("{} {} {:.1}", r.rank, r.entrant.name, r.breakdown.total);
//!     print!("{}", r.breakdown.explain(false));
//! }
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod predictor;

// Re-export commonly used types
pub use config::ScoringConfig;
pub use crate::core::{ScoreBreakdown, ScoreCalculator};
pub use data::{load_race_card, RaceCard};
pub use error::{CardError, ConfigError};
pub use models::{
    PacePrediction, PastRaceRecord, RaceEntrant, Racecourse, RunningStyle, StyleClassification,
    Surface, TargetRaceContext, TrackCondition,
};
pub use predictor::{FieldPredictor, RankedEntrant};
