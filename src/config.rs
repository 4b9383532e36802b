//! Scoring configuration
//!
//! Every coefficient, threshold and weight table the engine reads lives here,
//! in one versioned object. `ScoringConfig::default()` is the v7 constant set;
//! alternative sets are loaded from JSON and only need to name the fields they
//! change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Ordered step table.
///
/// `steps` is scanned in order and the first matching bound wins; `otherwise`
/// covers values that match no bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTable {
    pub steps: Vec<(f64, f64)>,
    pub otherwise: f64,
}

impl StepTable {
    pub fn new(steps: &[(f64, f64)], otherwise: f64) -> Self {
        Self {
            steps: steps.to_vec(),
            otherwise,
        }
    }

    /// Value of the first step with `x >= bound` (descending bounds)
    pub fn at_least(&self, x: f64) -> f64 {
        self.steps
            .iter()
            .find(|(bound, _)| x >= *bound)
            .map(|(_, value)| *value)
            .unwrap_or(self.otherwise)
    }

    /// Value of the first step with `x <= bound` (ascending bounds)
    pub fn at_most(&self, x: f64) -> f64 {
        self.steps
            .iter()
            .find(|(bound, _)| x <= *bound)
            .map(|(_, value)| *value)
            .unwrap_or(self.otherwise)
    }
}

/// Reliability coefficient per race grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeCoefficients {
    pub g1: f64,
    pub g2: f64,
    pub g3: f64,
    pub listed: f64,
    pub three_win: f64,
    pub two_win: f64,
    pub one_win: f64,
    pub regional: f64,
    pub maiden: f64,
    pub baseline: f64,
}

impl Default for GradeCoefficients {
    fn default() -> Self {
        Self {
            g1: 1.00,
            g2: 0.95,
            g3: 0.90,
            listed: 0.85,
            three_win: 0.80,
            two_win: 0.75,
            one_win: 0.70,
            regional: 0.60,
            maiden: 0.65,
            baseline: 0.60,
        }
    }
}

/// Final-sectional relative score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionalConfig {
    /// Time-gap window (s) for selecting comparable finishers
    pub window: f64,
    pub sprint_max_distance: u32,
    /// Base points by (reference - own), distances up to `sprint_max_distance`
    pub sprint_points: StepTable,
    pub route_points: StepTable,
    /// Finish bonus by position (index 0 = winner) in graded races
    pub graded_finish_bonus: Vec<f64>,
    pub finish_bonus: Vec<f64>,
    pub finish_bonus_scale: f64,
    pub regional_factor: f64,
    pub surface_mismatch_factor: f64,
}

impl Default for SectionalConfig {
    fn default() -> Self {
        Self {
            window: 2.0,
            sprint_max_distance: 1400,
            sprint_points: StepTable::new(&[(1.3, 15.0), (0.8, 12.0), (0.4, 8.0), (0.0, 5.0)], -3.0),
            route_points: StepTable::new(&[(1.5, 15.0), (1.0, 12.0), (0.5, 8.0), (0.0, 5.0)], -3.0),
            graded_finish_bonus: vec![3.0, 2.0, 2.0, 1.5, 1.5],
            finish_bonus: vec![3.0, 2.0, 1.0],
            finish_bonus_scale: 5.0,
            regional_factor: 0.4,
            surface_mismatch_factor: 0.3,
        }
    }
}

/// Distance and course suitability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitabilityConfig {
    pub weights: Vec<f64>,
    pub distance_full: f64,
    /// Points at `near_window` metres; interpolated from `distance_full`
    pub distance_near: f64,
    pub distance_mid: f64,
    pub near_window: u32,
    pub mid_window: u32,
    pub far_window: u32,
    /// Coefficient by absolute gap to the winner
    pub margin_coefficients: StepTable,
    /// Coefficient by finish position, used when the gap is zero or missing
    pub finish_coefficients: StepTable,
    pub same_course: f64,
    pub same_course_other_surface: f64,
    pub cap: f64,
}

impl Default for SuitabilityConfig {
    fn default() -> Self {
        Self {
            weights: vec![1.0, 0.8, 0.6, 0.5, 0.4],
            distance_full: 15.0,
            distance_near: 10.0,
            distance_mid: 5.0,
            near_window: 200,
            mid_window: 400,
            far_window: 600,
            margin_coefficients: StepTable::new(
                &[(0.3, 1.0), (0.6, 0.85), (1.0, 0.70), (1.5, 0.50), (2.5, 0.30)],
                0.10,
            ),
            finish_coefficients: StepTable::new(
                &[(1.0, 1.0), (2.0, 0.85), (3.0, 0.70), (5.0, 0.50), (9.0, 0.30)],
                0.10,
            ),
            same_course: 15.0,
            same_course_other_surface: 8.0,
            cap: 15.0,
        }
    }
}

/// Late 4F score, turf routes only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LateSectionConfig {
    pub min_distance: u32,
    /// Baseline by target distance
    pub baselines: StepTable,
    pub estimate_ratio: f64,
    pub estimate_offset: f64,
    pub points_per_second: f64,
    pub multipliers: StepTable,
    pub finish_factors: StepTable,
    pub g1_reliability: f64,
    pub g2_reliability: f64,
    pub g3_reliability: f64,
    pub listed_reliability: f64,
    pub other_reliability: f64,
}

impl Default for LateSectionConfig {
    fn default() -> Self {
        Self {
            min_distance: 1800,
            baselines: StepTable::new(&[(2000.0, 47.2), (2400.0, 47.8)], 48.3),
            estimate_ratio: 4.0 / 3.0,
            estimate_offset: 0.4,
            points_per_second: 10.0,
            multipliers: StepTable::new(
                &[
                    (3.5, 1.80),
                    (2.5, 1.50),
                    (1.5, 1.30),
                    (0.7, 1.15),
                    (-0.5, 1.00),
                    (-2.0, 0.85),
                ],
                0.65,
            ),
            finish_factors: StepTable::new(&[(1.0, 1.0), (3.0, 0.9), (5.0, 0.75), (10.0, 0.5)], 0.3),
            g1_reliability: 1.0,
            g2_reliability: 0.95,
            g3_reliability: 0.9,
            listed_reliability: 0.85,
            other_reliability: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoffConfig {
    pub grace_days: i64,
    pub days_per_month: f64,
    /// Penalty by months off
    pub ladder: StepTable,
}

impl Default for LayoffConfig {
    fn default() -> Self {
        Self {
            grace_days: 120,
            days_per_month: 30.44,
            ladder: StepTable::new(
                &[
                    (4.0, -4.0),
                    (5.0, -6.0),
                    (6.0, -8.0),
                    (7.0, -10.0),
                    (8.0, -11.0),
                    (9.0, -12.0),
                    (10.0, -14.0),
                    (11.0, -16.0),
                ],
                -20.0,
            ),
        }
    }
}

/// Graded-race bonus as [winner, 2nd-3rd, other]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradedBonusConfig {
    pub g1: [f64; 3],
    pub g2: [f64; 3],
    pub g3: [f64; 3],
    pub listed: [f64; 3],
}

impl Default for GradedBonusConfig {
    fn default() -> Self {
        Self {
            g1: [10.0, 8.0, 5.0],
            g2: [7.0, 5.0, 3.0],
            g3: [5.0, 3.0, 2.0],
            listed: [3.0, 2.0, 1.0],
        }
    }
}

/// Second-start boost after a debut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebutConfig {
    /// Base bonus by finish (index 0 = winner)
    pub base: Vec<f64>,
    pub sectional_margin: f64,
    pub sectional_bonus: f64,
    pub position_bonus: f64,
    pub back_half_ratio: f64,
    pub halve_margin: f64,
    pub void_margin: f64,
}

impl Default for DebutConfig {
    fn default() -> Self {
        Self {
            base: vec![3.0, 1.5, 0.5],
            sectional_margin: 0.5,
            sectional_bonus: 2.0,
            position_bonus: 1.5,
            back_half_ratio: 0.5,
            halve_margin: 0.7,
            void_margin: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigLossConfig {
    pub threshold: f64,
    pub excuse_distance_change: u32,
    pub excuse_layoff_days: i64,
    /// Penalty by effective count; the last entry covers every larger count
    pub penalties: Vec<f64>,
}

impl Default for BigLossConfig {
    fn default() -> Self {
        Self {
            threshold: 1.1,
            excuse_distance_change: 600,
            excuse_layoff_days: 120,
            penalties: vec![0.0, -3.0, -8.0, -15.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinStreakConfig {
    pub weights: Vec<f64>,
    /// Points by winning margin
    pub margin_points: StepTable,
    pub cap: f64,
}

impl Default for WinStreakConfig {
    fn default() -> Self {
        Self {
            weights: vec![1.0, 0.7, 0.5],
            margin_points: StepTable::new(&[(0.5, 4.0), (0.2, 2.5)], 1.5),
            cap: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseRecordConfig {
    pub distance_tolerance: u32,
    pub weights: Vec<f64>,
    pub off_distance_factor: f64,
    pub cap: f64,
}

impl Default for CourseRecordConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: 200,
            weights: vec![1.0, 0.7, 0.5, 0.4, 0.3],
            off_distance_factor: 0.8,
            cap: 10.0,
        }
    }
}

/// Style/pace/course affinity extras
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub favored_bonus: f64,
    pub distance_bonus: f64,
    pub sprint_max_distance: u32,
    pub staying_min_distance: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            favored_bonus: 3.0,
            distance_bonus: 2.0,
            sprint_max_distance: 1400,
            staying_min_distance: 2200,
        }
    }
}

/// Weight of each normalized sub-score in the total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPreset {
    pub sectional: f64,
    pub late_section: f64,
    pub distance: f64,
    pub course: f64,
    pub style: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    pub long_distance_min: u32,
    pub max_sectional: f64,
    pub max_distance: f64,
    pub max_course: f64,
    pub max_style: f64,
    pub max_late_section: f64,
    pub long_distance: WeightPreset,
    pub standard: WeightPreset,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            long_distance_min: 1800,
            max_sectional: 150.0,
            max_distance: 15.0,
            max_course: 15.0,
            max_style: 20.0,
            max_late_section: 50.0,
            long_distance: WeightPreset {
                sectional: 0.30,
                late_section: 0.20,
                distance: 0.15,
                course: 0.10,
                style: 0.15,
            },
            standard: WeightPreset {
                sectional: 0.45,
                late_section: 0.0,
                distance: 0.20,
                course: 0.15,
                style: 0.20,
            },
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub version: String,
    /// Number of most recent starts considered
    pub lookback: usize,
    /// Per-slot recency decay (1.0, 0.85, 0.70, ...)
    pub decay_step: f64,
    pub grades: GradeCoefficients,
    pub sectional: SectionalConfig,
    pub suitability: SuitabilityConfig,
    pub late_section: LateSectionConfig,
    pub layoff: LayoffConfig,
    pub graded_bonus: GradedBonusConfig,
    pub debut: DebutConfig,
    pub big_loss: BigLossConfig,
    pub win_streak: WinStreakConfig,
    pub course_record: CourseRecordConfig,
    pub style: StyleConfig,
    pub regional_penalty: f64,
    pub composition: CompositionConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: "v7".to_string(),
            lookback: 5,
            decay_step: 0.15,
            grades: GradeCoefficients::default(),
            sectional: SectionalConfig::default(),
            suitability: SuitabilityConfig::default(),
            late_section: LateSectionConfig::default(),
            layoff: LayoffConfig::default(),
            graded_bonus: GradedBonusConfig::default(),
            debut: DebutConfig::default(),
            big_loss: BigLossConfig::default(),
            win_streak: WinStreakConfig::default(),
            course_record: CourseRecordConfig::default(),
            style: StyleConfig::default(),
            regional_penalty: -15.0,
            composition: CompositionConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Parse a configuration from JSON. Missing sections keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Recency decay for slot `idx` (0 = most recent)
    pub fn decay(&self, idx: usize) -> f64 {
        1.0 - idx as f64 * self.decay_step
    }

    /// Check that every recency table covers the lookback window
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=5).contains(&self.lookback) {
            return Err(ConfigError::Invalid(format!(
                "lookback must be between 1 and 5, got {}",
                self.lookback
            )));
        }
        if self.suitability.weights.len() < self.lookback {
            return Err(ConfigError::Invalid(format!(
                "suitability.weights needs {} entries, got {}",
                self.lookback,
                self.suitability.weights.len()
            )));
        }
        if self.course_record.weights.len() < self.lookback {
            return Err(ConfigError::Invalid(format!(
                "course_record.weights needs {} entries, got {}",
                self.lookback,
                self.course_record.weights.len()
            )));
        }
        if self.big_loss.penalties.is_empty() {
            return Err(ConfigError::Invalid(
                "big_loss.penalties must not be empty".to_string(),
            ));
        }
        if self.decay_step * (self.lookback as f64 - 1.0) >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "decay_step {} leaves a non-positive weight within the lookback",
                self.decay_step
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_table_at_least() {
        let table = StepTable::new(&[(1.5, 15.0), (1.0, 12.0), (0.0, 5.0)], -3.0);
        assert_eq!(table.at_least(2.0), 15.0);
        assert_eq!(table.at_least(1.5), 15.0);
        assert_eq!(table.at_least(1.2), 12.0);
        assert_eq!(table.at_least(0.0), 5.0);
        assert_eq!(table.at_least(-0.1), -3.0);
    }

    #[test]
    fn test_step_table_at_most() {
        let table = SuitabilityConfig::default().margin_coefficients;
        assert_eq!(table.at_most(0.3), 1.0);
        assert_eq!(table.at_most(0.31), 0.85);
        assert_eq!(table.at_most(2.5), 0.30);
        assert_eq!(table.at_most(3.0), 0.10);
    }

    #[test]
    fn test_default_is_valid() {
        let config = ScoringConfig::default();
        assert_eq!(config.version, "v7");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_decay_sequence() {
        let config = ScoringConfig::default();
        let decays: Vec<f64> = (0..5).map(|i| config.decay(i)).collect();
        let expected = [1.0, 0.85, 0.70, 0.55, 0.40];
        for (d, e) in decays.iter().zip(expected.iter()) {
            assert!((d - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScoringConfig::from_json(r#"{"version": "v7-test", "regional_penalty": -10.0}"#)
            .unwrap();
        assert_eq!(config.version, "v7-test");
        assert_eq!(config.regional_penalty, -10.0);
        assert_eq!(config.big_loss.threshold, 1.1);
    }

    #[test]
    fn test_invalid_lookback_rejected() {
        let result = ScoringConfig::from_json(r#"{"lookback": 7}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ScoringConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = ScoringConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
