//! Running style (脚質) classification and pace prediction
//!
//! Styles come from the 4th-corner position ratio of each past run. The
//! field's aggregated styles give one pace prediction per race, which then
//! feeds every entrant's style bonus.

use std::collections::HashMap;
use tracing::debug;

use super::course::{favored_styles, straight_length};
use crate::config::StyleConfig;
use crate::models::{
    Pace, PacePrediction, PastRaceRecord, Racecourse, RunningStyle, StyleClassification,
    StyleCounts,
};

/// Runs considered when aggregating a horse's style
pub const STYLE_LOOKBACK: usize = 5;

/// Classify a single run from its 4th-corner position.
///
/// A closing sectional faster than the field average raises confidence for
/// mid-pack and rear runners.
pub fn classify_one(
    corner_position: u8,
    field_size: u8,
    own_sectional: Option<f64>,
    field_avg_sectional: Option<f64>,
) -> StyleClassification {
    if corner_position == 0 || field_size == 0 {
        return StyleClassification::unknown();
    }

    let ratio = corner_position as f64 / field_size as f64;
    let beats_field_by = |margin: f64| match (own_sectional, field_avg_sectional) {
        (Some(own), Some(avg)) if own > 0.0 && avg > 0.0 => own < avg - margin,
        _ => false,
    };

    let (style, confidence) = if ratio <= 0.15 {
        (RunningStyle::Frontrunner, 0.90)
    } else if ratio <= 0.35 {
        (RunningStyle::Stalker, 0.85)
    } else if ratio <= 0.65 {
        (RunningStyle::Closer, if beats_field_by(0.3) { 0.80 } else { 0.70 })
    } else {
        (RunningStyle::DeepCloser, if beats_field_by(0.5) { 0.85 } else { 0.75 })
    };

    StyleClassification { style, confidence }
}

/// Style of one past record
pub fn classify_record(record: &PastRaceRecord) -> StyleClassification {
    classify_one(
        record.corner_position.unwrap_or(0),
        record.field_size.unwrap_or(0),
        record.sectional,
        record.field_average_sectional(),
    )
}

/// Majority style over the most recent runs.
///
/// Ties go to the style seen most recently. Confidence is the mean confidence
/// of the majority runs scaled by `0.7 + 0.3 * agreement`.
pub fn aggregate(records: &[PastRaceRecord]) -> StyleClassification {
    let classified: Vec<StyleClassification> = records
        .iter()
        .take(STYLE_LOOKBACK)
        .map(classify_record)
        .filter(|c| c.style != RunningStyle::Unknown)
        .collect();

    if classified.is_empty() {
        return StyleClassification::unknown();
    }

    let mut counts: HashMap<RunningStyle, usize> = HashMap::new();
    for c in &classified {
        *counts.entry(c.style).or_insert(0) += 1;
    }
    let best = counts.values().copied().max().unwrap_or(0);

    // First in most-recent-first order among the tied styles
    let majority = classified
        .iter()
        .map(|c| c.style)
        .find(|s| counts.get(s).copied() == Some(best))
        .unwrap_or(RunningStyle::Unknown);

    let matching: Vec<f64> = classified
        .iter()
        .filter(|c| c.style == majority)
        .map(|c| c.confidence)
        .collect();
    let mean_confidence = matching.iter().sum::<f64>() / matching.len() as f64;
    let agreement = matching.len() as f64 / classified.len() as f64;
    let confidence = mean_confidence * (0.7 + 0.3 * agreement);

    debug!(
        "Aggregated style {} from {} runs (agreement {:.2}, confidence {:.2})",
        majority.label(),
        classified.len(),
        agreement,
        confidence
    );

    StyleClassification {
        style: majority,
        confidence,
    }
}

/// Aggregate styles for every entrant of a field, in input order
pub fn aggregate_field(histories: &[Vec<PastRaceRecord>]) -> Vec<StyleClassification> {
    histories.iter().map(|h| aggregate(h)).collect()
}

pub fn count_styles(styles: &[StyleClassification]) -> StyleCounts {
    let mut counts = StyleCounts::default();
    for s in styles {
        match s.style {
            RunningStyle::Frontrunner => counts.frontrunner += 1,
            RunningStyle::Stalker => counts.stalker += 1,
            RunningStyle::Closer => counts.closer += 1,
            RunningStyle::DeepCloser => counts.deep_closer += 1,
            RunningStyle::Unknown => {}
        }
    }
    counts
}

/// Predict the race tempo from the field's front-runner ratio.
///
/// Long straights let closers get up, so a lower ratio already means a fast
/// pace; short straights need more pace pressure before that happens.
pub fn predict_pace(
    styles: &[StyleClassification],
    field_size: usize,
    course: &Racecourse,
) -> PacePrediction {
    let counts = count_styles(styles);
    let straight = straight_length(course);
    let known = counts.front_runners() + counts.closer + counts.deep_closer;

    if known == 0 || field_size == 0 {
        return PacePrediction {
            pace: Pace::Medium,
            front_ratio: 0.0,
            counts,
            straight_length: straight,
        };
    }

    let front_ratio = counts.front_runners() as f64 / field_size as f64;
    let (fast, medium) = if straight >= 500 {
        (0.30, 0.15)
    } else if straight <= 320 {
        (0.40, 0.25)
    } else {
        (0.35, 0.20)
    };

    let pace = if front_ratio >= fast {
        Pace::Fast
    } else if front_ratio >= medium {
        Pace::Medium
    } else {
        Pace::Slow
    };

    debug!(
        "Pace {} at {} ({} front runners / {}, straight {}m)",
        pace.label(),
        course,
        counts.front_runners(),
        field_size,
        straight
    );

    PacePrediction {
        pace,
        front_ratio,
        counts,
        straight_length: straight,
    }
}

fn pace_affinity(style: RunningStyle, pace: Pace) -> f64 {
    use RunningStyle::*;
    match (pace, style) {
        (Pace::Slow, Frontrunner) => 15.0,
        (Pace::Slow, Stalker) => 12.0,
        (Pace::Slow, Closer) => 10.0,
        (Pace::Slow, DeepCloser) => 8.0,
        (Pace::Medium, Frontrunner) => 10.0,
        (Pace::Medium, Stalker) => 12.0,
        (Pace::Medium, Closer) => 12.0,
        (Pace::Medium, DeepCloser) => 10.0,
        (Pace::Fast, Frontrunner) => 5.0,
        (Pace::Fast, Stalker) => 8.0,
        (Pace::Fast, Closer) => 15.0,
        (Pace::Fast, DeepCloser) => 18.0,
        (_, Unknown) => 0.0,
    }
}

/// Style x pace x course affinity
pub fn style_match_bonus(
    style: RunningStyle,
    pace: Pace,
    course: &Racecourse,
    distance: u32,
    config: &StyleConfig,
) -> f64 {
    if style == RunningStyle::Unknown {
        return 0.0;
    }

    let mut bonus = pace_affinity(style, pace);
    if favored_styles(course).contains(&style) {
        bonus += config.favored_bonus;
    }
    let sprint_speed = style.is_speed() && distance <= config.sprint_max_distance;
    let staying_closer = style.is_closing() && distance >= config.staying_min_distance;
    if sprint_speed || staying_closer {
        bonus += config.distance_bonus;
    }
    bonus
}

/// Style weights per course as (distance, [逃げ, 先行, 差し, 追込])
fn style_weight_table(course: &Racecourse) -> &'static [(u32, [f64; 4])] {
    match course {
        Racecourse::Tokyo => &[
            (1400, [0.08, 0.12, 0.20, 0.15]),
            (1600, [0.05, 0.10, 0.20, 0.15]),
            (1800, [0.03, 0.08, 0.15, 0.12]),
            (2000, [0.03, 0.08, 0.15, 0.12]),
            (2400, [0.02, 0.05, 0.10, 0.08]),
        ],
        Racecourse::Nakayama => &[
            (1200, [0.20, 0.20, 0.10, 0.05]),
            (1600, [0.15, 0.20, 0.10, 0.05]),
            (1800, [0.12, 0.18, 0.12, 0.08]),
            (2000, [0.12, 0.18, 0.12, 0.08]),
            (2500, [0.08, 0.12, 0.10, 0.08]),
        ],
        Racecourse::Niigata => &[
            (1600, [0.03, 0.08, 0.20, 0.18]),
            (1800, [0.03, 0.08, 0.18, 0.15]),
            (2000, [0.02, 0.05, 0.15, 0.12]),
        ],
        Racecourse::Kyoto => &[
            (1400, [0.10, 0.15, 0.15, 0.10]),
            (1600, [0.08, 0.15, 0.15, 0.10]),
            (1800, [0.05, 0.12, 0.12, 0.08]),
            (2000, [0.05, 0.12, 0.12, 0.08]),
        ],
        Racecourse::Hanshin => &[
            (1400, [0.12, 0.18, 0.12, 0.08]),
            (1600, [0.10, 0.15, 0.12, 0.08]),
            (1800, [0.08, 0.12, 0.10, 0.08]),
            (2000, [0.08, 0.12, 0.10, 0.08]),
        ],
        Racecourse::Kokura => &[
            (1200, [0.20, 0.20, 0.10, 0.05]),
            (1700, [0.15, 0.18, 0.10, 0.05]),
            (1800, [0.12, 0.15, 0.10, 0.05]),
            (2000, [0.10, 0.12, 0.10, 0.08]),
        ],
        Racecourse::Chukyo => &[
            (1200, [0.12, 0.15, 0.15, 0.10]),
            (1400, [0.10, 0.12, 0.18, 0.12]),
            (1600, [0.08, 0.10, 0.18, 0.12]),
            (1800, [0.05, 0.08, 0.15, 0.10]),
            (2000, [0.05, 0.08, 0.15, 0.10]),
        ],
        Racecourse::Fukushima => &[
            (1200, [0.18, 0.18, 0.10, 0.05]),
            (1700, [0.15, 0.18, 0.12, 0.08]),
            (1800, [0.12, 0.15, 0.12, 0.08]),
            (2000, [0.10, 0.12, 0.12, 0.08]),
        ],
        Racecourse::Sapporo => &[
            (1200, [0.15, 0.18, 0.12, 0.08]),
            (1500, [0.12, 0.15, 0.12, 0.08]),
            (1800, [0.10, 0.12, 0.12, 0.10]),
            (2000, [0.08, 0.10, 0.12, 0.10]),
        ],
        Racecourse::Hakodate => &[
            (1200, [0.15, 0.18, 0.10, 0.05]),
            (1800, [0.10, 0.12, 0.12, 0.08]),
            (2000, [0.08, 0.10, 0.12, 0.10]),
        ],
        _ => &[],
    }
}

const UNTABULATED_STYLE_WEIGHT: f64 = 0.10;

/// Multiplier applied to the style bonus at a course and distance
pub fn style_weight(course: &Racecourse, distance: u32, style: RunningStyle) -> f64 {
    let table = style_weight_table(course);

    let mut nearest: Option<&(u32, [f64; 4])> = None;
    for row in table {
        match nearest {
            Some(best) if best.0.abs_diff(distance) <= row.0.abs_diff(distance) => {}
            _ => nearest = Some(row),
        }
    }

    match nearest {
        Some((_, weights)) => match style {
            RunningStyle::Frontrunner => weights[0],
            RunningStyle::Stalker => weights[1],
            RunningStyle::Closer => weights[2],
            RunningStyle::DeepCloser => weights[3],
            RunningStyle::Unknown => UNTABULATED_STYLE_WEIGHT,
        },
        None => {
            if distance <= 1600 {
                0.20
            } else if distance <= 2200 {
                0.10
            } else {
                0.05
            }
        }
    }
}
