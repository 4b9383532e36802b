//! Course profiles
//!
//! Static lookups per racecourse: inner/outer loop detection, baseline final
//! 3F times, going offsets, straight lengths and turf course records.
//!
//! Distances are in metres, times in seconds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Racecourse, RunningStyle, TrackCondition};

/// Loop of a course with two turf configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loop {
    /// 内回り
    Inner,
    /// 外回り
    Outer,
}

/// Course plus the loop actually run, e.g. 阪神外
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseVariant {
    pub course: Racecourse,
    pub track_loop: Option<Loop>,
}

impl fmt::Display for CourseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.track_loop {
            Some(Loop::Inner) => write!(f, "{}内", self.course),
            Some(Loop::Outer) => write!(f, "{}外", self.course),
            None => write!(f, "{}", self.course),
        }
    }
}

/// Coarse layout class used for going offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    LongStraight,
    Standard,
    Hilly,
    Tight,
}

impl CourseType {
    /// Seconds added to the baseline 3F on a given going
    pub fn condition_offset(&self, condition: TrackCondition) -> f64 {
        let offsets = match self {
            CourseType::LongStraight => [0.0, 0.4, 1.0, 1.8],
            CourseType::Standard => [0.0, 0.5, 1.2, 2.0],
            CourseType::Hilly => [0.0, 0.6, 1.5, 2.5],
            CourseType::Tight => [0.0, 0.7, 1.8, 3.0],
        };
        match condition {
            TrackCondition::Firm => offsets[0],
            TrackCondition::Good => offsets[1],
            TrackCondition::Soft => offsets[2],
            TrackCondition::Heavy => offsets[3],
        }
    }
}

/// Everything known about one course variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseProfile {
    pub variant: CourseVariant,
    pub course_type: CourseType,
    pub straight_length: u32,
    pub favored_styles: Vec<RunningStyle>,
    /// (distance, baseline 3F on firm going)
    pub baselines: Vec<(u32, f64)>,
    /// (distance, course record)
    pub records: Vec<(u32, f64)>,
}

const DEFAULT_STRAIGHT: u32 = 400;

/// Seconds per metre applied when extrapolating from the nearest baseline
const EXTRAPOLATION_PER_METRE: f64 = 0.001;

/// Loop configuration of a race.
///
/// An explicit 外/内 hint in the distance text wins; otherwise each two-loop
/// course has fixed distance rules. Single-loop courses never get a loop.
pub fn detect_variant(course: &Racecourse, distance: u32, label_text: &str) -> CourseVariant {
    let track_loop = match course {
        Racecourse::Kyoto | Racecourse::Hanshin | Racecourse::Niigata => {
            Some(loop_hint(label_text).unwrap_or_else(|| default_loop(course, distance)))
        }
        _ => None,
    };
    CourseVariant {
        course: course.clone(),
        track_loop,
    }
}

fn loop_hint(text: &str) -> Option<Loop> {
    if text.contains('外') {
        Some(Loop::Outer)
    } else if text.contains('内') {
        Some(Loop::Inner)
    } else {
        None
    }
}

fn default_loop(course: &Racecourse, distance: u32) -> Loop {
    match course {
        Racecourse::Kyoto => match distance {
            2200 | 2400 | 3000 | 3200 => Loop::Outer,
            _ => Loop::Inner,
        },
        // 2200 is the inner-loop 阪神大賞典 trip
        Racecourse::Hanshin => {
            if distance <= 1400 || distance == 2200 {
                Loop::Inner
            } else {
                Loop::Outer
            }
        }
        Racecourse::Niigata => {
            if distance >= 1800 {
                Loop::Outer
            } else {
                Loop::Inner
            }
        }
        _ => Loop::Inner,
    }
}

pub fn course_type(variant: &CourseVariant) -> CourseType {
    use Racecourse::*;
    match (&variant.course, variant.track_loop) {
        (Tokyo, _) | (Niigata, Some(Loop::Outer)) => CourseType::LongStraight,
        (Nakayama, _) => CourseType::Hilly,
        (Kyoto, Some(Loop::Inner))
        | (Hanshin, Some(Loop::Inner))
        | (Niigata, Some(Loop::Inner))
        | (Sapporo, _)
        | (Kokura, _)
        | (Hakodate, _) => CourseType::Tight,
        _ => CourseType::Standard,
    }
}

pub fn straight_length(course: &Racecourse) -> u32 {
    match course {
        Racecourse::Tokyo => 525,
        Racecourse::Kyoto => 403,
        Racecourse::Hanshin => 356,
        Racecourse::Nakayama => 310,
        Racecourse::Niigata => 659,
        Racecourse::Kokura => 293,
        Racecourse::Fukushima => 292,
        Racecourse::Hakodate => 262,
        Racecourse::Sapporo => 266,
        Racecourse::Chukyo => 412,
        _ => DEFAULT_STRAIGHT,
    }
}

/// Running styles that the course layout tends to reward
pub fn favored_styles(course: &Racecourse) -> &'static [RunningStyle] {
    use RunningStyle::*;
    match course {
        Racecourse::Tokyo | Racecourse::Niigata => &[Closer, DeepCloser],
        Racecourse::Kyoto => &[Stalker, Closer],
        Racecourse::Nakayama | Racecourse::Kokura | Racecourse::Fukushima => {
            &[Frontrunner, Stalker]
        }
        Racecourse::Hanshin | Racecourse::Hakodate | Racecourse::Sapporo => &[Stalker],
        Racecourse::Chukyo => &[Closer],
        _ => &[],
    }
}

/// Baseline final 3F on firm going, per variant
fn baseline_table(variant: &CourseVariant) -> &'static [(u32, f64)] {
    use Racecourse::*;
    match (&variant.course, variant.track_loop) {
        (Tokyo, _) => &[
            (1400, 33.3),
            (1600, 33.8),
            (1800, 34.5),
            (2000, 35.0),
            (2400, 35.5),
            (3400, 37.0),
        ],
        (Kyoto, Some(Loop::Outer)) => &[
            (1400, 33.8),
            (1600, 34.3),
            (1800, 34.8),
            (2000, 35.2),
            (2200, 35.5),
            (2400, 36.0),
            (3000, 37.5),
            (3200, 37.8),
        ],
        (Kyoto, _) => &[
            (1200, 34.5),
            (1400, 35.0),
            (1600, 35.5),
            (1800, 36.0),
            (2000, 36.5),
        ],
        (Hanshin, Some(Loop::Outer)) => &[(1600, 34.0), (1800, 34.3), (2000, 34.8), (2400, 35.5)],
        (Hanshin, _) => &[
            (1200, 34.8),
            (1400, 35.2),
            (1800, 36.0),
            (2000, 36.5),
            (2200, 36.8),
        ],
        (Niigata, Some(Loop::Outer)) => &[
            (1600, 33.0),
            (1800, 33.5),
            (2000, 33.8),
            (2200, 34.5),
            (2400, 35.0),
        ],
        (Niigata, _) => &[
            (1000, 34.0),
            (1200, 34.5),
            (1400, 35.0),
            (1600, 35.5),
            (1800, 36.0),
        ],
        (Nakayama, _) => &[
            (1200, 35.0),
            (1600, 35.8),
            (1800, 36.2),
            (2000, 36.5),
            (2200, 37.0),
            (2500, 37.5),
        ],
        (Chukyo, _) => &[
            (1200, 34.3),
            (1400, 34.8),
            (1600, 35.2),
            (1800, 35.5),
            (2000, 36.0),
            (2200, 36.5),
        ],
        (Sapporo, _) => &[
            (1200, 35.0),
            (1500, 35.5),
            (1800, 36.0),
            (2000, 36.5),
            (2600, 38.0),
        ],
        (Kokura, _) => &[
            (1200, 35.0),
            (1700, 35.8),
            (1800, 36.0),
            (2000, 36.5),
            (2600, 38.0),
        ],
        (Hakodate, _) => &[(1200, 35.2), (1800, 36.0), (2000, 36.5), (2600, 38.0)],
        (Fukushima, _) => &[
            (1200, 34.8),
            (1700, 35.5),
            (1800, 35.8),
            (2000, 36.2),
            (2600, 37.5),
        ],
        _ => &[],
    }
}

/// Turf course records, per variant
fn record_table(variant: &CourseVariant) -> &'static [(u32, f64)] {
    use Racecourse::*;
    match (&variant.course, variant.track_loop) {
        (Tokyo, _) => &[
            (1400, 79.8),
            (1600, 90.5),
            (1800, 103.5),
            (2000, 116.1),
            (2400, 141.2),
            (3400, 208.4),
        ],
        (Nakayama, _) => &[
            (1200, 67.3),
            (1600, 91.7),
            (1800, 106.1),
            (2000, 118.0),
            (2200, 131.0),
            (2500, 150.7),
        ],
        (Hanshin, Some(Loop::Outer)) => &[(1600, 91.3), (1800, 103.2), (2000, 115.5), (2400, 140.9)],
        (Hanshin, _) => &[
            (1200, 67.4),
            (1400, 79.3),
            (1800, 106.0),
            (2000, 118.0),
            (2200, 131.5),
        ],
        (Kyoto, Some(Loop::Outer)) => &[
            (1600, 90.5),
            (1800, 103.5),
            (2000, 116.8),
            (2200, 130.5),
            (2400, 143.5),
            (3000, 179.0),
            (3200, 192.5),
        ],
        (Kyoto, _) => &[
            (1200, 68.5),
            (1400, 81.0),
            (1600, 92.5),
            (1800, 105.5),
            (2000, 118.5),
        ],
        (Niigata, Some(Loop::Outer)) => &[
            (1600, 90.5),
            (1800, 104.5),
            (2000, 117.5),
            (2200, 130.5),
            (2400, 144.0),
        ],
        (Niigata, _) => &[(1000, 55.5), (1200, 67.5), (1400, 81.5), (2000, 118.5)],
        (Chukyo, _) => &[(1200, 68.3), (1400, 81.5), (1600, 93.5), (2000, 119.3)],
        (Kokura, _) => &[(1200, 67.9), (1800, 106.5), (2000, 119.5), (2600, 159.5)],
        (Fukushima, _) => &[
            (1200, 68.0),
            (1700, 101.8),
            (1800, 107.0),
            (2000, 119.8),
            (2600, 160.0),
        ],
        (Sapporo, _) => &[
            (1200, 68.6),
            (1500, 89.0),
            (1800, 107.2),
            (2000, 120.0),
            (2600, 160.5),
        ],
        (Hakodate, _) => &[(1200, 68.3), (1800, 107.5), (2000, 120.2), (2600, 161.0)],
        _ => &[],
    }
}

/// Distance-only baseline for courses without a table
fn untabulated_baseline(distance: u32) -> f64 {
    if distance <= 1800 {
        34.5
    } else if distance <= 2200 {
        35.5
    } else {
        36.5
    }
}

/// Expected final 3F for a course/distance/going, rounded to 0.1s
pub fn baseline_sectional_time(
    course: &Racecourse,
    distance: u32,
    label_text: &str,
    condition: TrackCondition,
) -> f64 {
    let variant = detect_variant(course, distance, label_text);
    let table = baseline_table(&variant);

    let baseline = match table.iter().find(|(d, _)| *d == distance) {
        Some((_, time)) => *time,
        None => match nearest(table, distance) {
            Some((d, time)) => time + (distance as f64 - d as f64) * EXTRAPOLATION_PER_METRE,
            None => untabulated_baseline(distance),
        },
    };

    let offset = course_type(&variant).condition_offset(condition);
    round1(baseline + offset)
}

/// Nearest tabulated distance; ties go to the shorter one
fn nearest(table: &[(u32, f64)], distance: u32) -> Option<(u32, f64)> {
    let mut best: Option<(u32, f64)> = None;
    for &(d, time) in table {
        let diff = d.abs_diff(distance);
        match best {
            Some((bd, _)) if bd.abs_diff(distance) <= diff => {}
            _ => best = Some((d, time)),
        }
    }
    best
}

/// Exact-match course record. `None` means unknown: skip the comparison.
pub fn course_record(variant: &CourseVariant, distance: u32) -> Option<f64> {
    record_table(variant)
        .iter()
        .find(|(d, _)| *d == distance)
        .map(|(_, time)| *time)
}

/// Full profile of the course variant run at `distance`
pub fn profile(course: &Racecourse, distance: u32, label_text: &str) -> CourseProfile {
    let variant = detect_variant(course, distance, label_text);
    CourseProfile {
        course_type: course_type(&variant),
        straight_length: straight_length(course),
        favored_styles: favored_styles(course).to_vec(),
        baselines: baseline_table(&variant).to_vec(),
        records: record_table(&variant).to_vec(),
        variant,
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(course: Racecourse, distance: u32, text: &str) -> Option<Loop> {
        detect_variant(&course, distance, text).track_loop
    }

    #[test]
    fn test_detect_variant_explicit_hint() {
        assert_eq!(variant(Racecourse::Kyoto, 1600, "芝外1600"), Some(Loop::Outer));
        assert_eq!(variant(Racecourse::Hanshin, 2000, "芝内2000"), Some(Loop::Inner));
    }

    #[test]
    fn test_detect_variant_distance_rules() {
        assert_eq!(variant(Racecourse::Kyoto, 2400, ""), Some(Loop::Outer));
        assert_eq!(variant(Racecourse::Kyoto, 1600, ""), Some(Loop::Inner));
        assert_eq!(variant(Racecourse::Hanshin, 1400, ""), Some(Loop::Inner));
        assert_eq!(variant(Racecourse::Hanshin, 2200, ""), Some(Loop::Inner));
        assert_eq!(variant(Racecourse::Hanshin, 1600, ""), Some(Loop::Outer));
        assert_eq!(variant(Racecourse::Niigata, 1600, ""), Some(Loop::Inner));
        assert_eq!(variant(Racecourse::Niigata, 1800, ""), Some(Loop::Outer));
        assert_eq!(variant(Racecourse::Tokyo, 1600, "芝外1600"), None);
    }

    #[test]
    fn test_variant_display() {
        let v = detect_variant(&Racecourse::Hanshin, 1600, "");
        assert_eq!(v.to_string(), "阪神外");
        let v = detect_variant(&Racecourse::Tokyo, 1600, "");
        assert_eq!(v.to_string(), "東京");
    }

    #[test]
    fn test_baseline_exact_hit() {
        let t = baseline_sectional_time(&Racecourse::Tokyo, 1600, "", TrackCondition::Firm);
        assert!((t - 33.8).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_extrapolates_from_nearest() {
        // Tokyo 1700 is equidistant from 1600 and 1800; the shorter wins
        let t = baseline_sectional_time(&Racecourse::Tokyo, 1700, "", TrackCondition::Firm);
        assert!((t - 33.9).abs() < 1e-9);
        // Nakayama 1400 -> nearest 1200 (35.0) + 0.2
        let t = baseline_sectional_time(&Racecourse::Nakayama, 1400, "", TrackCondition::Firm);
        assert!((t - 35.2).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_condition_offsets() {
        let firm = baseline_sectional_time(&Racecourse::Nakayama, 2000, "", TrackCondition::Firm);
        let heavy = baseline_sectional_time(&Racecourse::Nakayama, 2000, "", TrackCondition::Heavy);
        assert!((heavy - firm - 2.5).abs() < 1e-9);

        let soft = baseline_sectional_time(&Racecourse::Tokyo, 2400, "", TrackCondition::Soft);
        assert!((soft - 36.5).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_untabulated_course() {
        let oi = Racecourse::Regional("大井".to_string());
        assert!((baseline_sectional_time(&oi, 1200, "", TrackCondition::Firm) - 34.5).abs() < 1e-9);
        assert!((baseline_sectional_time(&oi, 2000, "", TrackCondition::Firm) - 35.5).abs() < 1e-9);
        assert!((baseline_sectional_time(&oi, 2600, "", TrackCondition::Good) - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_course_record_lookup() {
        let tokyo = detect_variant(&Racecourse::Tokyo, 1600, "");
        assert_eq!(course_record(&tokyo, 1600), Some(90.5));
        assert_eq!(course_record(&tokyo, 1700), None);

        let hanshin_outer = detect_variant(&Racecourse::Hanshin, 1600, "");
        assert_eq!(course_record(&hanshin_outer, 1600), Some(91.3));

        let oi = detect_variant(&Racecourse::Regional("大井".to_string()), 1600, "");
        assert_eq!(course_record(&oi, 1600), None);
    }

    #[test]
    fn test_course_types() {
        let niigata_outer = detect_variant(&Racecourse::Niigata, 2000, "");
        assert_eq!(course_type(&niigata_outer), CourseType::LongStraight);
        let kyoto_inner = detect_variant(&Racecourse::Kyoto, 1600, "");
        assert_eq!(course_type(&kyoto_inner), CourseType::Tight);
        let chukyo = detect_variant(&Racecourse::Chukyo, 1600, "");
        assert_eq!(course_type(&chukyo), CourseType::Standard);
    }

    #[test]
    fn test_profile() {
        let p = profile(&Racecourse::Tokyo, 2400, "芝2400");
        assert_eq!(p.straight_length, 525);
        assert_eq!(p.course_type, CourseType::LongStraight);
        assert!(p.favored_styles.contains(&RunningStyle::Closer));
        assert!(p.records.contains(&(2400, 141.2)));
        assert_eq!(straight_length(&Racecourse::Other("x".to_string())), 400);
    }
}
