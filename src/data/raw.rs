//! Raw past-performance records and their normalization
//!
//! Scraped or hand-entered histories arrive loosely typed: numbers as strings,
//! full-width digits, finish cells such as "中止" or "3(降)", times written as
//! "1:33.5". `RecordNormalizer` turns them into `PastRaceRecord`s in a single
//! pass, removing non-finishers and ordering the result most recent first.
//!
//! # Example
//!
//! ```no_run
//! use keiba::data::raw::{RawRaceRecord, RecordNormalizer};
//!
//! let raw: Vec<RawRaceRecord> = serde_json::from_str("[]").unwrap();
//! let history = RecordNormalizer::new().normalize_history(&raw);
//! println!("{} usable starts", history.len());
//! ```

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{FieldFinisher, PastRaceRecord, Racecourse, Sex, Surface, TrackCondition};

/// Starts kept per horse after normalization
pub const HISTORY_LIMIT: usize = 5;

/// Finish cells that mark a start without a placing
const NON_FINISH_CODES: [&str; 5] = ["中止", "除外", "取消", "失格", "競走中止"];

/// Placings at or above this are sentinel codes, not positions
const SENTINEL_POSITION: u32 = 90;

/// A cell that may hold a number or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Number(f64),
    Text(String),
}

impl Loose {
    pub fn as_text(&self) -> String {
        match self {
            Loose::Number(n) => n.to_string(),
            Loose::Text(s) => s.trim().to_string(),
        }
    }

    /// Numeric value; text is read after full-width digit normalization
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Loose::Number(n) => Some(*n),
            Loose::Text(s) => normalize_fullwidth_numbers(s.trim()).parse().ok(),
        }
    }
}

fn loose_f64(cell: &Option<Loose>) -> Option<f64> {
    cell.as_ref().and_then(Loose::as_f64)
}

/// Another finisher as scraped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFinisher {
    #[serde(default)]
    pub position: Option<Loose>,
    #[serde(default)]
    pub sectional: Option<Loose>,
    #[serde(default)]
    pub time_gap: Option<Loose>,
}

/// One past start as scraped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRaceRecord {
    /// "2024/05/26", "2024-05-26" or "2024.05.26"
    #[serde(default)]
    pub date: Option<String>,
    /// Venue cell, e.g. "2東京12"
    #[serde(default)]
    pub course: Option<String>,
    /// Distance cell, e.g. "芝外1600" or "ダ1200"
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    /// Placing or a non-finish code
    #[serde(default)]
    pub finish: Option<Loose>,
    #[serde(default)]
    pub time_gap: Option<Loose>,
    #[serde(default)]
    pub impost: Option<Loose>,
    /// Final 3F (上がり)
    #[serde(default)]
    pub sectional: Option<Loose>,
    /// 200m lap times, in running order
    #[serde(default)]
    pub laps: Vec<f64>,
    /// Corner passing order, e.g. "8-8-6-4"
    #[serde(default)]
    pub passing: Option<String>,
    #[serde(default)]
    pub field_size: Option<Loose>,
    #[serde(default)]
    pub race_name: Option<String>,
    #[serde(default)]
    pub field: Vec<RawFinisher>,
    /// "1:33.5" or seconds
    #[serde(default)]
    pub finish_time: Option<Loose>,
    #[serde(default)]
    pub winner_time: Option<Loose>,
    /// Margin over the runner-up when this horse won
    #[serde(default)]
    pub winner_margin: Option<Loose>,
}

/// Convert full-width digits to ASCII
pub fn normalize_fullwidth_numbers(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '．' => '.',
            '－' | '−' => '-',
            _ => c,
        })
        .collect()
}

/// Placing of a finish cell, or `None` for a non-finisher
fn parse_placing(cell: &Loose, digits: &Regex) -> Option<u8> {
    let text = normalize_fullwidth_numbers(&cell.as_text());
    if NON_FINISH_CODES.iter().any(|code| text.contains(code)) {
        return None;
    }
    let position: u32 = digits.captures(&text)?.get(1)?.as_str().parse().ok()?;
    if position == 0 || position >= SENTINEL_POSITION {
        return None;
    }
    u8::try_from(position).ok()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = normalize_fullwidth_numbers(text.trim());
    ["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
}

/// Record normalizer holding the compiled patterns
pub struct RecordNormalizer {
    distance_pattern: Regex,
    digits_pattern: Regex,
    time_pattern: Regex,
    sex_age_pattern: Regex,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordNormalizer {
    pub fn new() -> Self {
        Self {
            distance_pattern: Regex::new(r"(\d{3,4})").expect("distance pattern"),
            digits_pattern: Regex::new(r"^\s*(\d+)").expect("digits pattern"),
            time_pattern: Regex::new(r"^(?:(\d+):)?(\d+(?:\.\d+)?)$").expect("time pattern"),
            sex_age_pattern: Regex::new(r"^(牡|牝|セ|騸)\s*(\d{1,2})").expect("sex/age pattern"),
        }
    }

    /// Parse "牡4" / "牝3" / "セ6"
    pub fn parse_sex_age(&self, text: &str) -> (Option<Sex>, Option<u8>) {
        let text = normalize_fullwidth_numbers(text.trim());
        match self.sex_age_pattern.captures(&text) {
            Some(caps) => (Sex::parse(&caps[1]), caps[2].parse().ok()),
            None => (None, None),
        }
    }

    /// Metres from a distance cell such as "芝外1600"
    pub fn parse_distance(&self, text: &str) -> Option<u32> {
        let text = normalize_fullwidth_numbers(text);
        self.distance_pattern.captures(&text)?[1].parse().ok()
    }

    /// Seconds from "1:33.5" or "93.5"
    pub fn parse_time(&self, cell: &Loose) -> Option<f64> {
        if let Loose::Number(n) = cell {
            return (*n > 0.0).then_some(*n);
        }
        let text = normalize_fullwidth_numbers(&cell.as_text());
        let caps = self.time_pattern.captures(&text)?;
        let seconds: f64 = caps[2].parse().ok()?;
        let minutes: f64 = match caps.get(1) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0.0,
        };
        let total = minutes * 60.0 + seconds;
        (total > 0.0).then_some(total)
    }

    /// Last corner of a passing string
    fn parse_corner(&self, passing: &str) -> Option<u8> {
        normalize_fullwidth_numbers(passing)
            .split('-')
            .filter_map(|p| p.trim().parse::<u8>().ok())
            .last()
            .filter(|&c| c > 0)
    }

    fn normalize_finisher(&self, raw: &RawFinisher) -> Option<FieldFinisher> {
        let position = parse_placing(raw.position.as_ref()?, &self.digits_pattern)?;
        let time_gap = if position == 1 {
            Some(0.0)
        } else {
            loose_f64(&raw.time_gap)
        };
        Some(FieldFinisher {
            position,
            sectional: loose_f64(&raw.sectional).filter(|&s| s > 0.0),
            time_gap,
        })
    }

    /// Normalize one start. `None` for a non-finisher.
    pub fn normalize(&self, raw: &RawRaceRecord) -> Option<PastRaceRecord> {
        let finish_position = parse_placing(raw.finish.as_ref()?, &self.digits_pattern)?;

        let distance_text = raw.distance.as_deref().unwrap_or("").trim().to_string();
        let distance = self.parse_distance(&distance_text).unwrap_or(0);
        let surface = match raw.surface.as_deref().map(Surface::parse) {
            Some(surface) if surface != Surface::Unknown => surface,
            _ => Surface::parse(&distance_text),
        };

        // Winners are printed with a negative gap, the lead over second place
        let printed_gap = loose_f64(&raw.time_gap);
        let mut winner_margin = loose_f64(&raw.winner_margin);
        let time_gap = if finish_position == 1 {
            if winner_margin.is_none() {
                winner_margin = printed_gap.map(f64::abs).filter(|&m| m > 0.0);
            }
            Some(0.0)
        } else {
            printed_gap
        };
        let finish_time = raw
            .finish_time
            .as_ref()
            .and_then(|t| self.parse_time(t))
            .or_else(|| {
                let winner = raw.winner_time.as_ref().and_then(|t| self.parse_time(t))?;
                Some(winner + time_gap.unwrap_or(0.0).max(0.0))
            });

        let late_section = if raw.laps.len() >= 4 {
            Some(raw.laps[raw.laps.len() - 4..].iter().sum())
        } else {
            None
        };

        let field = raw
            .field
            .iter()
            .filter_map(|f| self.normalize_finisher(f))
            .collect();

        Some(PastRaceRecord {
            date: raw.date.as_deref().and_then(parse_date),
            course: raw
                .course
                .as_deref()
                .map(Racecourse::parse)
                .unwrap_or_default(),
            distance,
            distance_text,
            surface,
            condition: raw
                .condition
                .as_deref()
                .map(TrackCondition::parse)
                .unwrap_or_default(),
            finish_position,
            time_gap,
            impost: loose_f64(&raw.impost).unwrap_or(0.0),
            sectional: loose_f64(&raw.sectional).filter(|&s| s > 0.0),
            late_section,
            corner_position: raw.passing.as_deref().and_then(|p| self.parse_corner(p)),
            field_size: loose_f64(&raw.field_size)
                .filter(|&n| n >= 1.0)
                .and_then(|n| u8::try_from(n as u32).ok()),
            label: raw.race_name.clone().unwrap_or_default(),
            field,
            finish_time,
            winner_margin,
            after_non_finish: false,
        })
    }

    /// Normalize a horse's history.
    ///
    /// Non-finishers are dropped, the start right after one is flagged, and at
    /// most `HISTORY_LIMIT` starts are returned, most recent first. Undated
    /// starts keep their input order after the dated ones.
    pub fn normalize_history(&self, raws: &[RawRaceRecord]) -> Vec<PastRaceRecord> {
        let mut parsed: Vec<(Option<NaiveDate>, usize, Option<PastRaceRecord>)> = raws
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let date = raw.date.as_deref().and_then(parse_date);
                (date, idx, self.normalize(raw))
            })
            .collect();
        parsed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut history = Vec::new();
        for i in 0..parsed.len() {
            let previous_dnf = parsed.get(i + 1).map_or(false, |p| p.2.is_none());
            match parsed[i].2.take() {
                Some(mut record) => {
                    record.after_non_finish = previous_dnf;
                    history.push(record);
                }
                None => debug!("Dropped non-finisher start (input row {})", parsed[i].1 + 1),
            }
        }

        history.truncate(HISTORY_LIMIT);
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, finish: Loose) -> RawRaceRecord {
        RawRaceRecord {
            date: Some(date.to_string()),
            course: Some("2東京12".to_string()),
            distance: Some("芝1600".to_string()),
            finish: Some(finish),
            time_gap: Some(Loose::Text("0.3".to_string())),
            ..Default::default()
        }
    }

    fn text(s: &str) -> Loose {
        Loose::Text(s.to_string())
    }

    #[test]
    fn test_normalize_fullwidth_numbers() {
        assert_eq!(normalize_fullwidth_numbers("１６００"), "1600");
        assert_eq!(normalize_fullwidth_numbers("３３．５"), "33.5");
        assert_eq!(normalize_fullwidth_numbers("abc"), "abc");
    }

    #[test]
    fn test_parse_sex_age() {
        let n = RecordNormalizer::new();
        assert_eq!(n.parse_sex_age("牡4"), (Some(Sex::Colt), Some(4)));
        assert_eq!(n.parse_sex_age("牝３"), (Some(Sex::Filly), Some(3)));
        assert_eq!(n.parse_sex_age("セ7"), (Some(Sex::Gelding), Some(7)));
        assert_eq!(n.parse_sex_age("?"), (None, None));
    }

    #[test]
    fn test_parse_distance_and_time() {
        let n = RecordNormalizer::new();
        assert_eq!(n.parse_distance("芝外1600"), Some(1600));
        assert_eq!(n.parse_distance("ダ1200m"), Some(1200));
        assert_eq!(n.parse_distance("不明"), None);

        assert!((n.parse_time(&text("1:33.5")).unwrap() - 93.5).abs() < 1e-9);
        assert!((n.parse_time(&text("59.8")).unwrap() - 59.8).abs() < 1e-9);
        assert!((n.parse_time(&Loose::Number(120.1)).unwrap() - 120.1).abs() < 1e-9);
        assert_eq!(n.parse_time(&text("--")), None);
    }

    #[test]
    fn test_normalize_single_record() {
        let n = RecordNormalizer::new();
        let record = RawRaceRecord {
            date: Some("2024/05/26".to_string()),
            course: Some("2東京12".to_string()),
            distance: Some("芝2400".to_string()),
            condition: Some("稍重".to_string()),
            finish: Some(text("3(降)")),
            time_gap: Some(text("0.4")),
            impost: Some(Loose::Number(57.0)),
            sectional: Some(text("34.1")),
            laps: vec![12.5, 11.0, 12.0, 12.1, 11.8, 11.5, 11.6, 11.9],
            passing: Some("10-10-9-8".to_string()),
            field_size: Some(text("18")),
            race_name: Some("日本ダービー(GI)".to_string()),
            winner_time: Some(text("2:23.6")),
            field: vec![
                RawFinisher {
                    position: Some(Loose::Number(1.0)),
                    sectional: Some(text("33.8")),
                    time_gap: Some(Loose::Number(0.0)),
                },
                RawFinisher {
                    position: Some(text("中止")),
                    sectional: None,
                    time_gap: None,
                },
            ],
            ..Default::default()
        };

        let r = n.normalize(&record).unwrap();
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 5, 26));
        assert_eq!(r.course, Racecourse::Tokyo);
        assert_eq!(r.distance, 2400);
        assert_eq!(r.surface, Surface::Turf);
        assert_eq!(r.condition, TrackCondition::Good);
        assert_eq!(r.finish_position, 3);
        assert_eq!(r.corner_position, Some(8));
        assert_eq!(r.field_size, Some(18));
        assert_eq!(r.field.len(), 1);
        assert!((r.late_section.unwrap() - 46.8).abs() < 1e-9);
        assert!((r.finish_time.unwrap() - 144.0).abs() < 1e-9);
        assert!((r.impost - 57.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finishers_are_dropped() {
        let n = RecordNormalizer::new();
        assert!(n.normalize(&raw("2024/05/01", text("中止"))).is_none());
        assert!(n.normalize(&raw("2024/05/01", text("除外"))).is_none());
        assert!(n.normalize(&raw("2024/05/01", Loose::Number(0.0))).is_none());
        assert!(n.normalize(&raw("2024/05/01", Loose::Number(99.0))).is_none());
        assert!(n.normalize(&RawRaceRecord::default()).is_none());
    }

    #[test]
    fn test_normalize_history_orders_and_flags() {
        let n = RecordNormalizer::new();
        let raws = vec![
            raw("2024/01/10", Loose::Number(2.0)),
            raw("2024/05/01", Loose::Number(5.0)),
            raw("2024/03/15", text("取消")),
            raw("2023/11/20", Loose::Number(1.0)),
        ];

        let history = n.normalize_history(&raws);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].finish_position, 5);
        assert!(history[0].after_non_finish);
        assert_eq!(history[1].finish_position, 2);
        assert!(!history[1].after_non_finish);
        assert_eq!(history[2].finish_position, 1);
    }

    #[test]
    fn test_normalize_history_truncates() {
        let n = RecordNormalizer::new();
        let raws: Vec<_> = (1..=8)
            .map(|m| raw(&format!("2024/{:02}/01", m), Loose::Number(m as f64)))
            .collect();
        let history = n.normalize_history(&raws);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].finish_position, 8);
        assert_eq!(history[4].finish_position, 4);
    }

    #[test]
    fn test_raw_record_from_json() {
        let json = r#"{
            "date": "2024-04-07",
            "course": "阪神",
            "distance": "芝外1600",
            "finish": 1,
            "time_gap": "-0.2",
            "sectional": 33.4,
            "race_name": "桜花賞(GI)"
        }"#;
        let raw: RawRaceRecord = serde_json::from_str(json).unwrap();
        let r = RecordNormalizer::new().normalize(&raw).unwrap();
        assert_eq!(r.course, Racecourse::Hanshin);
        assert_eq!(r.distance_text, "芝外1600");
        assert!(r.is_win());
        assert_eq!(r.time_gap, Some(0.0));
        assert_eq!(r.winner_margin, Some(0.2));
    }

    #[test]
    fn test_winner_gap_becomes_margin() {
        let n = RecordNormalizer::new();
        let mut won = raw("2024/05/01", Loose::Number(1.0));
        won.time_gap = Some(text("-1.2"));
        won.winner_margin = Some(Loose::Number(0.8));
        let r = n.normalize(&won).unwrap();
        assert_eq!(r.time_gap, Some(0.0));
        assert_eq!(r.winner_margin, Some(0.8));

        let mut second = raw("2024/05/01", Loose::Number(2.0));
        second.time_gap = Some(text("0.1"));
        assert_eq!(n.normalize(&second).unwrap().time_gap, Some(0.1));
    }
}
