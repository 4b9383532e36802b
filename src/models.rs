use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track surface of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Turf,
    Dirt,
    Steeplechase,
    #[default]
    Unknown,
}

impl Surface {
    /// Parse a surface from netkeiba-style text ("芝", "ダ", "ダート", "障") or English names
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with('芝') || text.eq_ignore_ascii_case("turf") {
            Surface::Turf
        } else if text.starts_with('ダ') || text.eq_ignore_ascii_case("dirt") {
            Surface::Dirt
        } else if text.starts_with('障') || text.eq_ignore_ascii_case("steeplechase") {
            Surface::Steeplechase
        } else {
            Surface::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Surface::Turf => "芝",
            Surface::Dirt => "ダート",
            Surface::Steeplechase => "障害",
            Surface::Unknown => "不明",
        }
    }
}

/// Going (馬場状態)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackCondition {
    /// 良
    #[default]
    Firm,
    /// 稍重
    Good,
    /// 重
    Soft,
    /// 不良
    Heavy,
}

impl TrackCondition {
    /// Parse going text. Unrecognized text maps to firm.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "稍重" | "稍" | "good" => TrackCondition::Good,
            "重" | "soft" => TrackCondition::Soft,
            "不良" | "不" | "heavy" => TrackCondition::Heavy,
            _ => TrackCondition::Firm,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackCondition::Firm => "良",
            TrackCondition::Good => "稍重",
            TrackCondition::Soft => "重",
            TrackCondition::Heavy => "不良",
        }
    }
}

/// JRA racecourses (central circuit)
const PRIMARY_COURSES: [(&str, &str); 10] = [
    ("札幌", "sapporo"),
    ("函館", "hakodate"),
    ("福島", "fukushima"),
    ("新潟", "niigata"),
    ("東京", "tokyo"),
    ("中山", "nakayama"),
    ("中京", "chukyo"),
    ("京都", "kyoto"),
    ("阪神", "hanshin"),
    ("小倉", "kokura"),
];

/// NAR venues (regional circuit)
pub const REGIONAL_VENUES: [&str; 15] = [
    "大井", "川崎", "船橋", "浦和", "門別", "盛岡", "水沢", "金沢", "笠松", "名古屋", "園田",
    "姫路", "高知", "佐賀", "帯広",
];

/// Racecourse a race is run at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Racecourse {
    Sapporo,
    Hakodate,
    Fukushima,
    Niigata,
    Tokyo,
    Nakayama,
    Chukyo,
    Kyoto,
    Hanshin,
    Kokura,
    /// Regional (NAR) venue, keyed by its Japanese name
    Regional(String),
    /// Anything else (overseas, unparsed)
    Other(String),
}

impl Racecourse {
    /// Parse a course from page text such as "東京", "1東京2" or "Tokyo"
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let lower = text.to_lowercase();
        for (idx, (ja, en)) in PRIMARY_COURSES.iter().enumerate() {
            if text.contains(ja) || lower == *en {
                return Self::primary(idx);
            }
        }
        if let Some(venue) = REGIONAL_VENUES.iter().find(|v| text.contains(*v)) {
            return Racecourse::Regional(venue.to_string());
        }
        Racecourse::Other(text.to_string())
    }

    fn primary(idx: usize) -> Self {
        match idx {
            0 => Racecourse::Sapporo,
            1 => Racecourse::Hakodate,
            2 => Racecourse::Fukushima,
            3 => Racecourse::Niigata,
            4 => Racecourse::Tokyo,
            5 => Racecourse::Nakayama,
            6 => Racecourse::Chukyo,
            7 => Racecourse::Kyoto,
            8 => Racecourse::Hanshin,
            _ => Racecourse::Kokura,
        }
    }

    /// Japanese course name
    pub fn name(&self) -> &str {
        match self {
            Racecourse::Sapporo => "札幌",
            Racecourse::Hakodate => "函館",
            Racecourse::Fukushima => "福島",
            Racecourse::Niigata => "新潟",
            Racecourse::Tokyo => "東京",
            Racecourse::Nakayama => "中山",
            Racecourse::Chukyo => "中京",
            Racecourse::Kyoto => "京都",
            Racecourse::Hanshin => "阪神",
            Racecourse::Kokura => "小倉",
            Racecourse::Regional(name) | Racecourse::Other(name) => name,
        }
    }

    pub fn is_regional(&self) -> bool {
        matches!(self, Racecourse::Regional(_))
    }

    pub fn is_primary(&self) -> bool {
        !matches!(self, Racecourse::Regional(_) | Racecourse::Other(_))
    }
}

impl Default for Racecourse {
    fn default() -> Self {
        Racecourse::Other(String::new())
    }
}

impl From<String> for Racecourse {
    fn from(value: String) -> Self {
        Racecourse::parse(&value)
    }
}

impl From<Racecourse> for String {
    fn from(value: Racecourse) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Racecourse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sex of a horse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// 牡
    Colt,
    /// 牝
    Filly,
    /// セ
    Gelding,
}

impl Sex {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "牡" | "牡馬" | "M" | "m" | "colt" => Some(Sex::Colt),
            "牝" | "牝馬" | "メス" | "F" | "f" | "filly" | "mare" => Some(Sex::Filly),
            "セ" | "セン" | "騸" | "G" | "g" | "gelding" => Some(Sex::Gelding),
            _ => None,
        }
    }

    pub fn is_female(&self) -> bool {
        matches!(self, Sex::Filly)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Colt => "牡",
            Sex::Filly => "牝",
            Sex::Gelding => "セ",
        }
    }
}

/// Another finisher of a past race, used for field-relative comparisons
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldFinisher {
    pub position: u8,
    #[serde(default)]
    pub sectional: Option<f64>,
    #[serde(default)]
    pub time_gap: Option<f64>,
}

/// A normalized past performance. Non-finishers never reach this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PastRaceRecord {
    pub date: Option<NaiveDate>,
    pub course: Racecourse,
    pub distance: u32,
    /// Raw distance cell ("芝1600", "芝外1600"), kept for inner/outer hints
    pub distance_text: String,
    pub surface: Surface,
    pub condition: TrackCondition,
    pub finish_position: u8,
    /// Seconds behind the winner (0.0 for the winner)
    pub time_gap: Option<f64>,
    pub impost: f64,
    /// Final 3F sectional time
    pub sectional: Option<f64>,
    /// Late 4F time, from laps when available
    pub late_section: Option<f64>,
    pub corner_position: Option<u8>,
    pub field_size: Option<u8>,
    pub label: String,
    pub field: Vec<FieldFinisher>,
    pub finish_time: Option<f64>,
    pub winner_margin: Option<f64>,
    /// The chronologically previous start was a non-finish
    pub after_non_finish: bool,
}

impl PastRaceRecord {
    pub fn is_win(&self) -> bool {
        self.finish_position == 1
    }

    /// Time behind the winner, 0.0 for the winner or when missing
    pub fn margin(&self) -> f64 {
        self.time_gap.map_or(0.0, |g| g.max(0.0))
    }

    /// Mean sectional time of the whole field including this runner
    pub fn field_average_sectional(&self) -> Option<f64> {
        let mut times: Vec<f64> = self
            .field
            .iter()
            .filter_map(|h| h.sectional)
            .filter(|&s| s > 0.0)
            .collect();
        if let Some(own) = self.sectional.filter(|&s| s > 0.0) {
            times.push(own);
        }
        mean(&times)
    }

    /// 4th-corner position as a fraction of the field
    pub fn corner_ratio(&self) -> Option<f64> {
        match (self.corner_position, self.field_size) {
            (Some(pos), Some(size)) if pos > 0 && size > 0 => Some(pos as f64 / size as f64),
            _ => None,
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Entrant in the target race
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceEntrant {
    pub name: String,
    #[serde(default)]
    pub frame: u8,
    #[serde(default)]
    pub horse_no: u8,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub age: Option<u8>,
    /// Impost carried today (kg)
    #[serde(default)]
    pub impost: f64,
    /// Informational only
    #[serde(default)]
    pub odds: Option<f64>,
}

/// The race being handicapped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetRaceContext {
    pub course: Racecourse,
    pub distance: u32,
    #[serde(default)]
    pub distance_text: String,
    pub surface: Surface,
    #[serde(default)]
    pub condition: TrackCondition,
    /// Reference date for layoff arithmetic
    #[serde(default)]
    pub race_date: Option<NaiveDate>,
}

impl TargetRaceContext {
    pub fn is_long_distance_turf(&self, min_distance: u32) -> bool {
        self.surface == Surface::Turf && self.distance >= min_distance
    }
}

/// Running style (脚質)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningStyle {
    /// 逃げ
    Frontrunner,
    /// 先行
    Stalker,
    /// 差し
    Closer,
    /// 追込
    DeepCloser,
    #[default]
    Unknown,
}

impl RunningStyle {
    pub fn label(&self) -> &'static str {
        match self {
            RunningStyle::Frontrunner => "逃げ",
            RunningStyle::Stalker => "先行",
            RunningStyle::Closer => "差し",
            RunningStyle::DeepCloser => "追込",
            RunningStyle::Unknown => "不明",
        }
    }

    pub fn is_speed(&self) -> bool {
        matches!(self, RunningStyle::Frontrunner | RunningStyle::Stalker)
    }

    pub fn is_closing(&self) -> bool {
        matches!(self, RunningStyle::Closer | RunningStyle::DeepCloser)
    }
}

/// Style of a single run or of a horse's recent history
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleClassification {
    pub style: RunningStyle,
    pub confidence: f64,
}

impl StyleClassification {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Predicted race tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    /// ハイ
    Fast,
    /// ミドル
    #[default]
    Medium,
    /// スロー
    Slow,
}

impl Pace {
    pub fn label(&self) -> &'static str {
        match self {
            Pace::Fast => "ハイ",
            Pace::Medium => "ミドル",
            Pace::Slow => "スロー",
        }
    }
}

/// Number of entrants per running style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleCounts {
    pub frontrunner: usize,
    pub stalker: usize,
    pub closer: usize,
    pub deep_closer: usize,
}

impl StyleCounts {
    pub fn front_runners(&self) -> usize {
        self.frontrunner + self.stalker
    }
}

/// Field-wide pace prediction, computed once per race
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacePrediction {
    pub pace: Pace,
    pub front_ratio: f64,
    pub counts: StyleCounts,
    pub straight_length: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_racecourse_parse() {
        assert_eq!(Racecourse::parse("東京"), Racecourse::Tokyo);
        assert_eq!(Racecourse::parse("1東京2"), Racecourse::Tokyo);
        assert_eq!(Racecourse::parse("Hanshin"), Racecourse::Hanshin);
        assert_eq!(
            Racecourse::parse("大井"),
            Racecourse::Regional("大井".to_string())
        );
        assert!(Racecourse::parse("シャティン").eq(&Racecourse::Other("シャティン".to_string())));
    }

    #[test]
    fn test_racecourse_serde_roundtrip_by_name() {
        let json = serde_json::to_string(&Racecourse::Nakayama).unwrap();
        assert_eq!(json, "\"中山\"");
        let parsed: Racecourse = serde_json::from_str("\"5中山8\"").unwrap();
        assert_eq!(parsed, Racecourse::Nakayama);
    }

    #[test]
    fn test_surface_parse() {
        assert_eq!(Surface::parse("芝1600"), Surface::Turf);
        assert_eq!(Surface::parse("ダ1200"), Surface::Dirt);
        assert_eq!(Surface::parse("障3000"), Surface::Steeplechase);
        assert_eq!(Surface::parse(""), Surface::Unknown);
    }

    #[test]
    fn test_condition_parse() {
        assert_eq!(TrackCondition::parse("稍重"), TrackCondition::Good);
        assert_eq!(TrackCondition::parse("不良"), TrackCondition::Heavy);
        assert_eq!(TrackCondition::parse("???"), TrackCondition::Firm);
    }

    #[test]
    fn test_field_average_includes_own_time() {
        let record = PastRaceRecord {
            sectional: Some(34.0),
            field: vec![
                FieldFinisher {
                    position: 1,
                    sectional: Some(35.0),
                    time_gap: Some(0.0),
                },
                FieldFinisher {
                    position: 3,
                    sectional: None,
                    time_gap: Some(0.4),
                },
            ],
            ..Default::default()
        };
        let avg = record.field_average_sectional().unwrap();
        assert!((avg - 34.5).abs() < 1e-9);
    }

    #[test]
    fn test_corner_ratio() {
        let record = PastRaceRecord {
            corner_position: Some(12),
            field_size: Some(16),
            ..Default::default()
        };
        assert!((record.corner_ratio().unwrap() - 0.75).abs() < 1e-9);
        assert!(PastRaceRecord::default().corner_ratio().is_none());
    }
}
