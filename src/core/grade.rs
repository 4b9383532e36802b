//! Race grade classification
//!
//! Maps a race label (e.g. "天皇賞(秋)(GI)", "2勝クラス", "C1十") to a grade
//! tier and its reliability coefficient, and tells regional-circuit races
//! apart from interregional graded races run at regional venues.

use serde::{Deserialize, Serialize};

use crate::config::GradeCoefficients;
use crate::models::{Racecourse, Surface};

/// Grade tier of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceGrade {
    G1,
    G2,
    G3,
    /// Listed and open-class races
    Listed,
    ThreeWin,
    TwoWin,
    OneWin,
    /// Regional class codes (C1, B2, ...)
    Regional,
    /// Maiden and debut races
    Maiden,
    Baseline,
}

// Checked in order. The tier-3 markers come first so "GIII" never reads as "GII".
const G3_MARKERS: [&str; 5] = ["G3", "GIII", "JPNIII", "JPN3", "GⅢ"];
const G2_MARKERS: [&str; 5] = ["G2", "GII", "JPNII", "JPN2", "GⅡ"];
const G1_MARKERS: [&str; 5] = ["G1", "GI", "JPNI", "JPN1", "GⅠ"];
const LISTED_MARKERS: [&str; 5] = ["(L)", "（L）", "OP", "オープン", "リステッド"];
const THREE_WIN_MARKERS: [&str; 2] = ["3勝クラス", "1600万下"];
const TWO_WIN_MARKERS: [&str; 2] = ["2勝クラス", "1000万下"];
const ONE_WIN_MARKERS: [&str; 2] = ["1勝クラス", "500万下"];
const MAIDEN_MARKERS: [&str; 3] = ["未勝利", "新馬", "メイクデビュー"];
const DEBUT_MARKERS: [&str; 2] = ["新馬", "メイクデビュー"];

/// NAR class codes
pub const REGIONAL_CLASS_CODES: [&str; 8] = ["C1", "C2", "C3", "B1", "B2", "B3", "A1", "A2"];

const JPN_MARKERS: [&str; 6] = ["JPNI", "JPNII", "JPNIII", "JPN1", "JPN2", "JPN3"];

/// Interregional graded races run at NAR venues
const INTERREGIONAL_RACES: [&str; 23] = [
    "帝王賞",
    "東京大賞典",
    "かしわ記念",
    "JBCクラシック",
    "JBCスプリント",
    "JBCレディスクラシック",
    "ジャパンダートダービー",
    "エンプレス杯",
    "マリーンC",
    "スパーキングレディーC",
    "さきたま杯",
    "ブリーダーズゴールドC",
    "ダイオライト記念",
    "名古屋グランプリ",
    "黒船賞",
    "マーキュリーC",
    "ウィナーズカップ",
    "ジャパンブリーダーズカップ",
    "TCK女王盃",
    "クラスターC",
    "東京スプリント",
    "全日本2歳優駿",
    "ローレル賞",
];

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

impl RaceGrade {
    /// Grade tier of a race label
    pub fn detect(label: &str) -> Self {
        if label.trim().is_empty() {
            return RaceGrade::Baseline;
        }
        let upper = label.to_uppercase();

        if contains_any(&upper, &G3_MARKERS) {
            RaceGrade::G3
        } else if contains_any(&upper, &G2_MARKERS) {
            RaceGrade::G2
        } else if contains_any(&upper, &G1_MARKERS) {
            RaceGrade::G1
        } else if contains_any(&upper, &LISTED_MARKERS) {
            RaceGrade::Listed
        } else if contains_any(label, &THREE_WIN_MARKERS) {
            RaceGrade::ThreeWin
        } else if contains_any(label, &TWO_WIN_MARKERS) {
            RaceGrade::TwoWin
        } else if contains_any(label, &ONE_WIN_MARKERS) {
            RaceGrade::OneWin
        } else if contains_any(&upper, &REGIONAL_CLASS_CODES) {
            RaceGrade::Regional
        } else if contains_any(label, &MAIDEN_MARKERS) {
            RaceGrade::Maiden
        } else {
            RaceGrade::Baseline
        }
    }

    /// G1-G3 (including Jpn grades)
    pub fn is_graded(&self) -> bool {
        matches!(self, RaceGrade::G1 | RaceGrade::G2 | RaceGrade::G3)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RaceGrade::G1 => "G1",
            RaceGrade::G2 => "G2",
            RaceGrade::G3 => "G3",
            RaceGrade::Listed => "OP",
            RaceGrade::ThreeWin => "3勝",
            RaceGrade::TwoWin => "2勝",
            RaceGrade::OneWin => "1勝",
            RaceGrade::Regional => "地方",
            RaceGrade::Maiden => "未勝利",
            RaceGrade::Baseline => "不明",
        }
    }
}

impl GradeCoefficients {
    pub fn coefficient(&self, grade: RaceGrade) -> f64 {
        match grade {
            RaceGrade::G1 => self.g1,
            RaceGrade::G2 => self.g2,
            RaceGrade::G3 => self.g3,
            RaceGrade::Listed => self.listed,
            RaceGrade::ThreeWin => self.three_win,
            RaceGrade::TwoWin => self.two_win,
            RaceGrade::OneWin => self.one_win,
            RaceGrade::Regional => self.regional,
            RaceGrade::Maiden => self.maiden,
            RaceGrade::Baseline => self.baseline,
        }
    }
}

/// Grade tier and reliability coefficient of a race label
pub fn classify(label: &str, coefficients: &GradeCoefficients) -> (RaceGrade, f64) {
    let grade = RaceGrade::detect(label);
    (grade, coefficients.coefficient(grade))
}

/// Interregional graded race (Jpn grade or a known race name)
pub fn is_interregional(label: &str) -> bool {
    contains_any(&label.to_uppercase(), &JPN_MARKERS) || contains_any(label, &INTERREGIONAL_RACES)
}

/// Regional-circuit race: NAR venue or NAR class code, unless interregional
pub fn is_regional(label: &str, course: &Racecourse) -> bool {
    if is_interregional(label) {
        return false;
    }
    course.is_regional() || contains_any(&label.to_uppercase(), &REGIONAL_CLASS_CODES)
}

/// Debut (新馬) race
pub fn is_debut(label: &str) -> bool {
    contains_any(label, &DEBUT_MARKERS)
}

/// Surface implied by a label or distance cell when none is recorded
pub fn infer_surface(label: &str) -> Surface {
    if label.contains('ダ') {
        Surface::Dirt
    } else if label.contains('障') {
        Surface::Steeplechase
    } else {
        Surface::Turf
    }
}
