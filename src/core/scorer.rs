//! Composite entrant scoring
//!
//! `ScoreCalculator` turns an entrant's recent history (most recent first,
//! non-finishers already removed) into a `ScoreBreakdown`. Every sub-score is
//! a pure function of the history and the target race; the field-wide pace is
//! computed beforehand and only read here.
//!
//! Sub-scores, in explanation order:
//! - final 3F relative to comparable finishers
//! - late 4F (turf routes only)
//! - distance and course suitability
//! - style x pace affinity
//! - impost, layoff, graded-race bonus, debut boost, consecutive big losses,
//!   win streak, course-record comparison, regional danger flag
//!
//! The first group is normalized onto 0-100 and weighted by one of two
//! presets; the rest is added as-is.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::breakdown::{Component, Contribution, DangerFlag, ScoreBreakdown};
use super::course::{baseline_sectional_time, course_record, detect_variant, round1};
use super::grade::{infer_surface, is_debut, is_regional, RaceGrade};
use super::style::{style_match_bonus, style_weight};
use crate::config::ScoringConfig;
use crate::models::{
    mean, PacePrediction, PastRaceRecord, RaceEntrant, RunningStyle, StyleClassification, Surface,
    TargetRaceContext,
};

/// Where the reference time of a sectional comparison came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
    /// Finishers within the time-gap window
    Nearby(usize),
    /// Every finisher with a sectional
    Field,
    /// Course baseline or surface default
    Baseline,
}

/// Why a big loss does not count toward the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossExcuse {
    DistanceChange,
    AfterNonFinish,
    Layoff,
}

impl LossExcuse {
    pub fn label(&self) -> &'static str {
        match self {
            LossExcuse::DistanceChange => "distance change",
            LossExcuse::AfterNonFinish => "after non-finish",
            LossExcuse::Layoff => "first start after a layoff",
        }
    }
}

/// Result of the consecutive big-loss scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossScan {
    /// Big losses before the first non-big-loss
    pub big_losses: usize,
    /// Big losses that count toward the penalty
    pub effective: usize,
    /// (history index, reason) of excused losses
    pub excused: Vec<(usize, LossExcuse)>,
    pub penalty: f64,
}

/// One course-record comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordComparison {
    pub index: usize,
    pub variant: String,
    pub distance: u32,
    pub finish_time: f64,
    pub record: f64,
    pub points: f64,
    pub weight: f64,
}

/// Composite score engine
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn window<'a>(&self, records: &'a [PastRaceRecord]) -> &'a [PastRaceRecord] {
        &records[..records.len().min(self.config.lookback)]
    }

    /// Recorded surface, or the one implied by the distance cell/label
    fn surface_of(record: &PastRaceRecord) -> Surface {
        match record.surface {
            Surface::Unknown if !record.distance_text.is_empty() => {
                infer_surface(&record.distance_text)
            }
            Surface::Unknown => infer_surface(&record.label),
            surface => surface,
        }
    }

    /// Coefficient from the gap to the winner, or from the finish when the
    /// gap is zero or missing
    fn margin_coefficient(&self, record: &PastRaceRecord) -> f64 {
        let table = &self.config.suitability;
        match record.time_gap {
            Some(gap) if gap > 0.0 => table.margin_coefficients.at_most(gap),
            _ => table.finish_coefficients.at_most(record.finish_position as f64),
        }
    }

    // ------------------------------------------------------------------
    // Final 3F relative score
    // ------------------------------------------------------------------

    /// Default final 3F by surface and distance
    pub fn default_sectional(distance: u32, surface: Surface) -> f64 {
        match surface {
            Surface::Dirt => {
                if distance <= 1400 {
                    37.5
                } else if distance <= 1800 {
                    38.0
                } else {
                    38.5
                }
            }
            _ => {
                if distance <= 1400 {
                    34.5
                } else if distance <= 1800 {
                    35.0
                } else if distance <= 2200 {
                    35.5
                } else {
                    36.5
                }
            }
        }
    }

    /// Reference final 3F for one past run
    pub fn sectional_reference(&self, record: &PastRaceRecord) -> (f64, ReferenceSource) {
        let others: Vec<_> = record
            .field
            .iter()
            .filter(|h| h.sectional.map_or(false, |s| s > 0.0))
            .collect();

        if !others.is_empty() {
            if let Some(own_gap) = record.time_gap {
                let nearby: Vec<f64> = others
                    .iter()
                    .filter(|h| {
                        h.time_gap
                            .map_or(false, |g| (g - own_gap).abs() <= self.config.sectional.window)
                    })
                    .filter_map(|h| h.sectional)
                    .collect();
                if let Some(avg) = mean(&nearby) {
                    return (avg, ReferenceSource::Nearby(nearby.len()));
                }
            }
            if let Some(avg) = record.field_average_sectional() {
                return (avg, ReferenceSource::Field);
            }
        }

        let surface = Self::surface_of(record);
        let baseline = if surface == Surface::Turf && record.course.is_primary() {
            baseline_sectional_time(
                &record.course,
                record.distance,
                &record.distance_text,
                record.condition,
            )
        } else {
            Self::default_sectional(record.distance, surface)
        };
        (baseline, ReferenceSource::Baseline)
    }

    fn finish_bonus(&self, grade: RaceGrade, position: u8) -> f64 {
        let table = if grade.is_graded() {
            &self.config.sectional.graded_finish_bonus
        } else {
            &self.config.sectional.finish_bonus
        };
        match position {
            0 => 0.0,
            p => table.get(p as usize - 1).copied().unwrap_or(0.0),
        }
    }

    /// Closing-speed score relative to comparable finishers, recency decayed
    pub fn sectional_score(&self, records: &[PastRaceRecord], ctx: &TargetRaceContext) -> f64 {
        let cfg = &self.config.sectional;
        let mut score = 0.0;

        for (idx, record) in self.window(records).iter().enumerate() {
            let own = match record.sectional {
                Some(s) if s > 0.0 && record.distance > 0 => s,
                _ => continue,
            };

            let (reference, source) = self.sectional_reference(record);
            let diff = reference - own;
            let base = if record.distance <= cfg.sprint_max_distance {
                cfg.sprint_points.at_least(diff)
            } else {
                cfg.route_points.at_least(diff)
            };

            let grade = RaceGrade::detect(&record.label);
            let bonus = self.finish_bonus(grade, record.finish_position);
            let points = base + bonus * cfg.finish_bonus_scale;

            let mut reliability = self.config.grades.coefficient(grade) * self.config.decay(idx);
            if is_regional(&record.label, &record.course) {
                reliability *= cfg.regional_factor;
            }
            if Self::surface_of(record) != ctx.surface {
                reliability *= cfg.surface_mismatch_factor;
            }

            debug!(
                "[{}] 3F {:.1} vs {:.2} ({:?}) diff {:+.2} -> {:.1} pts x {:.3}",
                idx + 1,
                own,
                reference,
                source,
                diff,
                points,
                reliability
            );
            score += points * reliability;
        }

        round1(score)
    }

    // ------------------------------------------------------------------
    // Distance / course suitability
    // ------------------------------------------------------------------

    /// Base points for a distance difference; symmetric in sign
    pub fn distance_base_points(&self, target: u32, past: u32) -> f64 {
        let cfg = &self.config.suitability;
        let diff = target.abs_diff(past);
        if diff <= cfg.near_window {
            let span = cfg.distance_full - cfg.distance_near;
            cfg.distance_full - diff as f64 / cfg.near_window as f64 * span
        } else if diff <= cfg.mid_window {
            cfg.distance_near
        } else if diff <= cfg.far_window {
            cfg.distance_mid
        } else {
            0.0
        }
    }

    fn weighted_suitability<F>(&self, records: &[PastRaceRecord], base_points: F) -> f64
    where
        F: Fn(&PastRaceRecord) -> Option<f64>,
    {
        let cfg = &self.config.suitability;
        let mut weighted = 0.0;
        let mut denom = 0.0;

        for (idx, record) in self.window(records).iter().enumerate() {
            let Some(base) = base_points(record) else {
                continue;
            };
            let w = cfg.weights.get(idx).copied().unwrap_or(0.0);
            weighted += base * self.margin_coefficient(record) * w;
            denom += w;
        }

        if denom == 0.0 {
            return 0.0;
        }
        round1((weighted / denom).min(cfg.cap))
    }

    pub fn distance_score(&self, records: &[PastRaceRecord], target_distance: u32) -> f64 {
        self.weighted_suitability(records, |r| {
            (r.distance > 0).then(|| self.distance_base_points(target_distance, r.distance))
        })
    }

    /// Course points never transfer across venues
    pub fn course_base_points(&self, record: &PastRaceRecord, ctx: &TargetRaceContext) -> f64 {
        let cfg = &self.config.suitability;
        if record.course != ctx.course {
            return 0.0;
        }
        let surface = Self::surface_of(record);
        let same_surface = surface == ctx.surface
            || surface == Surface::Unknown
            || ctx.surface == Surface::Unknown;
        if same_surface {
            cfg.same_course
        } else {
            cfg.same_course_other_surface
        }
    }

    pub fn course_score(&self, records: &[PastRaceRecord], ctx: &TargetRaceContext) -> f64 {
        self.weighted_suitability(records, |r| Some(self.course_base_points(r, ctx)))
    }

    // ------------------------------------------------------------------
    // Impost
    // ------------------------------------------------------------------

    /// Standard impost for the horse's age and sex
    pub fn baseline_impost(entrant: &RaceEntrant) -> f64 {
        match (entrant.age, entrant.sex) {
            (Some(age), Some(sex)) => match age {
                a if a >= 4 => {
                    if sex.is_female() {
                        56.0
                    } else {
                        58.0
                    }
                }
                3 => {
                    if sex.is_female() {
                        55.0
                    } else {
                        57.0
                    }
                }
                _ => 55.0,
            },
            _ => 58.0,
        }
    }

    /// One point per kilogram below (bonus) or above (penalty) the baseline
    pub fn impost_adjustment(&self, entrant: &RaceEntrant) -> f64 {
        if entrant.impost <= 0.0 {
            return 0.0;
        }
        round1(Self::baseline_impost(entrant) - entrant.impost)
    }

    // ------------------------------------------------------------------
    // Late 4F
    // ------------------------------------------------------------------

    pub fn late_section_score(&self, records: &[PastRaceRecord], ctx: &TargetRaceContext) -> f64 {
        let cfg = &self.config.late_section;
        if !ctx.is_long_distance_turf(cfg.min_distance) {
            return 0.0;
        }

        let baseline = cfg.baselines.at_most(ctx.distance as f64);
        let mut score = 0.0;

        for (idx, record) in self.window(records).iter().enumerate() {
            if Self::surface_of(record) != Surface::Turf || record.distance < cfg.min_distance {
                continue;
            }
            if is_regional(&record.label, &record.course) {
                continue;
            }

            let late = match (record.late_section, record.sectional) {
                (Some(late), _) if late > 0.0 => late,
                (_, Some(s)) if s > 0.0 => s * cfg.estimate_ratio + cfg.estimate_offset,
                _ => continue,
            };

            let diff = baseline - late;
            let points = diff * cfg.points_per_second * cfg.multipliers.at_least(diff);

            let reliability = match RaceGrade::detect(&record.label) {
                RaceGrade::G1 => cfg.g1_reliability,
                RaceGrade::G2 => cfg.g2_reliability,
                RaceGrade::G3 => cfg.g3_reliability,
                RaceGrade::Listed => cfg.listed_reliability,
                _ => cfg.other_reliability,
            };
            let finish = cfg.finish_factors.at_most(record.finish_position as f64);

            debug!(
                "[{}] late 4F {:.1} vs {:.1} -> {:.1} pts",
                idx + 1,
                late,
                baseline,
                points
            );
            score += points * reliability * self.config.decay(idx) * finish;
        }

        round1(score)
    }

    // ------------------------------------------------------------------
    // Layoff
    // ------------------------------------------------------------------

    /// Penalty for time off since the latest start; 0 when either date is unknown
    pub fn layoff_penalty(&self, records: &[PastRaceRecord], race_date: Option<NaiveDate>) -> f64 {
        let cfg = &self.config.layoff;
        let (Some(today), Some(last)) = (race_date, records.first().and_then(|r| r.date)) else {
            return 0.0;
        };

        let days = (today - last).num_days();
        if days <= cfg.grace_days {
            return 0.0;
        }
        let months = days as f64 / cfg.days_per_month;
        debug!("Layoff {} days ({:.1} months)", days, months);
        cfg.ladder.at_most(months)
    }

    // ------------------------------------------------------------------
    // Graded-race bonus
    // ------------------------------------------------------------------

    pub fn graded_bonus(&self, records: &[PastRaceRecord]) -> f64 {
        let cfg = &self.config.graded_bonus;
        let mut bonus = 0.0;

        for (idx, record) in self.window(records).iter().enumerate() {
            let table = match RaceGrade::detect(&record.label) {
                RaceGrade::G1 => &cfg.g1,
                RaceGrade::G2 => &cfg.g2,
                RaceGrade::G3 => &cfg.g3,
                RaceGrade::Listed => &cfg.listed,
                _ => continue,
            };
            let points = match record.finish_position {
                1 => table[0],
                2 | 3 => table[1],
                _ => table[2],
            };
            bonus += points * self.config.decay(idx);
        }

        round1(bonus)
    }

    // ------------------------------------------------------------------
    // Debut boost
    // ------------------------------------------------------------------

    /// Second-start boost; only for a single visible start that was a debut
    pub fn debut_boost(&self, records: &[PastRaceRecord]) -> f64 {
        let cfg = &self.config.debut;
        let [debut] = records else {
            return 0.0;
        };
        if !is_debut(&debut.label) {
            return 0.0;
        }

        let mut boost = match debut.finish_position {
            0 => 0.0,
            p => cfg.base.get(p as usize - 1).copied().unwrap_or(0.0),
        };

        let margin = debut.margin();
        let extras_factor = if margin >= cfg.void_margin {
            0.0
        } else if margin >= cfg.halve_margin {
            0.5
        } else {
            1.0
        };

        let has_field = debut.field.iter().any(|h| h.sectional.map_or(false, |s| s > 0.0));
        let own = debut.sectional.filter(|&s| s > 0.0);
        if let (true, Some(own), Some(avg)) = (has_field, own, debut.field_average_sectional()) {
            if avg - own >= cfg.sectional_margin {
                boost += cfg.sectional_bonus * extras_factor;
            }
            if debut.corner_ratio().map_or(false, |r| r > cfg.back_half_ratio) && own < avg {
                boost += cfg.position_bonus * extras_factor;
            }
        }

        debug!("Debut boost {:.1} (margin {:.2})", boost, margin);
        boost
    }

    // ------------------------------------------------------------------
    // Consecutive big losses
    // ------------------------------------------------------------------

    fn loss_excuse(&self, records: &[PastRaceRecord], idx: usize) -> Option<LossExcuse> {
        let cfg = &self.config.big_loss;
        let loss = &records[idx];
        if loss.after_non_finish {
            return Some(LossExcuse::AfterNonFinish);
        }
        let previous = records.get(idx + 1)?;
        if loss.distance > 0
            && previous.distance > 0
            && loss.distance.abs_diff(previous.distance) >= cfg.excuse_distance_change
        {
            return Some(LossExcuse::DistanceChange);
        }
        if let (Some(a), Some(b)) = (loss.date, previous.date) {
            if (a - b).num_days() >= cfg.excuse_layoff_days {
                return Some(LossExcuse::Layoff);
            }
        }
        None
    }

    /// Scan big losses from the most recent start backward.
    ///
    /// The scan stops at the first run that is not a big loss. Excused losses
    /// neither count nor stop the scan.
    pub fn scan_big_losses(&self, records: &[PastRaceRecord]) -> LossScan {
        let cfg = &self.config.big_loss;
        let window = self.window(records);
        let mut scan = LossScan::default();

        for (idx, record) in window.iter().enumerate() {
            let big = record.time_gap.map_or(false, |g| g >= cfg.threshold);
            if !big {
                break;
            }
            scan.big_losses += 1;
            match self.loss_excuse(window, idx) {
                Some(excuse) => scan.excused.push((idx, excuse)),
                None => scan.effective += 1,
            }
        }

        let tier = scan.effective.min(cfg.penalties.len().saturating_sub(1));
        scan.penalty = cfg.penalties.get(tier).copied().unwrap_or(0.0);
        scan
    }

    pub fn big_loss_penalty(&self, records: &[PastRaceRecord]) -> f64 {
        self.scan_big_losses(records).penalty
    }

    // ------------------------------------------------------------------
    // Win streak
    // ------------------------------------------------------------------

    pub fn win_streak_bonus(&self, records: &[PastRaceRecord]) -> f64 {
        let cfg = &self.config.win_streak;
        let mut bonus = 0.0;

        for (record, weight) in records.iter().zip(cfg.weights.iter()) {
            if !record.is_win() {
                break;
            }
            let margin = match record.winner_margin {
                Some(m) if m > 0.0 => m,
                _ => record.time_gap.map_or(0.0, f64::abs),
            };
            bonus += cfg.margin_points.at_least(margin) * weight;
        }

        round1(bonus.min(cfg.cap))
    }

    // ------------------------------------------------------------------
    // Course record comparison
    // ------------------------------------------------------------------

    /// Points for finishing `diff` seconds behind the course record
    pub fn record_gap_points(diff: f64) -> f64 {
        if diff <= 0.0 {
            10.0
        } else if diff <= 1.0 {
            10.0 - diff * 2.0
        } else if diff <= 2.0 {
            8.0 - (diff - 1.0) * 2.0
        } else if diff <= 4.0 {
            6.0 - (diff - 2.0) * 2.5
        } else {
            0.0
        }
    }

    /// Comparable runs against the record of the course and distance run
    pub fn record_comparisons(
        &self,
        records: &[PastRaceRecord],
        ctx: &TargetRaceContext,
    ) -> Vec<RecordComparison> {
        let cfg = &self.config.course_record;
        if ctx.surface != Surface::Turf {
            return Vec::new();
        }

        let mut comparisons = Vec::new();
        for (idx, record) in self.window(records).iter().enumerate() {
            if Self::surface_of(record) != ctx.surface {
                continue;
            }
            let dist_diff = record.distance.abs_diff(ctx.distance);
            if dist_diff > cfg.distance_tolerance {
                continue;
            }
            let Some(finish_time) = record.finish_time.filter(|&t| t > 0.0) else {
                continue;
            };

            let variant = detect_variant(&record.course, record.distance, &record.distance_text);
            let Some(cr) = course_record(&variant, record.distance) else {
                debug!("[{}] no course record for {} {}m", idx + 1, variant, record.distance);
                continue;
            };

            let mut weight = cfg.weights.get(idx).copied().unwrap_or(0.0);
            if dist_diff != 0 {
                weight *= cfg.off_distance_factor;
            }
            comparisons.push(RecordComparison {
                index: idx,
                variant: variant.to_string(),
                distance: record.distance,
                finish_time,
                record: cr,
                points: Self::record_gap_points(finish_time - cr),
                weight,
            });
        }
        comparisons
    }

    pub fn course_record_score(&self, records: &[PastRaceRecord], ctx: &TargetRaceContext) -> f64 {
        let total: f64 = self
            .record_comparisons(records, ctx)
            .iter()
            .map(|c| c.points * c.weight)
            .sum();
        round1(total.clamp(0.0, self.config.course_record.cap))
    }

    // ------------------------------------------------------------------
    // Style / danger
    // ------------------------------------------------------------------

    /// Affinity x confidence x course weight; 0 without style or pace
    pub fn style_bonus(
        &self,
        style: Option<&StyleClassification>,
        pace: Option<&PacePrediction>,
        ctx: &TargetRaceContext,
    ) -> f64 {
        let (Some(style), Some(pace)) = (style, pace) else {
            return 0.0;
        };
        if style.style == RunningStyle::Unknown {
            return 0.0;
        }
        let raw = style_match_bonus(
            style.style,
            pace.pace,
            &ctx.course,
            ctx.distance,
            &self.config.style,
        );
        raw * style.confidence * style_weight(&ctx.course, ctx.distance, style.style)
    }

    /// Regional majority in the window and the latest start still regional
    pub fn danger_flags(&self, records: &[PastRaceRecord]) -> Vec<DangerFlag> {
        let window = self.window(records);
        let Some(latest) = window.first() else {
            return Vec::new();
        };
        let regional = window
            .iter()
            .filter(|r| is_regional(&r.label, &r.course))
            .count();
        if regional * 2 > window.len() && is_regional(&latest.label, &latest.course) {
            vec![DangerFlag::RegionalTransfer]
        } else {
            Vec::new()
        }
    }

    // ------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------

    fn normalize(raw: f64, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        (raw / max * 100.0).clamp(-100.0, 100.0)
    }

    /// Score one entrant against the target race.
    ///
    /// `records` must be most recent first; only the lookback window is used.
    /// An empty history scores 0.0 everywhere.
    pub fn compute_score(
        &self,
        entrant: &RaceEntrant,
        records: &[PastRaceRecord],
        ctx: &TargetRaceContext,
        style: Option<&StyleClassification>,
        pace: Option<&PacePrediction>,
    ) -> ScoreBreakdown {
        let cfg = &self.config;
        let comp = &cfg.composition;
        let records = self.window(records);
        let long_distance = ctx.is_long_distance_turf(comp.long_distance_min);

        let mut b = ScoreBreakdown {
            long_distance,
            config_version: cfg.version.clone(),
            ..Default::default()
        };

        if records.is_empty() {
            b.notes.push("no qualifying history".to_string());
            b.contributions = Component::ORDER
                .iter()
                .map(|&component| Contribution {
                    component,
                    raw: 0.0,
                    value: 0.0,
                })
                .collect();
            debug!("{}: no history, all sub-scores 0", entrant.name);
            return b;
        }

        b.sectional = self.sectional_score(records, ctx);
        b.late_section = self.late_section_score(records, ctx);
        b.distance = self.distance_score(records, ctx.distance);
        b.course = self.course_score(records, ctx);
        b.style_bonus = self.style_bonus(style, pace, ctx);
        b.impost = self.impost_adjustment(entrant);
        b.layoff = self.layoff_penalty(records, ctx.race_date);
        b.graded_bonus = self.graded_bonus(records);
        b.debut_boost = self.debut_boost(records);
        let losses = self.scan_big_losses(records);
        b.big_loss = losses.penalty;
        b.win_streak = self.win_streak_bonus(records);
        let comparisons = self.record_comparisons(records, ctx);
        b.course_record = self.course_record_score(records, ctx);
        b.danger_flags = self.danger_flags(records);
        if !b.danger_flags.is_empty() {
            b.danger = cfg.regional_penalty;
        }

        let preset = if long_distance {
            &comp.long_distance
        } else {
            &comp.standard
        };
        let weighted = |raw: f64, max: f64, weight: f64| Self::normalize(raw, max) * weight;

        let terms = [
            (
                Component::Sectional,
                b.sectional,
                weighted(b.sectional, comp.max_sectional, preset.sectional),
            ),
            (
                Component::LateSection,
                b.late_section,
                weighted(b.late_section, comp.max_late_section, preset.late_section),
            ),
            (
                Component::Distance,
                b.distance,
                weighted(b.distance, comp.max_distance, preset.distance),
            ),
            (
                Component::Course,
                b.course,
                weighted(b.course, comp.max_course, preset.course),
            ),
            (
                Component::Style,
                b.style_bonus,
                weighted(b.style_bonus, comp.max_style, preset.style),
            ),
            (Component::Impost, b.impost, b.impost),
            (Component::Layoff, b.layoff, b.layoff),
            (Component::GradedBonus, b.graded_bonus, b.graded_bonus),
            (Component::DebutBoost, b.debut_boost, b.debut_boost),
            (Component::BigLoss, b.big_loss, b.big_loss),
            (Component::WinStreak, b.win_streak, b.win_streak),
            (Component::CourseRecord, b.course_record, b.course_record),
            (Component::Danger, b.danger, b.danger),
        ];

        b.contributions = terms
            .iter()
            .map(|&(component, raw, value)| Contribution {
                component,
                raw,
                value: round1(value),
            })
            .collect();
        b.total = round1(b.contributions.iter().map(|c| c.value).sum());

        self.add_notes(&mut b, records, ctx, style, pace, &losses, &comparisons);
        debug!("{}: total {:.1}", entrant.name, b.total);
        b
    }

    #[allow(clippy::too_many_arguments)]
    fn add_notes(
        &self,
        b: &mut ScoreBreakdown,
        records: &[PastRaceRecord],
        ctx: &TargetRaceContext,
        style: Option<&StyleClassification>,
        pace: Option<&PacePrediction>,
        losses: &LossScan,
        comparisons: &[RecordComparison],
    ) {
        if ctx.race_date.is_none() {
            b.notes.push("race date not set, layoff not assessed".to_string());
        } else if records.first().and_then(|r| r.date).is_none() {
            b.notes.push("latest start has no date, layoff not assessed".to_string());
        }

        for (idx, record) in records.iter().enumerate() {
            if record.sectional.map_or(false, |s| s > 0.0) {
                let (reference, source) = self.sectional_reference(record);
                if source == ReferenceSource::Baseline {
                    b.notes.push(format!(
                        "start {}: no field sectionals, compared with baseline {:.1}",
                        idx + 1,
                        reference
                    ));
                }
            }
        }

        match (style, pace) {
            (Some(s), Some(p)) if s.style != RunningStyle::Unknown => b.notes.push(format!(
                "style {} ({:.2}) at {} pace",
                s.style.label(),
                s.confidence,
                p.pace.label()
            )),
            _ => b.notes.push("style or pace unknown, no style bonus".to_string()),
        }

        if losses.big_losses > 0 {
            b.notes.push(format!(
                "{} consecutive big losses, {} counted",
                losses.big_losses, losses.effective
            ));
            for (idx, excuse) in &losses.excused {
                b.notes
                    .push(format!("start {}: big loss excused ({})", idx + 1, excuse.label()));
            }
        }

        for c in comparisons {
            b.notes.push(format!(
                "start {}: {} {}m in {:.1}s vs record {:.1}s -> {:.1} x {:.2}",
                c.index + 1,
                c.variant,
                c.distance,
                c.finish_time,
                c.record,
                c.points,
                c.weight
            ));
        }
    }
}
