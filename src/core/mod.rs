//! Core scoring logic

pub mod breakdown;
pub mod course;
pub mod grade;
pub mod scorer;
pub mod style;

// Re-export commonly used types
pub use breakdown::{Component, Contribution, DangerFlag, ScoreBreakdown};
pub use course::{
    baseline_sectional_time, course_record, detect_variant, CourseProfile, CourseVariant, Loop,
};
pub use grade::{classify, is_regional, RaceGrade};
pub use scorer::{LossExcuse, LossScan, RecordComparison, ReferenceSource, ScoreCalculator};
pub use style::{aggregate, aggregate_field, classify_one, predict_pace, style_match_bonus};
