// src/models/statistics.rs

use serde::{Deserialize, Serialize};

use crate::models::submission::LetterGrade;

/// Number of submissions per letter grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: u32,
    #[serde(rename = "B")]
    pub b: u32,
    #[serde(rename = "C")]
    pub c: u32,
    #[serde(rename = "D")]
    pub d: u32,
    #[serde(rename = "F")]
    pub f: u32,
}

impl GradeDistribution {
    pub fn record(&mut self, grade: LetterGrade) {
        match grade {
            LetterGrade::A => self.a += 1,
            LetterGrade::B => self.b += 1,
            LetterGrade::C => self.c += 1,
            LetterGrade::D => self.d += 1,
            LetterGrade::F => self.f += 1,
        }
    }

    pub fn count(&self, grade: LetterGrade) -> u32 {
        match grade {
            LetterGrade::A => self.a,
            LetterGrade::B => self.b,
            LetterGrade::C => self.c,
            LetterGrade::D => self.d,
            LetterGrade::F => self.f,
        }
    }
}

/// Cohort statistics for one assignment. All zero when nobody has submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStatistics {
    pub assignment_id: i64,
    pub total_submissions: u32,
    /// Mean percentage rounded to one decimal place.
    pub average_percentage: f64,
    pub highest_score: u8,
    pub lowest_score: u8,
    pub grade_distribution: GradeDistribution,
}
