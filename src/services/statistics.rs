// src/services/statistics.rs

use crate::models::{
    statistics::{AssignmentStatistics, GradeDistribution},
    submission::Submission,
};

/// Aggregates the submissions of one assignment. Recomputed on every call.
pub fn aggregate(assignment_id: i64, submissions: &[Submission]) -> AssignmentStatistics {
    if submissions.is_empty() {
        return AssignmentStatistics {
            assignment_id,
            ..Default::default()
        };
    }

    let mut distribution = GradeDistribution::default();
    let mut sum: u64 = 0;
    let mut highest = u8::MIN;
    let mut lowest = u8::MAX;

    for submission in submissions {
        distribution.record(submission.letter_grade);
        sum += u64::from(submission.percentage);
        highest = highest.max(submission.percentage);
        lowest = lowest.min(submission.percentage);
    }

    let mean = sum as f64 / submissions.len() as f64;

    AssignmentStatistics {
        assignment_id,
        total_submissions: submissions.len() as u32,
        average_percentage: (mean * 10.0).round() / 10.0,
        highest_score: highest,
        lowest_score: lowest,
        grade_distribution: distribution,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::submission::LetterGrade;
    use crate::services::grading::letter_grade;

    fn submission(id: i64, percentage: u8) -> Submission {
        Submission {
            id,
            student_id: id,
            assignment_id: 1,
            answers: vec![],
            results: vec![],
            correct_answers: 0,
            total_questions: 0,
            score: 0,
            max_score: 0,
            percentage,
            letter_grade: letter_grade(percentage),
            time_spent_seconds: 60,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn empty_set_is_all_zero() {
        let stats = aggregate(1, &[]);
        assert_eq!(stats.total_submissions, 0);
        assert_eq!(stats.average_percentage, 0.0);
        assert_eq!(stats.highest_score, 0);
        assert_eq!(stats.lowest_score, 0);
        assert_eq!(stats.grade_distribution, GradeDistribution::default());
    }

    #[test]
    fn mean_high_low_and_histogram() {
        let subs = [submission(1, 100), submission(2, 80), submission(3, 60)];
        let stats = aggregate(1, &subs);
        assert_eq!(stats.total_submissions, 3);
        assert_eq!(stats.average_percentage, 80.0);
        assert_eq!(stats.highest_score, 100);
        assert_eq!(stats.lowest_score, 60);
        assert_eq!(stats.grade_distribution.count(LetterGrade::A), 1);
        assert_eq!(stats.grade_distribution.count(LetterGrade::B), 1);
        assert_eq!(stats.grade_distribution.count(LetterGrade::C), 0);
        assert_eq!(stats.grade_distribution.count(LetterGrade::D), 1);
        assert_eq!(stats.grade_distribution.count(LetterGrade::F), 0);
    }

    #[test]
    fn average_keeps_one_decimal() {
        let subs = [submission(1, 100), submission(2, 67), submission(3, 67)];
        // 234 / 3 = 78.0, then 100 + 67 = 83.5
        assert_eq!(aggregate(1, &subs).average_percentage, 78.0);
        assert_eq!(aggregate(1, &subs[..2]).average_percentage, 83.5);

        let subs = [submission(1, 33), submission(2, 34), submission(3, 34)];
        assert_eq!(aggregate(1, &subs).average_percentage, 33.7);
    }

    #[test]
    fn single_submission_is_both_high_and_low() {
        let stats = aggregate(9, &[submission(1, 45)]);
        assert_eq!(stats.assignment_id, 9);
        assert_eq!(stats.highest_score, 45);
        assert_eq!(stats.lowest_score, 45);
        assert_eq!(stats.grade_distribution.f, 1);
    }
}
