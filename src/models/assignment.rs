// src/models/assignment.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// One of the four option labels of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    A,
    B,
    C,
    D,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    /// Position of the label's option text in `Question::options`.
    pub fn index(self) -> usize {
        match self {
            Label::A => 0,
            Label::B => 1,
            Label::C => 2,
            Label::D => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::A => "A",
            Label::B => "B",
            Label::C => "C",
            Label::D => "D",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Label::A),
            "B" | "b" => Ok(Label::B),
            "C" | "c" => Ok(Label::C),
            "D" | "d" => Ok(Label::D),
            other => Err(AppError::Validation(format!(
                "Unknown option label '{}', expected one of A, B, C, D",
                other
            ))),
        }
    }
}

fn default_points() -> u32 {
    1
}

/// A multiple-choice question. `index` is its 0-based display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub index: usize,

    /// The prompt shown to the student.
    pub text: String,

    pub instruction: Option<String>,

    /// Option texts for labels A, B, C and D, in that order.
    pub options: [String; 4],

    pub correct: Label,

    #[serde(default = "default_points")]
    pub points: u32,
}

impl Question {
    pub fn option(&self, label: Label) -> &str {
        &self.options[label.index()]
    }
}

/// A named, timed set of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_limit_minutes: u32,
    pub questions: Vec<Question>,
    /// Bumped on every question replacement. A submission is only recorded
    /// against the version it was graded on.
    pub questions_version: i64,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn summary(&self) -> AssignmentSummary {
        AssignmentSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            time_limit_minutes: self.time_limit_minutes,
            question_count: self.questions.len(),
            is_active: self.is_active,
        }
    }

    /// The student-facing view: questions without their answer key.
    pub fn paper(&self) -> AssignmentPaper {
        AssignmentPaper {
            assignment_id: self.id,
            title: self.title.clone(),
            time_limit_minutes: self.time_limit_minutes,
            questions: self.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// Listing entry, excludes questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_limit_minutes: u32,
    pub question_count: usize,
    pub is_active: bool,
}

/// DTO for sending a question to a student (excludes correct label and points).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub index: usize,
    pub text: String,
    pub instruction: Option<String>,
    pub options: [String; 4],
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            index: q.index,
            text: q.text.clone(),
            instruction: q.instruction.clone(),
            options: q.options.clone(),
        }
    }
}

/// Everything a timed attempt needs to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentPaper {
    pub assignment_id: i64,
    pub title: String,
    pub time_limit_minutes: u32,
    pub questions: Vec<PublicQuestion>,
}

/// Validated input for a new assignment, ready for storage.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub time_limit_minutes: u32,
    pub questions: Vec<Question>,
    pub is_active: bool,
    pub created_by: i64,
}

/// DTO for authoring one question.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[validate(length(max = 2000))]
    pub instruction: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: [String; 4],
    #[validate(custom(function = validate_label))]
    pub correct: String,
    #[validate(range(min = 1, max = 100))]
    pub points: Option<u32>,
}

/// DTO for creating a new assignment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: u32,
    #[validate(length(min = 1, max = 500), nested)]
    pub questions: Vec<QuestionInput>,
    pub is_active: Option<bool>,
}

/// DTO for replacing the whole question sequence.
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceQuestionsRequest {
    #[validate(length(min = 1, max = 500), nested)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

fn validate_label(label: &str) -> Result<(), validator::ValidationError> {
    label
        .parse::<Label>()
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("correct_label_must_be_a_to_d"))
}

/// Numbers validated inputs by position. Callers must run `validate()` first.
pub fn build_questions(inputs: Vec<QuestionInput>) -> Result<Vec<Question>, AppError> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            Ok(Question {
                index,
                text: input.text,
                instruction: input.instruction.filter(|s| !s.trim().is_empty()),
                options: input.options,
                correct: input.correct.parse()?,
                points: input.points.unwrap_or_else(default_points),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(correct: &str) -> QuestionInput {
        QuestionInput {
            text: "2 + 2 = ?".to_string(),
            instruction: None,
            options: ["3".into(), "4".into(), "5".into(), "22".into()],
            correct: correct.to_string(),
            points: None,
        }
    }

    #[test]
    fn label_parsing_accepts_only_a_to_d() {
        assert_eq!("B".parse::<Label>().unwrap(), Label::B);
        assert_eq!(" d ".parse::<Label>().unwrap(), Label::D);
        assert!("E".parse::<Label>().is_err());
        assert!("".parse::<Label>().is_err());
    }

    #[test]
    fn question_input_rejects_unknown_correct_label() {
        assert!(input("B").validate().is_ok());
        assert!(input("E").validate().is_err());
    }

    #[test]
    fn question_input_rejects_blank_option() {
        let mut q = input("A");
        q.options[2] = "   ".into();
        assert!(q.validate().is_err());
    }

    #[test]
    fn create_request_requires_questions() {
        let req = CreateAssignmentRequest {
            title: "Quiz".into(),
            description: None,
            time_limit_minutes: 10,
            questions: vec![],
            is_active: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_validates_each_question() {
        let mut bad = input("A");
        bad.options[0] = String::new();
        let req = CreateAssignmentRequest {
            title: "Quiz".into(),
            description: None,
            time_limit_minutes: 10,
            questions: vec![input("B"), bad],
            is_active: None,
        };
        assert!(req.validate().is_err());

        let req = ReplaceQuestionsRequest {
            questions: vec![input("B"), input("Z")],
        };
        assert!(req.validate().is_err());
        assert!(ReplaceQuestionsRequest { questions: vec![input("C")] }.validate().is_ok());
    }

    #[test]
    fn build_questions_numbers_by_position_and_defaults_points() {
        let questions = build_questions(vec![input("A"), input("C")]).unwrap();
        assert_eq!(questions[0].index, 0);
        assert_eq!(questions[1].index, 1);
        assert_eq!(questions[1].correct, Label::C);
        assert_eq!(questions[1].points, 1);
        assert_eq!(questions[1].option(Label::B), "4");
    }

    #[test]
    fn paper_hides_answer_key() {
        let assignment = Assignment {
            id: 7,
            title: "Arithmetic".into(),
            description: String::new(),
            time_limit_minutes: 5,
            questions: build_questions(vec![input("B")]).unwrap(),
            questions_version: 1,
            is_active: true,
            created_by: 1,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(assignment.paper()).unwrap();
        assert!(json["questions"][0].get("correct").is_none());
        assert_eq!(json["time_limit_minutes"], 5);
    }
}
