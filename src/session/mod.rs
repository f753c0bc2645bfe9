// src/session/mod.rs

//! One student's timed attempt at an assignment.
//!
//! `Loading -> InProgress -> Submitting -> Submitted`, or `Cancelled` from
//! `Loading` (fetch failed), `InProgress` (student gave up) and `Submitting`
//! (a timed-out submit refused for good; answers stay readable). The attempt
//! talks to the outside world only in `load` and while submitting; every
//! other operation is a synchronous in-memory mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        assignment::{AssignmentPaper, Label, PublicQuestion},
        submission::{Submission, SubmitAssignment},
    },
};

pub mod api;
pub mod timer;

pub use api::AssessmentApi;
pub use timer::{Clock, Countdown, IntervalTicker, ManualClock, SystemClock, Ticker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    InProgress,
    Submitting,
    Submitted,
    Cancelled,
}

/// What to send for a question the student never answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnansweredPolicy {
    /// Substitute a fixed label, graded like a deliberate choice.
    Placeholder(Label),
    /// Send the "no answer" marker. Graded wrong, still counted in the total.
    Blank,
}

impl Default for UnansweredPolicy {
    fn default() -> Self {
        UnansweredPolicy::Placeholder(Label::A)
    }
}

impl UnansweredPolicy {
    fn fill(self) -> Option<Label> {
        match self {
            UnansweredPolicy::Placeholder(label) => Some(label),
            UnansweredPolicy::Blank => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub unanswered: UnansweredPolicy,
}

/// How the attempt ended up with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This attempt recorded it.
    Recorded(Submission),
    /// One already existed when the attempt was opened.
    Existing(Submission),
    /// Another attempt won the race; the repository refused this one.
    AlreadySubmitted,
}

/// Result of asking to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    Submitted,
    AlreadySubmitted,
    /// Explicit submit found blanks; call again with `confirmed = true`.
    NeedsConfirmation { unanswered: Vec<usize> },
    /// A submit was already under way or done; nothing happened.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    /// Time ran out and the attempt was auto-submitted.
    Expired(SubmitAttempt),
    /// The session is not in progress; the tick was ignored.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NotInProgress(SessionState),
    QuestionOutOfRange { index: usize, total: usize },
    Load(AppError),
    Submit(AppError),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Load(err) | SessionError::Submit(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotInProgress(state) => write!(f, "session is {:?}, not in progress", state),
            SessionError::QuestionOutOfRange { index, total } => {
                write!(f, "question {} out of range (0..{})", index, total)
            }
            SessionError::Load(err) => write!(f, "failed to load assignment: {}", err),
            SessionError::Submit(err) => write!(f, "failed to submit: {}", err),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitTrigger {
    Explicit,
    Timeout,
}

pub struct Session {
    api: Arc<dyn AssessmentApi>,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
    assignment_id: i64,
    student_id: i64,
    state: SessionState,
    paper: Option<AssignmentPaper>,
    started_at: Option<DateTime<Utc>>,
    countdown: Countdown,
    current: usize,
    answers: BTreeMap<usize, Label>,
    submitted: AtomicBool,
    outcome: Option<SubmitOutcome>,
}

impl Session {
    pub fn new(
        api: Arc<dyn AssessmentApi>,
        clock: Arc<dyn Clock>,
        options: SessionOptions,
        assignment_id: i64,
        student_id: i64,
    ) -> Self {
        let mut countdown = Countdown::from_minutes(0);
        countdown.halt();
        Self {
            api,
            clock,
            options,
            assignment_id,
            student_id,
            state: SessionState::Loading,
            paper: None,
            started_at: None,
            countdown,
            current: 0,
            answers: BTreeMap::new(),
            submitted: AtomicBool::new(false),
            outcome: None,
        }
    }

    /// Creates a session and loads it in one go.
    pub async fn open(
        api: Arc<dyn AssessmentApi>,
        clock: Arc<dyn Clock>,
        options: SessionOptions,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(api, clock, options, assignment_id, student_id);
        session.load().await?;
        Ok(session)
    }

    /// Fetches the paper and starts the clock.
    ///
    /// Any failure cancels the session. If the student already has a
    /// submission for this assignment the session goes straight to `Submitted`.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Loading)?;

        let fetched = self.api.assignment_paper(self.assignment_id).await;
        let paper = match fetched {
            Ok(paper) if paper.questions.is_empty() => {
                return Err(self.fail_load(AppError::InvalidAssignment(format!(
                    "Assignment {} has no questions",
                    self.assignment_id
                ))));
            }
            Ok(paper) => paper,
            Err(e) => return Err(self.fail_load(e)),
        };

        let results = self.api.student_results(self.student_id).await;
        let existing = match results {
            Ok(results) => results
                .into_iter()
                .find(|s| s.assignment_id == self.assignment_id),
            Err(e) => return Err(self.fail_load(e)),
        };

        if let Some(submission) = existing {
            tracing::info!(
                assignment_id = self.assignment_id,
                student_id = self.student_id,
                submission_id = submission.id,
                "Assignment already submitted, opening for review"
            );
            self.submitted.store(true, Ordering::SeqCst);
            self.paper = Some(paper);
            self.outcome = Some(SubmitOutcome::Existing(submission));
            self.state = SessionState::Submitted;
            return Ok(());
        }

        self.countdown = Countdown::from_minutes(paper.time_limit_minutes);
        self.started_at = Some(self.clock.now());
        self.paper = Some(paper);
        self.state = SessionState::InProgress;
        tracing::info!(
            assignment_id = self.assignment_id,
            student_id = self.student_id,
            remaining = self.countdown.remaining(),
            "Session started"
        );
        Ok(())
    }

    fn fail_load(&mut self, err: AppError) -> SessionError {
        tracing::warn!(assignment_id = self.assignment_id, "Failed to load assignment: {}", err);
        self.state = SessionState::Cancelled;
        SessionError::Load(err)
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::NotInProgress(self.state))
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn assignment_id(&self) -> i64 {
        self.assignment_id
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn paper(&self) -> Option<&AssignmentPaper> {
        self.paper.as_ref()
    }

    pub fn total_questions(&self) -> usize {
        self.paper.as_ref().map_or(0, |p| p.questions.len())
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn is_timer_running(&self) -> bool {
        self.state == SessionState::InProgress && self.countdown.is_running()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&PublicQuestion> {
        self.paper.as_ref().and_then(|p| p.questions.get(self.current))
    }

    pub fn answer(&self, index: usize) -> Option<Label> {
        self.answers.get(&index).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn unanswered_indices(&self) -> Vec<usize> {
        (0..self.total_questions())
            .filter(|i| !self.answers.contains_key(i))
            .collect()
    }

    pub fn outcome(&self) -> Option<&SubmitOutcome> {
        self.outcome.as_ref()
    }

    /// The submission to review, if this attempt produced or found one.
    pub fn submission(&self) -> Option<&Submission> {
        match &self.outcome {
            Some(SubmitOutcome::Recorded(s)) | Some(SubmitOutcome::Existing(s)) => Some(s),
            _ => None,
        }
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        let total = self.total_questions();
        if index < total {
            Ok(())
        } else {
            Err(SessionError::QuestionOutOfRange { index, total })
        }
    }

    /// Records a choice, replacing any earlier one for that question.
    pub fn select_answer(&mut self, index: usize, label: Label) -> Result<(), SessionError> {
        self.expect_state(SessionState::InProgress)?;
        self.check_index(index)?;
        self.answers.insert(index, label);
        Ok(())
    }

    /// Jumps to any question.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.expect_state(SessionState::InProgress)?;
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    /// Moves forward one question, staying put on the last one.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        self.expect_state(SessionState::InProgress)?;
        if self.current + 1 < self.total_questions() {
            self.current += 1;
        }
        Ok(self.current)
    }

    /// Moves back one question, staying put on the first one.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.expect_state(SessionState::InProgress)?;
        self.current = self.current.saturating_sub(1);
        Ok(self.current)
    }

    /// Abandons the attempt. Nothing is written and the answers are dropped.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Loading | SessionState::InProgress => {
                self.countdown.halt();
                self.answers.clear();
                self.state = SessionState::Cancelled;
                tracing::info!(
                    assignment_id = self.assignment_id,
                    student_id = self.student_id,
                    "Session cancelled"
                );
                Ok(())
            }
            other => Err(SessionError::NotInProgress(other)),
        }
    }

    /// Explicit submit. Asks for confirmation first when questions are blank,
    /// unless `confirmed` is set.
    pub async fn submit(&mut self, confirmed: bool) -> Result<SubmitAttempt, SessionError> {
        match self.state {
            SessionState::InProgress => {}
            SessionState::Submitting | SessionState::Submitted => return Ok(SubmitAttempt::Ignored),
            other => return Err(SessionError::NotInProgress(other)),
        }

        if !confirmed {
            let unanswered = self.unanswered_indices();
            if !unanswered.is_empty() {
                return Ok(SubmitAttempt::NeedsConfirmation { unanswered });
            }
        }

        self.finish(SubmitTrigger::Explicit).await
    }

    /// Advances the countdown by one second; auto-submits when it reaches zero.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        if self.state != SessionState::InProgress {
            return Ok(TickOutcome::Stopped);
        }

        let remaining = self.countdown.tick();
        if remaining > 0 {
            return Ok(TickOutcome::Running { remaining });
        }

        tracing::info!(
            assignment_id = self.assignment_id,
            student_id = self.student_id,
            answered = self.answers.len(),
            "Time expired, auto-submitting"
        );
        let attempt = self.finish(SubmitTrigger::Timeout).await?;
        Ok(TickOutcome::Expired(attempt))
    }

    fn build_command(&self) -> SubmitAssignment {
        let fill = self.options.unanswered.fill();
        let answers = (0..self.total_questions())
            .map(|i| self.answers.get(&i).copied().or(fill))
            .collect();
        let elapsed = self
            .started_at
            .map_or(0, |start| (self.clock.now() - start).num_seconds().max(0));

        SubmitAssignment {
            assignment_id: self.assignment_id,
            student_id: self.student_id,
            answers,
            time_spent_seconds: u32::try_from(elapsed).unwrap_or(u32::MAX),
        }
    }

    async fn finish(&mut self, trigger: SubmitTrigger) -> Result<SubmitAttempt, SessionError> {
        if self
            .submitted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(SubmitAttempt::Ignored);
        }

        self.state = SessionState::Submitting;
        self.countdown.halt();
        let command = self.build_command();

        let result = self.api.submit_assignment(command).await;
        match result {
            Ok(submission) => {
                tracing::info!(
                    submission_id = submission.id,
                    trigger = ?trigger,
                    percentage = submission.percentage,
                    "Attempt submitted"
                );
                self.outcome = Some(SubmitOutcome::Recorded(submission));
                self.state = SessionState::Submitted;
                Ok(SubmitAttempt::Submitted)
            }
            Err(AppError::AlreadySubmitted(_)) => {
                tracing::warn!(
                    assignment_id = self.assignment_id,
                    student_id = self.student_id,
                    "Submission already exists, treating attempt as submitted"
                );
                self.outcome = Some(SubmitOutcome::AlreadySubmitted);
                self.state = SessionState::Submitted;
                Ok(SubmitAttempt::AlreadySubmitted)
            }
            Err(e) if trigger == SubmitTrigger::Timeout && !e.is_retryable() => {
                // Time is up and resubmitting the same answers cannot succeed.
                tracing::error!(
                    assignment_id = self.assignment_id,
                    student_id = self.student_id,
                    "Auto-submit refused, closing the attempt: {}",
                    e
                );
                self.state = SessionState::Cancelled;
                Err(SessionError::Submit(e))
            }
            Err(e) => {
                tracing::warn!(trigger = ?trigger, "Submit failed, answers kept for retry: {}", e);
                self.submitted.store(false, Ordering::SeqCst);
                self.countdown.resume();
                self.state = SessionState::InProgress;
                Err(SessionError::Submit(e))
            }
        }
    }
}

/// Ticks a shared session until it leaves `InProgress`.
///
/// Transient auto-submit failures are retried on the next tick; any other
/// failure stops the loop and is returned, with the session `Cancelled`.
pub async fn run_countdown<T: Ticker>(
    session: Arc<tokio::sync::Mutex<Session>>,
    mut ticker: T,
) -> Result<SessionState, SessionError> {
    loop {
        ticker.tick().await;
        let mut session = session.lock().await;
        match session.tick().await {
            Ok(TickOutcome::Running { .. }) => {}
            Ok(TickOutcome::Expired(_)) | Ok(TickOutcome::Stopped) => return Ok(session.state()),
            Err(e) if e.is_retryable() => {
                tracing::warn!("Auto-submit failed, retrying on next tick: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::models::submission::LetterGrade;

    /// Scripted contract: records submits and fails the first `fail_submits` calls.
    #[derive(Default)]
    struct FakeApi {
        time_limit_minutes: u32,
        question_count: usize,
        fail_paper: bool,
        fail_submits: Mutex<u32>,
        reject_as_duplicate: bool,
        reject_as_conflict: bool,
        existing: Option<Submission>,
        submits: Mutex<Vec<SubmitAssignment>>,
    }

    impl FakeApi {
        fn new(question_count: usize, time_limit_minutes: u32) -> Self {
            Self {
                question_count,
                time_limit_minutes,
                ..Default::default()
            }
        }

        fn submits(&self) -> Vec<SubmitAssignment> {
            self.submits.lock().unwrap().clone()
        }
    }

    fn submission_for(command: &SubmitAssignment) -> Submission {
        Submission {
            id: 1,
            student_id: command.student_id,
            assignment_id: command.assignment_id,
            answers: command.answers.clone(),
            results: vec![],
            correct_answers: 0,
            total_questions: command.answers.len() as u32,
            score: 0,
            max_score: 0,
            percentage: 0,
            letter_grade: LetterGrade::F,
            time_spent_seconds: command.time_spent_seconds,
            submitted_at: Utc::now(),
        }
    }

    #[async_trait]
    impl AssessmentApi for FakeApi {
        async fn assignment_paper(&self, assignment_id: i64) -> Result<AssignmentPaper, AppError> {
            if self.fail_paper {
                return Err(AppError::TransientIo("offline".into()));
            }
            Ok(AssignmentPaper {
                assignment_id,
                title: "Fake".into(),
                time_limit_minutes: self.time_limit_minutes,
                questions: (0..self.question_count)
                    .map(|index| PublicQuestion {
                        index,
                        text: format!("Q{}", index),
                        instruction: None,
                        options: ["a".into(), "b".into(), "c".into(), "d".into()],
                    })
                    .collect(),
            })
        }

        async fn submit_assignment(&self, command: SubmitAssignment) -> Result<Submission, AppError> {
            self.submits.lock().unwrap().push(command.clone());
            {
                let mut failures = self.fail_submits.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(AppError::TransientIo("connection reset".into()));
                }
            }
            if self.reject_as_duplicate {
                return Err(AppError::AlreadySubmitted("dup".into()));
            }
            if self.reject_as_conflict {
                return Err(AppError::Conflict("questions changed".into()));
            }
            Ok(submission_for(&command))
        }

        async fn student_results(&self, _student_id: i64) -> Result<Vec<Submission>, AppError> {
            Ok(self.existing.clone().into_iter().collect())
        }
    }

    async fn open(api: Arc<FakeApi>, clock: ManualClock) -> Session {
        Session::open(api, Arc::new(clock), SessionOptions::default(), 10, 20)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn load_starts_countdown_from_time_limit() {
        let session = open(Arc::new(FakeApi::new(4, 2)), ManualClock::default()).await;
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.remaining_seconds(), 120);
        assert_eq!(session.total_questions(), 4);
        assert_eq!(session.current_question().unwrap().text, "Q0");
    }

    #[tokio::test]
    async fn load_failure_cancels() {
        let api = Arc::new(FakeApi {
            fail_paper: true,
            ..FakeApi::new(4, 1)
        });
        let mut session = Session::new(api, Arc::new(SystemClock), SessionOptions::default(), 1, 2);
        let err = session.load().await.unwrap_err();
        assert!(matches!(err, SessionError::Load(AppError::TransientIo(_))));
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[tokio::test]
    async fn empty_paper_cancels() {
        let mut session = Session::new(
            Arc::new(FakeApi::new(0, 1)),
            Arc::new(SystemClock),
            SessionOptions::default(),
            1,
            2,
        );
        let err = session.load().await.unwrap_err();
        assert!(matches!(err, SessionError::Load(AppError::InvalidAssignment(_))));
        assert_eq!(session.state(), SessionState::Cancelled);
    }

    #[tokio::test]
    async fn existing_submission_skips_the_attempt() {
        let existing = submission_for(&SubmitAssignment {
            assignment_id: 10,
            student_id: 20,
            answers: vec![Some(Label::B)],
            time_spent_seconds: 5,
        });
        let api = Arc::new(FakeApi {
            existing: Some(existing.clone()),
            ..FakeApi::new(1, 1)
        });
        let mut session = open(api.clone(), ManualClock::default()).await;
        assert_eq!(session.state(), SessionState::Submitted);
        assert_eq!(session.outcome(), Some(&SubmitOutcome::Existing(existing)));
        assert_eq!(session.tick().await.unwrap(), TickOutcome::Stopped);
        assert!(api.submits().is_empty());
    }

    #[tokio::test]
    async fn selection_is_last_write_wins_and_bounds_checked() {
        let mut session = open(Arc::new(FakeApi::new(3, 1)), ManualClock::default()).await;
        session.select_answer(1, Label::A).unwrap();
        session.select_answer(1, Label::C).unwrap();
        assert_eq!(session.answer(1), Some(Label::C));
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.unanswered_indices(), vec![0, 2]);

        assert_eq!(
            session.select_answer(3, Label::A),
            Err(SessionError::QuestionOutOfRange { index: 3, total: 3 })
        );
        assert!(session.go_to(5).is_err());
    }

    #[tokio::test]
    async fn navigation_is_free_and_clamped() {
        let mut session = open(Arc::new(FakeApi::new(3, 1)), ManualClock::default()).await;
        session.go_to(2).unwrap();
        assert_eq!(session.next().unwrap(), 2);
        assert_eq!(session.previous().unwrap(), 1);
        session.go_to(0).unwrap();
        assert_eq!(session.previous().unwrap(), 0);
    }

    #[tokio::test]
    async fn explicit_submit_with_blanks_needs_confirmation() {
        let api = Arc::new(FakeApi::new(3, 1));
        let mut session = open(api.clone(), ManualClock::default()).await;
        session.select_answer(0, Label::B).unwrap();

        let attempt = session.submit(false).await.unwrap();
        assert_eq!(
            attempt,
            SubmitAttempt::NeedsConfirmation { unanswered: vec![1, 2] }
        );
        assert_eq!(session.state(), SessionState::InProgress);
        assert!(api.submits().is_empty());

        assert_eq!(session.submit(true).await.unwrap(), SubmitAttempt::Submitted);
        assert_eq!(
            api.submits()[0].answers,
            vec![Some(Label::B), Some(Label::A), Some(Label::A)]
        );
    }

    #[tokio::test]
    async fn blank_policy_sends_no_answer_marker() {
        let api = Arc::new(FakeApi::new(2, 1));
        let options = SessionOptions {
            unanswered: UnansweredPolicy::Blank,
        };
        let mut session = Session::open(api.clone(), Arc::new(SystemClock), options, 1, 2)
            .await
            .unwrap();
        session.select_answer(1, Label::D).unwrap();
        session.submit(true).await.unwrap();
        assert_eq!(api.submits()[0].answers, vec![None, Some(Label::D)]);
    }

    #[tokio::test]
    async fn elapsed_time_comes_from_the_clock() {
        let api = Arc::new(FakeApi::new(1, 5));
        let clock = ManualClock::default();
        let mut session = open(api.clone(), clock.clone()).await;
        session.select_answer(0, Label::A).unwrap();
        clock.advance(Duration::from_secs(95));
        session.submit(false).await.unwrap();
        assert_eq!(api.submits()[0].time_spent_seconds, 95);
        assert_eq!(session.submission().unwrap().time_spent_seconds, 95);
    }

    #[tokio::test]
    async fn timeout_auto_submits_exactly_once() {
        let api = Arc::new(FakeApi::new(4, 1));
        let mut session = open(api.clone(), ManualClock::default()).await;
        session.select_answer(0, Label::A).unwrap();
        session.select_answer(2, Label::C).unwrap();

        for expected in (1..60).rev() {
            assert_eq!(
                session.tick().await.unwrap(),
                TickOutcome::Running { remaining: expected }
            );
        }
        assert_eq!(
            session.tick().await.unwrap(),
            TickOutcome::Expired(SubmitAttempt::Submitted)
        );
        assert_eq!(session.state(), SessionState::Submitted);

        // Stale ticks after expiry
        assert_eq!(session.tick().await.unwrap(), TickOutcome::Stopped);
        assert_eq!(session.tick().await.unwrap(), TickOutcome::Stopped);

        let submits = api.submits();
        assert_eq!(submits.len(), 1);
        assert_eq!(
            submits[0].answers,
            vec![Some(Label::A), Some(Label::A), Some(Label::C), Some(Label::A)]
        );
    }

    #[tokio::test]
    async fn stale_tick_after_submit_is_ignored() {
        let api = Arc::new(FakeApi::new(1, 1));
        let mut session = open(api.clone(), ManualClock::default()).await;
        session.select_answer(0, Label::A).unwrap();
        session.submit(false).await.unwrap();

        assert_eq!(session.tick().await.unwrap(), TickOutcome::Stopped);
        assert_eq!(session.submit(true).await.unwrap(), SubmitAttempt::Ignored);
        assert_eq!(api.submits().len(), 1);
        assert!(!session.is_timer_running());
    }

    #[tokio::test]
    async fn transient_failure_reverts_to_in_progress() {
        let api = Arc::new(FakeApi {
            fail_submits: Mutex::new(1),
            ..FakeApi::new(2, 1)
        });
        let mut session = open(api.clone(), ManualClock::default()).await;
        session.select_answer(0, Label::B).unwrap();
        session.tick().await.unwrap();

        let err = session.submit(true).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.answer(0), Some(Label::B));
        assert_eq!(session.remaining_seconds(), 59);
        assert!(session.is_timer_running());

        assert_eq!(session.submit(true).await.unwrap(), SubmitAttempt::Submitted);
        assert_eq!(api.submits().len(), 2);
    }

    #[tokio::test]
    async fn failed_auto_submit_retries_on_next_tick() {
        let api = Arc::new(FakeApi {
            fail_submits: Mutex::new(1),
            ..FakeApi::new(1, 1)
        });
        let mut session = open(api.clone(), ManualClock::default()).await;
        for _ in 0..59 {
            session.tick().await.unwrap();
        }
        assert!(session.tick().await.is_err());
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.remaining_seconds(), 0);

        assert_eq!(
            session.tick().await.unwrap(),
            TickOutcome::Expired(SubmitAttempt::Submitted)
        );
        assert_eq!(api.submits().len(), 2);
    }

    #[tokio::test]
    async fn refused_auto_submit_closes_the_attempt() {
        let api = Arc::new(FakeApi {
            reject_as_conflict: true,
            ..FakeApi::new(2, 1)
        });
        let mut session = open(api.clone(), ManualClock::default()).await;
        session.select_answer(1, Label::C).unwrap();
        for _ in 0..59 {
            session.tick().await.unwrap();
        }

        let err = session.tick().await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(session.state(), SessionState::Cancelled);
        assert!(!session.is_timer_running());
        assert_eq!(session.answer(1), Some(Label::C));

        // Closed for good: no edits, no more submits
        assert_eq!(
            session.select_answer(0, Label::A),
            Err(SessionError::NotInProgress(SessionState::Cancelled))
        );
        assert_eq!(session.tick().await.unwrap(), TickOutcome::Stopped);
        assert!(session.submit(true).await.is_err());
        assert_eq!(api.submits().len(), 1);
    }

    #[tokio::test]
    async fn refused_explicit_submit_stays_in_progress() {
        let api = Arc::new(FakeApi {
            reject_as_conflict: true,
            ..FakeApi::new(1, 1)
        });
        let mut session = open(api.clone(), ManualClock::default()).await;
        assert!(session.submit(true).await.is_err());
        assert_eq!(session.state(), SessionState::InProgress);
        assert!(session.is_timer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn run_countdown_stops_on_refused_auto_submit() {
        let api = Arc::new(FakeApi {
            reject_as_conflict: true,
            ..FakeApi::new(1, 1)
        });
        let session = Arc::new(tokio::sync::Mutex::new(
            open(api.clone(), ManualClock::default()).await,
        ));

        let err = run_countdown(session.clone(), IntervalTicker::every_second())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Submit(AppError::Conflict(_))));
        assert_eq!(session.lock().await.state(), SessionState::Cancelled);
        assert_eq!(api.submits().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_is_terminal() {
        let api = Arc::new(FakeApi {
            reject_as_duplicate: true,
            ..FakeApi::new(1, 1)
        });
        let mut session = open(api.clone(), ManualClock::default()).await;
        session.select_answer(0, Label::A).unwrap();
        assert_eq!(session.submit(false).await.unwrap(), SubmitAttempt::AlreadySubmitted);
        assert_eq!(session.state(), SessionState::Submitted);
        assert_eq!(session.outcome(), Some(&SubmitOutcome::AlreadySubmitted));
        assert!(session.submission().is_none());
        assert_eq!(session.submit(true).await.unwrap(), SubmitAttempt::Ignored);
        assert_eq!(api.submits().len(), 1);
    }

    #[tokio::test]
    async fn cancel_discards_answers_and_never_submits() {
        let api = Arc::new(FakeApi::new(2, 1));
        let mut session = open(api.clone(), ManualClock::default()).await;
        session.select_answer(0, Label::D).unwrap();
        session.cancel().unwrap();

        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.tick().await.unwrap(), TickOutcome::Stopped);
        assert!(matches!(
            session.submit(true).await,
            Err(SessionError::NotInProgress(SessionState::Cancelled))
        ));
        assert!(api.submits().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_countdown_auto_submits_on_expiry() {
        let api = Arc::new(FakeApi::new(2, 1));
        let session = Arc::new(tokio::sync::Mutex::new(
            open(api.clone(), ManualClock::default()).await,
        ));
        session.lock().await.select_answer(1, Label::B).unwrap();

        let started = tokio::time::Instant::now();
        let state = run_countdown(session.clone(), IntervalTicker::every_second())
            .await
            .unwrap();

        assert_eq!(state, SessionState::Submitted);
        assert_eq!(started.elapsed(), Duration::from_secs(60));
        assert_eq!(api.submits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_countdown_stops_after_explicit_submit() {
        let api = Arc::new(FakeApi::new(1, 10));
        let session = Arc::new(tokio::sync::Mutex::new(
            open(api.clone(), ManualClock::default()).await,
        ));
        let driver = tokio::spawn(run_countdown(session.clone(), IntervalTicker::every_second()));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        {
            let mut session = session.lock().await;
            session.select_answer(0, Label::C).unwrap();
            assert_eq!(session.submit(false).await.unwrap(), SubmitAttempt::Submitted);
        }

        let state = driver.await.unwrap().unwrap();
        assert_eq!(state, SessionState::Submitted);
        assert_eq!(api.submits().len(), 1);
    }
}
