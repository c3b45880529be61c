use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use thiserror::Error;

use crate::quiz::bank::QuestionBank;
use crate::quiz::report;
use crate::quiz::scoring::{self, ScoringError};
use crate::quiz::session::{SessionError, SessionStore};
use crate::quiz::{AnswerValue, UserId};

/// An encouragement is sent after every this many answers.
const ENCOURAGE_EVERY: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("user has no session")]
    SessionNotFound,
    #[error("no questions available")]
    NoQuestions,
    #[error("answer {0} is outside the scale")]
    InvalidAnswer(u8),
    #[error("quiz already completed")]
    AlreadyCompleted,
    #[error("user is not an admin")]
    Forbidden,
    #[error("nothing was answered")]
    NothingAnswered,
}

impl From<SessionError> for ControllerError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotFound(_) => ControllerError::SessionNotFound,
            SessionError::InvalidAnswer(value) => ControllerError::InvalidAnswer(value),
        }
    }
}

impl From<ScoringError> for ControllerError {
    fn from(error: ScoringError) -> Self {
        match error {
            ScoringError::NoAnswers => ControllerError::NothingAnswered,
        }
    }
}

/// What the transport should send back, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text(String),
    /// Needs the 1..=5 answer keyboard.
    Question(String),
    /// Final report: shown after the processing animation, with the reflection button.
    Report(String),
}

pub type Reply = Result<Vec<Outgoing>, ControllerError>;

/// Drives the quiz for every user. Holds no transport types, so each
/// operation is a plain function of the stored session and its input.
pub struct QuizController {
    // None when the questions file failed to load at startup.
    bank: Option<QuestionBank>,
    sessions: Arc<dyn SessionStore>,
    admins: HashSet<UserId>,
}

impl QuizController {
    pub fn new(
        bank: Option<QuestionBank>,
        sessions: Arc<dyn SessionStore>,
        admins: HashSet<UserId>,
    ) -> Self {
        Self {
            bank,
            sessions,
            admins,
        }
    }

    fn bank(&self) -> Result<&QuestionBank, ControllerError> {
        self.bank
            .as_ref()
            .filter(|bank| !bank.is_empty())
            .ok_or(ControllerError::NoQuestions)
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        let is_admin = self.admins.contains(&user_id);
        log::debug!("Admin check for user {}: {}", user_id, is_admin);
        is_admin
    }

    /// `/start`: resets the user's progress and asks the first question.
    pub fn begin(&self, user_id: UserId, user_name: &str) -> Reply {
        let bank = self.bank()?;
        self.sessions.start(user_id);

        Ok(vec![
            Outgoing::Text(report::welcome_message(user_name)),
            self.question(bank, 0)?,
        ])
    }

    /// `/next`: repeats the current question, or the report once every
    /// question is answered.
    pub fn advance(&self, user_id: UserId, user_name: &str) -> Reply {
        let bank = self.bank()?;
        let session = self
            .sessions
            .get(user_id)
            .ok_or(ControllerError::SessionNotFound)?;

        if session.current_question >= bank.len() {
            return Ok(vec![self.finish(bank, user_id, user_name)?]);
        }
        Ok(vec![self.question(bank, session.current_question)?])
    }

    pub fn submit_answer(&self, user_id: UserId, user_name: &str, value: u8) -> Reply {
        let bank = self.bank()?;
        let session = self
            .sessions
            .get(user_id)
            .ok_or(ControllerError::SessionNotFound)?;
        let value = AnswerValue::new(value)?;

        let index = session.current_question;
        let question = bank.get(index).ok_or(ControllerError::AlreadyCompleted)?;
        self.sessions.record_answer(user_id, question.id, value)?;
        let next = self.sessions.advance(user_id)?;

        if next < bank.len() {
            let mut replies = Vec::with_capacity(2);
            if next % ENCOURAGE_EVERY == 0 {
                if let Some(text) = report::ENCOURAGEMENT_MESSAGES.choose(&mut rand::thread_rng()) {
                    replies.push(Outgoing::Text(text.to_string()));
                }
            }
            replies.push(self.question(bank, next)?);
            return Ok(replies);
        }

        Ok(vec![self.finish(bank, user_id, user_name)?])
    }

    /// `/admin`: usage statistics, only for the configured admin ids.
    pub fn request_admin_stats(&self, user_id: UserId, user_name: &str) -> Reply {
        if !self.is_admin(user_id) {
            log::info!("Rejected stats request from user {}", user_id);
            return Err(ControllerError::Forbidden);
        }
        let stats = self.sessions.stats();
        Ok(vec![Outgoing::Text(report::stats_message(&stats, user_name))])
    }

    pub fn reflection(&self, user_id: UserId) -> Reply {
        log::info!("Reflection file requested by user {}", user_id);
        Ok(vec![Outgoing::Text(report::reflection_message().to_string())])
    }

    fn question(&self, bank: &QuestionBank, index: usize) -> Result<Outgoing, ControllerError> {
        let question = bank.get(index).ok_or(ControllerError::NoQuestions)?;
        Ok(Outgoing::Question(report::question_text(
            index,
            bank.len(),
            question,
        )))
    }

    fn finish(
        &self,
        bank: &QuestionBank,
        user_id: UserId,
        user_name: &str,
    ) -> Result<Outgoing, ControllerError> {
        let session = self
            .sessions
            .get(user_id)
            .ok_or(ControllerError::SessionNotFound)?;
        let scores = scoring::score(&session.answers, bank.questions());
        let dominant = scores.dominant()?;
        let text = report::results_message(&scores, dominant, bank, user_name);

        self.sessions.mark_completed(user_id)?;
        log::info!(
            "Test completed for user {}, dominant strategy '{}'",
            user_id,
            dominant.strategy
        );
        Ok(Outgoing::Report(text))
    }
}
