use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::quiz::{AnswerValue, UserId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no session for user {0}")]
    NotFound(UserId),
    #[error("answer {0} is outside the 1..=5 scale")]
    InvalidAnswer(u8),
}

/// Quiz progress of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserId,
    pub current_question: usize,
    /// Question id -> answer.
    pub answers: BTreeMap<u32, AnswerValue>,
    pub completed: bool,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            current_question: 0,
            answers: BTreeMap::new(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Every `start` ever made, restarts included.
    pub total_sessions: usize,
    pub completed_sessions: usize,
    /// Distinct users currently holding a session.
    pub active_users: usize,
}

/// Where sessions live. Only the in-memory backend exists today; the
/// controller only sees this trait.
pub trait SessionStore: Send + Sync {
    /// Creates a fresh session, replacing whatever the user had before.
    fn start(&self, user_id: UserId) -> Session;

    fn get(&self, user_id: UserId) -> Option<Session>;

    fn record_answer(
        &self,
        user_id: UserId,
        question_id: u32,
        value: AnswerValue,
    ) -> Result<(), SessionError>;

    /// Moves the user to the next question and returns the new index.
    fn advance(&self, user_id: UserId) -> Result<usize, SessionError>;

    fn mark_completed(&self, user_id: UserId) -> Result<(), SessionError>;

    fn stats(&self) -> Stats;
}

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<UserId, Session>,
    created: usize,
}

/// Sessions kept for the lifetime of the process. Nothing is ever evicted.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: Mutex<Inner>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A handler that panicked mid-update must not lock everyone else out.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for InMemorySessionStore {
    fn start(&self, user_id: UserId) -> Session {
        let session = Session::new(user_id);
        let mut inner = self.lock();
        inner.sessions.insert(user_id, session.clone());
        inner.created += 1;
        log::info!("Started new session for user {}", user_id);
        session
    }

    fn get(&self, user_id: UserId) -> Option<Session> {
        let session = self.lock().sessions.get(&user_id).cloned();
        log::debug!(
            "Retrieved session for user {}: {}",
            user_id,
            if session.is_some() { "found" } else { "not found" }
        );
        session
    }

    fn record_answer(
        &self,
        user_id: UserId,
        question_id: u32,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        let mut inner = self.lock();
        match inner.sessions.get_mut(&user_id) {
            Some(session) => {
                session.answers.insert(question_id, value);
                log::info!(
                    "Saved answer for user {}, question {}: {}",
                    user_id,
                    question_id,
                    value.get()
                );
                Ok(())
            }
            None => {
                log::warn!("Attempted to save answer without a session: user {}", user_id);
                Err(SessionError::NotFound(user_id))
            }
        }
    }

    fn advance(&self, user_id: UserId) -> Result<usize, SessionError> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .get_mut(&user_id)
            .ok_or(SessionError::NotFound(user_id))?;
        session.current_question += 1;
        Ok(session.current_question)
    }

    fn mark_completed(&self, user_id: UserId) -> Result<(), SessionError> {
        let mut inner = self.lock();
        match inner.sessions.get_mut(&user_id) {
            Some(session) => {
                session.completed = true;
                log::info!("Marked test as completed for user {}", user_id);
                Ok(())
            }
            None => {
                log::warn!("Attempted to mark completion without a session: user {}", user_id);
                Err(SessionError::NotFound(user_id))
            }
        }
    }

    fn stats(&self) -> Stats {
        let inner = self.lock();
        let stats = Stats {
            total_sessions: inner.created,
            completed_sessions: inner.sessions.values().filter(|s| s.completed).count(),
            active_users: inner.sessions.len(),
        };
        log::info!("Retrieved statistics: {:?}", stats);
        stats
    }
}
