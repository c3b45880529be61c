pub mod bank;
pub mod controller;
pub mod report;
pub mod scoring;
pub mod session;

use std::fmt;

/// Telegram user identifier, kept as a plain integer so the quiz core
/// doesn't depend on the transport.
pub type UserId = u64;

/// Lowest and highest points on the Likert scale.
pub const MIN_ANSWER: u8 = 1;
pub const MAX_ANSWER: u8 = 5;

/// Coping strategy a question is tagged with, e.g. "избегание".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Strategy(String);

impl Strategy {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "question")]
    pub text: String,
    pub strategy: Strategy,
}

impl Question {
    pub fn new(id: u32, text: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            id,
            text: text.into(),
            strategy,
        }
    }
}

/// A single answer on the 1..=5 scale. Can only be built through
/// [`AnswerValue::new`], so a stored answer is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerValue(u8);

impl AnswerValue {
    pub fn new(value: u8) -> Result<Self, session::SessionError> {
        if !(MIN_ANSWER..=MAX_ANSWER).contains(&value) {
            return Err(session::SessionError::InvalidAnswer(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_value_accepts_the_likert_range() {
        for value in MIN_ANSWER..=MAX_ANSWER {
            assert_eq!(AnswerValue::new(value).unwrap().get(), value);
        }
    }

    #[test]
    fn answer_value_rejects_out_of_range() {
        assert!(matches!(
            AnswerValue::new(0),
            Err(session::SessionError::InvalidAnswer(0))
        ));
        assert!(matches!(
            AnswerValue::new(6),
            Err(session::SessionError::InvalidAnswer(6))
        ));
    }

    #[test]
    fn question_deserializes_from_bank_shape() {
        let question: Question =
            serde_json::from_str(r#"{"id": 7, "question": "Я ищу поддержку", "strategy": "поиск поддержки"}"#)
                .unwrap();
        assert_eq!(question.id, 7);
        assert_eq!(question.text, "Я ищу поддержку");
        assert_eq!(question.strategy, Strategy::new("поиск поддержки"));
    }
}
