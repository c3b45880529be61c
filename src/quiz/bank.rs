use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::quiz::{Question, Strategy};

/// Used in the report when the bank doesn't define a symbol for a strategy.
pub const DEFAULT_SYMBOL: &str = "•";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read questions file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed questions file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no questions available")]
    Empty,
    #[error("question id {0} is used more than once")]
    DuplicateId(u32),
    #[error("strategy '{0}' has no description")]
    MissingDescription(Strategy),
}

/// On-disk shape of `questions.json`.
#[derive(Debug, serde::Deserialize)]
struct BankDocument {
    questions: Vec<Question>,
    strategy_descriptions: HashMap<Strategy, String>,
    #[serde(default)]
    strategy_symbols: HashMap<Strategy, String>,
}

/// The fixed, ordered list of questions every user goes through,
/// plus the per-strategy texts used by the report.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    // Order of first appearance in `questions`; scoring ties are broken by it.
    strategies: Vec<Strategy>,
    descriptions: HashMap<Strategy, String>,
    symbols: HashMap<Strategy, String>,
}

impl QuestionBank {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        log::debug!("Reading questions from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let bank = Self::from_json(&raw)?;
        log::info!(
            "Loaded {} questions across {} strategies from {}",
            bank.len(),
            bank.strategies().len(),
            path.display()
        );
        Ok(bank)
    }

    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        let document: BankDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    fn from_document(document: BankDocument) -> Result<Self, LoadError> {
        if document.questions.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut seen_ids = HashSet::new();
        let mut strategies: Vec<Strategy> = Vec::new();
        for question in &document.questions {
            if !seen_ids.insert(question.id) {
                return Err(LoadError::DuplicateId(question.id));
            }
            if !strategies.contains(&question.strategy) {
                if !document.strategy_descriptions.contains_key(&question.strategy) {
                    return Err(LoadError::MissingDescription(question.strategy.clone()));
                }
                strategies.push(question.strategy.clone());
            }
        }

        Ok(Self {
            questions: document.questions,
            strategies,
            descriptions: document.strategy_descriptions,
            symbols: document.strategy_symbols,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Strategies in declaration order.
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn description(&self, strategy: &Strategy) -> &str {
        self.descriptions
            .get(strategy)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn symbol(&self, strategy: &Strategy) -> &str {
        self.symbols
            .get(strategy)
            .map(String::as_str)
            .unwrap_or(DEFAULT_SYMBOL)
    }
}
