use std::collections::BTreeMap;

use thiserror::Error;

use crate::quiz::{AnswerValue, Question, Strategy, MAX_ANSWER};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("no question has been answered")]
    NoAnswers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyScore {
    pub strategy: Strategy,
    /// 0.0..=100.0, one decimal place.
    pub percentage: f64,
    /// How many answered questions contributed.
    pub answered: usize,
}

/// Scores for every strategy of the bank, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    scores: Vec<StrategyScore>,
}

impl Scores {
    pub fn iter(&self) -> impl Iterator<Item = &StrategyScore> {
        self.scores.iter()
    }

    /// Highest-scoring strategy among those that got at least one answer.
    /// Ties go to the strategy declared first.
    pub fn dominant(&self) -> Result<&StrategyScore, ScoringError> {
        let mut best: Option<&StrategyScore> = None;
        for score in self.scores.iter().filter(|s| s.answered > 0) {
            match best {
                Some(current) if current.percentage >= score.percentage => {}
                _ => best = Some(score),
            }
        }
        best.ok_or(ScoringError::NoAnswers)
    }

    /// Strategies sorted by percentage, highest first. Equal percentages keep
    /// declaration order.
    pub fn ranked(&self) -> Vec<&StrategyScore> {
        let mut ranked: Vec<&StrategyScore> = self.iter().collect();
        ranked.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        ranked
    }
}

/// Turns a user's answers into a percentage per strategy:
/// `100 * sum / (5 * answered)`, rounded to one decimal, `0.0` when nothing
/// in the strategy was answered.
pub fn score(answers: &BTreeMap<u32, AnswerValue>, questions: &[Question]) -> Scores {
    // (strategy, sum, answered) in order of first appearance
    let mut totals: Vec<(Strategy, u32, usize)> = Vec::new();

    for question in questions {
        let position = match totals.iter().position(|(s, _, _)| s == &question.strategy) {
            Some(position) => position,
            None => {
                totals.push((question.strategy.clone(), 0, 0));
                totals.len() - 1
            }
        };
        if let Some(value) = answers.get(&question.id) {
            let entry = &mut totals[position];
            entry.1 += u32::from(value.get());
            entry.2 += 1;
        }
    }

    let scores = totals
        .into_iter()
        .map(|(strategy, sum, answered)| {
            let percentage = if answered == 0 {
                0.0
            } else {
                let max = f64::from(MAX_ANSWER) * answered as f64;
                round_to_tenth(f64::from(sum) / max * 100.0)
            };
            StrategyScore {
                strategy,
                percentage,
                answered,
            }
        })
        .collect();

    Scores { scores }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
