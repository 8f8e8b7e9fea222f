//! Choosing the learning outcome that questions get generated against.
//!
//! A sub-strand can list several outcomes but the generator only ever works
//! with one. [`FirstOutcome`] takes the head of the list; a different
//! [`OutcomeSelector`] can be handed to the controller to pick otherwise.

use crate::curriculum::LearningOutcome;
use serde_json::Number;

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeChoice {
    /// A usable numeric outcome id.
    Selected(Number),
    /// The chosen outcome's id is not a JSON number.
    InvalidId,
    /// The sub-strand has no outcomes.
    Empty,
}

pub trait OutcomeSelector {
    fn choose(&self, outcomes: &[LearningOutcome]) -> OutcomeChoice;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstOutcome;

impl OutcomeSelector for FirstOutcome {
    fn choose(&self, outcomes: &[LearningOutcome]) -> OutcomeChoice {
        let Some(first) = outcomes.first() else {
            return OutcomeChoice::Empty;
        };
        match first.numeric_id() {
            Some(id) => OutcomeChoice::Selected(id.clone()),
            None => OutcomeChoice::InvalidId,
        }
    }
}
