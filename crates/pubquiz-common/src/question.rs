use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::GameError;
use crate::scoring::DEFAULT_TIME_LIMIT_SECS;

/// A question as the session stores it. `correct_answer` never leaves the
/// server; clients only ever see a [`QuestionView`].
#[derive(Debug, Clone)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub time_limit: u32,
    pub category: Option<String>,
}

impl Question {
    /// Public projection of this question, with the correct-answer index
    /// stripped and a 1-based position attached.
    pub fn view(&self, question_number: usize, total_questions: usize) -> QuestionView {
        QuestionView {
            id: self.id,
            text: self.text.clone(),
            options: self.options.clone(),
            time_limit: self.time_limit,
            category: self.category.clone(),
            question_number,
            total_questions,
        }
    }
}

/// Question payload as a host submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

impl QuestionInput {
    /// Validate and assign an id. At least two options, the answer index in
    /// range, non-empty prompt text.
    pub fn into_question(self) -> Result<Question, GameError> {
        if self.text.trim().is_empty() || self.options.len() < 2 {
            return Err(GameError::BadRequest);
        }
        if self.correct_answer >= self.options.len() {
            return Err(GameError::BadRequest);
        }
        Ok(Question {
            id: Uuid::new_v4(),
            text: self.text,
            options: self.options,
            correct_answer: self.correct_answer,
            time_limit: self.time_limit.unwrap_or(DEFAULT_TIME_LIMIT_SECS),
            category: self.category,
        })
    }
}

/// What teams and hosts see when a question goes live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub time_limit: u32,
    pub category: Option<String>,
    pub question_number: usize,
    pub total_questions: usize,
}
