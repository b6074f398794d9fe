use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded submission. Append-only; a team's first answer for a given
/// question is the one that scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub question_index: usize,
    pub option: usize,
    pub correct: bool,
    pub points: u32,
    pub elapsed_ms: u64,
}

/// A team of players sharing one connection; the unit of scoring.
#[derive(Debug, Clone)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    /// Connection currently owning the team. Goes stale when the
    /// connection drops after the lobby phase.
    pub conn: Uuid,
    pub score: u32,
    pub answers: Vec<Answer>,
}

impl Team {
    pub fn new(name: String, conn: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            conn,
            score: 0,
            answers: Vec::new(),
        }
    }

    /// The scoring (first) answer for a question, if any.
    pub fn answer_for(&self, question_index: usize) -> Option<&Answer> {
        self.answers
            .iter()
            .find(|a| a.question_index == question_index)
    }
}
