use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::question::{Question, QuestionView};
use crate::scoring;
use crate::team::{Answer, Team};

// -- Session State Machine --

/// Phase of a game session. Serialized kebab-case on the wire
/// (`"answer-reveal"` etc.).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    Lobby,
    Question,
    AnswerReveal,
    Ended,
}

/// One trivia game: host, teams, questions, cursor and phase.
///
/// All mutation happens through the methods below; the server wraps each
/// session in its own `Mutex`, so operations are totally ordered per game.
/// Wall-clock time is passed in as [`Instant`] arguments rather than read
/// internally, which keeps the scoring path deterministic under test.
#[derive(Debug)]
pub struct GameSession {
    pub id: Uuid,
    pub pin: String,
    pub host_name: String,
    /// Opaque token handed back to the creator.
    pub host_id: Uuid,
    /// Connection currently driving the game. Stale after a host
    /// disconnect; never used for authorization.
    pub host_conn: Option<Uuid>,
    pub phase: GamePhase,
    questions: Vec<Question>,
    /// Cursor into `questions`. `None` exactly while in the lobby.
    current: Option<usize>,
    teams: Vec<Team>,
    question_started: Option<Instant>,
}

/// Result of advancing past the current question.
#[derive(Debug, Clone)]
pub enum Advance {
    Question(QuestionView),
    Ended {
        final_leaderboard: Vec<LeaderboardEntry>,
        total_questions: usize,
    },
}

/// Result of an answer submission. `first` is false when the team had
/// already answered this question; the stored result is echoed back and
/// nothing is mutated.
#[derive(Debug, Clone, Copy)]
pub struct SubmitOutcome {
    pub correct: bool,
    pub points: u32,
    pub first: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub answers_count: usize,
}

impl GameSession {
    pub fn new(pin: String, host_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            pin,
            host_name,
            host_id: Uuid::new_v4(),
            host_conn: None,
            phase: GamePhase::Lobby,
            questions: Vec::new(),
            current: None,
            teams: Vec::new(),
            question_started: None,
        }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, team_id: Uuid) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Register a team. Only allowed in the lobby; team names are not
    /// required to be unique.
    pub fn add_team(&mut self, name: String, conn: Uuid) -> Result<Uuid, GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        let team = Team::new(name, conn);
        let id = team.id;
        self.teams.push(team);
        Ok(id)
    }

    /// Remove a team by id. No-op if absent.
    pub fn remove_team(&mut self, team_id: Uuid) -> Option<Team> {
        let idx = self.teams.iter().position(|t| t.id == team_id)?;
        Some(self.teams.remove(idx))
    }

    /// React to a connection going away. In the lobby the team leaves the
    /// game and is returned; past the lobby the team is kept with a stale
    /// connection id so its score survives. A stale host connection is
    /// cleared in any phase.
    pub fn handle_disconnect(&mut self, conn: Uuid) -> Option<Team> {
        if self.host_conn == Some(conn) {
            self.host_conn = None;
        }
        if self.phase != GamePhase::Lobby {
            return None;
        }
        let idx = self.teams.iter().position(|t| t.conn == conn)?;
        Some(self.teams.remove(idx))
    }

    /// Append a question. Permitted in any phase; it has no effect on a
    /// question already in flight.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    /// Leave the lobby and activate question 0.
    pub fn start(&mut self, now: Instant) -> Result<QuestionView, GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::WrongState);
        }
        if self.questions.is_empty() {
            return Err(GameError::NoQuestions);
        }
        self.phase = GamePhase::Question;
        self.current = Some(0);
        self.question_started = Some(now);
        self.current_view().ok_or(GameError::UnknownQuestion)
    }

    /// Advance the cursor. Runs from `question` (skipping the reveal) or
    /// from `answer-reveal`; past the last question the game ends.
    pub fn next_question(&mut self, now: Instant) -> Result<Advance, GameError> {
        if !matches!(self.phase, GamePhase::Question | GamePhase::AnswerReveal) {
            return Err(GameError::WrongState);
        }
        let next = match self.current {
            Some(c) => c + 1,
            None => return Err(GameError::UnknownQuestion),
        };
        self.current = Some(next);
        if next >= self.questions.len() {
            let total_questions = self.questions.len();
            let final_leaderboard = self.end_game();
            return Ok(Advance::Ended {
                final_leaderboard,
                total_questions,
            });
        }
        self.phase = GamePhase::Question;
        self.question_started = Some(now);
        self.current_view()
            .map(Advance::Question)
            .ok_or(GameError::UnknownQuestion)
    }

    /// Record a team's answer for the active question. First submission
    /// wins: a repeat returns the stored result and changes nothing.
    pub fn submit_answer(
        &mut self,
        team_id: Uuid,
        option: usize,
        now: Instant,
    ) -> Result<SubmitOutcome, GameError> {
        if self.phase != GamePhase::Question {
            return Err(GameError::GameNotAcceptingAnswers);
        }
        if self.team(team_id).is_none() {
            return Err(GameError::UnknownTeam);
        }
        let idx = self.current.ok_or(GameError::UnknownQuestion)?;
        let question = self.questions.get(idx).ok_or(GameError::UnknownQuestion)?;
        if option >= question.options.len() {
            return Err(GameError::BadRequest);
        }
        let question_id = question.id;
        let correct = option == question.correct_answer;
        let time_limit = question.time_limit;
        let started = self.question_started.ok_or(GameError::UnknownQuestion)?;

        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or(GameError::UnknownTeam)?;
        if let Some(prev) = team.answer_for(idx) {
            return Ok(SubmitOutcome {
                correct: prev.correct,
                points: prev.points,
                first: false,
            });
        }

        let elapsed_ms = now.saturating_duration_since(started).as_millis() as u64;
        let points = scoring::award(correct, elapsed_ms, time_limit);
        team.answers.push(Answer {
            question_id,
            question_index: idx,
            option,
            correct,
            points,
            elapsed_ms,
        });
        team.score += points;
        Ok(SubmitOutcome {
            correct,
            points,
            first: true,
        })
    }

    /// Disclose the correct answer and the current standings. Idempotent
    /// while already revealed.
    pub fn reveal_answer(&mut self) -> Result<(usize, Vec<LeaderboardEntry>), GameError> {
        match self.phase {
            GamePhase::Question => self.phase = GamePhase::AnswerReveal,
            GamePhase::AnswerReveal => {}
            GamePhase::Lobby | GamePhase::Ended => return Err(GameError::WrongState),
        }
        let idx = self.current.ok_or(GameError::UnknownQuestion)?;
        let question = self.questions.get(idx).ok_or(GameError::UnknownQuestion)?;
        Ok((question.correct_answer, self.leaderboard()))
    }

    /// Standings snapshot: score descending, ties in join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .teams
            .iter()
            .map(|t| LeaderboardEntry {
                name: t.name.clone(),
                score: t.score,
                answers_count: t.answers.len(),
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Terminal transition. After this no operation mutates score, teams
    /// or phase.
    pub fn end_game(&mut self) -> Vec<LeaderboardEntry> {
        self.phase = GamePhase::Ended;
        self.question_started = None;
        self.leaderboard()
    }

    fn current_view(&self) -> Option<QuestionView> {
        let idx = self.current?;
        let question = self.questions.get(idx)?;
        Some(question.view(idx + 1, self.questions.len()))
    }
}

// -- Errors --

/// Error taxonomy surfaced to clients as `{ success: false, error }`. The
/// display strings are rendered directly by the client, so they stay
/// short and stable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Game not found")]
    GameNotFound,
    #[error("Game already started")]
    GameAlreadyStarted,
    #[error("No questions added")]
    NoQuestions,
    #[error("Game is not accepting answers")]
    GameNotAcceptingAnswers,
    #[error("Invalid game state")]
    WrongState,
    #[error("Team not found")]
    UnknownTeam,
    #[error("Question not found")]
    UnknownQuestion,
    #[error("Bad request")]
    BadRequest,
    #[error("No game PINs available")]
    PinExhausted,
}
