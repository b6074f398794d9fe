use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::game::{GameError, GamePhase, LeaderboardEntry};
use crate::question::{QuestionInput, QuestionView};

// -- Framing --
//
// Inbound frames look like `{"event": <name>, "data": {...}, "ack": <id>}`.
// Outbound frames are either a broadcast `{"event", "data"}` or a reply
// `{"ack", "data"}` correlated to the request that carried the ack. Ack
// ids are opaque scalars chosen by the client and echoed back verbatim.

/// Pull the correlation id out of a raw frame without validating the rest,
/// so malformed requests can still be answered.
pub fn extract_ack(raw: &Value) -> Option<Value> {
    raw.get("ack").filter(|a| !a.is_null()).cloned()
}

/// Decode the event portion of a raw frame. Unknown top-level keys (like
/// `ack`) are ignored.
pub fn parse_event(raw: Value) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_value(raw)
}

// -- Client -> Server Events --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "host:create-game", rename_all = "camelCase")]
    CreateGame { host_name: String },

    #[serde(rename = "team:join", rename_all = "camelCase")]
    Join { pin: String, team_name: String },

    #[serde(rename = "host:add-question", rename_all = "camelCase")]
    AddQuestion { pin: String, question: QuestionInput },

    #[serde(rename = "host:start-game", rename_all = "camelCase")]
    StartGame { pin: String },

    #[serde(rename = "host:next-question", rename_all = "camelCase")]
    NextQuestion { pin: String },

    #[serde(rename = "team:submit-answer", rename_all = "camelCase")]
    SubmitAnswer {
        pin: String,
        team_id: Uuid,
        answer: usize,
    },

    #[serde(rename = "host:reveal-answer", rename_all = "camelCase")]
    RevealAnswer { pin: String },

    #[serde(rename = "game:get-leaderboard", rename_all = "camelCase")]
    GetLeaderboard { pin: String },

    #[serde(rename = "ping")]
    Ping,
}

// -- Server -> Client Events --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "team:joined", rename_all = "camelCase")]
    TeamJoined {
        team_id: Uuid,
        team_name: String,
        total_teams: usize,
    },

    #[serde(rename = "team:left", rename_all = "camelCase")]
    TeamLeft {
        team_id: Uuid,
        team_name: String,
        total_teams: usize,
    },

    #[serde(rename = "game:started", rename_all = "camelCase")]
    GameStarted { question: QuestionView },

    #[serde(rename = "question:new", rename_all = "camelCase")]
    QuestionNew { question: QuestionView },

    #[serde(rename = "answer:submitted", rename_all = "camelCase")]
    AnswerSubmitted { team_id: Uuid, answered: bool },

    #[serde(rename = "answer:revealed", rename_all = "camelCase")]
    AnswerRevealed {
        correct_answer: usize,
        leaderboard: Vec<LeaderboardEntry>,
    },

    #[serde(rename = "game:ended", rename_all = "camelCase")]
    GameEnded {
        final_leaderboard: Vec<LeaderboardEntry>,
        total_questions: usize,
    },
}

/// A single outbound message as written to the socket.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Event(ServerEvent),
    Reply { ack: Value, data: Value },
}

impl ServerFrame {
    pub fn reply<T: Serialize>(ack: Value, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(ServerFrame::Reply {
            ack,
            data: serde_json::to_value(payload)?,
        })
    }
}

// -- Reply payloads --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReply {
    pub success: bool,
    pub game_id: Uuid,
    pub pin: String,
    pub host_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReply {
    pub success: bool,
    pub team_id: Uuid,
    pub team_name: String,
    pub game_state: GamePhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionReply {
    pub success: bool,
    pub total_questions: usize,
}

/// Bare acknowledgement, used by `host:start-game` and `ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkReply {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionReply {
    pub success: bool,
    pub ended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReply {
    pub success: bool,
    pub submitted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealReply {
    pub success: bool,
    pub correct_answer: usize,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardReply {
    pub success: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReply {
    pub success: bool,
    pub error: String,
}

impl From<&GameError> for ErrorReply {
    fn from(e: &GameError) -> Self {
        Self {
            success: false,
            error: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_create_game() {
        let raw = json!({
            "event": "host:create-game",
            "data": { "hostName": "Alex" },
            "ack": 1
        });
        assert_eq!(extract_ack(&raw), Some(json!(1)));
        match parse_event(raw).unwrap() {
            ClientEvent::CreateGame { host_name } => assert_eq!(host_name, "Alex"),
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_parse_submit_answer() {
        let team_id = Uuid::new_v4();
        let raw = json!({
            "event": "team:submit-answer",
            "data": { "pin": "4217", "teamId": team_id, "answer": 1 },
            "ack": "req-7"
        });
        assert_eq!(extract_ack(&raw), Some(json!("req-7")));
        match parse_event(raw).unwrap() {
            ClientEvent::SubmitAnswer { pin, team_id: t, answer } => {
                assert_eq!(pin, "4217");
                assert_eq!(t, team_id);
                assert_eq!(answer, 1);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ping_without_data() {
        let raw = json!({ "event": "ping" });
        assert!(extract_ack(&raw).is_none());
        assert!(matches!(parse_event(raw).unwrap(), ClientEvent::Ping));
    }

    #[test]
    fn test_parse_rejects_unknown_event() {
        let raw = json!({ "event": "host:self-destruct", "data": {} });
        assert!(parse_event(raw).is_err());
    }

    #[test]
    fn test_broadcast_wire_shape() {
        let event = ServerEvent::TeamJoined {
            team_id: Uuid::new_v4(),
            team_name: "Pandas".into(),
            total_teams: 2,
        };
        let json = serde_json::to_value(ServerFrame::Event(event)).unwrap();
        assert_eq!(json["event"], "team:joined");
        assert_eq!(json["data"]["teamName"], "Pandas");
        assert_eq!(json["data"]["totalTeams"], 2);
        assert!(json.get("ack").is_none());
    }

    #[test]
    fn test_reply_wire_shape() {
        let frame = ServerFrame::reply(json!(5), &OkReply { success: true }).unwrap();
        let json = serde_json::to_value(frame).unwrap();
        assert_eq!(json["ack"], 5);
        assert_eq!(json["data"]["success"], true);
        assert!(json.get("event").is_none());
    }

    #[test]
    fn test_game_phase_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(GamePhase::AnswerReveal).unwrap(),
            json!("answer-reveal")
        );
        assert_eq!(serde_json::to_value(GamePhase::Lobby).unwrap(), json!("lobby"));
    }

    #[test]
    fn test_join_reply_carries_phase() {
        let reply = JoinReply {
            success: true,
            team_id: Uuid::new_v4(),
            team_name: "Pandas".into(),
            game_state: GamePhase::Lobby,
        };
        let json = serde_json::to_value(reply).unwrap();
        assert_eq!(json["gameState"], "lobby");
        assert_eq!(json["teamName"], "Pandas");
    }

    #[test]
    fn test_correct_answer_only_in_reveal() {
        let view = QuestionView {
            id: Uuid::new_v4(),
            text: "2+2?".into(),
            options: vec!["3".into(), "4".into()],
            time_limit: 30,
            category: None,
            question_number: 1,
            total_questions: 1,
        };
        let started = serde_json::to_value(ServerFrame::Event(ServerEvent::GameStarted {
            question: view.clone(),
        }))
        .unwrap();
        assert!(started["data"]["question"].get("correctAnswer").is_none());

        let fresh = serde_json::to_value(ServerFrame::Event(ServerEvent::QuestionNew {
            question: view,
        }))
        .unwrap();
        assert!(fresh["data"]["question"].get("correctAnswer").is_none());

        let revealed = serde_json::to_value(ServerFrame::Event(ServerEvent::AnswerRevealed {
            correct_answer: 1,
            leaderboard: vec![],
        }))
        .unwrap();
        assert_eq!(revealed["data"]["correctAnswer"], 1);
    }

    #[test]
    fn test_next_question_reply_omits_absent_question() {
        let ended = NextQuestionReply {
            success: true,
            ended: true,
            question: None,
        };
        let json = serde_json::to_value(ended).unwrap();
        assert!(json.get("question").is_none());
        assert_eq!(json["ended"], true);
    }

    #[test]
    fn test_error_reply_strings_are_stable() {
        let reply = ErrorReply::from(&GameError::GameNotFound);
        assert!(!reply.success);
        assert_eq!(reply.error, "Game not found");
        assert_eq!(
            ErrorReply::from(&GameError::GameAlreadyStarted).error,
            "Game already started"
        );
    }

    #[test]
    fn test_server_event_round_trip() {
        let event = ServerEvent::GameEnded {
            final_leaderboard: vec![LeaderboardEntry {
                name: "Pandas".into(),
                score: 145,
                answers_count: 1,
            }],
            total_questions: 1,
        };
        let text = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&text).unwrap();
        match back {
            ServerEvent::GameEnded {
                final_leaderboard, ..
            } => assert_eq!(final_leaderboard[0].score, 145),
            other => panic!("wrong variant: {:?}", other),
        }
    }
}
