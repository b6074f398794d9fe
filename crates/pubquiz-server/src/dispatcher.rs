//! Inbound event dispatch.
//!
//! Every handler follows the same shape: look up the session, mutate it
//! under its own lock while computing the outbound payloads, drop the
//! lock, broadcast, then send the ack reply. Broadcasts go out before the
//! reply so the initiator's observers never see state changes late, and
//! no lock is ever held across the router's send path.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use pubquiz_common::game::{Advance, GameError, GamePhase};
use pubquiz_common::protocol::{
    AddQuestionReply, ClientEvent, CreatedReply, ErrorReply, JoinReply, LeaderboardReply,
    NextQuestionReply, OkReply, RevealReply, ServerEvent, ServerFrame, SubmitReply,
};

use crate::rooms::{game_room, host_room};
use crate::server::SharedState;

pub async fn handle_event(
    conn_id: Uuid,
    event: ClientEvent,
    ack: Option<Value>,
    state: &SharedState,
) -> anyhow::Result<()> {
    match event {
        ClientEvent::CreateGame { host_name } => {
            let session = match state.registry.create(host_name).await {
                Ok(s) => s,
                Err(e) => return reply_err(state, conn_id, ack, &e).await,
            };
            let (game_id, pin, host_id) = {
                let mut s = session.lock().await;
                s.host_conn = Some(conn_id);
                (s.id, s.pin.clone(), s.host_id)
            };
            state.router.join(conn_id, &game_room(&pin)).await;
            state.router.join(conn_id, &host_room(&pin)).await;
            tracing::info!(%pin, %game_id, "game created");
            reply(
                state,
                conn_id,
                ack,
                &CreatedReply {
                    success: true,
                    game_id,
                    pin,
                    host_id,
                },
            )
            .await
        }

        ClientEvent::Join { pin, team_name } => {
            let Some(session) = state.registry.lookup(&pin).await else {
                return reply_err(state, conn_id, ack, &GameError::GameNotFound).await;
            };
            let result = {
                let mut s = session.lock().await;
                s.add_team(team_name.clone(), conn_id)
                    .map(|team_id| (team_id, s.teams().len(), s.phase))
            };
            match result {
                Ok((team_id, total_teams, phase)) => {
                    state.router.join(conn_id, &game_room(&pin)).await;
                    state
                        .router
                        .broadcast(
                            &host_room(&pin),
                            ServerEvent::TeamJoined {
                                team_id,
                                team_name: team_name.clone(),
                                total_teams,
                            },
                        )
                        .await;
                    tracing::info!(%pin, team = %team_name, "team joined");
                    reply(
                        state,
                        conn_id,
                        ack,
                        &JoinReply {
                            success: true,
                            team_id,
                            team_name,
                            game_state: phase,
                        },
                    )
                    .await
                }
                Err(e) => reply_err(state, conn_id, ack, &e).await,
            }
        }

        ClientEvent::AddQuestion { pin, question } => {
            let Some(session) = state.registry.lookup(&pin).await else {
                return reply_err(state, conn_id, ack, &GameError::GameNotFound).await;
            };
            let question = match question.into_question() {
                Ok(q) => q,
                Err(e) => return reply_err(state, conn_id, ack, &e).await,
            };
            let total_questions = {
                let mut s = session.lock().await;
                s.add_question(question);
                s.question_count()
            };
            reply(
                state,
                conn_id,
                ack,
                &AddQuestionReply {
                    success: true,
                    total_questions,
                },
            )
            .await
        }

        ClientEvent::StartGame { pin } => {
            let Some(session) = state.registry.lookup(&pin).await else {
                return reply_err(state, conn_id, ack, &GameError::GameNotFound).await;
            };
            let result = { session.lock().await.start(Instant::now()) };
            match result {
                Ok(question) => {
                    state
                        .router
                        .broadcast(&game_room(&pin), ServerEvent::GameStarted { question })
                        .await;
                    tracing::info!(%pin, "game started");
                    reply(state, conn_id, ack, &OkReply { success: true }).await
                }
                Err(e) => reply_err(state, conn_id, ack, &e).await,
            }
        }

        ClientEvent::NextQuestion { pin } => {
            let Some(session) = state.registry.lookup(&pin).await else {
                return reply_err(state, conn_id, ack, &GameError::GameNotFound).await;
            };
            let result = { session.lock().await.next_question(Instant::now()) };
            match result {
                Ok(Advance::Question(question)) => {
                    state
                        .router
                        .broadcast(
                            &game_room(&pin),
                            ServerEvent::QuestionNew {
                                question: question.clone(),
                            },
                        )
                        .await;
                    reply(
                        state,
                        conn_id,
                        ack,
                        &NextQuestionReply {
                            success: true,
                            ended: false,
                            question: Some(question),
                        },
                    )
                    .await
                }
                Ok(Advance::Ended {
                    final_leaderboard,
                    total_questions,
                }) => {
                    state
                        .router
                        .broadcast(
                            &game_room(&pin),
                            ServerEvent::GameEnded {
                                final_leaderboard,
                                total_questions,
                            },
                        )
                        .await;
                    tracing::info!(%pin, "game ended");
                    reply(
                        state,
                        conn_id,
                        ack,
                        &NextQuestionReply {
                            success: true,
                            ended: true,
                            question: None,
                        },
                    )
                    .await
                }
                Err(e) => reply_err(state, conn_id, ack, &e).await,
            }
        }

        ClientEvent::SubmitAnswer {
            pin,
            team_id,
            answer,
        } => {
            let Some(session) = state.registry.lookup(&pin).await else {
                return reply_err(state, conn_id, ack, &GameError::GameNotFound).await;
            };
            let result = {
                session
                    .lock()
                    .await
                    .submit_answer(team_id, answer, Instant::now())
            };
            match result {
                Ok(outcome) => {
                    // Repeats echo the stored result; the host already
                    // counted this team, so only first submissions fan out.
                    if outcome.first {
                        state
                            .router
                            .broadcast(
                                &host_room(&pin),
                                ServerEvent::AnswerSubmitted {
                                    team_id,
                                    answered: true,
                                },
                            )
                            .await;
                    }
                    reply(
                        state,
                        conn_id,
                        ack,
                        &SubmitReply {
                            success: true,
                            submitted: true,
                        },
                    )
                    .await
                }
                Err(e) => reply_err(state, conn_id, ack, &e).await,
            }
        }

        ClientEvent::RevealAnswer { pin } => {
            let Some(session) = state.registry.lookup(&pin).await else {
                return reply_err(state, conn_id, ack, &GameError::GameNotFound).await;
            };
            let result = { session.lock().await.reveal_answer() };
            match result {
                Ok((correct_answer, leaderboard)) => {
                    state
                        .router
                        .broadcast(
                            &game_room(&pin),
                            ServerEvent::AnswerRevealed {
                                correct_answer,
                                leaderboard: leaderboard.clone(),
                            },
                        )
                        .await;
                    reply(
                        state,
                        conn_id,
                        ack,
                        &RevealReply {
                            success: true,
                            correct_answer,
                            leaderboard,
                        },
                    )
                    .await
                }
                Err(e) => reply_err(state, conn_id, ack, &e).await,
            }
        }

        ClientEvent::GetLeaderboard { pin } => {
            let Some(session) = state.registry.lookup(&pin).await else {
                return reply_err(state, conn_id, ack, &GameError::GameNotFound).await;
            };
            let leaderboard = { session.lock().await.leaderboard() };
            reply(
                state,
                conn_id,
                ack,
                &LeaderboardReply {
                    success: true,
                    leaderboard,
                },
            )
            .await
        }

        ClientEvent::Ping => reply(state, conn_id, ack, &OkReply { success: true }).await,
    }
}

/// Disconnect sweep: drop the connection from the router, then visit every
/// live session. A lobby session loses the departing team (and is evicted
/// once empty); sessions past the lobby keep the team with a stale
/// connection id.
pub async fn handle_disconnect(conn_id: Uuid, state: &SharedState) {
    state.router.unregister(conn_id).await;

    for (pin, session) in state.registry.entries().await {
        let (removed, phase, remaining) = {
            let mut s = session.lock().await;
            let removed = s.handle_disconnect(conn_id);
            (removed, s.phase, s.teams().len())
        };
        let Some(team) = removed else { continue };

        state
            .router
            .broadcast(
                &host_room(&pin),
                ServerEvent::TeamLeft {
                    team_id: team.id,
                    team_name: team.name.clone(),
                    total_teams: remaining,
                },
            )
            .await;
        tracing::info!(%pin, team = %team.name, "team disconnected");

        if phase == GamePhase::Lobby && remaining == 0 {
            state.registry.remove(&pin).await;
            tracing::info!(%pin, "lobby emptied, session evicted");
        }
    }
}

async fn reply<T: Serialize>(
    state: &SharedState,
    conn_id: Uuid,
    ack: Option<Value>,
    payload: &T,
) -> anyhow::Result<()> {
    // Fire-and-forget events carry no ack and get no reply.
    let Some(ack) = ack else { return Ok(()) };
    let frame = ServerFrame::reply(ack, payload)?;
    state.router.emit(conn_id, frame).await;
    Ok(())
}

async fn reply_err(
    state: &SharedState,
    conn_id: Uuid,
    ack: Option<Value>,
    error: &GameError,
) -> anyhow::Result<()> {
    reply(state, conn_id, ack, &ErrorReply::from(error)).await
}
