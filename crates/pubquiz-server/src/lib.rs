//! Real-time trivia game server.
//!
//! One long-lived process hosts many concurrent game sessions. Each session
//! is driven by a host over a WebSocket, joined by teams, and progresses
//! through lobby -> question -> answer-reveal until it ends. The modules
//! mirror that flow: [`registry`] owns the PIN -> session map, [`rooms`]
//! fans events out to connections, [`dispatcher`] routes inbound events
//! into the state machine, and [`janitor`] reaps finished sessions.

pub mod api;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod janitor;
pub mod registry;
pub mod rooms;
pub mod server;
