//! Network session to the crowdsourced housing aggregation server.
//!
//! - [`ingest`] -- debounced, batched HTTP delivery of observations with
//!   session-token auth and retry.
//! - [`push`] -- WebSocket subscriber for plot state notifications, with
//!   capped reconnect.
//! - [`coordinator`] -- glue between the host's game observations, the
//!   sweep state machine, and the two clients.
//! - [`schema`] -- the server's wire types.
//! - [`observer`] -- the contracts the host implements.
//! - [`auth`] -- HS256 tokens for the legacy authenticated push route.

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod ingest;
pub mod observer;
pub mod push;
pub mod schema;

pub use config::ClientConfig;
pub use coordinator::Coordinator;
pub use ingest::{IngestClient, IngestError};
pub use observer::{GameEvent, GameObserver, UserSink};
pub use push::{ConnectionState, PushClient, PushEvent};
