//! Short-lived HS256 tokens for the legacy authenticated WebSocket route.
//!
//! The HTTP path authenticates with server-issued session tokens; the
//! WebSocket URL may instead carry a `jwt` query parameter signed with a
//! shared secret. Tokens are regenerated on every (re)connect so the
//! `iat` claim stays fresh.

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::observer::GameObserver;
use crate::push::TokenSource;

/// Audience claim expected by the server.
pub const JWT_AUDIENCE: &str = "PaissaHouse";

/// Issuer claim expected by the server.
pub const JWT_ISSUER: &str = "PaissaDB";

/// Claims embedded in a WebSocket auth token.
#[derive(Debug, Serialize, Deserialize)]
pub struct WsClaims {
    /// The character's content id.
    pub cid: u64,
    pub aud: String,
    pub iss: String,
    /// Issued-at (UTC Unix timestamp).
    pub iat: i64,
}

/// Sign a WebSocket auth token for the given character.
pub fn generate_ws_token(
    content_id: u64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = WsClaims {
        cid: content_id,
        aud: JWT_AUDIENCE.to_string(),
        iss: JWT_ISSUER.to_string(),
        iat: chrono::Utc::now().timestamp(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Build a [`TokenSource`] for the push client: signs a fresh token for
/// the logged-in character on every connect, or yields `None` (and an
/// unauthenticated URL) when nobody is logged in.
pub fn ws_token_source(secret: String, observer: Arc<dyn GameObserver>) -> Box<TokenSource> {
    Box::new(move || {
        let player = observer.local_player()?;
        match generate_ws_token(player.content_id, &secret) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to sign WebSocket token");
                None
            }
        }
    })
}
