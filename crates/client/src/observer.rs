//! Contracts between the core pipeline and its host.
//!
//! The host hooks the game client and forwards raw observations as
//! [`GameEvent`]s on a broadcast channel; it also answers identity
//! queries and renders chat output. None of these calls may block.

use tokio::sync::broadcast;

use paissa_core::types::{PlayerContext, PlayerIdentity};

/// A raw observation delivered by the host.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A ward snapshot payload plus the server timestamp the host read
    /// from the surrounding frame.
    WardInfo {
        bytes: Vec<u8>,
        server_timestamp: i32,
    },

    /// A placard selection payload for a plot.
    PlacardSaleInfo {
        housing_type: u8,
        territory_type_id: u16,
        ward_id: u8,
        plot_id: u8,
        apartment: i16,
        bytes: Vec<u8>,
    },

    /// The login state changed (login or logout).
    Login,

    /// Periodic frame tick; used only to drain deferred work.
    Tick,
}

/// The host side of the game client: event source and identity oracle.
pub trait GameObserver: Send + Sync {
    /// Subscribe to the host's observation stream.
    fn subscribe(&self) -> broadcast::Receiver<GameEvent>;

    /// The logged-in character, if any.
    fn local_player(&self) -> Option<PlayerIdentity>;

    /// The world the player is currently on (not necessarily home).
    fn current_world_id(&self) -> Option<u16>;

    /// Home world and datacenter of the logged-in character.
    fn player_context(&self) -> Option<PlayerContext>;
}

/// The host's chat output.
pub trait UserSink: Send + Sync {
    /// Print a line to the given chat channel tag (empty = host default).
    fn print(&self, channel: &str, message: &str);

    /// Print an error line on the host's error channel.
    fn print_error(&self, message: &str);
}
