//! Notification filter: decides which pushed plot events the user sees.
//!
//! [`accept`] is a pure predicate over the event, the user's config, and
//! the player's identity context. The coordinator resolves the event
//! world's datacenter through the catalog before calling in, so the
//! filter itself performs no lookups.

use crate::config::{NotifyScope, UserConfig};
use crate::types::{AvailabilityType, PlayerContext, PurchaseSystem};

/// Which kind of push event is being filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotEventKind {
    Open,
    Update,
    Sold,
}

/// The fields of a push event the filter inspects.
#[derive(Debug, Clone)]
pub struct PlotEventFilterInput {
    pub kind: PlotEventKind,
    pub world_id: u16,
    pub district_id: u16,
    /// Raw size index: 0 small, 1 medium, 2 large.
    pub size: u8,
    pub purchase_system: PurchaseSystem,
    pub lotto_phase: Option<AvailabilityType>,
    pub previous_lotto_phase: Option<AvailabilityType>,
}

/// Decide whether a plot event should be shown to the user.
///
/// `player` is `None` when nobody is logged in; only the `All` scope
/// passes then. `event_datacenter_id` is the datacenter of the event's
/// world, if the catalog knows it.
pub fn accept(
    event: &PlotEventFilterInput,
    config: &UserConfig,
    player: Option<&PlayerContext>,
    event_datacenter_id: Option<u16>,
) -> bool {
    if !config.enabled {
        return false;
    }

    let in_scope = match config.scope {
        NotifyScope::All => true,
        NotifyScope::Datacenter => match (player, event_datacenter_id) {
            (Some(player), Some(dc)) => dc == player.home_datacenter_id,
            _ => false,
        },
        NotifyScope::Homeworld => {
            player.is_some_and(|player| event.world_id == player.home_world_id)
        }
    };
    if !in_scope {
        return false;
    }

    let Some(district) = config.district_filter(event.district_id) else {
        return false;
    };

    let size_enabled = match event.size {
        0 => district.small,
        1 => district.medium,
        2 => district.large,
        _ => return false,
    };
    if !size_enabled {
        return false;
    }

    let mut mask = PurchaseSystem::default();
    if district.free_company {
        mask = mask | PurchaseSystem::FREE_COMPANY;
    }
    if district.individual {
        mask = mask | PurchaseSystem::INDIVIDUAL;
    }
    if !event.purchase_system.contains(mask) {
        return false;
    }

    match event.kind {
        // FCFS plots are actionable immediately; lottery plots only once
        // the phase is known to accept entries.
        PlotEventKind::Open => {
            !event.purchase_system.contains(PurchaseSystem::LOTTERY)
                || event.lotto_phase == Some(AvailabilityType::Available)
        }
        // Only the "entered the available phase" edge is news.
        PlotEventKind::Update => {
            event.purchase_system.contains(PurchaseSystem::LOTTERY)
                && event.previous_lotto_phase != Some(AvailabilityType::Available)
                && event.lotto_phase == Some(AvailabilityType::Available)
        }
        PlotEventKind::Sold => false,
    }
}
