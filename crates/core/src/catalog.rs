//! Read-only lookups into the game's static data.
//!
//! The host owns the real data sheets; the core only needs a handful of
//! lookups, expressed as the [`CatalogService`] trait. [`StaticCatalog`]
//! covers what is knowable without the host: the five district names and
//! the current ward count.

use crate::config::{
    DISTRICT_EMPYREUM, DISTRICT_GOBLET, DISTRICT_LAVENDER_BEDS, DISTRICT_MIST, DISTRICT_SHIROGANE,
};

/// Wards per district in the current game version. Earlier versions had
/// 24; prefer [`CatalogService::wards_per_district`] over this constant.
pub const DEFAULT_WARDS_PER_DISTRICT: u16 = 30;

/// Map a district id to its land-set id.
///
/// The first three districts are contiguous from 339; the later two were
/// appended out of order.
pub fn territory_to_land_set_id(territory_type_id: u16) -> u16 {
    match territory_type_id {
        DISTRICT_SHIROGANE => 3,
        DISTRICT_EMPYREUM => 4,
        other => other.wrapping_sub(DISTRICT_MIST),
    }
}

/// Host-provided localized game-data lookups. Read-only and
/// side-effect-free.
pub trait CatalogService: Send + Sync {
    /// Localized display name of a district, if known.
    fn district_name(&self, district_id: u16) -> Option<String>;

    /// Display name of a world, if known.
    fn world_name(&self, world_id: u16) -> Option<String>;

    /// Datacenter id a world belongs to, if known.
    fn datacenter_of_world(&self, world_id: u16) -> Option<u16>;

    /// Size index (0 small, 1 medium, 2 large) of a plot, from the
    /// land-set sheet. Ward snapshots do not carry sizes themselves.
    fn plot_size(&self, district_id: u16, plot_number: u16) -> Option<u8>;

    /// How many wards each district holds.
    fn wards_per_district(&self) -> u16 {
        DEFAULT_WARDS_PER_DISTRICT
    }
}

/// Catalog fallback with no host data: district names only.
#[derive(Debug, Default)]
pub struct StaticCatalog;

impl CatalogService for StaticCatalog {
    fn district_name(&self, district_id: u16) -> Option<String> {
        let name = match district_id {
            DISTRICT_MIST => "Mist",
            DISTRICT_LAVENDER_BEDS => "The Lavender Beds",
            DISTRICT_GOBLET => "The Goblet",
            DISTRICT_SHIROGANE => "Shirogane",
            DISTRICT_EMPYREUM => "Empyreum",
            _ => return None,
        };
        Some(name.to_string())
    }

    fn world_name(&self, _world_id: u16) -> Option<String> {
        None
    }

    fn datacenter_of_world(&self, _world_id: u16) -> Option<u16> {
        None
    }

    fn plot_size(&self, _district_id: u16, _plot_number: u16) -> Option<u8> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn land_set_ids_fold_as_expected() {
        assert_eq!(territory_to_land_set_id(DISTRICT_MIST), 0);
        assert_eq!(territory_to_land_set_id(DISTRICT_LAVENDER_BEDS), 1);
        assert_eq!(territory_to_land_set_id(DISTRICT_GOBLET), 2);
        assert_eq!(territory_to_land_set_id(DISTRICT_SHIROGANE), 3);
        assert_eq!(territory_to_land_set_id(DISTRICT_EMPYREUM), 4);
    }

    #[test]
    fn static_catalog_names_the_five_districts() {
        let catalog = StaticCatalog;
        assert_eq!(catalog.district_name(DISTRICT_MIST).as_deref(), Some("Mist"));
        assert_eq!(
            catalog.district_name(DISTRICT_EMPYREUM).as_deref(),
            Some("Empyreum")
        );
        assert_eq!(catalog.district_name(1), None);
        assert_eq!(catalog.wards_per_district(), 30);
    }
}
