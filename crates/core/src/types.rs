//! Domain types shared across the sweep pipeline.
//!
//! Everything here mirrors either the game's wire layout (see
//! [`crate::wire`] for the decoders) or the aggregation server's view of
//! a plot. Numeric identifiers are kept as plain integers; name lookups
//! go through [`crate::catalog::CatalogService`].

use serde::{Deserialize, Serialize};

/// Identifies a plot-or-ward location.
///
/// `land_id` addresses a plot within a ward, or is `-1` for a ward-wide
/// record. All four fields are little-endian `i16` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandIdent {
    pub land_id: i16,
    pub ward_number: i16,
    pub territory_type_id: i16,
    pub world_id: i16,
}

/// Bit set describing one plot's public state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HousingFlags(pub u8);

impl HousingFlags {
    pub const PLOT_OWNED: HousingFlags = HousingFlags(1 << 0);
    pub const VISITORS_ALLOWED: HousingFlags = HousingFlags(1 << 1);
    pub const HAS_SEARCH_COMMENT: HousingFlags = HousingFlags(1 << 2);
    pub const HOUSE_BUILT: HousingFlags = HousingFlags(1 << 3);
    pub const OWNED_BY_FC: HousingFlags = HousingFlags(1 << 4);

    /// True if any bit of `other` is set in `self`.
    pub fn contains(self, other: HousingFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for HousingFlags {
    type Output = HousingFlags;

    fn bitor(self, rhs: HousingFlags) -> HousingFlags {
        HousingFlags(self.0 | rhs.0)
    }
}

/// One plot's public state inside a ward snapshot.
///
/// `owner_name` is meaningful only when [`HousingFlags::PLOT_OWNED`] is
/// set; the decoder normalizes it to empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseInfoEntry {
    pub price: u32,
    pub flags: HousingFlags,
    /// Up to three signed appeal tags; zero means unset.
    pub appeals: [i8; 3],
    pub owner_name: String,
}

/// Number of plots in every ward snapshot.
pub const HOUSES_PER_WARD: usize = 60;

/// A full ward snapshot: location plus exactly [`HOUSES_PER_WARD`] entries.
///
/// `purchase_type` and `tenant_type` are present only in the newer
/// 2664-byte wire layout and are preserved as raw bytes so the ingest
/// payload can forward them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardInfo {
    pub land_ident: LandIdent,
    pub entries: Vec<HouseInfoEntry>,
    pub purchase_type: Option<u8>,
    pub tenant_type: Option<u8>,
}

/// How an unowned plot is sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PurchaseType {
    /// First-come-first-serve direct purchase.
    Fcfs = 1,
    Lottery = 2,
}

impl TryFrom<u8> for PurchaseType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PurchaseType::Fcfs),
            2 => Ok(PurchaseType::Lottery),
            other => Err(format!("invalid purchase type {other}")),
        }
    }
}

impl From<PurchaseType> for u8 {
    fn from(value: PurchaseType) -> u8 {
        value as u8
    }
}

/// Who may buy a plot. Bitmask: free company and/or personal tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TenantType(pub u8);

impl TenantType {
    pub const FREE_COMPANY: TenantType = TenantType(1 << 0);
    pub const PERSONAL: TenantType = TenantType(1 << 1);

    pub fn contains(self, other: TenantType) -> bool {
        self.0 & other.0 != 0
    }
}

/// Lottery phase of an unowned plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AvailabilityType {
    /// Entries are currently accepted (or the plot is FCFS-purchasable).
    Available = 1,
    /// The lottery has been drawn; the winner may finalize the purchase.
    InResultsPeriod = 2,
    Unavailable = 3,
}

impl TryFrom<u8> for AvailabilityType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AvailabilityType::Available),
            2 => Ok(AvailabilityType::InResultsPeriod),
            3 => Ok(AvailabilityType::Unavailable),
            other => Err(format!("invalid availability type {other}")),
        }
    }
}

impl From<AvailabilityType> for u8 {
    fn from(value: AvailabilityType) -> u8 {
        value as u8
    }
}

/// Server-side purchase-system flag set carried by push payloads.
///
/// Distinct from [`PurchaseType`]: the server folds purchase and tenant
/// restrictions into one bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PurchaseSystem(pub u8);

impl PurchaseSystem {
    pub const LOTTERY: PurchaseSystem = PurchaseSystem(1 << 0);
    pub const FREE_COMPANY: PurchaseSystem = PurchaseSystem(1 << 1);
    pub const INDIVIDUAL: PurchaseSystem = PurchaseSystem(1 << 2);

    pub fn contains(self, other: PurchaseSystem) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for PurchaseSystem {
    type Output = PurchaseSystem;

    fn bitor(self, rhs: PurchaseSystem) -> PurchaseSystem {
        PurchaseSystem(self.0 | rhs.0)
    }
}

/// Sale metadata for one unowned plot, read from the placard payload.
///
/// The `unknown*` fields have no documented meaning; they are preserved
/// byte-for-byte so the ingest payload can forward them. `unknown4`
/// holds whatever trails the entry count, up to 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacardSaleInfo {
    pub purchase_type: PurchaseType,
    pub tenant_type: TenantType,
    pub availability_type: AvailabilityType,
    pub unknown1: u8,
    pub unknown2: u32,
    /// Unix seconds at which the current phase ends.
    pub phase_ends_at: u32,
    pub unknown3: u32,
    pub entry_count: u32,
    pub unknown4: Vec<u8>,
}

/// What kind of housing object a placard belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HousingType {
    OwnedHouse = 0,
    UnownedHouse = 1,
    FreeCompanyApartment = 2,
    Apartment = 3,
}

impl HousingType {
    pub fn from_u8(value: u8) -> Option<HousingType> {
        match value {
            0 => Some(HousingType::OwnedHouse),
            1 => Some(HousingType::UnownedHouse),
            2 => Some(HousingType::FreeCompanyApartment),
            3 => Some(HousingType::Apartment),
            _ => None,
        }
    }
}

/// An open plot retained for the end-of-sweep summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPlot {
    /// 0-based ward index.
    pub ward_number: u16,
    /// 0-based plot index within the ward.
    pub plot_number: u16,
    pub entry: HouseInfoEntry,
}

/// The local player, as reported by the host at HELLO time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub content_id: u64,
    pub name: String,
    pub home_world: String,
    pub home_world_id: u32,
}

/// The identity hierarchy the notification filter scopes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerContext {
    pub home_world_id: u16,
    pub home_datacenter_id: u16,
}
