//! Wire schema for the aggregation server.
//!
//! HTTP request/response bodies, the batched ingest records, and the
//! WebSocket push messages. Push frames arrive as JSON objects
//! `{"type": "<kind>", "data": {...}}` and deserialize into the
//! internally-tagged [`PushMessage`] enum.

use serde::{Deserialize, Serialize};

use paissa_core::types::{
    AvailabilityType, HouseInfoEntry, LandIdent, PlacardSaleInfo, PurchaseSystem,
};

// ---------------------------------------------------------------------------
// HTTP bodies
// ---------------------------------------------------------------------------

/// Body of `POST /hello`: registers the character for this session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloRequest {
    pub cid: u64,
    pub name: String,
    pub world: String,
    #[serde(rename = "worldId")]
    pub world_id: u32,
}

/// Response of `POST /hello`.
#[derive(Debug, Clone, Deserialize)]
pub struct HelloResponse {
    pub session_token: String,
}

/// Response of `GET /worlds/{worldId}/{districtId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DistrictDetail {
    pub district_id: u16,
    pub name: String,
    pub num_open_plots: u16,
    pub open_plots: Vec<OpenPlotDetail>,
}

// ---------------------------------------------------------------------------
// Ingest records
// ---------------------------------------------------------------------------

/// One observation in the batched `POST /ingest` array, discriminated by
/// the `event_type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum IngestRecord {
    #[serde(rename = "HOUSING_WARD_INFO")]
    WardInfo(WardInfoRecord),

    #[serde(rename = "LOTTERY_INFO")]
    Lottery(LotteryRecord),
}

/// A full ward snapshot observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardInfoRecord {
    /// Unix seconds at which the client decoded the snapshot.
    pub client_timestamp: i64,
    /// Timestamp the game server stamped on the surrounding frame.
    pub server_timestamp: i32,
    pub land_ident: LandIdent,
    pub house_info_entries: Vec<HouseInfoEntry>,
    /// Trailing bytes of the newer ward layout, forwarded verbatim.
    pub purchase_type: Option<u8>,
    pub tenant_type: Option<u8>,
}

/// A placard sale observation for one unowned plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryRecord {
    pub client_timestamp: i64,
    pub world_id: u32,
    pub district_id: u16,
    /// 0-based ward index.
    pub ward_number: u16,
    /// 0-based plot index.
    pub plot_number: u16,
    /// The decoded placard, opaque fields included.
    #[serde(flatten)]
    pub sale_info: PlacardSaleInfo,
}

// ---------------------------------------------------------------------------
// Push messages
// ---------------------------------------------------------------------------

/// A plot that just became purchasable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPlotDetail {
    pub world_id: u16,
    pub district_id: u16,
    /// 0-based ward index.
    pub ward_number: u16,
    /// 0-based plot index.
    pub plot_number: u16,
    pub size: u8,
    pub price: u32,
    pub last_updated_time: f64,
    pub est_time_open_min: f64,
    pub est_time_open_max: f64,
    pub purchase_system: PurchaseSystem,
    pub lotto_entries: Option<u32>,
    pub lotto_phase: Option<AvailabilityType>,
    pub lotto_phase_until: Option<u32>,
}

/// A state change on an already-open plot (lottery phase, entries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotUpdate {
    pub world_id: u16,
    pub district_id: u16,
    pub ward_number: u16,
    pub plot_number: u16,
    pub size: u8,
    pub price: u32,
    pub last_updated_time: f64,
    pub purchase_system: PurchaseSystem,
    pub lotto_entries: Option<u32>,
    pub lotto_phase: Option<AvailabilityType>,
    pub previous_lotto_phase: Option<AvailabilityType>,
    pub lotto_phase_until: Option<u32>,
}

/// A plot that left the market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoldPlotDetail {
    pub world_id: u16,
    pub district_id: u16,
    pub ward_number: u16,
    pub plot_number: u16,
    pub size: u8,
    pub last_updated_time: f64,
    pub est_time_sold_min: f64,
    pub est_time_sold_max: f64,
}

/// All known push message types.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PushMessage {
    #[serde(rename = "plot_open")]
    PlotOpen(OpenPlotDetail),

    #[serde(rename = "plot_update")]
    PlotUpdate(PlotUpdate),

    #[serde(rename = "plot_sold")]
    PlotSold(SoldPlotDetail),

    /// Liveness only; carries no payload.
    #[serde(rename = "ping")]
    Ping,
}

/// Parse a push text frame into a typed message.
///
/// Returns `Err` for malformed JSON or unknown `type` values. Callers
/// should log unknown types and continue.
pub fn parse_push_message(text: &str) -> Result<PushMessage, serde_json::Error> {
    serde_json::from_str(text)
}
