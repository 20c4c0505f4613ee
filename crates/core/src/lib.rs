//! Domain core for the housing sweep pipeline.
//!
//! Pure, I/O-free building blocks:
//!
//! - [`wire`] -- binary decoders for the ward snapshot and placard sale
//!   payloads.
//! - [`sweep`] -- the district sweep state machine.
//! - [`filter`] -- the notification predicate.
//! - [`format`] -- human-readable plot descriptions.
//! - [`config`] -- the user configuration document and store contract.
//! - [`catalog`] -- read-only game-data lookup contract.

pub mod catalog;
pub mod config;
pub mod filter;
pub mod format;
pub mod sweep;
pub mod types;
pub mod wire;

pub use catalog::CatalogService;
pub use config::{ConfigStore, UserConfig};
pub use sweep::SweepState;
pub use types::{PlacardSaleInfo, WardInfo};
pub use wire::{decode_placard_sale_info, decode_ward_info, DecodeError};
