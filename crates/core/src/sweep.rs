//! District sweep state machine.
//!
//! A "sweep" is the user visiting every ward of one district so the
//! client can snapshot them. [`SweepState`] tracks the district being
//! swept, which wards have been seen, and the open plots discovered, and
//! decides when an incoming ward snapshot belongs to a fresh sweep.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::types::{HousingFlags, OpenPlot, WardInfo};

/// A sweep older than this is considered stale; the next ward snapshot
/// starts a new one.
pub const SWEEP_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Per-user in-memory sweep tracker.
///
/// Owned and mutated by the coordinator only; created empty and
/// destroyed with the process. The ward count is parameterized because
/// it has changed across game versions (24 historically, 30 now) --
/// derive it from the host's catalog when available.
#[derive(Debug)]
pub struct SweepState {
    num_wards: u16,
    world_id: Option<i16>,
    district_id: Option<i16>,
    started_at: Option<Instant>,
    seen_wards: HashSet<u16>,
    open_plots: Vec<OpenPlot>,
}

impl SweepState {
    pub fn new(num_wards: u16) -> Self {
        Self {
            num_wards,
            world_id: None,
            district_id: None,
            started_at: None,
            seen_wards: HashSet::new(),
            open_plots: Vec::new(),
        }
    }

    /// Whether an incoming ward snapshot should begin a new sweep: a
    /// different `(world, district)` than the current one, or a current
    /// sweep older than [`SWEEP_TIMEOUT`]. Always true right after
    /// construction or [`reset`](Self::reset).
    pub fn should_start_new_sweep(&self, ward: &WardInfo) -> bool {
        self.world_id != Some(ward.land_ident.world_id)
            || self.district_id != Some(ward.land_ident.territory_type_id)
            || self
                .started_at
                .map(|t| t.elapsed() > SWEEP_TIMEOUT)
                .unwrap_or(true)
    }

    /// Begin a sweep of the ward's district, discarding prior progress.
    pub fn start(&mut self, ward: &WardInfo) {
        self.world_id = Some(ward.land_ident.world_id);
        self.district_id = Some(ward.land_ident.territory_type_id);
        self.seen_wards.clear();
        self.open_plots.clear();
        self.started_at = Some(Instant::now());
    }

    /// Whether this ward number was already recorded in the current sweep.
    pub fn contains(&self, ward: &WardInfo) -> bool {
        self.seen_wards.contains(&(ward.land_ident.ward_number as u16))
    }

    /// Record a ward snapshot. A ward already seen is a no-op; otherwise
    /// every entry without the owned bit becomes an [`OpenPlot`].
    pub fn add(&mut self, ward: &WardInfo) {
        if self.contains(ward) {
            return;
        }
        let ward_number = ward.land_ident.ward_number as u16;
        self.seen_wards.insert(ward_number);
        for (plot_number, entry) in ward.entries.iter().enumerate() {
            if !entry.flags.contains(HousingFlags::PLOT_OWNED) {
                self.open_plots.push(OpenPlot {
                    ward_number,
                    plot_number: plot_number as u16,
                    entry: entry.clone(),
                });
            }
        }
    }

    /// True once every ward of the district has been seen.
    pub fn is_complete(&self) -> bool {
        self.seen_wards.len() == self.num_wards as usize
    }

    /// Clear all identifiers and collections, as if freshly constructed.
    pub fn reset(&mut self) {
        self.world_id = None;
        self.district_id = None;
        self.started_at = None;
        self.seen_wards.clear();
        self.open_plots.clear();
    }

    pub fn num_wards(&self) -> u16 {
        self.num_wards
    }

    pub fn world_id(&self) -> Option<i16> {
        self.world_id
    }

    pub fn district_id(&self) -> Option<i16> {
        self.district_id
    }

    pub fn seen_ward_count(&self) -> usize {
        self.seen_wards.len()
    }

    pub fn open_plots(&self) -> &[OpenPlot] {
        &self.open_plots
    }

    /// Rewind the sweep start time, to exercise the staleness window.
    #[cfg(test)]
    pub(crate) fn age_by(&mut self, by: Duration) {
        self.started_at = self.started_at.and_then(|t| t.checked_sub(by));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HouseInfoEntry, LandIdent};

    fn ward(world_id: i16, district_id: i16, ward_number: i16, open: &[usize]) -> WardInfo {
        let entries = (0..60)
            .map(|i| HouseInfoEntry {
                price: 3_000_000,
                flags: if open.contains(&i) {
                    HousingFlags(0)
                } else {
                    HousingFlags::PLOT_OWNED
                },
                appeals: [0; 3],
                owner_name: String::new(),
            })
            .collect();
        WardInfo {
            land_ident: LandIdent {
                land_id: -1,
                ward_number,
                territory_type_id: district_id,
                world_id,
            },
            entries,
            purchase_type: None,
            tenant_type: None,
        }
    }

    #[test]
    fn first_ward_always_starts_a_sweep() {
        let state = SweepState::new(30);
        assert!(state.should_start_new_sweep(&ward(73, 339, 0, &[])));
    }

    #[test]
    fn same_district_does_not_restart() {
        let mut state = SweepState::new(30);
        let first = ward(73, 339, 0, &[]);
        state.start(&first);
        state.add(&first);
        assert!(!state.should_start_new_sweep(&ward(73, 339, 1, &[])));
    }

    #[test]
    fn different_district_or_world_restarts() {
        let mut state = SweepState::new(30);
        state.start(&ward(73, 339, 0, &[]));
        assert!(state.should_start_new_sweep(&ward(73, 340, 0, &[])));
        assert!(state.should_start_new_sweep(&ward(74, 339, 0, &[])));
    }

    #[test]
    fn stale_sweep_restarts() {
        let mut state = SweepState::new(30);
        state.start(&ward(73, 339, 0, &[]));
        assert!(!state.should_start_new_sweep(&ward(73, 339, 1, &[])));
        state.age_by(SWEEP_TIMEOUT + Duration::from_secs(1));
        assert!(state.should_start_new_sweep(&ward(73, 339, 1, &[])));
    }

    #[test]
    fn add_collects_open_plots() {
        let mut state = SweepState::new(30);
        let first = ward(73, 339, 0, &[4, 17]);
        state.start(&first);
        state.add(&first);
        state.add(&ward(73, 339, 1, &[0]));

        assert_eq!(state.open_plots().len(), 3);
        assert_eq!(state.open_plots()[0].ward_number, 0);
        assert_eq!(state.open_plots()[0].plot_number, 4);
        assert_eq!(state.open_plots()[2].ward_number, 1);
        assert_eq!(state.open_plots()[2].plot_number, 0);
    }

    #[test]
    fn duplicate_ward_is_idempotent() {
        let mut state = SweepState::new(30);
        let w5 = ward(73, 339, 5, &[2]);
        state.start(&w5);
        state.add(&w5);
        state.add(&w5);

        assert_eq!(state.seen_ward_count(), 1);
        assert_eq!(state.open_plots().len(), 1);
    }

    #[test]
    fn completes_after_all_wards() {
        let mut state = SweepState::new(30);
        let first = ward(73, 339, 0, &[]);
        state.start(&first);
        for n in 0..30 {
            assert!(!state.is_complete());
            state.add(&ward(73, 339, n, &[]));
        }
        assert!(state.is_complete());
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = SweepState::new(30);
        let first = ward(73, 339, 0, &[1]);
        state.start(&first);
        state.add(&first);
        state.reset();

        assert_eq!(state.world_id(), None);
        assert_eq!(state.district_id(), None);
        assert_eq!(state.seen_ward_count(), 0);
        assert!(state.open_plots().is_empty());
        assert!(state.should_start_new_sweep(&first));
    }
}
