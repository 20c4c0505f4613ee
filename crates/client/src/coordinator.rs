//! Glue between the host's observations, the sweep state machine, the
//! ingest pipeline, and the push notification path.
//!
//! The coordinator owns the [`SweepState`] and handles every event on a
//! single task, so no lock guards the sweep. All I/O it triggers (batch
//! POSTs, the HELLO handshake) runs on detached tasks inside the
//! [`IngestClient`].

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use paissa_core::catalog::CatalogService;
use paissa_core::config::UserConfig;
use paissa_core::filter::{self, PlotEventFilterInput, PlotEventKind};
use paissa_core::format::{format_plot, PlotSummary};
use paissa_core::sweep::SweepState;
use paissa_core::types::HousingType;
use paissa_core::wire;

use crate::ingest::IngestClient;
use crate::observer::{GameEvent, GameObserver, UserSink};
use crate::push::PushEvent;
use crate::schema::{IngestRecord, LotteryRecord, WardInfoRecord};

/// Event-loop hub of the client.
pub struct Coordinator {
    observer: Arc<dyn GameObserver>,
    ingest: Arc<IngestClient>,
    catalog: Arc<dyn CatalogService>,
    config: Arc<RwLock<UserConfig>>,
    sink: Arc<dyn UserSink>,
    sweep: SweepState,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(
        observer: Arc<dyn GameObserver>,
        ingest: Arc<IngestClient>,
        catalog: Arc<dyn CatalogService>,
        config: Arc<RwLock<UserConfig>>,
        sink: Arc<dyn UserSink>,
        cancel: CancellationToken,
    ) -> Self {
        let sweep = SweepState::new(catalog.wards_per_district());
        Self {
            observer,
            ingest,
            catalog,
            config,
            sink,
            sweep,
            cancel,
        }
    }

    pub fn sweep(&self) -> &SweepState {
        &self.sweep
    }

    /// Forget the current sweep, so re-sweeping the same district works
    /// without waiting out the staleness window.
    pub fn reset_sweep(&mut self) {
        self.sweep.reset();
    }

    /// Consume game and push events until cancelled.
    pub async fn run(mut self, mut push_rx: broadcast::Receiver<PushEvent>) {
        let mut game_rx = self.observer.subscribe();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = game_rx.recv() => match event {
                    Ok(event) => self.handle_game_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Game event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                event = push_rx.recv() => match event {
                    Ok(event) => self.handle_push_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Push event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    /// Dispatch one observation from the host.
    pub fn handle_game_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::WardInfo {
                bytes,
                server_timestamp,
            } => self.on_ward_info(&bytes, server_timestamp),
            GameEvent::PlacardSaleInfo {
                housing_type,
                territory_type_id,
                ward_id,
                plot_id,
                apartment,
                bytes,
            } => self.on_placard_sale_info(
                housing_type,
                territory_type_id,
                ward_id,
                plot_id,
                apartment,
                &bytes,
            ),
            GameEvent::Login => self.ingest.mark_needs_hello(),
            GameEvent::Tick => self.on_tick(),
        }
    }

    /// Run one pushed plot event through the filter and, if accepted,
    /// out to the user.
    pub fn handle_push_event(&self, event: &PushEvent) {
        let config = self.config.read().expect("config lock poisoned").clone();

        let (input, ward_number, plot_number, price) = match event {
            PushEvent::PlotOpen(detail) => (
                PlotEventFilterInput {
                    kind: PlotEventKind::Open,
                    world_id: detail.world_id,
                    district_id: detail.district_id,
                    size: detail.size,
                    purchase_system: detail.purchase_system,
                    lotto_phase: detail.lotto_phase,
                    previous_lotto_phase: None,
                },
                detail.ward_number,
                detail.plot_number,
                detail.price,
            ),
            PushEvent::PlotUpdate(update) => (
                PlotEventFilterInput {
                    kind: PlotEventKind::Update,
                    world_id: update.world_id,
                    district_id: update.district_id,
                    size: update.size,
                    purchase_system: update.purchase_system,
                    lotto_phase: update.lotto_phase,
                    previous_lotto_phase: update.previous_lotto_phase,
                },
                update.ward_number,
                update.plot_number,
                update.price,
            ),
            PushEvent::PlotSold(detail) => {
                // Observed but never surfaced to the user.
                tracing::debug!(
                    world_id = detail.world_id,
                    district_id = detail.district_id,
                    ward = detail.ward_number,
                    plot = detail.plot_number,
                    "Plot sold",
                );
                return;
            }
        };

        let player = self.observer.player_context();
        let event_datacenter = self.catalog.datacenter_of_world(input.world_id);
        if !filter::accept(&input, &config, player.as_ref(), event_datacenter) {
            return;
        }

        let world_name = self.world_name(input.world_id);
        let summary = PlotSummary {
            district_name: self.district_name(input.district_id),
            world_name: world_name.clone(),
            ward_number: ward_number + 1,
            plot_number: plot_number + 1,
            price,
            size: input.size,
        };
        let line = format_plot(config.output_format, &config.custom_template, &summary);
        self.sink.print(
            &config.chat_channel,
            &format!("New plot available for purchase on {world_name}: {line}"),
        );
    }

    // ---- game event handlers ----

    fn on_ward_info(&mut self, bytes: &[u8], server_timestamp: i32) {
        let config = self.config.read().expect("config lock poisoned").clone();
        if !config.enabled {
            return;
        }

        let ward = match wire::decode_ward_info(bytes) {
            Ok(ward) => ward,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable ward snapshot");
                return;
            }
        };
        tracing::debug!(
            ward = ward.land_ident.ward_number,
            district = ward.land_ident.territory_type_id,
            world = ward.land_ident.world_id,
            "Got ward snapshot",
        );

        if self.sweep.should_start_new_sweep(&ward) {
            self.sweep.start(&ward);
            if config.announce_sweep_progress {
                let district = self.district_name(ward.land_ident.territory_type_id as u16);
                let world = self.world_name(ward.land_ident.world_id as u16);
                self.sink.print(
                    &config.chat_channel,
                    &format!("Began sweep for {district} ({world})"),
                );
            }
        }

        if self.sweep.contains(&ward) {
            tracing::debug!(
                ward = ward.land_ident.ward_number,
                "Skipping ward already seen this sweep",
            );
            return;
        }
        self.sweep.add(&ward);

        self.ingest.submit(IngestRecord::WardInfo(WardInfoRecord {
            client_timestamp: chrono::Utc::now().timestamp(),
            server_timestamp,
            land_ident: ward.land_ident,
            house_info_entries: ward.entries,
            purchase_type: ward.purchase_type,
            tenant_type: ward.tenant_type,
        }));

        if self.sweep.is_complete() {
            self.on_sweep_complete(&config);
        }
    }

    fn on_placard_sale_info(
        &mut self,
        housing_type: u8,
        territory_type_id: u16,
        ward_id: u8,
        plot_id: u8,
        apartment: i16,
        bytes: &[u8],
    ) {
        // Placards on owned houses and apartments carry no sale data.
        if HousingType::from_u8(housing_type) != Some(HousingType::UnownedHouse) {
            return;
        }
        if bytes.is_empty() {
            return;
        }

        let sale_info = match wire::decode_placard_sale_info(bytes) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable placard payload");
                return;
            }
        };

        let Some(world_id) = self.observer.current_world_id() else {
            return;
        };

        tracing::info!(
            district = territory_type_id,
            ward = ward_id as u16 + 1,
            plot = plot_id as u16 + 1,
            apartment,
            entries = sale_info.entry_count,
            "Unowned plot placard observed",
        );

        self.ingest.submit(IngestRecord::Lottery(LotteryRecord {
            client_timestamp: chrono::Utc::now().timestamp(),
            world_id: world_id as u32,
            district_id: territory_type_id,
            ward_number: ward_id as u16,
            plot_number: plot_id as u16,
            sale_info,
        }));
    }

    fn on_tick(&self) {
        if self.ingest.needs_hello() {
            if let Some(player) = self.observer.local_player() {
                self.ingest.spawn_hello(player);
            }
        }
    }

    /// Print the end-of-sweep summary: every open plot found.
    fn on_sweep_complete(&self, config: &UserConfig) {
        tracing::info!(
            district = ?self.sweep.district_id(),
            open_plots = self.sweep.open_plots().len(),
            "District sweep complete",
        );
        if !config.announce_sweep_progress {
            return;
        }

        let district = self.district_name(self.sweep.district_id().unwrap_or_default() as u16);
        let world = self.world_name(self.sweep.world_id().unwrap_or_default() as u16);
        let district_id = self.sweep.district_id().unwrap_or_default() as u16;

        self.sink.print(
            &config.chat_channel,
            &format!(
                "Swept all {} wards. Thank you for your contribution!",
                self.sweep.num_wards()
            ),
        );
        self.sink.print(
            &config.chat_channel,
            &format!("Here's a summary of open plots in {district}:"),
        );
        self.sink.print(
            &config.chat_channel,
            &format!("{district}: {} open plots.", self.sweep.open_plots().len()),
        );

        for plot in self.sweep.open_plots() {
            let size = self
                .catalog
                .plot_size(district_id, plot.plot_number)
                .unwrap_or(0);
            let summary = PlotSummary {
                district_name: district.clone(),
                world_name: world.clone(),
                ward_number: plot.ward_number + 1,
                plot_number: plot.plot_number + 1,
                price: plot.entry.price,
                size,
            };
            self.sink.print(
                &config.chat_channel,
                &format_plot(config.output_format, &config.custom_template, &summary),
            );
        }
    }

    // ---- helpers ----

    fn district_name(&self, district_id: u16) -> String {
        self.catalog
            .district_name(district_id)
            .unwrap_or_else(|| format!("District {district_id}"))
    }

    fn world_name(&self, world_id: u16) -> String {
        self.catalog
            .world_name(world_id)
            .unwrap_or_else(|| format!("World {world_id}"))
    }
}
