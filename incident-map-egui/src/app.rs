//! The eframe application: the map, its overlays and the dialogs around it.

use std::time::Duration;

use egui::{Align2, TextureHandle, TextureOptions};
use galileo::{Map, TileSchema};
use galileo_egui::{EguiMap, EguiMapState};
use incident_map::geo::ScreenProjector;
use incident_map::view::PendingReport;
use incident_map::{
    GeolocationWatch, HttpClientImpl, MapViewConfig, MapViewState, Mode, OutcomeReceiver,
    TaskRunner,
};
use web_time::Instant;

use crate::icons::{to_color_image, IconCache};
use crate::messenger::RepaintMessenger;
use crate::overlays::paint_overlays;
use crate::ClickQueue;

const CAMERA_ANIMATION: Duration = Duration::from_millis(500);
const TILE_SCHEMA_LODS: u32 = 18;

/// Map application. Owns the map view state and everything started for it: dropping the
/// app stops position tracking and lets pending requests finish into a closed channel.
pub struct IncidentMapApp {
    map: EguiMapState,
    state: MapViewState,
    runner: TaskRunner<HttpClientImpl>,
    outcomes: OutcomeReceiver,
    clicks: ClickQueue,
    icons: IconCache,
    traffic_texture: Option<(u64, TextureHandle)>,
    started: bool,
    _geolocation: Option<GeolocationWatch>,
}

enum ReportAction {
    Submit,
    Cancel,
}

impl IncidentMapApp {
    /// Creates the app. Background work starts with the first frame, once the egui context
    /// is known.
    pub fn new(
        map: EguiMapState,
        config: MapViewConfig,
        http: HttpClientImpl,
        clicks: ClickQueue,
    ) -> Self {
        let (runner, outcomes) = TaskRunner::new(http.clone(), &config);

        Self {
            map,
            state: MapViewState::new(config),
            runner,
            outcomes,
            clicks,
            icons: IconCache::new(http),
            traffic_texture: None,
            started: false,
            _geolocation: None,
        }
    }

    fn start(&mut self, ctx: &egui::Context) {
        if self.started {
            return;
        }

        self._geolocation = start_services(ctx, &mut self.runner, &mut self.state);
        self.started = true;
    }

    fn process_outcomes(&mut self, now: Instant) {
        for outcome in self.outcomes.drain() {
            let commands = self.state.apply(outcome, now);
            self.runner.execute_all(commands);
        }
    }

    fn process_clicks(&mut self) {
        let clicks = std::mem::take(&mut *self.clicks.lock());
        if clicks.is_empty() {
            return;
        }

        let Some(projector) = view_projector(self.map.map()) else {
            log::warn!("Map view has no valid position, ignoring {} clicks", clicks.len());
            return;
        };

        for click in clicks {
            let Some(position) = projector.to_geo(click) else {
                log::debug!("Click at {click:?} is outside of the map");
                continue;
            };
            let commands = self.state.on_click(position);
            self.runner.execute_all(commands);
        }
    }

    fn follow_camera(&mut self) {
        let Some(request) = self.state.take_camera_request() else {
            return;
        };

        let map = self.map.map_mut();
        let view = map.view();
        let resolution = TileSchema::web(TILE_SCHEMA_LODS)
            .lod_resolution(request.z_level)
            .unwrap_or_else(|| view.resolution());
        let target = view
            .with_position(&request.position)
            .with_resolution(resolution);

        map.animate_to(target, CAMERA_ANIMATION);
        map.redraw();
    }

    fn show_mode_selector(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("mode_selector").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("On click:");
                let mut mode = self.state.mode();
                egui::ComboBox::from_id_salt("mode")
                    .selected_text(mode.label())
                    .show_ui(ui, |ui| {
                        for option in Mode::ALL {
                            ui.selectable_value(&mut mode, option, option.label());
                        }
                    });
                self.state.set_mode(mode);
            });
        });
    }

    fn show_map(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                EguiMap::new(&mut self.map).show_ui(ui);

                let Some(projector) = view_projector(self.map.map()) else {
                    return;
                };
                let overlays = self
                    .state
                    .user_marker()
                    .into_iter()
                    .chain(self.state.overlays().iter());
                paint_overlays(ui, rect, &projector, overlays, &mut self.icons);
            });
    }

    fn show_traffic(&mut self, ctx: &egui::Context, now: Instant) {
        let Some(snapshot) = self.state.traffic_snapshot() else {
            self.traffic_texture = None;
            return;
        };

        let texture = match &self.traffic_texture {
            Some((id, texture)) if *id == snapshot.id() => texture.clone(),
            _ => {
                let texture = ctx.load_texture(
                    format!("traffic-{}", snapshot.id()),
                    to_color_image(snapshot.image()),
                    TextureOptions::LINEAR,
                );
                self.traffic_texture = Some((snapshot.id(), texture.clone()));
                texture
            }
        };

        egui::Window::new("Traffic")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::RIGHT_TOP, [-10.0, 10.0])
            .show(ctx, |ui| {
                ui.label(snapshot.location().to_string());
                ui.add(egui::Image::from_texture(&texture).max_width(500.0));
            });

        ctx.request_repaint_after(snapshot.remaining(now));
    }

    fn show_report_dialog(&mut self, ctx: &egui::Context) {
        let Some(report) = self.state.pending_report_mut() else {
            return;
        };

        let action = report_dialog(ctx, report);
        match action {
            Some(ReportAction::Submit) => {
                if let Some(command) = self.state.submit_report() {
                    self.runner.execute(command);
                }
            }
            Some(ReportAction::Cancel) => self.state.cancel_report(),
            None => {}
        }
    }
}

fn report_dialog(ctx: &egui::Context, report: &mut PendingReport) -> Option<ReportAction> {
    let mut action = None;
    egui::Window::new("Report incident")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(report.location().to_string());
            egui::Grid::new("report_fields")
                .num_columns(2)
                .show(ui, |ui| {
                    ui.label("Short description");
                    ui.text_edit_singleline(&mut report.description);
                    ui.end_row();

                    ui.label("Type");
                    ui.text_edit_singleline(&mut report.kind);
                    ui.end_row();
                });

            ui.horizontal(|ui| {
                if ui.button("Submit").clicked() {
                    action = Some(ReportAction::Submit);
                }
                if ui.button("Cancel").clicked() {
                    action = Some(ReportAction::Cancel);
                }
            });
        });

    action
}

/// Connects the runner to the UI, loads the stored incidents and starts position tracking.
fn start_services(
    ctx: &egui::Context,
    runner: &mut TaskRunner<HttpClientImpl>,
    state: &mut MapViewState,
) -> Option<GeolocationWatch> {
    runner.set_messenger(RepaintMessenger::new(ctx.clone()));
    runner.execute_all(state.initial_commands());

    match GeolocationWatch::start(Box::new(runner.position_sink())) {
        Ok(watch) => Some(watch),
        Err(err) => {
            log::info!("Position tracking is not available: {err}");
            None
        }
    }
}

/// Projector matching the current map view, or `None` if the view has no valid position.
fn view_projector(map: &Map) -> Option<ScreenProjector> {
    let view = map.view();
    let size = view.size();
    ScreenProjector::new(
        &view.position()?,
        view.resolution(),
        size.width(),
        size.height(),
    )
}

impl eframe::App for IncidentMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.start(ctx);

        let now = Instant::now();
        self.process_outcomes(now);
        self.state.tick(now);
        self.icons.poll(ctx);

        self.show_mode_selector(ctx);
        self.show_map(ctx);

        // Clicks are queued by the map event handler while the map is drawn.
        self.process_clicks();
        self.follow_camera();

        self.show_traffic(ctx, now);
        self.show_report_dialog(ctx);
    }
}

#[cfg(test)]
mod tests {
    use incident_map::galileo_types::latlon;
    use incident_map::Outcome;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn started_services_wake_the_ui() {
        let ctx = egui::Context::default();
        let config = MapViewConfig::default();
        let (mut runner, mut outcomes) =
            TaskRunner::new(HttpClientImpl::new().unwrap(), &config);
        let mut state = MapViewState::new(config);

        tokio_test::block_on(async {
            let geolocation = start_services(&ctx, &mut runner, &mut state);
            assert!(geolocation.is_none());

            runner.position_sink()(latlon!(1.0, 2.0));
        });

        assert!(ctx.has_requested_repaint());
        let received = outcomes.drain();
        assert!(received
            .iter()
            .any(|outcome| matches!(outcome, Outcome::Position(p) if *p == latlon!(1.0, 2.0))));
    }
}
