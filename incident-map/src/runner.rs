//! Execution of [`Command`]s on the platform async runtime.

use std::sync::Arc;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use galileo_types::geo::impls::GeoPoint2d;
use maybe_sync::{MaybeSend, MaybeSync};

use crate::client::{IncidentBackend, TrafficApi};
use crate::config::MapViewConfig;
use crate::decoded_image::DecodedImage;
use crate::messenger::Messenger;
use crate::platform::{spawn, HttpClient};
use crate::view::{Command, Outcome};

struct Services<H> {
    backend: IncidentBackend<H>,
    traffic: TrafficApi<H>,
}

/// Runs commands in the background and reports their outcomes through a channel.
///
/// Commands are never cancelled or retried. Ordering of the outcomes follows the order in
/// which responses arrive, which is why [`MapViewState`](crate::MapViewState) checks request
/// generations.
pub struct TaskRunner<H> {
    services: Arc<Services<H>>,
    sender: UnboundedSender<Outcome>,
    messenger: Option<Arc<dyn Messenger>>,
}

/// Receiving end of the outcome channel, polled by the UI.
pub struct OutcomeReceiver {
    receiver: UnboundedReceiver<Outcome>,
}

impl OutcomeReceiver {
    /// Returns the next outcome if one is ready.
    pub fn try_recv(&mut self) -> Option<Outcome> {
        match self.receiver.try_next() {
            Ok(outcome) => outcome,
            Err(_) => None,
        }
    }

    /// Returns all outcomes that are ready.
    pub fn drain(&mut self) -> Vec<Outcome> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl<H> TaskRunner<H>
where
    H: HttpClient + MaybeSend + MaybeSync + 'static,
{
    /// Creates a runner that talks to the services named in the config.
    pub fn new(http: H, config: &MapViewConfig) -> (Self, OutcomeReceiver)
    where
        H: Clone,
    {
        let (sender, receiver) = unbounded();
        let services = Services {
            traffic: TrafficApi::new(http.clone(), config),
            backend: IncidentBackend::new(http, config.backend_url.clone()),
        };

        (
            Self {
                services: Arc::new(services),
                sender,
                messenger: None,
            },
            OutcomeReceiver { receiver },
        )
    }

    /// Sets the messenger notified after every outcome.
    pub fn set_messenger(&mut self, messenger: impl Messenger + 'static) {
        self.messenger = Some(Arc::new(messenger));
    }

    /// Starts executing the command in the background.
    pub fn execute(&self, command: Command) {
        let services = self.services.clone();
        let sender = self.sender.clone();
        let messenger = self.messenger.clone();

        spawn(async move {
            let outcome = run(&services, command).await;
            if sender.unbounded_send(outcome).is_err() {
                log::debug!("Outcome receiver is gone, dropping the outcome");
                return;
            }

            if let Some(messenger) = messenger {
                messenger.request_redraw();
            }
        });
    }

    /// Starts executing all the commands.
    pub fn execute_all(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.execute(command);
        }
    }

    /// Returns a function that forwards position updates to the outcome channel.
    pub fn position_sink(&self) -> impl Fn(GeoPoint2d) + 'static {
        let sender = self.sender.clone();
        let messenger = self.messenger.clone();
        move |position| {
            if sender.unbounded_send(Outcome::Position(position)).is_ok() {
                if let Some(messenger) = &messenger {
                    messenger.request_redraw();
                }
            }
        }
    }
}

async fn run<H: HttpClient>(services: &Services<H>, command: Command) -> Outcome {
    match command {
        Command::LoadIncidents { generation } => Outcome::Incidents {
            generation,
            result: services.backend.list_incidents().await,
        },
        Command::LoadTraffic {
            generation,
            location,
        } => {
            let result = services
                .traffic
                .flow_image(&location)
                .await
                .and_then(|bytes| DecodedImage::decode(&bytes));
            Outcome::Traffic {
                generation,
                location,
                result,
            }
        }
        Command::LoadThirdPartyIncidents { generation, bbox } => Outcome::ThirdPartyIncidents {
            generation,
            result: services.traffic.incidents(&bbox).await,
        },
        Command::SubmitIncident { incident } => Outcome::IncidentSubmitted {
            result: services.backend.submit_incident(&incident).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use galileo_types::geo::GeoPoint;
    use galileo_types::latlon;
    use web_time::Instant;

    use super::*;
    use crate::error::IncidentMapError;
    use crate::geo::ClickLocation;
    use crate::incident::Incident;
    use crate::mode::Mode;
    use crate::tests::{FakeHttpClient, RecordedRequest, TWO_PIXEL_PNG};
    use crate::view::MapViewState;

    const BACKEND: &str = "http://localhost:3001/incidents";

    fn config() -> MapViewConfig {
        MapViewConfig {
            api_key: "KEY".into(),
            ..Default::default()
        }
    }

    fn services(http: &FakeHttpClient) -> Services<FakeHttpClient> {
        Services {
            backend: IncidentBackend::new(http.clone(), BACKEND),
            traffic: TrafficApi::new(http.clone(), &config()),
        }
    }

    /// Runs the commands one after another and applies their outcomes, including follow-ups.
    fn run_to_completion(
        state: &mut MapViewState,
        services: &Services<FakeHttpClient>,
        commands: Vec<Command>,
    ) {
        let mut queue = commands;
        while !queue.is_empty() {
            let command = queue.remove(0);
            let outcome = tokio_test::block_on(run(services, command));
            queue.extend(state.apply(outcome, Instant::now()));
        }
    }

    #[test]
    fn display_incidents_scenario() {
        let http = FakeHttpClient::default();
        http.respond(
            BACKEND,
            r#"[{"lat":"1.0","lng":"2.0","shortDesc":"pothole","type":"hazard"}]"#,
        );
        let services = services(&http);
        let mut state = MapViewState::new(config());

        let commands = state.initial_commands();
        run_to_completion(&mut state, &services, commands);

        assert_eq!(state.overlays().len(), 1);
        let overlay = state.overlays().iter().next().unwrap();
        assert_relative_eq!(overlay.position.lat(), 1.0);
        assert_relative_eq!(overlay.position.lon(), 2.0);
        assert_eq!(overlay.description.as_deref(), Some("pothole"));
    }

    #[test]
    fn record_without_coordinates_is_skipped() {
        let http = FakeHttpClient::default();
        http.respond(
            BACKEND,
            r#"[
                {"lat":"1.0","lng":"2.0","shortDesc":"pothole","type":"hazard"},
                {"lat":null,"lng":"2.0","shortDesc":"lost","type":"hazard"}
            ]"#,
        );
        let services = services(&http);
        let mut state = MapViewState::new(config());

        let commands = state.initial_commands();
        run_to_completion(&mut state, &services, commands);

        assert_eq!(state.overlays().len(), 1);
        let overlay = state.overlays().iter().next().unwrap();
        assert_eq!(overlay.description.as_deref(), Some("pothole"));
    }

    #[test]
    fn traffic_scenario() {
        let http = FakeHttpClient::default();
        let services = services(&http);
        let url = services
            .traffic
            .flow_url(&ClickLocation::new(10.1234, 50.5678));
        assert!(url.contains("mapLat=50.57&mapLng=10.12"));
        http.respond(&url, TWO_PIXEL_PNG);

        let mut state = MapViewState::new(config());
        state.set_mode(Mode::Traffic);
        let commands = state.on_click(latlon!(50.5678, 10.1234));
        run_to_completion(&mut state, &services, commands);

        assert_eq!(http.requests(), [RecordedRequest::Get(url)]);
        let snapshot = state.traffic_snapshot().unwrap();
        assert_eq!(snapshot.image().dimensions, (2, 1));

        state.tick(Instant::now() + config().traffic_image_ttl());
        assert!(state.traffic_snapshot().is_none());
    }

    #[test]
    fn add_incident_scenario() {
        let http = FakeHttpClient::default();
        http.respond(BACKEND, "[]");
        let services = services(&http);
        let mut state = MapViewState::new(config());
        state.set_mode(Mode::AddIncident);

        let commands = state.on_click(latlon!(4.4, 3.3));
        run_to_completion(&mut state, &services, commands);

        let report = state.pending_report_mut().unwrap();
        report.description = "tree down".into();
        report.kind = "debris".into();
        // the fake answers the POST and the refresh with the same document
        http.respond(
            BACKEND,
            r#"[{"lat":"4.40","lng":"3.30","shortDesc":"tree down","type":"debris"}]"#,
        );
        let submit = state.submit_report().unwrap();
        run_to_completion(&mut state, &services, vec![submit]);

        let requests = http.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0], RecordedRequest::Get(BACKEND.into()));
        let RecordedRequest::Post(url, body) = &requests[1] else {
            panic!("expected a POST request, got {requests:?}");
        };
        assert_eq!(url, BACKEND);
        let sent: Incident = serde_json::from_slice(body).unwrap();
        assert_eq!(sent.lat, "4.40");
        assert_eq!(sent.lng, "3.30");
        assert_eq!(sent.short_desc, "tree down");
        assert_eq!(sent.kind, "debris");
        assert_eq!(requests[2], RecordedRequest::Get(BACKEND.into()));

        assert_eq!(state.overlays().len(), 1);
    }

    #[test]
    fn undecodable_traffic_image_is_an_error() {
        let http = FakeHttpClient::default();
        let services = services(&http);
        let location = ClickLocation::new(1.0, 1.0);
        http.respond(&services.traffic.flow_url(&location), "{\"error\":\"bad key\"}");

        let outcome = tokio_test::block_on(run(
            &services,
            Command::LoadTraffic {
                generation: 1,
                location,
            },
        ));
        assert_matches!(
            outcome,
            Outcome::Traffic {
                result: Err(IncidentMapError::ImageDecode(_)),
                ..
            }
        );
    }

    #[test]
    fn position_sink_feeds_the_channel() {
        let (runner, mut receiver) = TaskRunner::new(FakeHttpClient::default(), &config());
        let sink = runner.position_sink();
        sink(latlon!(1.0, 2.0));
        sink(latlon!(3.0, 4.0));

        let outcomes = receiver.drain();
        assert_eq!(outcomes.len(), 2);
        assert_matches!(outcomes[1], Outcome::Position(p) if p == latlon!(3.0, 4.0));
        assert!(receiver.try_recv().is_none());
    }
}
