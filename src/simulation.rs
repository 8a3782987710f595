use geo_types::LineString;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{DynMapDataStore, DynRoutePlanner};
use crate::config::{Config, Variant};
use crate::controller::{Collaborators, Controller, State};
use crate::entities::geo::line_string;
use crate::entities::{GeoPoint, LocationFix, Notice};
use crate::error::{routing_error, Error};
use crate::external::OnlineRoutePlanner;
use crate::headless::{
    HeadlessMap, HeadlessNavigation, HeadlessPanel, RecordingNotifier, StaticPermissions,
    StraightLinePlanner,
};
use crate::location::{DeviceLocationSource, LocationSources};

/// Longest quiet period tolerated while waiting on planning or guidance.
const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug)]
pub struct DemoReport {
    pub route: LineString<f64>,
    pub route_length: f64,
    pub travelled: f64,
    pub notices: Vec<Notice>,
}

/// Runs one session end to end against headless collaborators: acquire
/// the location, plan to a destination, follow the route with simulated
/// positions until arrival.
pub struct Executor {
    controller: Controller,
    device: DeviceLocationSource,
    map: HeadlessMap,
    notifier: RecordingNotifier,
}

impl Executor {
    #[tracing::instrument(name = "Executor::new", skip(config, store))]
    pub fn new(config: Config, store: Option<DynMapDataStore>) -> Result<Self, Error> {
        let planner: DynRoutePlanner = match (&config.variant, &config.api_key) {
            (Variant::Online, Some(_)) => Arc::new(OnlineRoutePlanner::new(&config)?),
            _ => {
                tracing::info!("planning straight-line routes");
                Arc::new(StraightLinePlanner::new())
            }
        };

        let device = DeviceLocationSource::new();
        let map = HeadlessMap::new();
        let notifier = RecordingNotifier::new();

        let controller = Controller::new(
            config.clone(),
            Collaborators {
                map: Box::new(map.clone()),
                panel: Box::new(HeadlessPanel::new()),
                notifier: Box::new(notifier.clone()),
                permissions: Box::new(StaticPermissions::granted()),
                planner,
                navigation: Box::new(HeadlessNavigation::new()),
                sources: Box::new(LocationSources::new(device.clone(), &config)),
                store,
            },
        );

        Ok(Self {
            controller,
            device,
            map,
            notifier,
        })
    }

    async fn next_event(&mut self) -> Result<(), Error> {
        match tokio::time::timeout(IDLE_TIMEOUT, self.controller.process_next()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("no events for {:?}", IDLE_TIMEOUT);
                Err(routing_error("timed out waiting for the session"))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(mut self, origin: GeoPoint, destination: GeoPoint) -> Result<DemoReport, Error> {
        self.controller.start();
        self.controller.process_pending();

        if self.controller.state() != &State::MapReady {
            tracing::warn!("location unavailable");
            return Err(routing_error("location unavailable"));
        }

        self.device.push(LocationFix::new(origin));
        self.controller.process_pending();

        let sink = self.controller.sink();
        sink.select_destination(destination);

        while self.controller.plan().is_none() {
            let notices = self.notifier.notices().len();
            self.next_event().await?;

            if self.notifier.notices().len() > notices {
                let notice = self.notifier.notices().remove(notices);
                return Err(routing_error(notice.message));
            }
        }

        let route = match self.controller.plan() {
            Some(plan) => plan.route().clone(),
            None => return Err(routing_error("no route found")),
        };
        tracing::info!(length = route.length, "route ready, starting guidance");

        sink.select_route();
        self.controller.process_pending();

        let mut travelled = 0.0;
        let mut reported = 0.0;

        while let Some(session) = self.controller.session() {
            travelled = session.progress.distance_along_route;

            if travelled - reported >= 1000.0 {
                tracing::info!(
                    travelled,
                    remaining = session.remaining_distance(),
                    "guidance progress"
                );
                reported = travelled;
            }

            self.next_event().await?;
        }

        tracing::info!(travelled, "arrived, map shows {:?}", self.map.snapshot().tracking);

        let report = DemoReport {
            route: line_string(&route.geometry()),
            route_length: route.length,
            travelled,
            notices: self.notifier.notices(),
        };

        self.controller.close();
        Ok(report)
    }
}

#[test]
fn demo_session_reaches_destination() {
    let config = Config {
        simulation_tick_ms: 5,
        simulation_time_scale: 200.0,
        ..Config::default()
    };

    let origin = GeoPoint::new(52.3676, 4.9041);
    let destination = GeoPoint::new(52.3731, 4.8922);

    let report = tokio_test::block_on(async {
        Executor::new(config, None)
            .unwrap()
            .run(origin, destination)
            .await
    })
    .unwrap();

    assert!(report.notices.is_empty());
    assert_eq!(report.route.0.len(), 11);
    assert!(report.travelled > report.route_length / 2.0);
}
