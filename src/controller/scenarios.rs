use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{Collaborators, Controller, Event, State};
use crate::api::{DynMapDataStore, LocationSource};
use crate::config::Config;
use crate::entities::{
    CameraTrackingMode, GeoPoint, LocationButtonPolicy, LocationFix, LocationMarker,
    LocationSourceKind, Notice, Padding, RouteProgress, RouteUpdateReason,
};
use crate::error::{navigation_error, upstream_error};
use crate::headless::{
    HeadlessMap, HeadlessMapDataStore, HeadlessNavigation, HeadlessPanel, RecordingNotifier,
    StaticPermissions, StraightLinePlanner,
};
use crate::location::{DeviceLocationSource, LocationSources};

struct Harness {
    controller: Controller,
    map: HeadlessMap,
    navigation: HeadlessNavigation,
    panel: HeadlessPanel,
    notifier: RecordingNotifier,
    permissions: StaticPermissions,
    planner: StraightLinePlanner,
    device: DeviceLocationSource,
    store: Option<HeadlessMapDataStore>,
}

fn origin() -> GeoPoint {
    GeoPoint::new(52.3676, 4.9041)
}

fn destination() -> GeoPoint {
    GeoPoint::new(52.3731, 4.8922)
}

fn test_config() -> Config {
    // keep the simulated ticker quiet so progress comes from the test
    Config {
        simulation_tick_ms: 3_600_000,
        ..Config::default()
    }
}

fn harness_with(
    permissions: StaticPermissions,
    planner: StraightLinePlanner,
    store: Option<HeadlessMapDataStore>,
) -> Harness {
    let config = test_config();
    let map = HeadlessMap::new();
    let navigation = HeadlessNavigation::new();
    let panel = HeadlessPanel::new();
    let notifier = RecordingNotifier::new();
    let device = DeviceLocationSource::new();

    let controller = Controller::new(
        config.clone(),
        Collaborators {
            map: Box::new(map.clone()),
            panel: Box::new(panel.clone()),
            notifier: Box::new(notifier.clone()),
            permissions: Box::new(permissions.clone()),
            planner: Arc::new(planner.clone()),
            navigation: Box::new(navigation.clone()),
            sources: Box::new(LocationSources::new(device.clone(), &config)),
            store: store
                .clone()
                .map(|store| Arc::new(store) as DynMapDataStore),
        },
    );

    Harness {
        controller,
        map,
        navigation,
        panel,
        notifier,
        permissions,
        planner,
        device,
        store,
    }
}

fn harness() -> Harness {
    harness_with(StaticPermissions::granted(), StraightLinePlanner::new(), None)
}

impl Harness {
    fn push_fix(&mut self, position: GeoPoint) {
        self.device.push(LocationFix::new(position));
        self.controller.process_pending();
    }

    /// Lets spawned planner calls finish, then handles their responses.
    async fn settle(&mut self, wait: Duration) {
        tokio::time::sleep(wait).await;
        self.controller.process_pending();
    }

    async fn plan_to(&mut self, destination: GeoPoint) {
        self.controller.sink().select_destination(destination);
        self.controller.process_pending();
        self.settle(Duration::from_millis(20)).await;
    }

    async fn navigate(&mut self) {
        self.controller.start();
        self.push_fix(origin());
        self.plan_to(destination()).await;
        self.controller.sink().select_route();
        self.controller.process_pending();
    }
}

#[test]
fn full_session_restores_free_browsing_map() {
    tokio_test::block_on(async {
        let mut h = harness();

        h.controller.start();
        assert_eq!(h.controller.state(), &State::MapReady);

        h.push_fix(origin());
        let camera = h.map.snapshot().camera.unwrap();
        assert_eq!(camera.position, origin());
        assert_eq!(camera.zoom, 8.0);

        h.plan_to(destination()).await;
        let map = h.map.snapshot();
        assert_eq!(h.controller.state().name(), "route_planned");
        assert_eq!(map.routes.len(), 1);
        assert!(map.routes[0].departure_marker_visible);
        assert!(map.routes[0].destination_marker_visible);
        assert_eq!(map.zoomed_with, Some(100));

        let planned_options = h.planner.requests()[0].clone();
        assert_eq!(planned_options.itinerary.origin, origin());
        assert_eq!(planned_options.itinerary.destination, destination());

        h.controller.sink().select_route();
        h.controller.process_pending();

        let session = h.controller.session().unwrap().clone();
        assert_eq!(session.plan.options(), &planned_options);
        assert_eq!(session.source, LocationSourceKind::Simulated);
        assert_eq!(h.panel.attached().unwrap().options(), &planned_options);
        assert!(h.panel.speed_view_visible());
        assert_eq!(h.navigation.source_kind(), Some(LocationSourceKind::Simulated));
        assert!(h.navigation.is_active());

        let map = h.map.snapshot();
        assert_eq!(map.tracking, CameraTrackingMode::FollowRoute);
        assert_eq!(map.indicator, Some(LocationMarker::Chevron));
        assert_eq!(map.padding, Padding::bottom(263));
        assert_eq!(map.source, Some(LocationSourceKind::MapMatched));
        assert_eq!(map.button_policy, Some(LocationButtonPolicy::Invisible));

        h.navigation.emit_progress(500.0);
        h.controller.process_pending();
        assert_eq!(h.map.snapshot().progress, Some(500.0));
        assert_eq!(
            h.controller.session().unwrap().progress.distance_along_route,
            500.0
        );

        h.controller.sink().stop_navigation();
        h.controller.process_pending();

        assert_eq!(h.controller.state(), &State::MapReady);
        assert!(h.panel.attached().is_none());
        assert!(!h.panel.speed_view_visible());
        assert!(!h.navigation.is_active());
        assert_eq!(h.navigation.listener_counts(), (0, 0, 0));
        assert_eq!(h.navigation.source_kind(), Some(LocationSourceKind::Device));

        let map = h.map.snapshot();
        assert_eq!(map.tracking, CameraTrackingMode::None);
        assert_eq!(map.indicator, Some(LocationMarker::Pointer));
        assert_eq!(map.padding, Padding::zero());
        assert!(map.routes.is_empty());
        assert_eq!(map.source, Some(LocationSourceKind::Device));
        assert_eq!(
            map.button_policy,
            Some(LocationButtonPolicy::InvisibleWhenRecentered)
        );
        assert_eq!(map.camera_listeners, 0);
        assert_eq!(h.controller.location_source().kind(), LocationSourceKind::Device);
    });
}

#[test]
fn centering_happens_once_per_acquisition() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.controller.start();

        h.push_fix(origin());
        h.push_fix(GeoPoint::new(52.37, 4.90));
        assert_eq!(h.map.snapshot().camera_moves, 1);
        assert_eq!(h.map.snapshot().camera.unwrap().position, origin());
        assert_eq!(h.device.listener_count(), 0);

        h.plan_to(destination()).await;
        h.controller.sink().select_route();
        h.controller.process_pending();
        h.controller.sink().stop_navigation();
        h.controller.process_pending();

        h.push_fix(destination());
        assert_eq!(h.map.snapshot().camera_moves, 2);
        assert_eq!(h.map.snapshot().camera.unwrap().position, destination());
    });
}

#[test]
fn new_destination_replaces_drawn_route() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.controller.start();
        h.push_fix(origin());

        h.plan_to(destination()).await;
        let other = GeoPoint::new(52.36, 4.88);
        h.plan_to(other).await;

        let map = h.map.snapshot();
        assert_eq!(map.routes.len(), 1);
        assert_eq!(map.routes[0].geometry.last(), Some(&other));
        assert_eq!(
            h.controller.plan().unwrap().options().itinerary.destination,
            other
        );
    });
}

#[test]
fn stale_planning_response_is_discarded() {
    tokio_test::block_on(async {
        let planner = StraightLinePlanner::new().with_delays([Duration::from_millis(200)]);
        let mut h = harness_with(StaticPermissions::granted(), planner, None);
        h.controller.start();
        h.push_fix(origin());

        let other = GeoPoint::new(52.36, 4.88);
        h.controller.sink().select_destination(destination());
        h.controller.process_pending();
        h.controller.sink().select_destination(other);
        h.controller.process_pending();

        h.settle(Duration::from_millis(20)).await;
        assert_eq!(h.map.snapshot().routes.len(), 1);

        h.settle(Duration::from_millis(300)).await;
        let map = h.map.snapshot();
        assert_eq!(h.planner.requests().len(), 2);
        assert_eq!(map.routes.len(), 1);
        assert_eq!(map.routes[0].geometry.last(), Some(&other));
    });
}

#[test]
fn destination_without_location_is_ignored() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.controller.start();

        h.plan_to(destination()).await;

        assert_eq!(h.controller.state(), &State::MapReady);
        assert!(h.planner.requests().is_empty());
    });
}

#[test]
fn map_location_stands_in_for_missing_fix() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.map.set_fallback_location(Some(origin()));
        h.controller.start();

        h.plan_to(destination()).await;

        let requests = h.planner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].itinerary.origin, origin());
        assert_eq!(requests[0].itinerary.destination, destination());
        assert_eq!(h.map.snapshot().routes.len(), 1);
    });
}

#[test]
fn destination_before_start_is_ignored() {
    tokio_test::block_on(async {
        let mut h = harness();

        h.plan_to(destination()).await;

        assert_eq!(h.controller.state(), &State::Idle);
        assert!(h.planner.requests().is_empty());
        assert_eq!(h.map.snapshot().clears, 0);
    });
}

#[test]
fn route_tap_without_plan_does_nothing() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.controller.start();
        h.push_fix(origin());

        h.controller.sink().select_route();
        h.controller.process_pending();

        assert_eq!(h.controller.state(), &State::MapReady);
        assert_eq!(h.panel.attaches(), 0);
        assert_eq!(h.navigation.starts(), 0);
    });
}

#[test]
fn stop_without_session_does_nothing() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.controller.start();
        h.push_fix(origin());
        h.plan_to(destination()).await;

        h.controller.sink().stop_navigation();
        h.controller.process_pending();

        assert_eq!(h.controller.state().name(), "route_planned");
        assert_eq!(h.map.snapshot().routes.len(), 1);
    });
}

#[test]
fn planning_failures_are_reported() {
    tokio_test::block_on(async {
        let planner = StraightLinePlanner::new().returning_no_routes();
        let mut h = harness_with(StaticPermissions::granted(), planner, None);
        h.controller.start();
        h.push_fix(origin());

        h.plan_to(destination()).await;
        assert_eq!(h.controller.state(), &State::MapReady);
        assert!(h.map.snapshot().routes.is_empty());
        assert_eq!(h.notifier.notices(), vec![Notice::short("no route found")]);

        let planner = StraightLinePlanner::new().failing(upstream_error());
        let mut h = harness_with(StaticPermissions::granted(), planner, None);
        h.controller.start();
        h.push_fix(origin());

        h.plan_to(destination()).await;
        assert_eq!(h.controller.state(), &State::MapReady);
        assert_eq!(h.notifier.notices().len(), 1);
    });
}

#[test]
fn denied_permission_shows_notice() {
    let permissions = StaticPermissions::prompting(false);
    let mut h = harness_with(permissions, StraightLinePlanner::new(), None);

    h.controller.start();
    assert_eq!(h.controller.state(), &State::LocationPending);
    h.controller.process_pending();

    assert_eq!(h.permissions.requests(), 1);
    assert_eq!(h.controller.state(), &State::Idle);
    assert_eq!(
        h.notifier.notices(),
        vec![Notice::short("location permission denied")]
    );
    assert!(h.map.snapshot().source.is_none());
}

#[test]
fn granted_permission_shows_location() {
    let permissions = StaticPermissions::prompting(true);
    let mut h = harness_with(permissions, StraightLinePlanner::new(), None);

    h.controller.start();
    h.controller.process_pending();

    assert_eq!(h.controller.state(), &State::MapReady);
    assert_eq!(h.map.snapshot().source, Some(LocationSourceKind::Device));
    assert_eq!(h.map.snapshot().indicator, Some(LocationMarker::Pointer));
    assert!(h.device.is_enabled());
}

#[test]
fn refused_guidance_keeps_plan() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.navigation
            .refuse_next_start(navigation_error("guidance unavailable"));

        h.navigate().await;

        assert_eq!(h.controller.state().name(), "route_planned");
        assert!(h.panel.attached().is_none());
        assert_eq!(
            h.map.snapshot().button_policy,
            Some(LocationButtonPolicy::InvisibleWhenRecentered)
        );
        assert_eq!(
            h.notifier.notices(),
            vec![Notice::short("guidance unavailable")]
        );
    });
}

#[test]
fn only_replanning_updates_redraw_route() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.navigate().await;
        let original = h.controller.plan().unwrap().clone();

        let detour = h
            .planner
            .route_between(origin(), GeoPoint::new(52.38, 4.90));

        h.navigation
            .emit_route_update(detour.clone(), RouteUpdateReason::Refresh);
        h.controller.process_pending();
        assert_eq!(h.map.snapshot().routes[0].geometry, original.route().geometry());
        assert_eq!(h.controller.plan(), Some(&original));

        h.navigation
            .emit_route_update(detour.clone(), RouteUpdateReason::Deviation);
        h.controller.process_pending();

        let map = h.map.snapshot();
        assert_eq!(map.routes.len(), 1);
        assert_eq!(map.routes[0].geometry, detour.geometry());

        let plan = h.controller.plan().unwrap();
        assert_eq!(plan.route(), &detour);
        assert_eq!(plan.options(), original.options());
    });
}

#[test]
fn engine_failure_ends_session() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.navigate().await;

        h.navigation.fail(navigation_error("guidance lost"));
        h.controller.process_pending();

        assert_eq!(h.controller.state(), &State::MapReady);
        assert_eq!(h.notifier.notices(), vec![Notice::short("guidance lost")]);
        assert_eq!(h.map.snapshot().tracking, CameraTrackingMode::None);
    });
}

#[test]
fn callbacks_from_other_sessions_are_ignored() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.navigate().await;

        let sink = h.controller.sink();
        sink.send(Event::ProgressUpdated {
            session: Uuid::new_v4(),
            progress: RouteProgress {
                distance_along_route: 42.0,
            },
        });
        sink.send(Event::NavigationStopped {
            session: Uuid::new_v4(),
        });
        h.controller.process_pending();

        assert!(h.controller.state().is_navigating());
        assert_eq!(h.map.snapshot().progress, None);
    });
}

#[test]
fn offline_store_follows_device_positions() {
    tokio_test::block_on(async {
        let store = HeadlessMapDataStore::new();
        let mut h = harness_with(
            StaticPermissions::granted(),
            StraightLinePlanner::new(),
            Some(store),
        );

        h.navigate().await;
        h.controller.sink().stop_navigation();
        h.controller.process_pending();
        h.push_fix(destination());

        let store = h.store.clone().unwrap();
        assert_eq!(store.positions(), vec![origin(), destination()]);
        // store listener only, centering already consumed
        assert_eq!(h.device.listener_count(), 1);
    });
}

#[test]
fn close_releases_everything() {
    tokio_test::block_on(async {
        let mut h = harness();
        h.navigate().await;

        h.controller.close();

        assert_eq!(h.controller.state(), &State::Idle);
        assert!(h.navigation.is_closed());
        assert!(h.map.snapshot().source.is_none());
        assert!(h.panel.attached().is_none());
        assert!(h.controller.process_next().await.is_err());
    });
}
