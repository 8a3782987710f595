//! In-process collaborators for running the controller without a map
//! renderer, a navigation SDK or a platform permission dialog.
//!
//! Every type here is a cheap `Clone` handle over shared state, so a
//! caller can give one copy to the [`Controller`](crate::controller::Controller)
//! and keep another to inspect what the controller did.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::api::{
    DynLocationSource, ListenerId, MapDataStore, MapView, NavigationEngine, NavigationPanel,
    Notifier, OnCameraChange, OnLocationUpdate, OnNavigationEvent, OnPermissionResult,
    OnProgressUpdate, OnRouteUpdate, PermissionGate, RoutePlanner,
};
use crate::entities::geo::{polyline_length, project};
use crate::entities::{
    CameraOptions, CameraTrackingMode, GeoPoint, Instruction, LocationButtonPolicy, LocationFix,
    LocationMarker, LocationSourceKind, Notice, Padding, Route, RouteDrawing, RouteLeg,
    RoutePlan, RoutePlanningOptions, RouteProgress, RouteUpdateReason,
};
use crate::error::Error;
use crate::listeners::{lock, Listeners};

/// Meters from the destination at which the headless engine reports
/// arrival.
const ARRIVAL_RADIUS: f64 = 5.0;

#[derive(Clone, Debug, PartialEq)]
pub struct MapSnapshot {
    pub source: Option<LocationSourceKind>,
    pub indicator: Option<LocationMarker>,
    pub camera: Option<CameraOptions>,
    pub camera_moves: usize,
    pub routes: Vec<RouteDrawing>,
    pub progress: Option<f64>,
    pub tracking: CameraTrackingMode,
    pub padding: Padding,
    pub zoomed_with: Option<u32>,
    pub button_policy: Option<LocationButtonPolicy>,
    pub clears: usize,
    pub camera_listeners: usize,
}

struct MapInner {
    source: Option<DynLocationSource>,
    fallback_location: Option<GeoPoint>,
    indicator: Option<LocationMarker>,
    camera: Option<CameraOptions>,
    camera_moves: usize,
    routes: Vec<RouteDrawing>,
    progress: Option<f64>,
    tracking: CameraTrackingMode,
    padding: Padding,
    zoomed_with: Option<u32>,
    button_policy: Option<LocationButtonPolicy>,
    clears: usize,
    camera_listeners: Listeners<dyn OnCameraChange>,
}

/// Records every call instead of rendering.
#[derive(Clone)]
pub struct HeadlessMap {
    inner: Arc<Mutex<MapInner>>,
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MapInner {
                source: None,
                fallback_location: None,
                indicator: None,
                camera: None,
                camera_moves: 0,
                routes: vec![],
                progress: None,
                tracking: CameraTrackingMode::None,
                padding: Padding::zero(),
                zoomed_with: None,
                button_policy: None,
                clears: 0,
                camera_listeners: Listeners::default(),
            })),
        }
    }

    /// Location reported when the attached source has no fix yet.
    pub fn set_fallback_location(&self, location: Option<GeoPoint>) {
        lock(&self.inner).fallback_location = location;
    }

    pub fn snapshot(&self) -> MapSnapshot {
        let inner = lock(&self.inner);

        MapSnapshot {
            source: inner.source.as_ref().map(|source| source.kind()),
            indicator: inner.indicator,
            camera: inner.camera,
            camera_moves: inner.camera_moves,
            routes: inner.routes.clone(),
            progress: inner.progress,
            tracking: inner.tracking,
            padding: inner.padding,
            zoomed_with: inner.zoomed_with,
            button_policy: inner.button_policy,
            clears: inner.clears,
            camera_listeners: inner.camera_listeners.len(),
        }
    }
}

impl MapView for HeadlessMap {
    fn set_location_source(&mut self, source: Option<DynLocationSource>) {
        lock(&self.inner).source = source;
    }

    fn current_location(&self) -> Option<GeoPoint> {
        let inner = lock(&self.inner);

        inner
            .source
            .as_ref()
            .and_then(|source| source.current_position())
            .or(inner.fallback_location)
    }

    fn set_location_indicator(&mut self, marker: LocationMarker) {
        lock(&self.inner).indicator = Some(marker);
    }

    fn move_camera(&mut self, camera: CameraOptions) {
        let mut inner = lock(&self.inner);
        inner.camera = Some(camera);
        inner.camera_moves += 1;
    }

    fn draw_route(&mut self, drawing: RouteDrawing) {
        lock(&self.inner).routes.push(drawing);
    }

    fn clear_routes(&mut self) {
        lock(&self.inner).routes.clear();
    }

    fn clear(&mut self) {
        let mut inner = lock(&self.inner);
        inner.routes.clear();
        inner.progress = None;
        inner.clears += 1;
    }

    fn set_route_progress(&mut self, distance_along_route: f64) {
        lock(&self.inner).progress = Some(distance_along_route);
    }

    fn set_camera_tracking_mode(&mut self, mode: CameraTrackingMode) {
        let listeners = {
            let mut inner = lock(&self.inner);
            inner.tracking = mode;
            inner.camera_listeners.snapshot()
        };

        for listener in listeners {
            listener.on_camera_change(mode);
        }
    }

    fn camera_tracking_mode(&self) -> CameraTrackingMode {
        lock(&self.inner).tracking
    }

    fn set_padding(&mut self, padding: Padding) {
        lock(&self.inner).padding = padding;
    }

    fn zoom_to_routes(&mut self, padding: u32) {
        lock(&self.inner).zoomed_with = Some(padding);
    }

    fn set_location_button_policy(&mut self, policy: LocationButtonPolicy) {
        lock(&self.inner).button_policy = Some(policy);
    }

    fn add_camera_change_listener(&mut self, listener: Arc<dyn OnCameraChange>) -> ListenerId {
        lock(&self.inner).camera_listeners.add(listener)
    }

    fn remove_camera_change_listener(&mut self, id: ListenerId) -> bool {
        lock(&self.inner).camera_listeners.remove(id)
    }
}

struct EngineInner {
    active: Option<RoutePlan>,
    source: Option<DynLocationSource>,
    subscription: Option<ListenerId>,
    refusal: Option<Error>,
    starts: usize,
    stops: usize,
    closed: bool,
    navigation: Listeners<dyn OnNavigationEvent>,
    progress: Listeners<dyn OnProgressUpdate>,
    route_update: Listeners<dyn OnRouteUpdate>,
}

impl EngineInner {
    fn subscribe(&mut self, tracker: Arc<dyn OnLocationUpdate>) {
        if let Some(source) = &self.source {
            self.subscription = Some(source.add_update_listener(tracker));
        }
    }

    fn unsubscribe(&mut self) {
        if let (Some(source), Some(id)) = (&self.source, self.subscription.take()) {
            source.remove_update_listener(id);
        }
    }
}

/// Turns fixes into progress along the active route and reports arrival.
struct ProgressTracker {
    inner: Weak<Mutex<EngineInner>>,
}

impl OnLocationUpdate for ProgressTracker {
    fn on_location_update(&self, fix: &LocationFix) {
        let inner = match self.inner.upgrade() {
            Some(inner) => inner,
            None => return,
        };

        let (progress, arrived, progress_listeners, navigation_listeners) = {
            let mut inner = lock(&inner);

            let geometry = match &inner.active {
                Some(plan) => plan.route().geometry(),
                None => return,
            };

            let projection = match project(&geometry, &fix.position) {
                Some(projection) => projection,
                None => return,
            };

            let progress = RouteProgress {
                distance_along_route: projection.distance_along,
            };
            // Service-reported lengths may disagree with the drawn geometry.
            let arrived = polyline_length(&geometry) - projection.distance_along <= ARRIVAL_RADIUS;

            if arrived {
                inner.active = None;
                inner.unsubscribe();
            }

            (
                progress,
                arrived,
                inner.progress.snapshot(),
                inner.navigation.snapshot(),
            )
        };

        for listener in progress_listeners {
            listener.on_progress_update(&progress);
        }

        if arrived {
            tracing::debug!("headless engine reached the destination");

            for listener in navigation_listeners {
                listener.on_stopped();
            }
        }
    }
}

/// Guidance engine that derives progress from its location source by
/// projecting fixes onto the route.
#[derive(Clone)]
pub struct HeadlessNavigation {
    inner: Arc<Mutex<EngineInner>>,
}

impl Default for HeadlessNavigation {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessNavigation {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                active: None,
                source: None,
                subscription: None,
                refusal: None,
                starts: 0,
                stops: 0,
                closed: false,
                navigation: Listeners::default(),
                progress: Listeners::default(),
                route_update: Listeners::default(),
            })),
        }
    }

    fn tracker(&self) -> Arc<dyn OnLocationUpdate> {
        Arc::new(ProgressTracker {
            inner: Arc::downgrade(&self.inner),
        })
    }

    /// Makes the next `start` fail with `err`.
    pub fn refuse_next_start(&self, err: Error) {
        lock(&self.inner).refusal = Some(err);
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner).active.is_some()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner).closed
    }

    pub fn starts(&self) -> usize {
        lock(&self.inner).starts
    }

    pub fn stops(&self) -> usize {
        lock(&self.inner).stops
    }

    pub fn source_kind(&self) -> Option<LocationSourceKind> {
        lock(&self.inner).source.as_ref().map(|source| source.kind())
    }

    /// Registered navigation, progress and route update listeners.
    pub fn listener_counts(&self) -> (usize, usize, usize) {
        let inner = lock(&self.inner);

        (
            inner.navigation.len(),
            inner.progress.len(),
            inner.route_update.len(),
        )
    }

    pub fn emit_progress(&self, distance_along_route: f64) {
        let listeners = lock(&self.inner).progress.snapshot();
        let progress = RouteProgress {
            distance_along_route,
        };

        for listener in listeners {
            listener.on_progress_update(&progress);
        }
    }

    /// Reports a new route, adopting it when the engine is active.
    pub fn emit_route_update(&self, route: Route, reason: RouteUpdateReason) {
        let listeners = {
            let mut inner = lock(&self.inner);

            if let Some(plan) = &inner.active {
                inner.active = Some(plan.replanned(route.clone()));
            }

            inner.route_update.snapshot()
        };

        for listener in listeners {
            listener.on_route_update(&route, reason);
        }
    }

    /// Aborts guidance and reports `err` to navigation listeners.
    pub fn fail(&self, err: Error) {
        let listeners = {
            let mut inner = lock(&self.inner);
            inner.active = None;
            inner.unsubscribe();
            inner.navigation.snapshot()
        };

        for listener in listeners {
            listener.on_failed(&err);
        }
    }
}

impl NavigationEngine for HeadlessNavigation {
    fn start(&mut self, plan: &RoutePlan) -> Result<(), Error> {
        let tracker = self.tracker();

        let listeners = {
            let mut inner = lock(&self.inner);

            if let Some(err) = inner.refusal.take() {
                return Err(err);
            }

            inner.unsubscribe();
            inner.active = Some(plan.clone());
            inner.starts += 1;
            inner.subscribe(tracker);
            inner.navigation.snapshot()
        };

        for listener in listeners {
            listener.on_started();
        }

        Ok(())
    }

    fn stop(&mut self) {
        let mut inner = lock(&self.inner);
        inner.unsubscribe();

        if inner.active.take().is_some() {
            inner.stops += 1;
        }
    }

    fn set_location_source(&mut self, source: DynLocationSource) {
        let tracker = self.tracker();
        let mut inner = lock(&self.inner);

        inner.unsubscribe();
        inner.source = Some(source);

        if inner.active.is_some() {
            inner.subscribe(tracker);
        }
    }

    fn location_source(&self) -> Option<DynLocationSource> {
        lock(&self.inner).source.clone()
    }

    fn add_progress_listener(&mut self, listener: Arc<dyn OnProgressUpdate>) -> ListenerId {
        lock(&self.inner).progress.add(listener)
    }

    fn remove_progress_listener(&mut self, id: ListenerId) -> bool {
        lock(&self.inner).progress.remove(id)
    }

    fn add_route_update_listener(&mut self, listener: Arc<dyn OnRouteUpdate>) -> ListenerId {
        lock(&self.inner).route_update.add(listener)
    }

    fn remove_route_update_listener(&mut self, id: ListenerId) -> bool {
        lock(&self.inner).route_update.remove(id)
    }

    fn add_navigation_listener(&mut self, listener: Arc<dyn OnNavigationEvent>) -> ListenerId {
        lock(&self.inner).navigation.add(listener)
    }

    fn remove_navigation_listener(&mut self, id: ListenerId) -> bool {
        lock(&self.inner).navigation.remove(id)
    }

    fn close(&mut self) {
        self.stop();

        let mut inner = lock(&self.inner);
        inner.source = None;
        inner.navigation.clear();
        inner.progress.clear();
        inner.route_update.clear();
        inner.closed = true;
    }
}

#[derive(Default)]
struct PanelInner {
    attached: Option<RoutePlan>,
    attaches: usize,
    speed_view_visible: bool,
}

#[derive(Clone, Default)]
pub struct HeadlessPanel {
    inner: Arc<Mutex<PanelInner>>,
}

impl HeadlessPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> Option<RoutePlan> {
        lock(&self.inner).attached.clone()
    }

    pub fn attaches(&self) -> usize {
        lock(&self.inner).attaches
    }

    pub fn speed_view_visible(&self) -> bool {
        lock(&self.inner).speed_view_visible
    }
}

impl NavigationPanel for HeadlessPanel {
    fn attach(&mut self, plan: &RoutePlan) {
        let mut inner = lock(&self.inner);
        inner.attached = Some(plan.clone());
        inner.attaches += 1;
    }

    fn detach(&mut self) {
        let mut inner = lock(&self.inner);
        inner.attached = None;
        inner.speed_view_visible = false;
    }

    fn set_speed_view_visible(&mut self, visible: bool) {
        lock(&self.inner).speed_view_visible = visible;
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&mut self, notice: &Notice) {
        lock(&self.notices).push(notice.clone());
    }
}

struct PermissionInner {
    granted: bool,
    answer: bool,
    requests: usize,
}

/// Permission dialog with a fixed answer.
#[derive(Clone)]
pub struct StaticPermissions {
    inner: Arc<Mutex<PermissionInner>>,
}

impl StaticPermissions {
    fn with(granted: bool, answer: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PermissionInner {
                granted,
                answer,
                requests: 0,
            })),
        }
    }

    pub fn granted() -> Self {
        Self::with(true, true)
    }

    /// Not yet granted; a request is answered with `answer`.
    pub fn prompting(answer: bool) -> Self {
        Self::with(false, answer)
    }

    pub fn requests(&self) -> usize {
        lock(&self.inner).requests
    }
}

impl PermissionGate for StaticPermissions {
    fn is_granted(&self) -> bool {
        lock(&self.inner).granted
    }

    fn request(&mut self, callback: Arc<dyn OnPermissionResult>) {
        let answer = {
            let mut inner = lock(&self.inner);
            inner.requests += 1;
            inner.granted = inner.answer;
            inner.answer
        };

        callback.on_permission_result(answer);
    }
}

enum Outcome {
    Route,
    NoRoute,
    Failure(Error),
}

/// Plans a straight line between origin and destination.
#[derive(Clone)]
pub struct StraightLinePlanner {
    segments: usize,
    outcome: Arc<Outcome>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    requests: Arc<Mutex<Vec<RoutePlanningOptions>>>,
}

impl Default for StraightLinePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl StraightLinePlanner {
    pub fn new() -> Self {
        Self {
            segments: 10,
            outcome: Arc::new(Outcome::Route),
            delays: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Successive requests wait for these delays in order; later ones
    /// answer immediately.
    pub fn with_delays<I: IntoIterator<Item = Duration>>(self, delays: I) -> Self {
        lock(&self.delays).extend(delays);
        self
    }

    pub fn returning_no_routes(mut self) -> Self {
        self.outcome = Arc::new(Outcome::NoRoute);
        self
    }

    pub fn failing(mut self, err: Error) -> Self {
        self.outcome = Arc::new(Outcome::Failure(err));
        self
    }

    pub fn requests(&self) -> Vec<RoutePlanningOptions> {
        lock(&self.requests).clone()
    }

    pub fn route_between(&self, origin: GeoPoint, destination: GeoPoint) -> Route {
        let points: Vec<GeoPoint> = (0..=self.segments)
            .map(|i| origin.lerp(&destination, i as f64 / self.segments as f64))
            .collect();
        let length = polyline_length(&points);

        Route::new(vec![RouteLeg {
            points,
            instructions: vec![
                Instruction {
                    route_offset: 0.0,
                    combine_with_next: false,
                },
                Instruction {
                    route_offset: length,
                    combine_with_next: false,
                },
            ],
        }])
    }
}

#[async_trait]
impl RoutePlanner for StraightLinePlanner {
    async fn plan_route(&self, options: &RoutePlanningOptions) -> Result<Vec<Route>, Error> {
        lock(&self.requests).push(options.clone());

        let delay = lock(&self.delays).pop_front();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match &*self.outcome {
            Outcome::Route => Ok(vec![self.route_between(
                options.itinerary.origin,
                options.itinerary.destination,
            )]),
            Outcome::NoRoute => Ok(vec![]),
            Outcome::Failure(err) => Err(err.clone()),
        }
    }
}

/// Map-data store that only remembers what it was told.
#[derive(Clone, Default)]
pub struct HeadlessMapDataStore {
    positions: Arc<Mutex<Vec<GeoPoint>>>,
    updates_enabled: Arc<Mutex<bool>>,
}

impl HeadlessMapDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> Vec<GeoPoint> {
        lock(&self.positions).clone()
    }

    pub fn updates_enabled(&self) -> bool {
        *lock(&self.updates_enabled)
    }
}

impl MapDataStore for HeadlessMapDataStore {
    fn update_position(&self, position: GeoPoint) {
        lock(&self.positions).push(position);
    }

    fn set_updates_enabled(&self, enabled: bool) {
        *lock(&self.updates_enabled) = enabled;
    }
}

#[test]
fn straight_line_planner_connects_itinerary() {
    use crate::entities::Itinerary;

    let planner = StraightLinePlanner::new();
    let origin = GeoPoint::new(52.0, 4.0);
    let destination = GeoPoint::new(52.0, 4.1);
    let options = RoutePlanningOptions::new(Itinerary::new(origin, destination));

    let routes = tokio_test::block_on(planner.plan_route(&options)).unwrap();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].departure(), Some(origin));
    assert_eq!(routes[0].destination(), Some(destination));
    assert_eq!(planner.requests().len(), 1);
}

#[cfg(test)]
struct Recorder(Mutex<Vec<f64>>, Mutex<bool>);

#[cfg(test)]
impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Recorder(Mutex::new(vec![]), Mutex::new(false)))
    }
}

#[cfg(test)]
impl OnProgressUpdate for Recorder {
    fn on_progress_update(&self, progress: &RouteProgress) {
        lock(&self.0).push(progress.distance_along_route);
    }
}

#[cfg(test)]
impl OnNavigationEvent for Recorder {
    fn on_started(&self) {}
    fn on_stopped(&self) {
        *lock(&self.1) = true;
    }
    fn on_failed(&self, _: &Error) {}
}

#[test]
fn engine_reports_progress_and_arrival_from_its_source() {
    use crate::api::LocationSource;
    use crate::entities::Itinerary;
    use crate::location::DeviceLocationSource;

    let origin = GeoPoint::new(52.0, 4.0);
    let destination = GeoPoint::new(52.0, 4.01);
    let route = StraightLinePlanner::new().route_between(origin, destination);
    let plan = RoutePlan::new(
        route.clone(),
        RoutePlanningOptions::new(Itinerary::new(origin, destination)),
    );

    let device = DeviceLocationSource::new();
    device.enable();

    let recorder = Recorder::new();
    let mut engine = HeadlessNavigation::new();
    engine.set_location_source(Arc::new(device.clone()));
    engine.add_progress_listener(recorder.clone());
    engine.add_navigation_listener(recorder.clone());
    engine.start(&plan).unwrap();

    device.push(LocationFix::new(origin.lerp(&destination, 0.5)));
    assert!((lock(&recorder.0)[0] - route.length / 2.0).abs() < 1.0);
    assert!(!*lock(&recorder.1));

    device.push(LocationFix::new(destination));
    assert!(*lock(&recorder.1));
    assert!(!engine.is_active());
    assert_eq!(device.listener_count(), 0);
}

#[test]
fn refused_start_leaves_engine_idle() {
    use crate::error::navigation_error;

    let mut engine = HeadlessNavigation::new();
    engine.refuse_next_start(navigation_error("no guidance data"));

    let planner = StraightLinePlanner::new();
    let route = planner.route_between(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01));
    let plan = RoutePlan::new(
        route,
        RoutePlanningOptions::new(crate::entities::Itinerary::new(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.01),
        )),
    );

    let err = engine.start(&plan).unwrap_err();
    assert!(err.is_navigation_error());
    assert!(!engine.is_active());
    assert!(engine.start(&plan).is_ok());
    assert_eq!(engine.starts(), 1);
}

#[test]
fn arrival_uses_drawn_geometry_over_reported_length() {
    use crate::api::LocationSource;
    use crate::entities::Itinerary;
    use crate::location::DeviceLocationSource;

    let origin = GeoPoint::new(52.0, 4.0);
    let destination = GeoPoint::new(52.0, 4.01);
    let route = StraightLinePlanner::new().route_between(origin, destination);
    let reported = route.length + 20.0;
    let route = route.with_length(reported);
    let plan = RoutePlan::new(
        route,
        RoutePlanningOptions::new(Itinerary::new(origin, destination)),
    );

    let device = DeviceLocationSource::new();
    device.enable();

    let recorder = Recorder::new();
    let mut engine = HeadlessNavigation::new();
    engine.set_location_source(Arc::new(device.clone()));
    engine.add_navigation_listener(recorder.clone());
    engine.start(&plan).unwrap();

    device.push(LocationFix::new(destination));

    assert!(*lock(&recorder.1));
    assert!(!engine.is_active());
}
