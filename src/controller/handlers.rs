use std::sync::Arc;
use uuid::Uuid;

use super::events::{Event, EventSink};
use crate::api::{
    DynMapDataStore, OnCameraChange, OnLocationUpdate, OnNavigationEvent, OnPermissionResult,
    OnProgressUpdate, OnRouteUpdate,
};
use crate::entities::{CameraTrackingMode, LocationFix, Route, RouteProgress, RouteUpdateReason};
use crate::error::Error;

pub struct PermissionListener {
    sink: EventSink,
}

impl PermissionListener {
    pub fn new(sink: EventSink) -> Arc<Self> {
        Arc::new(Self { sink })
    }
}

impl OnPermissionResult for PermissionListener {
    fn on_permission_result(&self, granted: bool) {
        self.sink.send(Event::PermissionResolved { granted });
    }
}

/// Forwards fixes until the controller removes it after the first one.
pub struct CenteringListener {
    sink: EventSink,
    token: Uuid,
}

impl CenteringListener {
    pub fn new(sink: EventSink, token: Uuid) -> Arc<Self> {
        Arc::new(Self { sink, token })
    }
}

impl OnLocationUpdate for CenteringListener {
    fn on_location_update(&self, fix: &LocationFix) {
        self.sink.send(Event::FirstFix {
            token: self.token,
            fix: *fix,
        });
    }
}

/// Keeps the offline map-data store informed of the vehicle position.
pub struct StorePositionListener {
    store: DynMapDataStore,
}

impl StorePositionListener {
    pub fn new(store: DynMapDataStore) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

impl OnLocationUpdate for StorePositionListener {
    fn on_location_update(&self, fix: &LocationFix) {
        self.store.update_position(fix.position);
    }
}

/// Session-scoped handlers carry the id of the session that registered
/// them so late callbacks from a torn-down session are recognisable.
pub struct NavigationListener {
    sink: EventSink,
    session: Uuid,
}

impl NavigationListener {
    pub fn new(sink: EventSink, session: Uuid) -> Arc<Self> {
        Arc::new(Self { sink, session })
    }
}

impl OnNavigationEvent for NavigationListener {
    fn on_started(&self) {
        self.sink.send(Event::NavigationStarted {
            session: self.session,
        });
    }

    fn on_stopped(&self) {
        self.sink.send(Event::NavigationStopped {
            session: self.session,
        });
    }

    fn on_failed(&self, failure: &Error) {
        self.sink.send(Event::NavigationFailed {
            session: self.session,
            failure: failure.clone(),
        });
    }
}

pub struct ProgressListener {
    sink: EventSink,
    session: Uuid,
}

impl ProgressListener {
    pub fn new(sink: EventSink, session: Uuid) -> Arc<Self> {
        Arc::new(Self { sink, session })
    }
}

impl OnProgressUpdate for ProgressListener {
    fn on_progress_update(&self, progress: &RouteProgress) {
        self.sink.send(Event::ProgressUpdated {
            session: self.session,
            progress: *progress,
        });
    }
}

pub struct RouteUpdateListener {
    sink: EventSink,
    session: Uuid,
}

impl RouteUpdateListener {
    pub fn new(sink: EventSink, session: Uuid) -> Arc<Self> {
        Arc::new(Self { sink, session })
    }
}

impl OnRouteUpdate for RouteUpdateListener {
    fn on_route_update(&self, route: &Route, reason: RouteUpdateReason) {
        self.sink.send(Event::RouteUpdated {
            session: self.session,
            route: route.clone(),
            reason,
        });
    }
}

pub struct CameraListener {
    sink: EventSink,
    session: Uuid,
}

impl CameraListener {
    pub fn new(sink: EventSink, session: Uuid) -> Arc<Self> {
        Arc::new(Self { sink, session })
    }
}

impl OnCameraChange for CameraListener {
    fn on_camera_change(&self, mode: CameraTrackingMode) {
        self.sink.send(Event::CameraChanged {
            session: self.session,
            mode,
        });
    }
}
