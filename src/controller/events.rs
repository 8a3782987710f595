use async_channel::Sender;
use uuid::Uuid;

use crate::entities::{
    CameraTrackingMode, GeoPoint, LocationFix, Route, RoutePlanningOptions, RouteProgress,
    RouteUpdateReason,
};
use crate::error::Error;

/// Everything the controller reacts to. Collaborator callbacks and user
/// interactions are both funnelled through this type and handled one at a
/// time.
#[derive(Debug)]
pub enum Event {
    PermissionResolved {
        granted: bool,
    },
    /// First fix seen by the one-shot centering listener `token`.
    FirstFix {
        token: Uuid,
        fix: LocationFix,
    },
    /// Long interaction on the map.
    DestinationSelected(GeoPoint),
    /// Tap on the drawn route.
    RouteSelected,
    StopRequested,
    RoutePlanned {
        generation: u64,
        options: RoutePlanningOptions,
        result: Result<Vec<Route>, Error>,
    },
    NavigationStarted {
        session: Uuid,
    },
    NavigationStopped {
        session: Uuid,
    },
    NavigationFailed {
        session: Uuid,
        failure: Error,
    },
    ProgressUpdated {
        session: Uuid,
        progress: RouteProgress,
    },
    RouteUpdated {
        session: Uuid,
        route: Route,
        reason: RouteUpdateReason,
    },
    CameraChanged {
        session: Uuid,
        mode: CameraTrackingMode,
    },
    Shutdown,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PermissionResolved { .. } => "permission_resolved",
            Self::FirstFix { .. } => "first_fix",
            Self::DestinationSelected(_) => "destination_selected",
            Self::RouteSelected => "route_selected",
            Self::StopRequested => "stop_requested",
            Self::RoutePlanned { .. } => "route_planned",
            Self::NavigationStarted { .. } => "navigation_started",
            Self::NavigationStopped { .. } => "navigation_stopped",
            Self::NavigationFailed { .. } => "navigation_failed",
            Self::ProgressUpdated { .. } => "progress_updated",
            Self::RouteUpdated { .. } => "route_updated",
            Self::CameraChanged { .. } => "camera_changed",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Cloneable sending half of the controller's event queue.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: Sender<Event>,
}

impl EventSink {
    pub(crate) fn new(tx: Sender<Event>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: Event) {
        if let Err(err) = self.tx.try_send(event) {
            tracing::warn!("controller gone, dropping {}", err.into_inner().name());
        }
    }

    pub fn select_destination(&self, point: GeoPoint) {
        self.send(Event::DestinationSelected(point));
    }

    pub fn select_route(&self) {
        self.send(Event::RouteSelected);
    }

    pub fn stop_navigation(&self) {
        self.send(Event::StopRequested);
    }

    pub fn shutdown(&self) {
        self.send(Event::Shutdown);
    }
}
