use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{
    CameraOptions, CameraTrackingMode, GeoPoint, LocationButtonPolicy, LocationFix,
    LocationMarker, LocationSourceKind, Notice, Padding, Route, RouteDrawing, RoutePlan,
    RoutePlanningOptions, RouteProgress, RouteUpdateReason,
};
use crate::error::Error;

pub type ListenerId = Uuid;

pub trait OnLocationUpdate: Send + Sync {
    fn on_location_update(&self, fix: &LocationFix);
}

pub trait OnProgressUpdate: Send + Sync {
    fn on_progress_update(&self, progress: &RouteProgress);
}

pub trait OnRouteUpdate: Send + Sync {
    fn on_route_update(&self, route: &Route, reason: RouteUpdateReason);
}

pub trait OnNavigationEvent: Send + Sync {
    fn on_started(&self);
    fn on_stopped(&self);
    fn on_failed(&self, failure: &Error);
}

pub trait OnCameraChange: Send + Sync {
    fn on_camera_change(&self, mode: CameraTrackingMode);
}

pub trait OnPermissionResult: Send + Sync {
    fn on_permission_result(&self, granted: bool);
}

/// Anything that reports where the vehicle is. Implementations are shared
/// handles: the map, the navigation engine and the controller may all
/// hold the same source.
pub trait LocationSource {
    fn kind(&self) -> LocationSourceKind;
    fn enable(&self);
    fn disable(&self);
    fn is_enabled(&self) -> bool;
    fn add_update_listener(&self, listener: Arc<dyn OnLocationUpdate>) -> ListenerId;
    fn remove_update_listener(&self, id: ListenerId) -> bool;
    fn listener_count(&self) -> usize;
    fn current_position(&self) -> Option<GeoPoint>;

    fn close(&self) {
        self.disable();
    }
}

pub type DynLocationSource = Arc<dyn LocationSource + Send + Sync>;

pub trait LocationSourceFactory: Send {
    /// Live positioning backed by the device.
    fn device(&self) -> DynLocationSource;
    fn simulated(&self, geometry: Vec<GeoPoint>, speed: f64) -> DynLocationSource;
    fn map_matched(&self, upstream: DynLocationSource, geometry: Vec<GeoPoint>)
        -> DynLocationSource;
}

#[async_trait]
pub trait RoutePlanner {
    /// Candidate routes, best first.
    async fn plan_route(&self, options: &RoutePlanningOptions) -> Result<Vec<Route>, Error>;
}

pub type DynRoutePlanner = Arc<dyn RoutePlanner + Send + Sync>;

pub trait NavigationEngine: Send {
    fn start(&mut self, plan: &RoutePlan) -> Result<(), Error>;
    fn stop(&mut self);
    fn set_location_source(&mut self, source: DynLocationSource);
    fn location_source(&self) -> Option<DynLocationSource>;
    fn add_progress_listener(&mut self, listener: Arc<dyn OnProgressUpdate>) -> ListenerId;
    fn remove_progress_listener(&mut self, id: ListenerId) -> bool;
    fn add_route_update_listener(&mut self, listener: Arc<dyn OnRouteUpdate>) -> ListenerId;
    fn remove_route_update_listener(&mut self, id: ListenerId) -> bool;
    fn add_navigation_listener(&mut self, listener: Arc<dyn OnNavigationEvent>) -> ListenerId;
    fn remove_navigation_listener(&mut self, id: ListenerId) -> bool;
    fn close(&mut self);
}

pub trait MapView: Send {
    fn set_location_source(&mut self, source: Option<DynLocationSource>);
    fn current_location(&self) -> Option<GeoPoint>;
    fn set_location_indicator(&mut self, marker: LocationMarker);
    fn move_camera(&mut self, camera: CameraOptions);
    fn draw_route(&mut self, drawing: RouteDrawing);
    fn clear_routes(&mut self);
    /// Removes routes, markers and every other overlay.
    fn clear(&mut self);
    fn set_route_progress(&mut self, distance_along_route: f64);
    fn set_camera_tracking_mode(&mut self, mode: CameraTrackingMode);
    fn camera_tracking_mode(&self) -> CameraTrackingMode;
    fn set_padding(&mut self, padding: Padding);
    fn zoom_to_routes(&mut self, padding: u32);
    fn set_location_button_policy(&mut self, policy: LocationButtonPolicy);
    fn add_camera_change_listener(&mut self, listener: Arc<dyn OnCameraChange>) -> ListenerId;
    fn remove_camera_change_listener(&mut self, id: ListenerId) -> bool;
}

/// Turn-by-turn panel shown while guidance is active.
pub trait NavigationPanel: Send {
    fn attach(&mut self, plan: &RoutePlan);
    fn detach(&mut self);
    fn set_speed_view_visible(&mut self, visible: bool);
}

pub trait Notifier: Send {
    fn show(&mut self, notice: &Notice);
}

pub trait PermissionGate: Send {
    fn is_granted(&self) -> bool;
    fn request(&mut self, callback: Arc<dyn OnPermissionResult>);
}

/// On-device map data used by offline routing and rendering.
pub trait MapDataStore {
    fn update_position(&self, position: GeoPoint);
    fn set_updates_enabled(&self, enabled: bool);
}

pub type DynMapDataStore = Arc<dyn MapDataStore + Send + Sync>;
