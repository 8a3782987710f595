use uuid::Uuid;

use super::handlers::{CameraListener, NavigationListener, ProgressListener, RouteUpdateListener};
use super::{Controller, SessionListeners};
use crate::entities::{
    CameraTrackingMode, LocationButtonPolicy, LocationMarker, LocationSourceKind,
    NavigationSession, Notice, Padding, Route, RouteProgress, RouteUpdateReason,
};
use crate::error::{navigation_error, Error};

impl Controller {
    /// Starts guidance along the planned route, driven by a simulated
    /// source that the map sees through a map-matched view.
    #[tracing::instrument(skip(self))]
    pub fn select_route(&mut self) {
        let plan = match self.state.plan() {
            Some(plan) if !self.state.is_navigating() => plan.clone(),
            _ => {
                tracing::debug!("no planned route in state {}", self.state.name());
                return;
            }
        };

        self.map
            .set_location_button_policy(LocationButtonPolicy::Invisible);
        self.panel.attach(&plan);

        if let Err(err) = self.navigation.start(&plan) {
            tracing::warn!("navigation engine refused to start: {}", err);
            self.panel.detach();
            self.map
                .set_location_button_policy(LocationButtonPolicy::InvisibleWhenRecentered);
            self.notify(Notice::from(&err));
            return;
        }

        let session = NavigationSession::new(plan, LocationSourceKind::Simulated);
        let id = session.id;

        self.session_listeners = Some(SessionListeners {
            navigation: self
                .navigation
                .add_navigation_listener(NavigationListener::new(self.sink.clone(), id)),
            progress: self
                .navigation
                .add_progress_listener(ProgressListener::new(self.sink.clone(), id)),
            route_update: self
                .navigation
                .add_route_update_listener(RouteUpdateListener::new(self.sink.clone(), id)),
            camera: self
                .map
                .add_camera_change_listener(CameraListener::new(self.sink.clone(), id)),
        });

        let geometry = session.plan.route().geometry();
        let simulated = self
            .sources
            .simulated(geometry.clone(), self.config.simulation_speed);

        let previous = self.slot.replace(simulated.clone());
        previous.close();
        self.centering = None;
        self.navigation.set_location_source(simulated.clone());

        let matched = self.sources.map_matched(simulated.clone(), geometry);
        matched.enable();
        self.map.set_location_source(Some(matched.clone()));
        self.map_source = Some(matched);
        simulated.enable();

        self.map
            .set_camera_tracking_mode(CameraTrackingMode::FollowRoute);
        self.map.set_location_indicator(LocationMarker::Chevron);
        self.map.set_padding(self.config.navigation_padding());

        match self.state.begin_navigation(session) {
            Ok(()) => tracing::info!(session = %id, "navigation started"),
            Err(err) => tracing::error!("unexpected state starting navigation: {}", err),
        }
    }

    /// Ends guidance and restores the free-browsing map. Does nothing
    /// unless a session is active.
    #[tracing::instrument(skip(self))]
    pub fn stop_navigation(&mut self) {
        let session = match self.state.begin_stopping() {
            Ok(session) => session,
            Err(_) => {
                tracing::debug!("not navigating, nothing to stop");
                return;
            }
        };

        self.teardown(&session);
        self.reacquire_device_source();
        self.acquire_user_location();
    }

    pub(super) fn teardown(&mut self, session: &NavigationSession) {
        self.panel.detach();
        self.navigation.stop();

        if let Some(listeners) = self.session_listeners.take() {
            self.navigation
                .remove_navigation_listener(listeners.navigation);
            self.navigation.remove_progress_listener(listeners.progress);
            self.navigation
                .remove_route_update_listener(listeners.route_update);
            self.map.remove_camera_change_listener(listeners.camera);
        }

        self.map
            .set_location_button_policy(LocationButtonPolicy::InvisibleWhenRecentered);
        self.map.set_camera_tracking_mode(CameraTrackingMode::None);
        self.map.set_location_indicator(LocationMarker::Pointer);
        self.map.set_padding(Padding::zero());

        if let Some(source) = self.map_source.take() {
            source.close();
        }

        self.map.clear();

        tracing::info!(
            session = %session.id,
            travelled = session.progress.distance_along_route,
            "navigation stopped"
        );
    }

    pub(super) fn on_navigation_started(&mut self, session: Uuid) {
        tracing::debug!(session = %session, "engine reported start");
    }

    pub(super) fn on_navigation_stopped(&mut self, session: Uuid) {
        if !self.is_current_session(session) {
            return;
        }

        tracing::info!(session = %session, "engine finished guidance");
        self.stop_navigation();
    }

    pub(super) fn on_navigation_failed(&mut self, session: Uuid, failure: Error) {
        if !self.is_current_session(session) {
            return;
        }

        let err = navigation_error(&failure.message);
        tracing::warn!(session = %session, "{}", err);
        self.notify(Notice::from(&err));
        self.stop_navigation();
    }

    pub(super) fn on_progress_updated(&mut self, session: Uuid, progress: RouteProgress) {
        match self.state.session_mut() {
            Some(current) if current.id == session => current.progress = progress,
            _ => {
                tracing::debug!("dropping progress for inactive session");
                return;
            }
        }

        self.map.set_route_progress(progress.distance_along_route);
    }

    pub(super) fn on_route_updated(
        &mut self,
        session: Uuid,
        route: Route,
        reason: RouteUpdateReason,
    ) {
        let current = match self.state.session_mut() {
            Some(current) if current.id == session => current,
            _ => return,
        };

        if reason.is_informational() {
            tracing::debug!(?reason, "route updated in place");
            return;
        }

        current.plan = current.plan.replanned(route.clone());

        tracing::info!(?reason, "route replaced");
        self.map.clear_routes();
        self.draw_route(&route, false);
    }

    pub(super) fn on_camera_changed(&mut self, session: Uuid, mode: CameraTrackingMode) {
        if !self.is_current_session(session) {
            return;
        }

        self.panel
            .set_speed_view_visible(mode == CameraTrackingMode::FollowRoute);
    }

    fn is_current_session(&self, session: Uuid) -> bool {
        matches!(self.state.session(), Some(current) if current.id == session)
    }
}
