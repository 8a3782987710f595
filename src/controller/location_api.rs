use uuid::Uuid;

use super::handlers::{CenteringListener, PermissionListener, StorePositionListener};
use super::{Centering, Controller, State};
use crate::entities::{CameraOptions, LocationFix, LocationMarker, Notice};
use crate::error::permission_denied_error;

impl Controller {
    /// Starts showing the user's location, asking for permission first
    /// when it has not been granted yet.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self) {
        if !matches!(self.state, State::Idle) {
            tracing::warn!("already started, in state {}", self.state.name());
            return;
        }

        self.acquire_user_location();
    }

    pub(super) fn acquire_user_location(&mut self) {
        if let Err(err) = self.state.await_location() {
            tracing::warn!("cannot acquire location in state {}: {}", self.state.name(), err);
            return;
        }

        if self.permissions.is_granted() {
            self.show_user_location();
            return;
        }

        tracing::info!("requesting location permission");
        self.permissions
            .request(PermissionListener::new(self.sink.clone()));
    }

    pub(super) fn on_permission_resolved(&mut self, granted: bool) {
        if !matches!(self.state, State::LocationPending) {
            tracing::debug!("permission answer arrived in state {}", self.state.name());
            return;
        }

        if granted {
            self.show_user_location();
            return;
        }

        let err = permission_denied_error();
        tracing::warn!("{}", err);
        self.notify(Notice::from(&err));

        if let Err(err) = self.state.deny_location() {
            tracing::error!("unexpected state after permission denial: {}", err);
        }
    }

    /// Enables the active source, hands it to the map and arms the
    /// one-shot centering listener.
    fn show_user_location(&mut self) {
        let source = self.slot.source().clone();
        source.enable();

        let token = Uuid::new_v4();
        let listener = self
            .slot
            .add_listener(CenteringListener::new(self.sink.clone(), token));
        self.centering = Some(Centering { token, listener });

        self.map.set_location_source(Some(source));
        self.map.set_location_indicator(LocationMarker::Pointer);

        match self.state.grant_location() {
            Ok(()) => tracing::info!("map ready with {} location", self.slot.kind().name()),
            Err(err) => tracing::error!("unexpected state showing location: {}", err),
        }
    }

    pub(super) fn on_first_fix(&mut self, token: Uuid, fix: LocationFix) {
        let centering = match self.centering.take() {
            Some(centering) if centering.token == token => centering,
            other => {
                self.centering = other;
                tracing::debug!("ignoring fix for retired centering listener");
                return;
            }
        };

        self.slot.remove_listener(centering.listener);
        self.map.move_camera(CameraOptions {
            position: fix.position,
            zoom: self.config.initial_zoom,
        });
    }

    pub(super) fn attach_store_listener(&mut self) {
        if let Some(store) = self.store.clone() {
            self.slot.add_listener(StorePositionListener::new(store));
        }
    }

    /// Puts a fresh device source in the slot and hands it back to the
    /// navigation engine.
    pub(super) fn reacquire_device_source(&mut self) {
        let device = self.sources.device();
        let previous = self.slot.replace(device.clone());
        previous.close();

        self.centering = None;
        self.navigation.set_location_source(device);
        self.attach_store_listener();
    }
}
