//! Navigation session lifecycle.
//!
//! The [`Controller`] coordinates permission acquisition, map display,
//! route planning, guidance and teardown over injected collaborators.
//! Collaborator callbacks arrive as [`Event`]s on a single queue and are
//! handled to completion one at a time, so no state is shared across
//! threads.

mod events;
mod handlers;
mod location_api;
mod navigation_api;
mod route_api;
mod state;

#[cfg(test)]
mod scenarios;

pub use events::{Event, EventSink};
pub use state::State;

use async_channel::Receiver;
use uuid::Uuid;

use crate::api::{
    DynLocationSource, DynMapDataStore, DynRoutePlanner, ListenerId, LocationSourceFactory,
    MapView, NavigationEngine, NavigationPanel, Notifier, PermissionGate,
};
use crate::config::Config;
use crate::entities::{NavigationSession, Notice, RoutePlan};
use crate::error::{unexpected_error, Error};
use crate::location::LocationSlot;

/// External services the controller drives.
pub struct Collaborators {
    pub map: Box<dyn MapView>,
    pub panel: Box<dyn NavigationPanel>,
    pub notifier: Box<dyn Notifier>,
    pub permissions: Box<dyn PermissionGate>,
    pub planner: DynRoutePlanner,
    pub navigation: Box<dyn NavigationEngine>,
    pub sources: Box<dyn LocationSourceFactory>,
    /// Present in the offline variant only.
    pub store: Option<DynMapDataStore>,
}

struct Centering {
    token: Uuid,
    listener: ListenerId,
}

/// Registrations made when guidance starts; removed when it stops.
struct SessionListeners {
    navigation: ListenerId,
    progress: ListenerId,
    route_update: ListenerId,
    camera: ListenerId,
}

pub struct Controller {
    config: Config,
    state: State,
    map: Box<dyn MapView>,
    panel: Box<dyn NavigationPanel>,
    notifier: Box<dyn Notifier>,
    permissions: Box<dyn PermissionGate>,
    planner: DynRoutePlanner,
    navigation: Box<dyn NavigationEngine>,
    sources: Box<dyn LocationSourceFactory>,
    store: Option<DynMapDataStore>,
    slot: LocationSlot,
    map_source: Option<DynLocationSource>,
    centering: Option<Centering>,
    session_listeners: Option<SessionListeners>,
    generation: u64,
    sink: EventSink,
    events: Receiver<Event>,
}

impl Controller {
    #[tracing::instrument(name = "Controller::new", skip_all)]
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let Collaborators {
            map,
            panel,
            notifier,
            permissions,
            planner,
            mut navigation,
            sources,
            store,
        } = collaborators;

        let (tx, events) = async_channel::unbounded();
        let device = sources.device();
        navigation.set_location_source(device.clone());

        let mut controller = Self {
            config,
            state: State::Idle,
            map,
            panel,
            notifier,
            permissions,
            planner,
            navigation,
            sources,
            store,
            slot: LocationSlot::new(device),
            map_source: None,
            centering: None,
            session_listeners: None,
            generation: 0,
            sink: EventSink::new(tx),
            events,
        };

        controller.attach_store_listener();
        controller
    }

    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn plan(&self) -> Option<&RoutePlan> {
        self.state.plan()
    }

    pub fn session(&self) -> Option<&NavigationSession> {
        self.state.session()
    }

    /// The source currently driving position updates.
    pub fn location_source(&self) -> &DynLocationSource {
        self.slot.source()
    }

    #[tracing::instrument(skip(self, event), fields(event = event.name(), state = %self.state.name()))]
    pub fn handle(&mut self, event: Event) {
        tracing::debug!("handling event");

        match event {
            Event::PermissionResolved { granted } => self.on_permission_resolved(granted),
            Event::FirstFix { token, fix } => self.on_first_fix(token, fix),
            Event::DestinationSelected(point) => self.select_destination(point),
            Event::RouteSelected => self.select_route(),
            Event::StopRequested => self.stop_navigation(),
            Event::RoutePlanned {
                generation,
                options,
                result,
            } => self.on_route_planned(generation, options, result),
            Event::NavigationStarted { session } => self.on_navigation_started(session),
            Event::NavigationStopped { session } => self.on_navigation_stopped(session),
            Event::NavigationFailed { session, failure } => {
                self.on_navigation_failed(session, failure)
            }
            Event::ProgressUpdated { session, progress } => {
                self.on_progress_updated(session, progress)
            }
            Event::RouteUpdated {
                session,
                route,
                reason,
            } => self.on_route_updated(session, route, reason),
            Event::CameraChanged { session, mode } => self.on_camera_changed(session, mode),
            Event::Shutdown => self.close(),
        }
    }

    /// Waits for the next event and handles it.
    pub async fn process_next(&mut self) -> Result<(), Error> {
        let event = self.events.recv().await.map_err(|_| unexpected_error())?;
        self.handle(event);
        Ok(())
    }

    /// Handles every event already queued, without waiting.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;

        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
            handled += 1;
        }

        handled
    }

    /// Handles events until `Shutdown` is received.
    #[tracing::instrument(skip(self))]
    pub async fn run(&mut self) {
        while let Ok(event) = self.events.recv().await {
            let shutdown = matches!(event, Event::Shutdown);
            self.handle(event);

            if shutdown {
                break;
            }
        }

        tracing::info!("controller stopped");
    }

    /// Releases the map's source, the navigation engine and the active
    /// location source.
    #[tracing::instrument(skip(self))]
    pub fn close(&mut self) {
        if let Ok(session) = self.state.begin_stopping() {
            self.teardown(&session);
        }

        self.map.set_location_source(None);

        if let Some(source) = self.map_source.take() {
            source.close();
        }

        self.navigation.close();
        self.slot.source().close();
        self.state = State::Idle;
        self.events.close();
    }

    fn notify(&mut self, notice: Notice) {
        tracing::info!("notice: {}", notice.message);
        self.notifier.show(&notice);
    }
}
