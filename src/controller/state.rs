use crate::entities::{NavigationSession, RoutePlan};
use crate::error::{invalid_state_error, Error};

#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Idle,
    LocationPending,
    MapReady,
    RoutePlanned { plan: RoutePlan },
    Navigating { session: NavigationSession },
    Stopping,
}

impl Default for State {
    fn default() -> Self {
        Self::Idle
    }
}

impl State {
    pub fn name(&self) -> String {
        match self {
            Self::Idle => "idle".into(),
            Self::LocationPending => "location_pending".into(),
            Self::MapReady => "map_ready".into(),
            Self::RoutePlanned { plan: _ } => "route_planned".into(),
            Self::Navigating { session: _ } => "navigating".into(),
            Self::Stopping => "stopping".into(),
        }
    }

    pub fn plan(&self) -> Option<&RoutePlan> {
        match self {
            Self::RoutePlanned { plan } => Some(plan),
            Self::Navigating { session } => Some(&session.plan),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&NavigationSession> {
        match self {
            Self::Navigating { session } => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut NavigationSession> {
        match self {
            Self::Navigating { session } => Some(session),
            _ => None,
        }
    }

    pub fn is_navigating(&self) -> bool {
        matches!(self, Self::Navigating { session: _ })
    }

    /// Map is up and accepts destinations.
    pub fn accepts_destination(&self) -> bool {
        matches!(self, Self::MapReady | Self::RoutePlanned { plan: _ })
    }

    pub fn await_location(&mut self) -> Result<(), Error> {
        match self {
            Self::Idle | Self::Stopping => {
                *self = Self::LocationPending;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    pub fn grant_location(&mut self) -> Result<(), Error> {
        match self {
            Self::LocationPending => {
                *self = Self::MapReady;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    pub fn deny_location(&mut self) -> Result<(), Error> {
        match self {
            Self::LocationPending => {
                *self = Self::Idle;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    /// Drops any planned route ahead of a new request.
    pub fn clear_plan(&mut self) -> Result<(), Error> {
        match self {
            Self::MapReady | Self::RoutePlanned { plan: _ } => {
                *self = Self::MapReady;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    pub fn plan_route(&mut self, plan: RoutePlan) -> Result<(), Error> {
        match self {
            Self::MapReady => {
                *self = Self::RoutePlanned { plan };
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    pub fn begin_navigation(&mut self, session: NavigationSession) -> Result<(), Error> {
        match self {
            Self::RoutePlanned { plan: _ } => {
                *self = Self::Navigating { session };
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }

    pub fn begin_stopping(&mut self) -> Result<NavigationSession, Error> {
        match std::mem::replace(self, Self::Stopping) {
            Self::Navigating { session } => Ok(session),
            other => {
                *self = other;
                Err(invalid_state_error())
            }
        }
    }
}

#[cfg(test)]
fn sample_plan() -> RoutePlan {
    use crate::entities::{GeoPoint, Itinerary, Route, RouteLeg, RoutePlanningOptions};

    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(0.0, 0.01);
    let route = Route::new(vec![RouteLeg {
        points: vec![a, b],
        instructions: vec![],
    }]);

    RoutePlan::new(route, RoutePlanningOptions::new(Itinerary::new(a, b)))
}

#[test]
fn navigation_requires_a_planned_route() {
    use crate::entities::{LocationSourceKind, NavigationSession};

    let session = NavigationSession::new(sample_plan(), LocationSourceKind::Simulated);

    let mut state = State::MapReady;
    assert!(state.begin_navigation(session.clone()).is_err());
    assert_eq!(state, State::MapReady);

    state.plan_route(sample_plan()).unwrap();
    state.begin_navigation(session).unwrap();
    assert!(state.is_navigating());
    assert!(state.plan().is_some());
}

#[test]
fn begin_stopping_only_from_navigating() {
    let mut state = State::RoutePlanned {
        plan: sample_plan(),
    };

    assert!(state.begin_stopping().unwrap_err().is_invalid_state_error());
    assert_eq!(state.name(), "route_planned");
}

#[test]
fn permission_flow_transitions() {
    let mut state = State::default();

    state.await_location().unwrap();
    assert_eq!(state, State::LocationPending);
    state.deny_location().unwrap();
    assert_eq!(state, State::Idle);

    state.await_location().unwrap();
    state.grant_location().unwrap();
    assert!(state.accepts_destination());
    assert!(state.grant_location().is_err());
}
