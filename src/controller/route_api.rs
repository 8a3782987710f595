use super::{Controller, Event, State};
use crate::entities::{
    GeoPoint, Itinerary, Notice, Route, RouteDrawing, RoutePlan, RoutePlanningOptions,
};
use crate::error::{routing_error, unexpected_error, Error};

impl Controller {
    /// Clears the map and plans a route from the current position to
    /// `destination`. Any response to an earlier request is discarded.
    #[tracing::instrument(skip(self))]
    pub fn select_destination(&mut self, destination: GeoPoint) {
        if !self.state.accepts_destination() {
            tracing::debug!("destination ignored in state {}", self.state.name());
            return;
        }

        self.map.clear();

        if let Err(err) = self.state.clear_plan() {
            tracing::error!("unexpected state clearing plan: {}", err);
            return;
        }

        let origin = match self
            .slot
            .source()
            .current_position()
            .or_else(|| self.map.current_location())
        {
            Some(origin) => origin,
            None => {
                tracing::warn!("current location unknown, cannot plan a route yet");
                return;
            }
        };

        let mut options = RoutePlanningOptions::new(Itinerary::new(origin, destination));
        options.vehicle = self.config.vehicle;

        self.generation += 1;
        let generation = self.generation;

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::error!("route planning requires a tokio runtime");
                self.notify(Notice::from(&unexpected_error()));
                return;
            }
        };

        let planner = self.planner.clone();
        let sink = self.sink.clone();

        tracing::info!(generation, "planning route");

        runtime.spawn(async move {
            let result = planner.plan_route(&options).await;

            sink.send(Event::RoutePlanned {
                generation,
                options,
                result,
            });
        });
    }

    pub(super) fn on_route_planned(
        &mut self,
        generation: u64,
        options: RoutePlanningOptions,
        result: Result<Vec<Route>, Error>,
    ) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale route planning response"
            );
            return;
        }

        if !matches!(self.state, State::MapReady) {
            tracing::debug!("route response ignored in state {}", self.state.name());
            return;
        }

        let route = match result.and_then(|routes| {
            routes
                .into_iter()
                .next()
                .ok_or_else(|| routing_error("no route found"))
        }) {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!("route planning failed: {}", err);
                self.notify(Notice::from(&err));
                return;
            }
        };

        let plan = RoutePlan::new(route, options);
        self.draw_route(plan.route(), true);

        match self.state.plan_route(plan) {
            Ok(()) => tracing::info!("route planned"),
            Err(err) => tracing::error!("unexpected state storing plan: {}", err),
        }
    }

    pub(super) fn draw_route(&mut self, route: &Route, zoom: bool) {
        self.map.draw_route(RouteDrawing {
            geometry: route.geometry(),
            instructions: route.instructions(),
            departure_marker_visible: true,
            destination_marker_visible: true,
        });

        if zoom {
            self.map.zoom_to_routes(self.config.route_padding);
        }
    }
}
