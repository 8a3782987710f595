use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{geo, GeoPoint, RoutePlanningOptions};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Distance from the route start, in meters.
    pub route_offset: f64,
    pub combine_with_next: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub points: Vec<GeoPoint>,
    pub instructions: Vec<Instruction>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub legs: Vec<RouteLeg>,
    pub length: f64,
}

impl Route {
    pub fn new(legs: Vec<RouteLeg>) -> Self {
        let length = legs.iter().map(|leg| geo::polyline_length(&leg.points)).sum();

        Self {
            id: Uuid::new_v4(),
            legs,
            length,
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// All leg points in travel order.
    pub fn geometry(&self) -> Vec<GeoPoint> {
        self.legs.iter().flat_map(|leg| leg.points.iter().copied()).collect()
    }

    pub fn instructions(&self) -> Vec<Instruction> {
        self.legs
            .iter()
            .flat_map(|leg| leg.instructions.iter().copied())
            .collect()
    }

    pub fn departure(&self) -> Option<GeoPoint> {
        self.legs.first().and_then(|leg| leg.points.first().copied())
    }

    pub fn destination(&self) -> Option<GeoPoint> {
        self.legs.last().and_then(|leg| leg.points.last().copied())
    }
}

/// A route bound to the options that produced it. Immutable: a route
/// update yields a new plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    route: Route,
    options: RoutePlanningOptions,
}

impl RoutePlan {
    pub fn new(route: Route, options: RoutePlanningOptions) -> Self {
        Self { route, options }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn options(&self) -> &RoutePlanningOptions {
        &self.options
    }

    /// Same options, different route.
    pub fn replanned(&self, route: Route) -> Self {
        Self {
            route,
            options: self.options.clone(),
        }
    }
}

#[test]
fn geometry_concatenates_legs() {
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(0.0, 0.01);
    let c = GeoPoint::new(0.0, 0.02);

    let route = Route::new(vec![
        RouteLeg {
            points: vec![a, b],
            instructions: vec![Instruction {
                route_offset: 0.0,
                combine_with_next: false,
            }],
        },
        RouteLeg {
            points: vec![b, c],
            instructions: vec![Instruction {
                route_offset: 1112.0,
                combine_with_next: true,
            }],
        },
    ]);

    assert_eq!(route.geometry(), vec![a, b, b, c]);
    assert_eq!(route.instructions().len(), 2);
    assert_eq!(route.departure(), Some(a));
    assert_eq!(route.destination(), Some(c));
    assert!((route.length - 2224.0).abs() < 5.0);
}
