use serde::{Deserialize, Serialize};

use crate::entities::GeoPoint;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

impl Itinerary {
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionType {
    Coded,
    Text,
    Tagged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneticsType {
    None,
    Ipa,
    LnH,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    None,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceOptions {
    pub instruction_type: InstructionType,
    pub phonetics_type: PhoneticsType,
    pub announcement_points: Inclusion,
    pub extended_sections: Inclusion,
    pub progress_points: Inclusion,
}

impl Default for GuidanceOptions {
    fn default() -> Self {
        Self {
            instruction_type: InstructionType::Text,
            phonetics_type: PhoneticsType::Ipa,
            announcement_points: Inclusion::All,
            extended_sections: Inclusion::All,
            progress_points: Inclusion::All,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vehicle {
    Car,
    Truck,
    Pedestrian,
    Bicycle,
}

impl Vehicle {
    pub fn travel_mode(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Truck => "truck",
            Self::Pedestrian => "pedestrian",
            Self::Bicycle => "bicycle",
        }
    }
}

/// Everything a planner needs to compute a route. Kept alongside the
/// resulting route so guidance starts with the exact same request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutePlanningOptions {
    pub itinerary: Itinerary,
    pub guidance: GuidanceOptions,
    pub vehicle: Vehicle,
}

impl RoutePlanningOptions {
    pub fn new(itinerary: Itinerary) -> Self {
        Self {
            itinerary,
            guidance: GuidanceOptions::default(),
            vehicle: Vehicle::Car,
        }
    }
}
