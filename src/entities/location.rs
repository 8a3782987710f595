use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::GeoPoint;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub position: GeoPoint,
    pub timestamp: DateTime<Utc>,
    /// Degrees clockwise from north.
    pub bearing: Option<f64>,
    /// Meters per second.
    pub speed: Option<f64>,
}

impl LocationFix {
    pub fn new(position: GeoPoint) -> Self {
        Self {
            position,
            timestamp: Utc::now(),
            bearing: None,
            speed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSourceKind {
    Device,
    MapMatched,
    Simulated,
}

impl LocationSourceKind {
    pub fn name(&self) -> String {
        match self {
            Self::Device => "device".into(),
            Self::MapMatched => "map_matched".into(),
            Self::Simulated => "simulated".into(),
        }
    }
}
