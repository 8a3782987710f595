use serde::{Deserialize, Serialize};

use crate::entities::{GeoPoint, Instruction};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraTrackingMode {
    None,
    FollowRoute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMarker {
    Pointer,
    Chevron,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationButtonPolicy {
    Invisible,
    InvisibleWhenRecentered,
}

/// Screen insets in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padding {
    pub top: u32,
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Padding {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn bottom(bottom: u32) -> Self {
        Self {
            bottom,
            ..Self::default()
        }
    }

    /// Converts density-independent units to pixels.
    pub fn scaled(&self, density: f64) -> Self {
        let scale = |v: u32| (v as f64 * density) as u32;

        Self {
            top: scale(self.top),
            left: scale(self.left),
            right: scale(self.right),
            bottom: scale(self.bottom),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraOptions {
    pub position: GeoPoint,
    pub zoom: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteDrawing {
    pub geometry: Vec<GeoPoint>,
    pub instructions: Vec<Instruction>,
    pub departure_marker_visible: bool,
    pub destination_marker_visible: bool,
}

#[test]
fn padding_scales_with_density() {
    let padding = Padding::bottom(263).scaled(2.0);

    assert_eq!(padding, Padding::bottom(526));
    assert_eq!(Padding::zero().scaled(3.0), Padding::zero());
}
