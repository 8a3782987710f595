pub mod geo;
mod location;
mod map;
mod notice;
mod options;
mod progress;
mod route;
mod session;

pub use geo::GeoPoint;
pub use location::{LocationFix, LocationSourceKind};
pub use map::{
    CameraOptions, CameraTrackingMode, LocationButtonPolicy, LocationMarker, Padding,
    RouteDrawing,
};
pub use notice::{Notice, NoticeDuration};
pub use options::{
    GuidanceOptions, Inclusion, InstructionType, Itinerary, PhoneticsType, RoutePlanningOptions,
    Vehicle,
};
pub use progress::{RouteProgress, RouteUpdateReason};
pub use route::{Instruction, Route, RouteLeg, RoutePlan};
pub use session::NavigationSession;
