pub mod device;
pub mod map_matched;
pub mod simulated;
pub mod slot;

pub use device::DeviceLocationSource;
pub use map_matched::MapMatchedLocationSource;
pub use simulated::SimulatedLocationSource;
pub use slot::LocationSlot;

use std::sync::Arc;
use std::time::Duration;

use crate::api::{DynLocationSource, LocationSourceFactory};
use crate::config::Config;
use crate::entities::GeoPoint;

/// Builds the three kinds of sources from the crate's own implementations.
/// The device source is shared: re-acquiring it hands out the same feed.
#[derive(Clone)]
pub struct LocationSources {
    device: DeviceLocationSource,
    tick: Duration,
    time_scale: f64,
    jitter: f64,
}

impl LocationSources {
    pub fn new(device: DeviceLocationSource, config: &Config) -> Self {
        Self {
            device,
            tick: Duration::from_millis(config.simulation_tick_ms),
            time_scale: config.simulation_time_scale,
            jitter: config.simulation_jitter,
        }
    }
}

impl LocationSourceFactory for LocationSources {
    fn device(&self) -> DynLocationSource {
        Arc::new(self.device.clone())
    }

    fn simulated(&self, geometry: Vec<GeoPoint>, speed: f64) -> DynLocationSource {
        let source = SimulatedLocationSource::new(geometry, speed)
            .with_tick(self.tick, self.time_scale)
            .with_jitter(self.jitter);

        Arc::new(source)
    }

    fn map_matched(
        &self,
        upstream: DynLocationSource,
        geometry: Vec<GeoPoint>,
    ) -> DynLocationSource {
        Arc::new(MapMatchedLocationSource::new(upstream, geometry))
    }
}
