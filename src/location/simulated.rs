use rand_distr::{Distribution, Normal};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{ListenerId, LocationSource, OnLocationUpdate};
use crate::entities::geo::{point_along, polyline_length};
use crate::entities::{GeoPoint, LocationFix, LocationSourceKind};
use crate::listeners::{lock, Listeners};

const METERS_PER_DEGREE: f64 = 111_320.0;

/// Drives positions along a known route at a constant target speed.
///
/// `advance` moves the vehicle by a simulated time step. When enabled
/// inside a tokio runtime the source also advances itself on a fixed
/// interval until it reaches the last point of the route.
#[derive(Clone)]
pub struct SimulatedLocationSource {
    inner: Arc<Mutex<Inner>>,
    tick: Duration,
    time_scale: f64,
}

struct Inner {
    geometry: Vec<GeoPoint>,
    length: f64,
    speed: f64,
    travelled: f64,
    enabled: bool,
    last: Option<GeoPoint>,
    jitter: Option<Normal<f64>>,
    listeners: Listeners<dyn OnLocationUpdate>,
    ticker: Option<JoinHandle<()>>,
}

impl SimulatedLocationSource {
    pub fn new(geometry: Vec<GeoPoint>, speed: f64) -> Self {
        let length = polyline_length(&geometry);

        Self {
            inner: Arc::new(Mutex::new(Inner {
                geometry,
                length,
                speed: speed.max(0.0),
                travelled: 0.0,
                enabled: false,
                last: None,
                jitter: None,
                listeners: Listeners::default(),
                ticker: None,
            })),
            tick: Duration::from_secs(1),
            time_scale: 1.0,
        }
    }

    /// Real interval between automatic steps, and how much simulated time
    /// each step covers relative to it.
    pub fn with_tick(mut self, tick: Duration, time_scale: f64) -> Self {
        self.tick = tick;
        self.time_scale = time_scale.max(0.0);
        self
    }

    /// Adds Gaussian noise with the given standard deviation in meters.
    pub fn with_jitter(self, sigma: f64) -> Self {
        lock(&self.inner).jitter = if sigma > 0.0 {
            Normal::new(0.0, sigma).ok()
        } else {
            None
        };
        self
    }

    pub fn travelled(&self) -> f64 {
        lock(&self.inner).travelled
    }

    pub fn is_finished(&self) -> bool {
        let inner = lock(&self.inner);
        inner.last.is_some() && inner.travelled >= inner.length
    }

    /// Moves the vehicle forward by `elapsed` of simulated time and
    /// reports the new fix. Returns `None` once disabled or finished.
    pub fn advance(&self, elapsed: Duration) -> Option<LocationFix> {
        let (fix, listeners) = {
            let mut inner = lock(&self.inner);

            if !inner.enabled || inner.geometry.is_empty() {
                return None;
            }

            if inner.last.is_some() && inner.travelled >= inner.length {
                return None;
            }

            let previous = point_along(&inner.geometry, inner.travelled)?;
            inner.travelled =
                (inner.travelled + inner.speed * elapsed.as_secs_f64()).min(inner.length);
            let mut position = point_along(&inner.geometry, inner.travelled)?;

            let bearing = (previous != position).then(|| previous.bearing_to(&position));

            if let Some(jitter) = inner.jitter {
                let mut rng = rand::thread_rng();
                let north = jitter.sample(&mut rng);
                let east = jitter.sample(&mut rng);
                position.latitude += north / METERS_PER_DEGREE;
                position.longitude +=
                    east / (METERS_PER_DEGREE * position.latitude.to_radians().cos().max(1e-6));
            }

            inner.last = Some(position);

            let mut fix = LocationFix::new(position);
            fix.bearing = bearing;
            fix.speed = Some(inner.speed);

            (fix, inner.listeners.snapshot())
        };

        for listener in listeners {
            listener.on_location_update(&fix);
        }

        Some(fix)
    }

    fn spawn_ticker(&self) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::debug!("no runtime, simulated source advances manually");
                return None;
            }
        };

        let step = match Duration::try_from_secs_f64(self.tick.as_secs_f64() * self.time_scale) {
            Ok(step) if !self.tick.is_zero() => step,
            _ => {
                tracing::warn!(
                    "tick {:?} at scale {} is not usable, simulated source advances manually",
                    self.tick,
                    self.time_scale
                );
                return None;
            }
        };

        let source = self.clone();

        Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(source.tick);
            interval.tick().await;

            loop {
                interval.tick().await;

                if source.advance(step).is_none() {
                    tracing::debug!("simulated source reached the end of the route");
                    break;
                }
            }
        }))
    }
}

impl LocationSource for SimulatedLocationSource {
    fn kind(&self) -> LocationSourceKind {
        LocationSourceKind::Simulated
    }

    fn enable(&self) {
        {
            let mut inner = lock(&self.inner);

            if inner.enabled {
                return;
            }

            inner.enabled = true;
        }

        let ticker = self.spawn_ticker();
        lock(&self.inner).ticker = ticker;
    }

    fn disable(&self) {
        let mut inner = lock(&self.inner);
        inner.enabled = false;

        if let Some(ticker) = inner.ticker.take() {
            ticker.abort();
        }
    }

    fn is_enabled(&self) -> bool {
        lock(&self.inner).enabled
    }

    fn add_update_listener(&self, listener: Arc<dyn OnLocationUpdate>) -> ListenerId {
        lock(&self.inner).listeners.add(listener)
    }

    fn remove_update_listener(&self, id: ListenerId) -> bool {
        lock(&self.inner).listeners.remove(id)
    }

    fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    fn current_position(&self) -> Option<GeoPoint> {
        let inner = lock(&self.inner);
        inner.last.or_else(|| inner.geometry.first().copied())
    }
}

#[cfg(test)]
fn straight_route() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(52.0, 4.0),
        GeoPoint::new(52.0, 4.01),
        GeoPoint::new(52.0, 4.02),
    ]
}

#[test]
fn advance_moves_at_target_speed() {
    let source = SimulatedLocationSource::new(straight_route(), 30.0);
    assert!(source.advance(Duration::from_secs(1)).is_none());

    source.enable();
    let fix = source.advance(Duration::from_secs(10)).unwrap();

    assert!((source.travelled() - 300.0).abs() < 1e-6);
    assert!((fix.position.distance_to(&straight_route()[0]) - 300.0).abs() < 1.0);
    assert_eq!(fix.speed, Some(30.0));
    // heading east
    assert!((fix.bearing.unwrap() - 90.0).abs() < 0.1);
}

#[test]
fn reaches_destination_after_length_over_speed() {
    let route = straight_route();
    let length = polyline_length(&route);
    let source = SimulatedLocationSource::new(route.clone(), 30.0);
    source.enable();

    let seconds = (length / 30.0).ceil() as u64;
    let mut last = None;
    for _ in 0..seconds {
        last = source.advance(Duration::from_secs(1)).or(last);
    }

    assert!(source.is_finished());
    assert_eq!(last.unwrap().position, route[2]);
    assert!(source.advance(Duration::from_secs(1)).is_none());
}

#[test]
fn listeners_receive_each_fix() {
    use crate::location::device::CollectingListener;

    let source = SimulatedLocationSource::new(straight_route(), 10.0);
    let collected = Arc::new(CollectingListener(Mutex::new(vec![])));
    let id = source.add_update_listener(collected.clone());
    source.enable();

    source.advance(Duration::from_secs(1));
    source.advance(Duration::from_secs(1));
    assert!(source.remove_update_listener(id));
    source.advance(Duration::from_secs(1));

    assert_eq!(lock(&collected.0).len(), 2);
}

#[test]
fn ticker_drives_source_inside_runtime() {
    use crate::location::device::CollectingListener;
    use tokio_test::block_on;

    let source = SimulatedLocationSource::new(straight_route(), 30.0)
        .with_tick(Duration::from_millis(5), 1000.0);
    let collected = Arc::new(CollectingListener(Mutex::new(vec![])));
    source.add_update_listener(collected.clone());

    block_on(async {
        source.enable();
        tokio::time::sleep(Duration::from_millis(300)).await;
    });

    source.disable();
    assert!(source.is_finished());
    assert!(!lock(&collected.0).is_empty());
}

#[test]
fn unusable_tick_falls_back_to_manual_advance() {
    use tokio_test::block_on;

    for (tick, scale) in [
        (Duration::ZERO, 1.0),
        (Duration::from_secs(1), f64::INFINITY),
        (Duration::from_secs(1), 1e30),
    ] {
        let source = SimulatedLocationSource::new(straight_route(), 30.0).with_tick(tick, scale);

        block_on(async {
            source.enable();
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        assert_eq!(source.travelled(), 0.0);
        assert!(source.advance(Duration::from_secs(1)).is_some());
        source.disable();
    }
}
