use std::sync::{Arc, Mutex, Weak};

use crate::api::{DynLocationSource, ListenerId, LocationSource, OnLocationUpdate};
use crate::entities::geo::project;
use crate::entities::{GeoPoint, LocationFix, LocationSourceKind};
use crate::listeners::{lock, Listeners};

/// Snaps the fixes of an upstream source onto the active route geometry.
#[derive(Clone)]
pub struct MapMatchedLocationSource {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    upstream: DynLocationSource,
    geometry: Vec<GeoPoint>,
    subscription: Option<ListenerId>,
    last: Option<LocationFix>,
    listeners: Listeners<dyn OnLocationUpdate>,
}

struct SnapListener {
    inner: Weak<Mutex<Inner>>,
}

impl OnLocationUpdate for SnapListener {
    fn on_location_update(&self, fix: &LocationFix) {
        let inner = match self.inner.upgrade() {
            Some(inner) => inner,
            None => return,
        };

        let (snapped, listeners) = {
            let mut inner = lock(&inner);
            let mut snapped = *fix;

            if let Some(projection) = project(&inner.geometry, &fix.position) {
                snapped.position = projection.point;
            }

            inner.last = Some(snapped);
            (snapped, inner.listeners.snapshot())
        };

        for listener in listeners {
            listener.on_location_update(&snapped);
        }
    }
}

impl MapMatchedLocationSource {
    pub fn new(upstream: DynLocationSource, geometry: Vec<GeoPoint>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                upstream,
                geometry,
                subscription: None,
                last: None,
                listeners: Listeners::default(),
            })),
        }
    }
}

impl LocationSource for MapMatchedLocationSource {
    fn kind(&self) -> LocationSourceKind {
        LocationSourceKind::MapMatched
    }

    fn enable(&self) {
        let mut inner = lock(&self.inner);

        if inner.subscription.is_some() {
            return;
        }

        let listener = Arc::new(SnapListener {
            inner: Arc::downgrade(&self.inner),
        });
        inner.subscription = Some(inner.upstream.add_update_listener(listener));
    }

    fn disable(&self) {
        let mut inner = lock(&self.inner);

        if let Some(id) = inner.subscription.take() {
            inner.upstream.remove_update_listener(id);
        }
    }

    fn is_enabled(&self) -> bool {
        lock(&self.inner).subscription.is_some()
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

        match inner.last {
            Some(fix) => Some(fix.position),
            None => inner.upstream.current_position(),
        }
    }
}

#[test]
fn snaps_upstream_fixes_onto_route() {
    use crate::location::device::CollectingListener;
    use crate::location::DeviceLocationSource;

    let device = DeviceLocationSource::new();
    device.enable();

    let route = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)];
    let matched = MapMatchedLocationSource::new(Arc::new(device.clone()), route);
    let collected = Arc::new(CollectingListener(Mutex::new(vec![])));
    matched.add_update_listener(collected.clone());

    matched.enable();
    assert_eq!(device.listener_count(), 1);

    device.push(LocationFix::new(GeoPoint::new(0.0003, 0.004)));

    let fixes = lock(&collected.0);
    assert_eq!(fixes.len(), 1);
    assert!((fixes[0].position.latitude).abs() < 1e-9);
    assert!((fixes[0].position.longitude - 0.004).abs() < 1e-9);
    drop(fixes);

    matched.disable();
    assert_eq!(device.listener_count(), 0);
}
