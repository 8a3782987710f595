use std::sync::{Arc, Mutex};

use crate::api::{ListenerId, LocationSource, OnLocationUpdate};
use crate::entities::{GeoPoint, LocationFix, LocationSourceKind};
use crate::listeners::{lock, Listeners};

/// Live positioning fed by the host platform. The platform layer calls
/// `push` for every fix reported by the operating system.
#[derive(Clone, Default)]
pub struct DeviceLocationSource {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    enabled: bool,
    last: Option<LocationFix>,
    listeners: Listeners<dyn OnLocationUpdate>,
}

impl DeviceLocationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the fix and notifies listeners while enabled.
    pub fn push(&self, fix: LocationFix) {
        let listeners = {
            let mut inner = lock(&self.inner);
            inner.last = Some(fix);

            if !inner.enabled {
                tracing::debug!("device source disabled, fix recorded without notifying");
                return;
            }

            inner.listeners.snapshot()
        };

        for listener in listeners {
            listener.on_location_update(&fix);
        }
    }
}

impl LocationSource for DeviceLocationSource {
    fn kind(&self) -> LocationSourceKind {
        LocationSourceKind::Device
    }

    fn enable(&self) {
        lock(&self.inner).enabled = true;
    }

    fn disable(&self) {
        lock(&self.inner).enabled = false;
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
        lock(&self.inner).last.map(|fix| fix.position)
    }
}

#[cfg(test)]
pub(crate) struct CollectingListener(pub Mutex<Vec<LocationFix>>);

#[cfg(test)]
impl OnLocationUpdate for CollectingListener {
    fn on_location_update(&self, fix: &LocationFix) {
        lock(&self.0).push(*fix);
    }
}

#[test]
fn push_only_notifies_while_enabled() {
    let source = DeviceLocationSource::new();
    let collected = Arc::new(CollectingListener(Mutex::new(vec![])));
    source.add_update_listener(collected.clone());

    source.push(LocationFix::new(GeoPoint::new(1.0, 2.0)));
    assert!(lock(&collected.0).is_empty());
    assert_eq!(source.current_position(), Some(GeoPoint::new(1.0, 2.0)));

    source.enable();
    source.push(LocationFix::new(GeoPoint::new(3.0, 4.0)));
    assert_eq!(lock(&collected.0).len(), 1);
}
