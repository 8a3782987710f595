use std::sync::Arc;

use crate::api::{DynLocationSource, ListenerId, OnLocationUpdate};
use crate::entities::LocationSourceKind;

/// The single active location source together with the listeners the
/// owner registered on it.
pub struct LocationSlot {
    source: DynLocationSource,
    listeners: Vec<ListenerId>,
}

impl LocationSlot {
    pub fn new(source: DynLocationSource) -> Self {
        Self {
            source,
            listeners: Vec::new(),
        }
    }

    pub fn source(&self) -> &DynLocationSource {
        &self.source
    }

    pub fn kind(&self) -> LocationSourceKind {
        self.source.kind()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn OnLocationUpdate>) -> ListenerId {
        let id = self.source.add_update_listener(listener);
        self.listeners.push(id);
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.retain(|l| *l != id);
        self.source.remove_update_listener(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Installs `source`. Every listener registered through the slot is
    /// removed from the previous source, which is then disabled and
    /// returned.
    pub fn replace(&mut self, source: DynLocationSource) -> DynLocationSource {
        for id in self.listeners.drain(..) {
            self.source.remove_update_listener(id);
        }

        self.source.disable();

        tracing::debug!(
            "location source swapped from {} to {}",
            self.source.kind().name(),
            source.kind().name()
        );

        std::mem::replace(&mut self.source, source)
    }
}

#[test]
fn replace_detaches_listeners_before_swapping() {
    use crate::api::LocationSource;
    use crate::entities::{GeoPoint, LocationFix};
    use crate::listeners::lock;
    use crate::location::device::CollectingListener;
    use crate::location::{DeviceLocationSource, SimulatedLocationSource};
    use std::sync::Mutex;

    let device = DeviceLocationSource::new();
    device.enable();

    let mut slot = LocationSlot::new(Arc::new(device.clone()));
    let collected = Arc::new(CollectingListener(Mutex::new(vec![])));
    slot.add_listener(collected.clone());
    assert_eq!(device.listener_count(), 1);

    let simulated = SimulatedLocationSource::new(vec![GeoPoint::new(0.0, 0.0)], 10.0);
    let old = slot.replace(Arc::new(simulated));

    assert_eq!(old.kind(), LocationSourceKind::Device);
    assert_eq!(slot.kind(), LocationSourceKind::Simulated);
    assert_eq!(slot.listener_count(), 0);
    assert_eq!(device.listener_count(), 0);
    assert!(!device.is_enabled());

    device.push(LocationFix::new(GeoPoint::new(1.0, 1.0)));
    assert!(lock(&collected.0).is_empty());
}
