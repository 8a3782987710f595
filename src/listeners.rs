use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::api::ListenerId;

/// Registration list for callback handlers. Callers take a `snapshot()`
/// and release their lock before invoking handlers, so a handler may
/// safely call back into the component that notified it.
pub(crate) struct Listeners<T: ?Sized> {
    entries: Vec<(ListenerId, Arc<T>)>,
}

impl<T: ?Sized> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> Listeners<T> {
    pub fn add(&mut self, listener: Arc<T>) -> ListenerId {
        let id = Uuid::new_v4();
        self.entries.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        before != self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.iter().map(|(_, l)| l.clone()).collect()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[test]
fn remove_reports_whether_listener_was_registered() {
    let mut listeners: Listeners<str> = Listeners::default();
    let id = listeners.add(Arc::from("a"));
    listeners.add(Arc::from("b"));

    assert!(listeners.remove(id));
    assert!(!listeners.remove(id));
    assert_eq!(listeners.len(), 1);
    assert_eq!(&*listeners.snapshot()[0], "b");
}
