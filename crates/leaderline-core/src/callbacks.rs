//! Simple store to add, remove, and trigger callbacks.

use std::rc::Rc;

/// Handle returned when a callback is added, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

impl CallbackId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Ordered set of callbacks receiving `&T`.
pub struct CallbackStore<T = ()> {
    next_id: u64,
    callbacks: Vec<(CallbackId, Rc<dyn Fn(&T)>)>,
}

impl<T> Default for CallbackStore<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
        }
    }
}

impl<T> CallbackStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, callback: impl Fn(&T) + 'static) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Rc::new(callback)));
        id
    }

    /// Returns whether the callback was registered.
    pub fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cb_id, _)| *cb_id != id);
        before != self.callbacks.len()
    }

    /// Snapshot of the registered callbacks, in insertion order.
    ///
    /// Invoke the snapshot rather than the store when callbacks may touch the
    /// owner of the store.
    pub fn snapshot(&self) -> Vec<Rc<dyn Fn(&T)>> {
        self.callbacks.iter().map(|(_, cb)| cb.clone()).collect()
    }

    pub fn trigger(&self, args: &T) {
        for callback in self.snapshot() {
            callback(args);
        }
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn has_callbacks(&self) -> bool {
        !self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
