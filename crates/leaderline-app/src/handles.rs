//! Host element ids and the element handles held for them.
//!
//! The id of a DOM element lives on the element itself, so looking it up
//! again needs no side table. Handles are only kept while an element is
//! being observed.

use leaderline_core::ElementId;
use std::collections::HashMap;
use uuid::Uuid;

pub const ID_ATTRIBUTE: &str = "data-leader-line-id";

pub fn parse_id(value: &str) -> Option<ElementId> {
    Uuid::parse_str(value).ok()
}

/// Attribute selector matching the element tagged with `id`.
pub fn id_selector(id: ElementId) -> String {
    format!("[{ID_ATTRIBUTE}=\"{id}\"]")
}

/// Handles of the elements between `observe` and `unobserve`.
#[derive(Debug)]
pub struct Observed<E> {
    handles: HashMap<ElementId, E>,
}

impl<E> Default for Observed<E> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }
}

impl<E> Observed<E> {
    pub fn observe(&mut self, id: ElementId, handle: E) {
        self.handles.insert(id, handle);
    }

    /// Release the handle, returning it so the caller can stop observing.
    pub fn unobserve(&mut self, id: ElementId) -> Option<E> {
        self.handles.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_selector_matches_attribute() {
        let id = Uuid::new_v4();
        let selector = id_selector(id);
        assert!(selector.starts_with("[data-leader-line-id=\""));
        let value = selector
            .trim_start_matches("[data-leader-line-id=\"")
            .trim_end_matches("\"]");
        assert_eq!(parse_id(value), Some(id));
        assert_eq!(parse_id("not-an-id"), None);
    }

    #[test]
    fn test_handles_released_on_unobserve() {
        let mut observed = Observed::default();
        let ids: Vec<_> = (0..3).map(|_| Uuid::new_v4()).collect();
        for _ in 0..10 {
            for (n, id) in ids.iter().enumerate() {
                observed.observe(*id, n);
            }
            assert_eq!(observed.len(), 3);
            for (n, id) in ids.iter().enumerate() {
                assert_eq!(observed.unobserve(*id), Some(n));
            }
            assert!(observed.is_empty());
        }
        assert_eq!(observed.unobserve(ids[0]), None);
    }
}
