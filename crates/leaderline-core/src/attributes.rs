//! Attribute-change subscriptions.
//!
//! Keeps the current value of an element's observed attributes and invokes
//! registered callbacks whenever one is written. This stands in for the
//! platform's mutation observer: the browser front-end forwards real
//! attribute mutations into [`AttributeObserver::set_attribute`].

use crate::callbacks::CallbackId;
use crate::error::LeaderLineResult;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// A single attribute change as seen by callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
}

type AttributeCallback = Rc<dyn Fn(&AttributeChange) -> LeaderLineResult<()>>;

#[derive(Default)]
struct Registered {
    callbacks: HashMap<String, Vec<(CallbackId, AttributeCallback)>>,
    once_callbacks: HashMap<String, Vec<(CallbackId, AttributeCallback)>>,
}

/// Attribute store with change callbacks.
#[derive(Default)]
pub struct AttributeObserver {
    values: RefCell<HashMap<String, String>>,
    registered: RefCell<Registered>,
    next_id: Cell<u64>,
}

impl AttributeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name`.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }

    /// Register `callback` for changes of `name`.
    ///
    /// `once` callbacks remove themselves after their first invocation.
    /// With `call_now` the callback is invoked immediately with the current
    /// value (and no old value); its error, if any, is returned.
    pub fn add_callback(
        &self,
        name: &str,
        callback: impl Fn(&AttributeChange) -> LeaderLineResult<()> + 'static,
        once: bool,
        call_now: bool,
    ) -> LeaderLineResult<CallbackId> {
        let id = CallbackId::from_raw(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        let callback: AttributeCallback = Rc::new(callback);
        {
            let mut registered = self.registered.borrow_mut();
            let map = if once {
                &mut registered.once_callbacks
            } else {
                &mut registered.callbacks
            };
            map.entry(name.to_string()).or_default().push((id, callback.clone()));
        }
        if call_now {
            callback(&AttributeChange {
                name: name.to_string(),
                new_value: self.attribute(name),
                old_value: None,
            })?;
        }
        Ok(id)
    }

    /// Unregister a callback previously added with the same `once` flag.
    pub fn remove_callback(&self, name: &str, id: CallbackId, once: bool) {
        let mut registered = self.registered.borrow_mut();
        let map = if once {
            &mut registered.once_callbacks
        } else {
            &mut registered.callbacks
        };
        if let Some(list) = map.get_mut(name) {
            list.retain(|(cb_id, _)| *cb_id != id);
            if list.is_empty() {
                map.remove(name);
            }
        }
    }

    /// Names of attributes that currently have callbacks.
    pub fn observed_attributes(&self) -> Vec<String> {
        let registered = self.registered.borrow();
        let mut names: Vec<String> = registered
            .callbacks
            .keys()
            .chain(registered.once_callbacks.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Write an attribute (`None` removes it) and notify its callbacks.
    ///
    /// Every callback runs; the first error is returned.
    pub fn set_attribute(&self, name: &str, value: Option<String>) -> LeaderLineResult<()> {
        let old_value = {
            let mut values = self.values.borrow_mut();
            match &value {
                Some(v) => values.insert(name.to_string(), v.clone()),
                None => values.remove(name),
            }
        };
        let change = AttributeChange {
            name: name.to_string(),
            new_value: value,
            old_value,
        };

        let (callbacks, once) = {
            let mut registered = self.registered.borrow_mut();
            let callbacks: Vec<AttributeCallback> = registered
                .callbacks
                .get(name)
                .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default();
            let once: Vec<AttributeCallback> = registered
                .once_callbacks
                .remove(name)
                .map(|list| list.into_iter().map(|(_, cb)| cb).collect())
                .unwrap_or_default();
            (callbacks, once)
        };

        let mut result = Ok(());
        for callback in callbacks.iter().chain(once.iter()) {
            if let Err(err) = callback(&change) {
                log::warn!("attribute `{name}` callback failed: {err}");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeaderLineError;
    use crate::events::ReferenceKind;

    fn recorder() -> (Rc<RefCell<Vec<AttributeChange>>>, impl Fn(&AttributeChange) -> LeaderLineResult<()>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |change: &AttributeChange| {
            sink.borrow_mut().push(change.clone());
            Ok(())
        })
    }

    #[test]
    fn test_callback_receives_old_and_new() {
        let attrs = AttributeObserver::new();
        let (seen, cb) = recorder();
        attrs.add_callback("source-selector", cb, false, false).unwrap();
        attrs.set_attribute("source-selector", Some("#a".into())).unwrap();
        attrs.set_attribute("source-selector", Some("#b".into())).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].old_value.as_deref(), Some("#a"));
        assert_eq!(seen[1].new_value.as_deref(), Some("#b"));
    }

    #[test]
    fn test_call_now_uses_current_value() {
        let attrs = AttributeObserver::new();
        attrs.set_attribute("target-selector", Some("#t".into())).unwrap();
        let (seen, cb) = recorder();
        attrs.add_callback("target-selector", cb, false, true).unwrap();
        assert_eq!(seen.borrow()[0].new_value.as_deref(), Some("#t"));
        assert_eq!(seen.borrow()[0].old_value, None);
    }

    #[test]
    fn test_once_callback_fires_once() {
        let attrs = AttributeObserver::new();
        let (seen, cb) = recorder();
        attrs.add_callback("x", cb, true, false).unwrap();
        attrs.set_attribute("x", Some("1".into())).unwrap();
        attrs.set_attribute("x", Some("2".into())).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert!(attrs.observed_attributes().is_empty());
    }

    #[test]
    fn test_remove_callback() {
        let attrs = AttributeObserver::new();
        let (seen, cb) = recorder();
        let id = attrs.add_callback("x", cb, false, false).unwrap();
        assert_eq!(attrs.observed_attributes(), vec!["x".to_string()]);
        attrs.remove_callback("x", id, false);
        attrs.set_attribute("x", None).unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_errors_are_returned_after_all_callbacks_run() {
        let attrs = AttributeObserver::new();
        attrs
            .add_callback(
                "x",
                |_| Err(LeaderLineError::SameReference { kind: ReferenceKind::Source }),
                false,
                false,
            )
            .unwrap();
        let (seen, cb) = recorder();
        attrs.add_callback("x", cb, false, false).unwrap();
        assert!(attrs.set_attribute("x", Some("v".into())).is_err());
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(attrs.attribute("x").as_deref(), Some("v"));
    }
}
