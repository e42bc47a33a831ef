//! Element identity and the capability side-tables keyed by it.
//!
//! Platform elements are never touched directly by the engine. They are
//! identified by an [`ElementId`], and behaviour is attached to them through
//! tables owned by the services rather than by mutating the element.

use crate::error::{LeaderLineError, LeaderLineResult};
use crate::frame::FrameScheduler;
use crate::transform::Transform;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier for platform elements.
pub type ElementId = Uuid;

/// Resolves a selector against the document.
pub trait SelectorResolver {
    fn query_selector(&self, selector: &str) -> Option<ElementId>;
}

/// Writes inline style properties on platform elements.
pub trait ElementStyle {
    fn set_style_property(&self, element: ElementId, property: &str, value: &str);
}

/// Capabilities attached to elements at runtime.
#[derive(Default)]
pub struct Features {
    transforms: RefCell<HashMap<ElementId, Rc<Transform>>>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the element's transform feature, creating it on first use.
    pub fn make_transformable(
        &self,
        element: ElementId,
        frames: &Rc<FrameScheduler>,
        writer: &Rc<dyn ElementStyle>,
    ) -> Rc<Transform> {
        self.make_transformable_proxy(element, element, frames, writer)
    }

    /// Like [`Features::make_transformable`], but `host` holds the feature
    /// on behalf of `target`, whose style receives the writes.
    pub fn make_transformable_proxy(
        &self,
        host: ElementId,
        target: ElementId,
        frames: &Rc<FrameScheduler>,
        writer: &Rc<dyn ElementStyle>,
    ) -> Rc<Transform> {
        self.transforms
            .borrow_mut()
            .entry(host)
            .or_insert_with(|| Transform::new(target, frames.clone(), writer.clone()))
            .clone()
    }

    /// The element's transform feature, if it has one.
    pub fn transform(&self, element: ElementId) -> Option<Rc<Transform>> {
        self.transforms.borrow().get(&element).cloned()
    }

    /// Detach every feature from `element`.
    pub fn remove(&self, element: ElementId) {
        if let Some(transform) = self.transforms.borrow_mut().remove(&element) {
            transform.dispose();
        }
    }

    pub fn reset(&self) {
        let removed: Vec<_> = self.transforms.borrow_mut().drain().map(|(_, t)| t).collect();
        for transform in removed {
            transform.dispose();
        }
    }
}

/// Looks up child nodes of an owner (e.g. inside its shadow root).
pub trait ChildLookup {
    type Node: Clone;

    fn query_child(&self, selector: &str) -> Option<Self::Node>;
}

/// Id-keyed association from owner identity to owner.
///
/// Holders of an id never own the owner: once the entry is removed every
/// lookup through it fails.
pub struct OwnerRegistry<O> {
    owners: RefCell<HashMap<ElementId, Rc<O>>>,
}

impl<O> Default for OwnerRegistry<O> {
    fn default() -> Self {
        Self {
            owners: RefCell::new(HashMap::new()),
        }
    }
}

impl<O> OwnerRegistry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ElementId, owner: Rc<O>) {
        self.owners.borrow_mut().insert(id, owner);
    }

    /// Remove the owner; outstanding child refs fail from now on.
    pub fn dispose(&self, id: ElementId) -> Option<Rc<O>> {
        self.owners.borrow_mut().remove(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<Rc<O>> {
        self.owners.borrow().get(&id).cloned()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.owners.borrow().contains_key(&id)
    }
}

/// Lazily-resolved reference to a child node of an owner.
///
/// The selector query only runs on first access; the result is cached.
#[derive(Debug, Clone)]
pub struct ChildRef<N> {
    selector: String,
    owner: ElementId,
    node: Option<N>,
}

impl<N: Clone> ChildRef<N> {
    pub fn new(selector: impl Into<String>, owner: ElementId) -> Self {
        Self {
            selector: selector.into(),
            owner,
            node: None,
        }
    }

    /// Resolve the node, querying the owner the first time.
    ///
    /// Returns `Ok(None)` when the owner exists but has no matching child.
    pub fn get<O>(&mut self, registry: &OwnerRegistry<O>) -> LeaderLineResult<Option<N>>
    where
        O: ChildLookup<Node = N>,
    {
        if let Some(node) = &self.node {
            return Ok(Some(node.clone()));
        }
        let owner = registry.get(self.owner).ok_or_else(|| LeaderLineError::OwnerGone {
            selector: self.selector.clone(),
        })?;
        self.node = owner.query_child(&self.selector);
        Ok(self.node.clone())
    }
}
