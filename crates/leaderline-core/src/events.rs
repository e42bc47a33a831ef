//! Cancelable notifications dispatched by a line.
//!
//! Every notification is delivered to all registered observers. Any observer
//! returning `false` vetoes the step that triggered it.

use crate::element::ElementId;
use crate::socket::Socket;
use kurbo::{Point, Rect};
use std::fmt;
use std::rc::Rc;

/// Which end of a line a reference is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Source,
    Target,
}

impl ReferenceKind {
    pub fn opposite(&self) -> ReferenceKind {
        match self {
            ReferenceKind::Source => ReferenceKind::Target,
            ReferenceKind::Target => ReferenceKind::Source,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Source => "source",
            ReferenceKind::Target => "target",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference is about to be assigned. Vetoing hides the line and keeps
/// the previous reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceChangeEvent {
    pub line: ElementId,
    pub kind: ReferenceKind,
    pub added: Option<ElementId>,
    pub removed: Option<ElementId>,
}

impl ReferenceChangeEvent {
    pub const NAME: &'static str = "leader-line-ref-change";
}

/// Both references are set; observers may reject the pair.
///
/// Not coalesced: assigning both ends declaratively validates once per
/// assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateEvent {
    pub line: ElementId,
    pub source: Option<ElementId>,
    pub target: Option<ElementId>,
}

impl ValidateEvent {
    pub const NAME: &'static str = "leader-line-validate";
}

/// Sockets are resolved and the line is about to be redrawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEvent {
    pub line: ElementId,
    pub source: ElementId,
    pub source_geometry: Rect,
    pub source_socket: Socket,
    pub target: ElementId,
    pub target_geometry: Rect,
    pub target_socket: Socket,
}

impl PositionEvent {
    pub const NAME: &'static str = "leader-line-position";
}

/// The line is about to be drawn.
///
/// Observers may move the endpoints or the viewport, e.g. to account for
/// transforms the sampled bounds don't reflect.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawEvent {
    pub line: ElementId,
    pub start: Point,
    pub end: Point,
    pub viewport: Rect,
}

impl DrawEvent {
    pub const NAME: &'static str = "leader-line-draw";
}

/// Hooks into a line's positioning. Returning `false` vetoes.
pub trait LeaderLineObserver {
    fn on_reference_change(&self, _event: &ReferenceChangeEvent) -> bool {
        true
    }

    fn on_validate(&self, _event: &ValidateEvent) -> bool {
        true
    }

    fn on_position(&self, _event: &PositionEvent) -> bool {
        true
    }

    fn on_draw(&self, _event: &mut DrawEvent) -> bool {
        true
    }
}

/// Handle returned by `add_observer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub(crate) struct ObserverList {
    next_id: u64,
    observers: Vec<(ObserverId, Rc<dyn LeaderLineObserver>)>,
}

impl ObserverList {
    pub(crate) fn add(&mut self, observer: Rc<dyn LeaderLineObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        before != self.observers.len()
    }

    pub(crate) fn snapshot(&self) -> Vec<Rc<dyn LeaderLineObserver>> {
        self.observers.iter().map(|(_, o)| o.clone()).collect()
    }
}

/// Run `notify` on every observer; true if none vetoed.
pub(crate) fn dispatch(
    observers: Vec<Rc<dyn LeaderLineObserver>>,
    mut notify: impl FnMut(&dyn LeaderLineObserver) -> bool,
) -> bool {
    observers
        .iter()
        .fold(true, |proceed, observer| notify(observer.as_ref()) && proceed)
}
