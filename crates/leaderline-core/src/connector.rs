//! The leader line itself: references, positioning and redraw.
//!
//! A line connects a source and a target element. Positioning samples both
//! elements' bounds asynchronously, picks a socket on each and redraws the
//! path between them. Observers can veto every step.

use crate::attributes::{AttributeChange, AttributeObserver};
use crate::element::{ElementId, SelectorResolver};
use crate::error::{LeaderLineError, LeaderLineResult};
use crate::events::{
    LeaderLineObserver, ObserverId, ObserverList, PositionEvent, ReferenceChangeEvent,
    ReferenceKind, ValidateEvent, dispatch,
};
use crate::geometry::RectExt;
use crate::path::build_draw;
use crate::render::LineRenderer;
use crate::services::Services;
use crate::socket::{Socket, resolve_sockets};
use crate::style::{StyleConfiguration, StyleUpdate};
use crate::surface::ConnectorSurface;
use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::task::{LocalSpawn, LocalSpawnExt};
use kurbo::{Point, Rect};
use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

/// Attribute holding the source selector.
pub const SOURCE_SELECTOR_ATTRIBUTE: &str = "source-selector";
/// Attribute holding the target selector.
pub const TARGET_SELECTOR_ATTRIBUTE: &str = "target-selector";

/// An element assigned as source or target, with the socket picked for it by
/// the last position pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub element: ElementId,
    pub socket: Option<Socket>,
}

impl Reference {
    fn new(element: ElementId) -> Self {
        Self {
            element,
            socket: None,
        }
    }
}

/// Resets the positioning flag when a position pass ends, however it ends.
struct PositioningGuard {
    positioning: Rc<Cell<bool>>,
}

impl PositioningGuard {
    fn acquire(positioning: &Rc<Cell<bool>>) -> Option<Self> {
        if positioning.replace(true) {
            return None;
        }
        Some(Self {
            positioning: positioning.clone(),
        })
    }
}

impl Drop for PositioningGuard {
    fn drop(&mut self) {
        self.positioning.set(false);
    }
}

/// A connector line between two elements.
///
/// Always lives in an `Rc`; see [`LeaderLine::new`].
pub struct LeaderLine<S: ConnectorSurface + 'static> {
    this: Weak<Self>,
    id: ElementId,
    services: Services,
    selectors: Rc<dyn SelectorResolver>,
    spawner: Rc<dyn LocalSpawn>,
    attributes: AttributeObserver,
    renderer: RefCell<LineRenderer<S>>,
    style: RefCell<StyleConfiguration>,
    source: Cell<Option<Reference>>,
    target: Cell<Option<Reference>>,
    /// Elements this line attached bounds sampling to.
    attached: RefCell<Vec<ElementId>>,
    positioning: Rc<Cell<bool>>,
    observers: RefCell<ObserverList>,
}

impl<S: ConnectorSurface + 'static> LeaderLine<S> {
    /// Create a hidden line drawing into `surface`.
    ///
    /// `id` identifies the line's host element. Selectors written to the
    /// selector attributes are resolved through `selectors`; repositioning
    /// triggered by reference changes runs on `spawner`.
    pub fn new(
        id: ElementId,
        surface: S,
        services: Services,
        selectors: Rc<dyn SelectorResolver>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Rc<Self> {
        let line = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            id,
            services,
            selectors,
            spawner,
            attributes: AttributeObserver::new(),
            renderer: RefCell::new(LineRenderer::new(surface)),
            style: RefCell::new(StyleConfiguration::default()),
            source: Cell::new(None),
            target: Cell::new(None),
            attached: RefCell::new(Vec::new()),
            positioning: Rc::new(Cell::new(false)),
            observers: RefCell::new(ObserverList::default()),
        });
        for (attribute, kind) in [
            (SOURCE_SELECTOR_ATTRIBUTE, ReferenceKind::Source),
            (TARGET_SELECTOR_ATTRIBUTE, ReferenceKind::Target),
        ] {
            let this = line.this.clone();
            let registered = line.attributes.add_callback(
                attribute,
                move |change: &AttributeChange| match this.upgrade() {
                    Some(line) => line.assign_from_selector(kind, change.new_value.as_deref()),
                    None => Ok(()),
                },
                false,
                true,
            );
            if let Err(err) = registered {
                log::warn!("initial {attribute} of line {id} could not be applied: {err}");
            }
        }
        line.renderer.borrow_mut().apply_style(&line.style.borrow());
        line
    }

    /// Identity of the line's host element.
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn source(&self) -> Option<ElementId> {
        self.source.get().map(|r| r.element)
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target.get().map(|r| r.element)
    }

    /// Socket picked for the source by the last position pass.
    pub fn source_socket(&self) -> Option<Socket> {
        self.source.get().and_then(|r| r.socket)
    }

    /// Socket picked for the target by the last position pass.
    pub fn target_socket(&self) -> Option<Socket> {
        self.target.get().and_then(|r| r.socket)
    }

    /// Assign the source element. Repositions when both ends are set.
    ///
    /// Fails without changing anything when `source` is the current target.
    pub fn set_source(&self, source: Option<ElementId>) -> LeaderLineResult<()> {
        self.assign(ReferenceKind::Source, source)
    }

    /// Assign the target element. Repositions when both ends are set.
    ///
    /// Fails without changing anything when `target` is the current source.
    pub fn set_target(&self, target: Option<ElementId>) -> LeaderLineResult<()> {
        self.assign(ReferenceKind::Target, target)
    }

    pub fn source_selector(&self) -> Option<String> {
        self.attributes.attribute(SOURCE_SELECTOR_ATTRIBUTE)
    }

    pub fn target_selector(&self) -> Option<String> {
        self.attributes.attribute(TARGET_SELECTOR_ATTRIBUTE)
    }

    /// Assign the source through a selector. The last of this and
    /// [`LeaderLine::set_source`] to be called wins.
    pub fn set_source_selector(&self, selector: Option<&str>) -> LeaderLineResult<()> {
        self.attribute_changed(SOURCE_SELECTOR_ATTRIBUTE, selector)
    }

    /// Assign the target through a selector. The last of this and
    /// [`LeaderLine::set_target`] to be called wins.
    pub fn set_target_selector(&self, selector: Option<&str>) -> LeaderLineResult<()> {
        self.attribute_changed(TARGET_SELECTOR_ATTRIBUTE, selector)
    }

    /// Forward an attribute mutation of the host element.
    pub fn attribute_changed(&self, name: &str, value: Option<&str>) -> LeaderLineResult<()> {
        self.attributes.set_attribute(name, value.map(str::to_string))
    }

    /// The host's attribute store.
    pub fn attributes(&self) -> &AttributeObserver {
        &self.attributes
    }

    pub fn is_hidden(&self) -> bool {
        self.renderer.borrow().is_hidden()
    }

    /// Whether a position pass is in flight.
    pub fn is_positioning(&self) -> bool {
        self.positioning.get()
    }

    pub fn show(&self) {
        if self.is_hidden() {
            log::debug!("showing line {}", self.id);
        }
        self.renderer.borrow_mut().set_visible(true);
    }

    pub fn hide(&self) {
        if !self.is_hidden() {
            log::debug!("hiding line {}", self.id);
        }
        self.renderer.borrow_mut().set_visible(false);
    }

    /// The line's surface.
    pub fn surface(&self) -> Ref<'_, S> {
        Ref::map(self.renderer.borrow(), LineRenderer::surface)
    }

    /// Current resolved style.
    pub fn style_config(&self) -> StyleConfiguration {
        self.style.borrow().clone()
    }

    /// Merge `update` into the style and apply it.
    pub fn set_style_config(&self, update: &StyleUpdate) {
        let style = self.style.borrow().merged(update);
        self.renderer.borrow_mut().apply_style(&style);
        *self.style.borrow_mut() = style;
    }

    pub fn add_observer(&self, observer: Rc<dyn LeaderLineObserver>) -> ObserverId {
        self.observers.borrow_mut().add(observer)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().remove(id)
    }

    /// Dispatch the validate notification; false if an observer vetoed.
    pub fn is_valid(&self) -> bool {
        let event = ValidateEvent {
            line: self.id,
            source: self.source(),
            target: self.target(),
        };
        self.notify(|observer| observer.on_validate(&event))
    }

    /// Reposition from the current bounds of both ends.
    ///
    /// Does nothing while another pass is in flight. Missing references or
    /// overlapping bounds hide the line. Dropping the returned future ends
    /// the pass without drawing.
    pub fn position(&self) -> LocalBoxFuture<'static, ()> {
        let Some(guard) = PositioningGuard::acquire(&self.positioning) else {
            log::trace!("line {} is already positioning", self.id);
            return future::ready(()).boxed_local();
        };
        let (Some(source), Some(target)) = (self.source.get(), self.target.get()) else {
            self.hide();
            return future::ready(()).boxed_local();
        };

        // A pass after `dispose` attaches again, so drop can release it.
        self.attach(source.element);
        self.attach(target.element);
        let bounds = &self.services.bounds;
        let samples = future::join(bounds.sample(source.element), bounds.sample(target.element));
        let this = self.this.clone();
        async move {
            let (source_rect, target_rect) = samples.await;
            if let Some(line) = this.upgrade() {
                line.place(source.element, source_rect, target.element, target_rect);
            }
            drop(guard);
        }
        .boxed_local()
    }

    /// Start a position pass in the background.
    pub fn request_position(&self) {
        if let Err(err) = self.spawner.spawn_local(self.position()) {
            log::warn!("can't schedule positioning of line {}: {err}", self.id);
        }
    }

    /// Release the bounds sampling attached for this line's references.
    pub fn dispose(&self) {
        let attached = std::mem::take(&mut *self.attached.borrow_mut());
        for element in attached {
            self.services.bounds.release(element);
        }
    }

    fn reference(&self, kind: ReferenceKind) -> &Cell<Option<Reference>> {
        match kind {
            ReferenceKind::Source => &self.source,
            ReferenceKind::Target => &self.target,
        }
    }

    fn assign_from_selector(&self, kind: ReferenceKind, selector: Option<&str>) -> LeaderLineResult<()> {
        let element = selector.and_then(|selector| self.selectors.query_selector(selector));
        if let (Some(selector), None) = (selector, element) {
            log::debug!("{kind} selector `{selector}` of line {} matches nothing", self.id);
        }
        self.assign(kind, element)
    }

    fn assign(&self, kind: ReferenceKind, element: Option<ElementId>) -> LeaderLineResult<()> {
        let current = self.reference(kind).get().map(|r| r.element);
        if element == current {
            return Ok(());
        }
        let opposite = self.reference(kind.opposite()).get().map(|r| r.element);
        if element.is_some() && element == opposite {
            return Err(LeaderLineError::SameReference { kind });
        }
        if let Some(element) = element {
            self.attach(element);
        }

        let event = ReferenceChangeEvent {
            line: self.id,
            kind,
            added: element,
            removed: current,
        };
        if !self.notify(|observer| observer.on_reference_change(&event)) {
            log::debug!("{kind} change of line {} vetoed", self.id);
            self.hide();
            return Ok(());
        }
        self.reference(kind).set(element.map(Reference::new));
        if element.is_none() {
            self.hide();
            return Ok(());
        }
        if self.source.get().is_some() && self.target.get().is_some() && self.is_valid() {
            self.request_position();
        }
        Ok(())
    }

    fn attach(&self, element: ElementId) {
        let mut attached = self.attached.borrow_mut();
        if !attached.contains(&element) {
            self.services.bounds.attach(element);
            attached.push(element);
        }
    }

    fn place(&self, source: ElementId, source_rect: Rect, target: ElementId, target_rect: Rect) {
        if source_rect.intersects_rect(&target_rect) {
            self.hide();
            return;
        }
        let sockets = resolve_sockets(&source_rect, &target_rect);
        self.cache_socket(ReferenceKind::Source, source, sockets.source);
        self.cache_socket(ReferenceKind::Target, target, sockets.target);

        let event = PositionEvent {
            line: self.id,
            source,
            source_geometry: source_rect,
            source_socket: sockets.source,
            target,
            target_geometry: target_rect,
            target_socket: sockets.target,
        };
        if !self.notify(|observer| observer.on_position(&event)) {
            log::debug!("positioning of line {} vetoed", self.id);
            return;
        }
        self.draw_line(
            sockets.source_point(&source_rect),
            sockets.target_point(&target_rect),
            sockets.source,
        );
    }

    fn cache_socket(&self, kind: ReferenceKind, element: ElementId, socket: Socket) {
        let cell = self.reference(kind);
        if let Some(reference) = cell.get().filter(|r| r.element == element) {
            cell.set(Some(Reference {
                socket: Some(socket),
                ..reference
            }));
        }
    }

    fn draw_line(&self, start: Point, end: Point, socket: Socket) {
        let style = self.style_config();
        let draw = build_draw(self.id, start, end, socket, &style, |event| {
            self.notify(|observer| observer.on_draw(event))
        });
        let Some(draw) = draw else {
            log::debug!("draw of line {} vetoed", self.id);
            return;
        };
        log::trace!("line {} drawn as `{}`", self.id, draw.path);
        let mut renderer = self.renderer.borrow_mut();
        renderer.draw(&draw.path, draw.viewport);
        renderer.set_visible(true);
    }

    fn notify(&self, notify: impl FnMut(&dyn LeaderLineObserver) -> bool) -> bool {
        let observers = self.observers.borrow().snapshot();
        dispatch(observers, notify)
    }
}

impl<S: ConnectorSurface + 'static> Drop for LeaderLine<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundsObserver;
    use crate::events::DrawEvent;
    use crate::geometry::rect_from_xywh;
    use crate::style::Toggle;
    use crate::surface::{MemorySurface, SvgNode};
    use futures::executor::LocalPool;
    use kurbo::Vec2;
    use std::collections::HashMap;
    use uuid::Uuid;

    #[derive(Default)]
    struct CountingObserver {
        observed: Cell<usize>,
    }

    impl BoundsObserver for CountingObserver {
        fn observe(&self, _element: ElementId) {
            self.observed.set(self.observed.get() + 1);
        }

        fn unobserve(&self, _element: ElementId) {}
    }

    #[derive(Default)]
    struct Selectors(HashMap<String, ElementId>);

    impl SelectorResolver for Selectors {
        fn query_selector(&self, selector: &str) -> Option<ElementId> {
            self.0.get(selector).copied()
        }
    }

    #[derive(Default)]
    struct Recorder {
        veto_reference: Cell<bool>,
        veto_validate: Cell<bool>,
        veto_position: Cell<bool>,
        shift_end: Cell<Option<Vec2>>,
        viewport: Cell<Option<Rect>>,
        reference_changes: RefCell<Vec<ReferenceChangeEvent>>,
        positions: Cell<usize>,
        draws: Cell<usize>,
    }

    impl LeaderLineObserver for Recorder {
        fn on_reference_change(&self, event: &ReferenceChangeEvent) -> bool {
            self.reference_changes.borrow_mut().push(event.clone());
            !self.veto_reference.get()
        }

        fn on_validate(&self, _event: &ValidateEvent) -> bool {
            !self.veto_validate.get()
        }

        fn on_position(&self, _event: &PositionEvent) -> bool {
            self.positions.set(self.positions.get() + 1);
            !self.veto_position.get()
        }

        fn on_draw(&self, event: &mut DrawEvent) -> bool {
            self.draws.set(self.draws.get() + 1);
            if let Some(shift) = self.shift_end.get() {
                event.end += shift;
            }
            if let Some(viewport) = self.viewport.get() {
                event.viewport = viewport;
            }
            true
        }
    }

    struct Harness {
        pool: LocalPool,
        services: Services,
        observer: Rc<CountingObserver>,
        recorder: Rc<Recorder>,
        line: Rc<LeaderLine<MemorySurface>>,
        a: ElementId,
        b: ElementId,
    }

    impl Harness {
        fn new() -> Self {
            let a = Uuid::new_v4();
            let b = Uuid::new_v4();
            let mut selectors = Selectors::default();
            selectors.0.insert("#a".into(), a);
            selectors.0.insert("#b".into(), b);

            let pool = LocalPool::new();
            let services = Services::new();
            let observer = Rc::new(CountingObserver::default());
            services.bounds.install_observer(observer.clone());
            let line = LeaderLine::new(
                Uuid::new_v4(),
                MemorySurface::new(),
                services.clone(),
                Rc::new(selectors),
                Rc::new(pool.spawner()),
            );
            let recorder = Rc::new(Recorder::default());
            line.add_observer(recorder.clone());
            Self {
                pool,
                services,
                observer,
                recorder,
                line,
                a,
                b,
            }
        }

        fn connect(&mut self) {
            self.line.set_source(Some(self.a)).unwrap();
            self.line.set_target(Some(self.b)).unwrap();
            self.pool.run_until_stalled();
        }

        fn deliver(&mut self, source: Rect, target: Rect) {
            self.services.bounds.deliver(self.a, source);
            self.services.bounds.deliver(self.b, target);
            self.pool.run_until_stalled();
        }

        fn path(&self) -> Option<String> {
            self.line
                .surface()
                .attribute(SvgNode::Path, "d")
                .map(str::to_string)
        }
    }

    #[test]
    fn test_separated_rects_draw_between_facing_sockets() {
        let mut h = Harness::new();
        h.connect();
        assert!(h.line.is_positioning());
        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
        );

        assert!(!h.line.is_hidden());
        assert!(!h.line.is_positioning());
        assert_eq!(h.line.source_socket(), Some(Socket::Right));
        assert_eq!(h.line.target_socket(), Some(Socket::Left));
        // Start (100, 50) moved inward by half the 2.5px line.
        assert_eq!(h.path().as_deref(), Some("M 98.75,50 L 300,50"));
        let surface = h.line.surface();
        assert_eq!(surface.style(SvgNode::Host, "display"), Some("contents"));
        assert_eq!(surface.attribute(SvgNode::Svg, "viewBox"), Some("92.5 42.5 215 15"));
    }

    #[test]
    fn test_overlapping_rects_hide_without_drawing() {
        let mut h = Harness::new();
        h.connect();
        let rect = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        h.deliver(rect, rect);

        assert!(h.line.is_hidden());
        assert_eq!(h.line.source_socket(), None);
        assert_eq!(h.recorder.positions.get(), 0);
        assert_eq!(h.path(), None);
    }

    #[test]
    fn test_second_position_while_in_flight_is_noop() {
        let mut h = Harness::new();
        h.connect();
        assert!(h.line.is_positioning());
        assert_eq!(h.line.position().now_or_never(), Some(()));
        h.line.request_position();
        h.pool.run_until_stalled();

        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(h.recorder.draws.get(), 1);
    }

    #[test]
    fn test_dropping_position_future_returns_to_idle() {
        let h = Harness::new();
        h.line.set_source(Some(h.a)).unwrap();
        h.line.set_target(Some(h.b)).unwrap();
        // The spawned pass was never polled; cancel it with the pool.
        drop(h.pool);
        assert!(!h.line.is_positioning());

        let pass = h.line.position();
        assert!(h.line.is_positioning());
        drop(pass);
        assert!(!h.line.is_positioning());
    }

    #[test]
    fn test_position_without_references_hides() {
        let h = Harness::new();
        h.line.show();
        assert_eq!(h.line.position().now_or_never(), Some(()));
        assert!(h.line.is_hidden());
        assert!(!h.line.is_positioning());
    }

    #[test]
    fn test_same_reference_fails_before_mutation() {
        let h = Harness::new();
        h.line.set_source(Some(h.a)).unwrap();
        let changes = h.recorder.reference_changes.borrow().len();

        assert_eq!(
            h.line.set_target(Some(h.a)),
            Err(LeaderLineError::SameReference {
                kind: ReferenceKind::Target
            })
        );
        assert_eq!(h.line.target(), None);
        assert_eq!(h.recorder.reference_changes.borrow().len(), changes);
    }

    #[test]
    fn test_unchanged_reference_is_noop() {
        let h = Harness::new();
        h.line.set_source(Some(h.a)).unwrap();
        h.line.set_source(Some(h.a)).unwrap();
        assert_eq!(h.recorder.reference_changes.borrow().len(), 1);
        // Clearing an end while the other is unset is fine too.
        h.line.set_source(None).unwrap();
        assert_eq!(h.line.source(), None);
    }

    #[test]
    fn test_reference_change_event_details() {
        let h = Harness::new();
        h.line.set_source(Some(h.a)).unwrap();
        h.line.set_source(Some(h.b)).unwrap();
        let changes = h.recorder.reference_changes.borrow();
        assert_eq!(changes[1].kind, ReferenceKind::Source);
        assert_eq!(changes[1].added, Some(h.b));
        assert_eq!(changes[1].removed, Some(h.a));
        assert_eq!(changes[1].line, h.line.id());
    }

    #[test]
    fn test_vetoed_reference_change_hides_and_keeps_old() {
        let mut h = Harness::new();
        h.connect();
        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
        );
        assert!(!h.line.is_hidden());

        h.recorder.veto_reference.set(true);
        let c = Uuid::new_v4();
        h.line.set_target(Some(c)).unwrap();
        assert!(h.line.is_hidden());
        assert_eq!(h.line.target(), Some(h.b));
    }

    #[test]
    fn test_unsetting_reference_hides() {
        let mut h = Harness::new();
        h.connect();
        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(0.0, 300.0, 100.0, 100.0),
        );
        assert!(!h.line.is_hidden());
        assert_eq!(h.line.source_socket(), Some(Socket::Bottom));
        assert_eq!(h.line.target_socket(), Some(Socket::Top));

        h.line.set_target(None).unwrap();
        assert!(h.line.is_hidden());
        assert_eq!(h.line.target(), None);
    }

    #[test]
    fn test_validate_veto_skips_positioning() {
        let mut h = Harness::new();
        h.recorder.veto_validate.set(true);
        h.connect();
        assert!(!h.line.is_positioning());
        assert_eq!(h.observer.observed.get(), 0);
        assert!(!h.line.is_valid());
        h.recorder.veto_validate.set(false);
        assert!(h.line.is_valid());
    }

    #[test]
    fn test_position_veto_preserves_visual_state() {
        let mut h = Harness::new();
        h.recorder.veto_position.set(true);
        h.connect();
        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(h.recorder.positions.get(), 1);
        assert_eq!(h.recorder.draws.get(), 0);
        assert!(h.line.is_hidden());
        assert_eq!(h.path(), None);
        // Sockets are still resolved before the notification.
        assert_eq!(h.line.source_socket(), Some(Socket::Right));
        assert!(!h.line.is_positioning());
    }

    #[test]
    fn test_draw_observer_can_move_endpoints() {
        let mut h = Harness::new();
        h.recorder.shift_end.set(Some(Vec2::new(10.0, 5.0)));
        h.connect();
        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(h.path().as_deref(), Some("M 98.75,50 L 310,55"));
    }

    #[test]
    fn test_draw_observer_viewport_reaches_surface() {
        let mut h = Harness::new();
        h.recorder
            .viewport
            .set(Some(rect_from_xywh(0.0, 0.0, 400.0, 100.0)));
        h.connect();
        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
        );
        let surface = h.line.surface();
        assert_eq!(surface.attribute(SvgNode::Svg, "viewBox"), Some("0 0 400 100"));
    }

    #[test]
    fn test_selectors_and_direct_assignment_last_wins() {
        let h = Harness::new();
        h.line.set_source_selector(Some("#a")).unwrap();
        assert_eq!(h.line.source(), Some(h.a));
        assert_eq!(h.line.source_selector().as_deref(), Some("#a"));

        h.line.set_source(Some(h.b)).unwrap();
        assert_eq!(h.line.source(), Some(h.b));

        h.line.set_source_selector(Some("#missing")).unwrap();
        assert_eq!(h.line.source(), None);
    }

    #[test]
    fn test_selector_same_reference_error_propagates() {
        let h = Harness::new();
        h.line.set_source_selector(Some("#a")).unwrap();
        assert!(h.line.set_target_selector(Some("#a")).is_err());
        assert_eq!(h.line.target(), None);
    }

    #[test]
    fn test_dashed_style_round_trip() {
        let h = Harness::new();
        h.line.set_style_config(&StyleUpdate {
            dashed: Some(Toggle::Enabled(true)),
            ..Default::default()
        });
        let dash = h.line.style_config().dashed.unwrap();
        assert_eq!(dash.dash_length, 10.0);
        assert_eq!(dash.start_offset, 0.0);
        assert_eq!(
            h.line.surface().attribute(SvgNode::Path, "stroke-dasharray"),
            Some("10")
        );

        h.line.set_style_config(&StyleUpdate {
            dashed: Some(Toggle::Enabled(false)),
            ..Default::default()
        });
        let surface = h.line.surface();
        assert_eq!(surface.attribute(SvgNode::Path, "stroke-dasharray"), None);
        assert_eq!(surface.attribute(SvgNode::Path, "stroke-dashoffset"), None);
        assert!(!surface.has_node(SvgNode::Animate));
    }

    #[test]
    fn test_default_style_applied_on_creation() {
        let h = Harness::new();
        assert_eq!(h.line.surface().attribute(SvgNode::Path, "stroke"), Some("coral"));
        assert!(h.line.is_hidden());
    }

    #[test]
    fn test_dispose_releases_sampling() {
        let h = Harness::new();
        let other = LeaderLine::new(
            Uuid::new_v4(),
            MemorySurface::new(),
            h.services.clone(),
            Rc::new(Selectors::default()),
            Rc::new(h.pool.spawner()),
        );
        h.line.set_source(Some(h.a)).unwrap();
        other.set_source(Some(h.a)).unwrap();
        h.line.set_target(Some(h.b)).unwrap();

        h.line.dispose();
        assert!(h.services.bounds.is_attached(h.a));
        assert!(!h.services.bounds.is_attached(h.b));
        drop(other);
        assert!(!h.services.bounds.is_attached(h.a));
    }

    #[test]
    fn test_position_after_dispose_released_on_drop() {
        let mut h = Harness::new();
        h.connect();
        h.deliver(
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
        );
        h.line.dispose();
        assert!(!h.services.bounds.is_attached(h.a));

        let pass = h.line.position();
        assert!(h.services.bounds.is_attached(h.a));
        assert!(h.services.bounds.is_attached(h.b));
        drop(pass);

        let Harness { services, line, a, b, .. } = h;
        drop(line);
        assert!(!services.bounds.is_attached(a));
        assert!(!services.bounds.is_attached(b));
    }
}
