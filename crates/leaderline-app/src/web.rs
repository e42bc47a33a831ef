//! WebAssembly entry point and the `<leader-line>` element bindings.

use crate::detail::{self, Detail, DetailValue};
use crate::handles::{ID_ATTRIBUTE, Observed, id_selector, parse_id};
use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};
use kurbo::{Point, Rect};
use leaderline_core::{
    BoundsObserver, BoundsSampler, ChildLookup, ChildRef, ConnectorSurface, DrawEvent, ElementId,
    ElementStyle, FrameDriver, FrameScheduler, LeaderLine, LeaderLineObserver, OwnerRegistry,
    PositionEvent, ReferenceChangeEvent, SOURCE_SELECTOR_ATTRIBUTE, SelectorResolver, Services,
    SvgNode, TARGET_SELECTOR_ATTRIBUTE, ValidateEvent, rect_from_xywh,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use uuid::Uuid;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CssStyleDeclaration, CustomEvent, CustomEventInit, Document, Element, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry, MutationObserver, MutationObserverInit,
    MutationRecord, ShadowRoot, ShadowRootInit, ShadowRootMode, SvgElement,
};

const TAG_NAME: &str = "leader-line";
const SVG_NS: &str = "http://www.w3.org/2000/svg";

const STYLE: &str = r#"
    :host {
        display: none;
        z-index: -1;
    }
    :host, svg {
        position: absolute;
        pointer-events: none;
    }
    #path {
        marker-end: url(#marker);
        pointer-events: auto;
    }
    :host([disable-pointer]) #path {
        pointer-events: none;
    }
    svg textPath {
        text-anchor: middle;
        dominant-baseline: text-after-edge;
    }
"#;

const TEMPLATE: &str = r#"
    <svg id="svg">
        <path id="path"></path>
        <marker id="marker" viewBox="0 0 10 10" refX="5" refY="5"
            markerWidth="5" markerHeight="5" orient="auto-start-reverse">
            <path d="M 0 0 L 10 5 L 0 10 z" stroke="context-stroke" fill="context-fill" id="marker_path"/>
        </marker>
    </svg>
"#;

/// Maps DOM elements to engine ids through a data attribute. Holds no
/// element references; lookups go back to the document.
struct DomRegistry {
    document: Document,
}

impl DomRegistry {
    fn id_of(&self, element: &Element) -> ElementId {
        if let Some(id) = element.get_attribute(ID_ATTRIBUTE).as_deref().and_then(parse_id) {
            return id;
        }
        let id = Uuid::new_v4();
        if let Err(err) = element.set_attribute(ID_ATTRIBUTE, &id.to_string()) {
            log::warn!("failed to tag element with {id}: {err:?}");
        }
        id
    }

    /// The connected element tagged with `id`.
    fn get(&self, id: ElementId) -> Option<Element> {
        self.document.query_selector(&id_selector(id)).ok().flatten()
    }

    fn to_js(&self, id: Option<ElementId>) -> JsValue {
        id.and_then(|id| self.get(id)).map_or(JsValue::NULL, JsValue::from)
    }
}

/// `document.querySelector`.
struct DocumentSelectors {
    document: Document,
    registry: Rc<DomRegistry>,
}

impl SelectorResolver for DocumentSelectors {
    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        match self.document.query_selector(selector) {
            Ok(element) => element.map(|element| self.registry.id_of(&element)),
            Err(err) => {
                log::warn!("invalid selector `{selector}`: {err:?}");
                None
            }
        }
    }
}

/// Bounds without layout: an `IntersectionObserver` reports the cached
/// bounding rect of each observed element on its next callback.
struct IntersectionBounds {
    registry: Rc<DomRegistry>,
    observed: RefCell<Observed<Element>>,
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

impl IntersectionBounds {
    fn new(registry: Rc<DomRegistry>, sampler: Weak<BoundsSampler>) -> Result<Self, JsValue> {
        let lookup = registry.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            let Some(sampler) = sampler.upgrade() else {
                return;
            };
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                let target = entry.target();
                let r = entry.bounding_client_rect();
                sampler.deliver(lookup.id_of(&target), rect_from_xywh(r.x(), r.y(), r.width(), r.height()));
            }
        });
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
        Ok(Self {
            registry,
            observed: RefCell::new(Observed::default()),
            observer,
            _callback: callback,
        })
    }
}

impl BoundsObserver for IntersectionBounds {
    fn observe(&self, element: ElementId) {
        let Some(handle) = self.registry.get(element) else {
            log::warn!("no DOM element for {element}");
            return;
        };
        self.observer.observe(&handle);
        self.observed.borrow_mut().observe(element, handle);
    }

    fn unobserve(&self, element: ElementId) {
        let handle = self.observed.borrow_mut().unobserve(element);
        if let Some(handle) = handle {
            self.observer.unobserve(&handle);
        }
    }
}

/// Drives the frame queue from `requestAnimationFrame`.
struct AnimationFrames {
    callback: Closure<dyn FnMut(f64)>,
}

impl AnimationFrames {
    fn new(frames: Weak<FrameScheduler>) -> Self {
        let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            if let Some(frames) = frames.upgrade() {
                frames.run_frame(timestamp);
            }
        });
        Self { callback }
    }
}

impl FrameDriver for AnimationFrames {
    fn request_frame(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(err) = window.request_animation_frame(self.callback.as_ref().unchecked_ref()) {
            log::error!("requestAnimationFrame failed: {err:?}");
        }
    }
}

fn style_of(element: &Element) -> Option<CssStyleDeclaration> {
    element
        .dyn_ref::<HtmlElement>()
        .map(HtmlElement::style)
        .or_else(|| element.dyn_ref::<SvgElement>().map(SvgElement::style))
}

/// Inline style writes for transform features.
struct DomStyle {
    registry: Rc<DomRegistry>,
}

impl ElementStyle for DomStyle {
    fn set_style_property(&self, element: ElementId, property: &str, value: &str) {
        let Some(style) = self.registry.get(element).as_ref().and_then(style_of) else {
            return;
        };
        if let Err(err) = style.set_property(property, value) {
            log::warn!("failed to set {property} on {element}: {err:?}");
        }
    }
}

/// Shadow root of a mounted line; owner of its template nodes.
struct ShadowOwner {
    root: ShadowRoot,
}

impl ChildLookup for ShadowOwner {
    type Node = Element;

    fn query_child(&self, selector: &str) -> Option<Element> {
        self.root.query_selector(selector).ok().flatten()
    }
}

/// Line template inside a shadow root.
struct ShadowSurface {
    document: Document,
    host: Element,
    owners: Rc<OwnerRegistry<ShadowOwner>>,
    svg: ChildRef<Element>,
    path: ChildRef<Element>,
    marker: ChildRef<Element>,
    marker_path: ChildRef<Element>,
    animate: Option<Element>,
    text: Option<Element>,
    text_path: Option<Element>,
}

impl ShadowSurface {
    fn new(document: Document, host: Element, id: ElementId, owners: Rc<OwnerRegistry<ShadowOwner>>) -> Self {
        Self {
            document,
            host,
            owners,
            svg: ChildRef::new("#svg", id),
            path: ChildRef::new("#path", id),
            marker: ChildRef::new("#marker", id),
            marker_path: ChildRef::new("#marker_path", id),
            animate: None,
            text: None,
            text_path: None,
        }
    }

    fn node(&mut self, node: SvgNode) -> Option<Element> {
        let child = match node {
            SvgNode::Host => return Some(self.host.clone()),
            SvgNode::Animate => return self.animate.clone(),
            SvgNode::Text => return self.text.clone(),
            SvgNode::TextPath => return self.text_path.clone(),
            SvgNode::Svg => &mut self.svg,
            SvgNode::Path => &mut self.path,
            SvgNode::Marker => &mut self.marker,
            SvgNode::MarkerPath => &mut self.marker_path,
        };
        match child.get(&*self.owners) {
            Ok(element) => element,
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    fn slot(&mut self, node: SvgNode) -> Option<&mut Option<Element>> {
        match node {
            SvgNode::Animate => Some(&mut self.animate),
            SvgNode::Text => Some(&mut self.text),
            SvgNode::TextPath => Some(&mut self.text_path),
            _ => None,
        }
    }
}

impl ConnectorSurface for ShadowSurface {
    fn set_attribute(&mut self, node: SvgNode, name: &str, value: &str) {
        if let Some(element) = self.node(node) {
            let _ = element.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, node: SvgNode, name: &str) {
        if let Some(element) = self.node(node) {
            let _ = element.remove_attribute(name);
        }
    }

    fn set_style(&mut self, node: SvgNode, property: &str, value: &str) {
        if let Some(style) = self.node(node).as_ref().and_then(style_of) {
            let _ = style.set_property(property, value);
        }
    }

    fn set_text_content(&mut self, node: SvgNode, text: &str) {
        if let Some(element) = self.node(node) {
            element.set_text_content(Some(text));
        }
    }

    fn create_node(&mut self, node: SvgNode) {
        let parent = match node {
            SvgNode::Animate => SvgNode::Path,
            SvgNode::Text => SvgNode::Svg,
            SvgNode::TextPath => SvgNode::Text,
            _ => return,
        };
        if self.node(node).is_some() {
            return;
        }
        let Some(parent) = self.node(parent) else {
            return;
        };
        let created = match self.document.create_element_ns(Some(SVG_NS), node.tag()) {
            Ok(created) => created,
            Err(err) => {
                log::error!("failed to create <{}>: {err:?}", node.tag());
                return;
            }
        };
        if let Err(err) = parent.append_child(&created) {
            log::error!("failed to attach <{}>: {err:?}", node.tag());
            return;
        }
        if let Some(slot) = self.slot(node) {
            *slot = Some(created);
        }
    }

    fn remove_node(&mut self, node: SvgNode) {
        if let Some(element) = self.slot(node).and_then(Option::take) {
            element.remove();
        }
        if node == SvgNode::Text {
            self.text_path = None;
        }
    }
}

/// Re-dispatches line notifications as DOM events on the host element.
struct EventBridge {
    host: Element,
    registry: Rc<DomRegistry>,
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(target, &JsValue::from_str(key), value);
}

fn get_f64(target: &JsValue, key: &str) -> Option<f64> {
    js_sys::Reflect::get(target, &JsValue::from_str(key)).ok()?.as_f64()
}

fn point_to_js(point: Point) -> js_sys::Object {
    let object = js_sys::Object::new();
    set(&object, "x", &point.x.into());
    set(&object, "y", &point.y.into());
    object
}

fn point_from_js(object: &js_sys::Object, key: &str) -> Option<Point> {
    let value = js_sys::Reflect::get(object, &JsValue::from_str(key)).ok()?;
    Some(Point::new(get_f64(&value, "x")?, get_f64(&value, "y")?))
}

fn rect_to_js(rect: Rect) -> js_sys::Object {
    let object = js_sys::Object::new();
    set(&object, "x", &rect.x0.into());
    set(&object, "y", &rect.y0.into());
    set(&object, "width", &rect.width().into());
    set(&object, "height", &rect.height().into());
    object
}

fn rect_from_js(object: &js_sys::Object, key: &str) -> Option<Rect> {
    let value = js_sys::Reflect::get(object, &JsValue::from_str(key)).ok()?;
    Some(rect_from_xywh(
        get_f64(&value, "x")?,
        get_f64(&value, "y")?,
        get_f64(&value, "width")?,
        get_f64(&value, "height")?,
    ))
}

impl EventBridge {
    fn to_js(&self, detail: &Detail) -> js_sys::Object {
        let object = js_sys::Object::new();
        for (key, value) in detail {
            let value = match value {
                DetailValue::Element(id) => self.registry.to_js(*id),
                DetailValue::Text(text) => JsValue::from_str(text),
                DetailValue::Point(point) => point_to_js(*point).into(),
                DetailValue::Rect(rect) => rect_to_js(*rect).into(),
            };
            set(&object, key, &value);
        }
        object
    }

    /// Dispatch a bubbling, cancelable, composed event. False if a listener
    /// called `preventDefault`.
    fn dispatch(&self, name: &str, detail: &js_sys::Object) -> bool {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        init.set_composed(true);
        init.set_detail(detail);
        match CustomEvent::new_with_event_init_dict(name, &init) {
            Ok(event) => self.host.dispatch_event(&event).unwrap_or(true),
            Err(err) => {
                log::error!("failed to create {name}: {err:?}");
                true
            }
        }
    }
}

impl LeaderLineObserver for EventBridge {
    fn on_reference_change(&self, event: &ReferenceChangeEvent) -> bool {
        let detail = self.to_js(&detail::reference_change(event));
        self.dispatch(ReferenceChangeEvent::NAME, &detail)
    }

    fn on_validate(&self, event: &ValidateEvent) -> bool {
        let detail = self.to_js(&detail::validate(event));
        self.dispatch(ValidateEvent::NAME, &detail)
    }

    fn on_position(&self, event: &PositionEvent) -> bool {
        let detail = self.to_js(&detail::position(event));
        self.dispatch(PositionEvent::NAME, &detail)
    }

    fn on_draw(&self, event: &mut DrawEvent) -> bool {
        let detail = self.to_js(&detail::draw(event));
        let proceed = self.dispatch(DrawEvent::NAME, &detail);
        // Listeners may move the endpoints before the path is built.
        if let Some(start) = point_from_js(&detail, detail::START) {
            event.start = start;
        }
        if let Some(end) = point_from_js(&detail, detail::END) {
            event.end = end;
        }
        if let Some(rect) = rect_from_js(&detail, detail::RECT) {
            event.viewport = rect;
        }
        proceed
    }
}

/// Runs spawned repositions on the browser's microtask queue.
struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

/// A mounted `<leader-line>` and the observer feeding its attributes.
struct Mounted {
    line: Rc<LeaderLine<ShadowSurface>>,
    _mutations: MutationObserver,
    _on_mutation: Closure<dyn FnMut(js_sys::Array)>,
}

struct Page {
    document: Document,
    registry: Rc<DomRegistry>,
    owners: Rc<OwnerRegistry<ShadowOwner>>,
    selectors: Rc<DocumentSelectors>,
    spawner: Rc<WasmSpawner>,
}

thread_local! {
    static PAGE: RefCell<Option<Rc<Page>>> = const { RefCell::new(None) };
    static MOUNTED: RefCell<Vec<Mounted>> = const { RefCell::new(Vec::new()) };
}

fn mounted_lines() -> Vec<Rc<LeaderLine<ShadowSurface>>> {
    MOUNTED.with(|mounted| mounted.borrow().iter().map(|m| m.line.clone()).collect())
}

fn install_services(registry: &Rc<DomRegistry>) -> Result<(), JsValue> {
    let services = Services::shared();
    let bounds = IntersectionBounds::new(registry.clone(), Rc::downgrade(&services.bounds))?;
    services.bounds.install_observer(Rc::new(bounds));
    services
        .frames
        .install_driver(Rc::new(AnimationFrames::new(Rc::downgrade(&services.frames))));
    Ok(())
}

fn mount(page: &Page, host: Element) -> Result<Mounted, JsValue> {
    let root = host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))?;
    root.set_inner_html(&format!("<style>{STYLE}</style>{TEMPLATE}"));

    let id = page.registry.id_of(&host);
    page.owners.register(id, Rc::new(ShadowOwner { root }));
    let surface = ShadowSurface::new(page.document.clone(), host.clone(), id, page.owners.clone());
    let line = LeaderLine::new(
        id,
        surface,
        Services::shared(),
        page.selectors.clone(),
        page.spawner.clone(),
    );
    line.add_observer(Rc::new(EventBridge {
        host: host.clone(),
        registry: page.registry.clone(),
    }));

    for attribute in [SOURCE_SELECTOR_ATTRIBUTE, TARGET_SELECTOR_ATTRIBUTE] {
        if let Some(value) = host.get_attribute(attribute) {
            if let Err(err) = line.attribute_changed(attribute, Some(&value)) {
                log::warn!("{attribute} of line {id}: {err}");
            }
        }
    }

    let weak = Rc::downgrade(&line);
    let observed = host.clone();
    let on_mutation = Closure::<dyn FnMut(js_sys::Array)>::new(move |records: js_sys::Array| {
        let Some(line) = weak.upgrade() else {
            return;
        };
        for record in records.iter() {
            let Some(name) = record
                .dyn_into::<MutationRecord>()
                .ok()
                .and_then(|record| record.attribute_name())
            else {
                continue;
            };
            let value = observed.get_attribute(&name);
            if let Err(err) = line.attribute_changed(&name, value.as_deref()) {
                log::warn!("{name} of line {}: {err}", line.id());
            }
        }
    });
    let mutations = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_attributes(true);
    let filter = js_sys::Array::of2(
        &JsValue::from_str(SOURCE_SELECTOR_ATTRIBUTE),
        &JsValue::from_str(TARGET_SELECTOR_ATTRIBUTE),
    );
    init.set_attribute_filter(&filter);
    mutations.observe_with_options(&host, &init)?;

    line.request_position();
    Ok(Mounted {
        line,
        _mutations: mutations,
        _on_mutation: on_mutation,
    })
}

fn mount_all() -> Result<usize, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let registry = Rc::new(DomRegistry {
        document: document.clone(),
    });
    install_services(&registry)?;

    let page = Rc::new(Page {
        selectors: Rc::new(DocumentSelectors {
            document: document.clone(),
            registry: registry.clone(),
        }),
        document: document.clone(),
        registry,
        owners: Rc::new(OwnerRegistry::new()),
        spawner: Rc::new(WasmSpawner),
    });
    PAGE.with(|current| *current.borrow_mut() = Some(page.clone()));

    let hosts = document.query_selector_all(TAG_NAME)?;
    let mut mounted = Vec::with_capacity(hosts.length() as usize);
    for index in 0..hosts.length() {
        let Some(host) = hosts.item(index).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        mounted.push(mount(&page, host)?);
    }
    let count = mounted.len();
    MOUNTED.with(|lines| lines.borrow_mut().extend(mounted));

    let on_resize = Closure::<dyn FnMut()>::new(|| {
        for line in mounted_lines() {
            line.request_position();
        }
    });
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();
    Ok(count)
}

/// Move an element through its transform feature. Lines attached to it
/// reposition once the transform is written.
#[wasm_bindgen(js_name = translateElement)]
pub fn translate_element(selector: &str, dx: f64, dy: f64) -> Result<(), JsValue> {
    let page = PAGE
        .with(|page| page.borrow().clone())
        .ok_or_else(|| JsValue::from_str("leader lines are not mounted"))?;
    let id = page
        .selectors
        .query_selector(selector)
        .ok_or_else(|| JsValue::from_str(&format!("no element matches `{selector}`")))?;
    let services = Services::shared();
    let transform = match services.features.transform(id) {
        Some(transform) => transform,
        None => {
            let writer: Rc<dyn ElementStyle> = Rc::new(DomStyle {
                registry: page.registry.clone(),
            });
            let transform = services.features.make_transformable(id, &services.frames, &writer);
            transform.add_listener(move |_| {
                for line in mounted_lines() {
                    if line.source() == Some(id) || line.target() == Some(id) {
                        line.request_position();
                    }
                }
            });
            transform
        }
    };
    transform.translate_by(dx, dy);
    Ok(())
}

#[wasm_bindgen(start)]
pub async fn run_wasm() {
    console_error_panic_hook::set_once();

    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
    }

    log::info!("Starting LeaderLine (WASM)");

    match mount_all() {
        Ok(count) => log::info!("Mounted {count} line(s)"),
        Err(err) => log::error!("Mounting failed: {err:?}"),
    }
}
