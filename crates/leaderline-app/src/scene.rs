//! Native scene host.
//!
//! Stands in for the browser: a scene file lists elements with fixed
//! rectangles and the lines between them. Bounds are "observed" by reading
//! the scene geometry (plus any transform), frames are driven manually and
//! spawned repositions run on a local executor. The result is written out
//! as one SVG document.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use futures::executor::LocalPool;
use futures::future::{FutureExt, join_all};
use futures::task::LocalSpawn;
use kurbo::Rect;
use leaderline_core::surface::{escaped_attr, escaped_text};
use leaderline_core::{
    BoundsObserver, BoundsSampler, ElementId, ElementStyle, FrameDriver, Features, LeaderLine,
    MemorySurface, SelectorResolver, Services, StyleUpdate, rect_from_xywh,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use uuid::Uuid;

/// An element of the scene, addressed by `#id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneElement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub label: Option<String>,
}

/// A line between two elements, given as selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLine {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub style: StyleUpdate,
}

/// Contents of a scene file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Page width; the configured width when absent.
    #[serde(default)]
    pub width: Option<f64>,
    /// Page height; the configured height when absent.
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub elements: Vec<SceneElement>,
    #[serde(default)]
    pub lines: Vec<SceneLine>,
}

impl Scene {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A translation applied to an element before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSpec {
    pub selector: String,
    pub dx: f64,
    pub dy: f64,
}

impl FromStr for DragSpec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidDrag(s.to_string());
        let (selector, delta) = s.rsplit_once(':').ok_or_else(invalid)?;
        let (dx, dy) = delta.split_once(',').ok_or_else(invalid)?;
        if selector.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            selector: selector.to_string(),
            dx: dx.trim().parse().map_err(|_| invalid())?,
            dy: dy.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Scene elements by id, in document order.
#[derive(Default)]
struct Document {
    elements: Vec<(ElementId, SceneElement)>,
    by_id: HashMap<String, ElementId>,
}

impl Document {
    fn from_elements(elements: Vec<SceneElement>) -> AppResult<Self> {
        let mut document = Self::default();
        for element in elements {
            if document.by_id.contains_key(&element.id) {
                return Err(AppError::DuplicateElement(element.id));
            }
            let id = Uuid::new_v4();
            document.by_id.insert(element.id.clone(), id);
            document.elements.push((id, element));
        }
        Ok(document)
    }

    fn rect(&self, id: ElementId) -> Option<Rect> {
        self.elements
            .iter()
            .find(|(element_id, _)| *element_id == id)
            .map(|(_, e)| rect_from_xywh(e.x, e.y, e.width, e.height))
    }
}

impl SelectorResolver for Document {
    /// Only id selectors (`#name`) are supported.
    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        self.by_id.get(selector.strip_prefix('#')?).copied()
    }
}

/// Reports bounds synchronously from the scene geometry.
struct SceneBounds {
    document: Rc<Document>,
    features: Rc<Features>,
    sampler: Weak<BoundsSampler>,
}

impl BoundsObserver for SceneBounds {
    fn observe(&self, element: ElementId) {
        let Some(sampler) = self.sampler.upgrade() else {
            return;
        };
        let Some(rect) = self.document.rect(element) else {
            log::warn!("observed element {element} is not part of the scene");
            return;
        };
        let rect = match self.features.transform(element) {
            Some(transform) => transform.matrix().transform_rect_bbox(rect),
            None => rect,
        };
        sampler.deliver(element, rect);
    }

    fn unobserve(&self, _element: ElementId) {}
}

/// Inline styles written to scene elements.
#[derive(Default)]
struct SceneStyle {
    properties: RefCell<HashMap<ElementId, BTreeMap<String, String>>>,
}

impl SceneStyle {
    fn property(&self, element: ElementId, property: &str) -> Option<String> {
        self.properties.borrow().get(&element)?.get(property).cloned()
    }
}

impl ElementStyle for SceneStyle {
    fn set_style_property(&self, element: ElementId, property: &str, value: &str) {
        log::debug!("{element}: {property} = {value}");
        self.properties
            .borrow_mut()
            .entry(element)
            .or_default()
            .insert(property.to_string(), value.to_string());
    }
}

/// Frame clock advanced by [`SceneRenderer`].
#[derive(Default)]
struct ManualFrames {
    requested: Cell<bool>,
}

impl FrameDriver for ManualFrames {
    fn request_frame(&self) {
        self.requested.set(true);
    }
}

/// Builds the lines of a scene and renders them.
pub struct SceneRenderer {
    config: AppConfig,
    width: f64,
    height: f64,
    document: Rc<Document>,
    services: Services,
    frames: Rc<ManualFrames>,
    style: Rc<SceneStyle>,
    pool: LocalPool,
    lines: Vec<Rc<LeaderLine<MemorySurface>>>,
}

impl SceneRenderer {
    /// Mount every line of `scene` and position it.
    pub fn new(scene: Scene, config: AppConfig) -> AppResult<Self> {
        let document = Rc::new(Document::from_elements(scene.elements)?);
        let services = Services::new();
        let frames = Rc::new(ManualFrames::default());
        services.frames.install_driver(frames.clone());
        services.bounds.install_observer(Rc::new(SceneBounds {
            document: document.clone(),
            features: services.features.clone(),
            sampler: Rc::downgrade(&services.bounds),
        }));

        let pool = LocalPool::new();
        let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());
        let mut lines = Vec::with_capacity(scene.lines.len());
        for line in &scene.lines {
            for selector in [&line.source, &line.target] {
                if document.query_selector(selector).is_none() {
                    return Err(AppError::UnknownSelector(selector.clone()));
                }
            }
            let leader = LeaderLine::new(
                Uuid::new_v4(),
                MemorySurface::new(),
                services.clone(),
                document.clone(),
                spawner.clone(),
            );
            leader.set_style_config(&line.style);
            leader.set_source_selector(Some(&line.source))?;
            leader.set_target_selector(Some(&line.target))?;
            lines.push(leader);
        }
        log::info!(
            "mounted {} element(s) and {} line(s)",
            document.elements.len(),
            lines.len()
        );

        let mut renderer = Self {
            width: scene.width.unwrap_or(config.width),
            height: scene.height.unwrap_or(config.height),
            config,
            document,
            services,
            frames,
            style: Rc::new(SceneStyle::default()),
            pool,
            lines,
        };
        renderer.settle();
        Ok(renderer)
    }

    pub fn lines(&self) -> &[Rc<LeaderLine<MemorySurface>>] {
        &self.lines
    }

    /// Translate elements through their transform feature, then let the
    /// affected lines reposition.
    pub fn apply_drags(&mut self, drags: &[DragSpec]) -> AppResult<()> {
        for drag in drags {
            let id = self
                .document
                .query_selector(&drag.selector)
                .ok_or_else(|| AppError::UnknownSelector(drag.selector.clone()))?;
            let transform = match self.services.features.transform(id) {
                Some(transform) => transform,
                None => {
                    let writer: Rc<dyn ElementStyle> = self.style.clone();
                    let transform =
                        self.services
                            .features
                            .make_transformable(id, &self.services.frames, &writer);
                    let affected: Vec<Weak<LeaderLine<MemorySurface>>> = self
                        .lines
                        .iter()
                        .filter(|line| line.source() == Some(id) || line.target() == Some(id))
                        .map(Rc::downgrade)
                        .collect();
                    transform.add_listener(move |_| {
                        for line in affected.iter().filter_map(Weak::upgrade) {
                            line.request_position();
                        }
                    });
                    transform
                }
            };
            log::debug!("dragging {} by ({}, {})", drag.selector, drag.dx, drag.dy);
            transform.translate_by(drag.dx, drag.dy);
        }
        self.settle();
        Ok(())
    }

    /// Reposition every line, resolving once all passes are done.
    pub fn reposition_all(&self) -> impl Future<Output = ()> + 'static {
        join_all(self.lines.iter().map(|line| line.position())).map(|_| ())
    }

    /// The page with its elements and every visible line.
    pub fn to_svg(&self) -> String {
        let (w, h) = (self.width, self.height);
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        ));
        svg.push_str(&format!(
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            escaped_attr(&self.config.background)
        ));
        for (id, element) in &self.document.elements {
            svg.push_str("<g");
            if let Some(transform) = self.style.property(*id, "transform") {
                svg.push_str(&format!(r#" transform="{}""#, escaped_attr(&transform)));
            }
            svg.push('>');
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}"/>"#,
                element.x,
                element.y,
                element.width,
                element.height,
                escaped_attr(&self.config.element_fill),
                escaped_attr(&self.config.element_stroke),
            ));
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
                element.x + element.width / 2.0,
                element.y + element.height / 2.0,
                escaped_text(element.label.as_deref().unwrap_or(&element.id)),
            ));
            svg.push_str("</g>");
        }
        for (i, line) in self.lines.iter().enumerate() {
            let surface = line.surface();
            if surface.is_displayed() {
                svg.push_str(&surface.to_svg_markup(&format!("line{i}-")));
            }
        }
        svg.push_str("</svg>");
        svg
    }

    /// Run frames until none is requested, then every spawned task.
    fn settle(&mut self) {
        let mut timestamp = 0.0;
        while self.frames.requested.replace(false) {
            self.services.frames.run_frame(timestamp);
            timestamp += self.config.frame_interval_ms;
        }
        self.pool.run_until_stalled();
    }
}
