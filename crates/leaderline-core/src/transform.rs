//! Frame-synchronised 2D transform feature.
//!
//! Mutations only touch the in-memory matrix; the element's `transform`
//! style is written on the next frame. Any number of mutations between two
//! frames result in a single style write of the latest matrix.

use crate::callbacks::{CallbackId, CallbackStore};
use crate::element::{ElementId, ElementStyle};
use crate::frame::{FrameScheduler, FrameTask};
use kurbo::{Affine, Vec2};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Transform feature attached to one element.
pub struct Transform {
    element: ElementId,
    matrix: Cell<Affine>,
    syncing: Cell<bool>,
    frames: Rc<FrameScheduler>,
    writer: Rc<dyn ElementStyle>,
    listeners: RefCell<CallbackStore<Affine>>,
    sync_task: FrameTask,
}

impl Transform {
    /// Create the feature for `element`, writing through `writer`.
    pub fn new(
        element: ElementId,
        frames: Rc<FrameScheduler>,
        writer: Rc<dyn ElementStyle>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let this = this.clone();
            let sync_task: FrameTask = Rc::new(move |_| {
                if let Some(transform) = this.upgrade() {
                    transform.write_transform();
                }
            });
            Self {
                element,
                matrix: Cell::new(Affine::IDENTITY),
                syncing: Cell::new(false),
                frames,
                writer,
                listeners: RefCell::new(CallbackStore::new()),
                sync_task,
            }
        })
    }

    /// Element whose style receives the writes.
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Current matrix (possibly not yet written).
    pub fn matrix(&self) -> Affine {
        self.matrix.get()
    }

    pub fn tx(&self) -> f64 {
        self.coeffs()[4]
    }

    pub fn ty(&self) -> f64 {
        self.coeffs()[5]
    }

    pub fn sx(&self) -> f64 {
        self.coeffs()[0]
    }

    pub fn sy(&self) -> f64 {
        self.coeffs()[3]
    }

    pub fn set_translate(&self, x: f64, y: f64) {
        self.update(|m| {
            m[4] = x;
            m[5] = y;
        });
    }

    pub fn translate_by(&self, x: f64, y: f64) {
        self.update(|m| {
            m[4] += x;
            m[5] += y;
        });
    }

    pub fn set_scale(&self, x: f64, y: f64) {
        self.update(|m| {
            m[0] = x;
            m[3] = y;
        });
    }

    /// Add `x` and `y` to the current scale.
    pub fn scale_by(&self, x: f64, y: f64) {
        self.update(|m| {
            m[0] += x;
            m[3] += y;
        });
    }

    /// Add `x` and `y` to the current scale, keeping `(cx, cy)` (in the
    /// element's local space) fixed.
    pub fn scale_by_about_point(&self, x: f64, y: f64, cx: f64, cy: f64) {
        let m = self.coeffs();
        let (sx, sy) = (m[0], m[3]);
        // A zero scale has no point to keep fixed; set the scale directly.
        if sx == 0.0 || sy == 0.0 {
            self.set_scale(sx + x, sy + y);
            return;
        }
        let factor = Affine::translate(Vec2::new(cx, cy))
            * Affine::scale_non_uniform((sx + x) / sx, (sy + y) / sy)
            * Affine::translate(Vec2::new(-cx, -cy));
        self.matrix.set(self.matrix.get() * factor);
        self.sync_transform(false);
    }

    /// Schedule a write of the current matrix on the next frame.
    ///
    /// Without `force`, nothing is queued while a write is already pending.
    pub fn sync_transform(&self, force: bool) {
        if !force && self.syncing.get() {
            return;
        }
        self.syncing.set(true);
        self.frames.push_task(&self.sync_task, false);
    }

    /// Whether a write is waiting for the next frame.
    pub fn is_syncing(&self) -> bool {
        self.syncing.get()
    }

    /// CSS value for the element's `transform` property.
    pub fn transform_string(&self) -> String {
        let [a, b, c, d, e, f] = self.coeffs();
        format!("matrix({a}, {b}, {c}, {d}, {e}, {f})")
    }

    /// Register a listener called with the matrix after every write.
    pub fn add_listener(&self, listener: impl Fn(&Affine) + 'static) -> CallbackId {
        self.listeners.borrow_mut().add(listener)
    }

    pub fn remove_listener(&self, id: CallbackId) -> bool {
        self.listeners.borrow_mut().remove(id)
    }

    /// Cancel any pending write and drop all listeners.
    pub fn dispose(&self) {
        self.frames.remove_task(&self.sync_task, true);
        self.syncing.set(false);
        self.listeners.borrow_mut().clear();
    }

    fn coeffs(&self) -> [f64; 6] {
        self.matrix.get().as_coeffs()
    }

    fn update(&self, edit: impl FnOnce(&mut [f64; 6])) {
        let mut coeffs = self.coeffs();
        edit(&mut coeffs);
        self.matrix.set(Affine::new(coeffs));
        self.sync_transform(false);
    }

    fn write_transform(&self) {
        self.syncing.set(false);
        self.writer
            .set_style_property(self.element, "transform", &self.transform_string());
        let matrix = self.matrix.get();
        let listeners = self.listeners.borrow().snapshot();
        for listener in listeners {
            listener(&matrix);
        }
    }
}
