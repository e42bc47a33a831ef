//! Per-animation-frame task queue.
//!
//! Visual writes are funnelled through one shared queue that is drained once
//! per frame. The queue is processed as a stack: the most recently scheduled
//! task runs first. Tasks scheduled while a frame is being drained run in
//! that same frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A task run on the next frame with the frame timestamp (milliseconds).
pub type FrameTask = Rc<dyn Fn(f64)>;

/// The platform's frame clock (`requestAnimationFrame` in the browser).
///
/// After [`FrameDriver::request_frame`] the platform must call
/// [`FrameScheduler::run_frame`] once.
pub trait FrameDriver {
    fn request_frame(&self);
}

/// Shared frame-synchronised task queue.
#[derive(Default)]
pub struct FrameScheduler {
    queue: RefCell<Vec<FrameTask>>,
    frame_requested: Cell<bool>,
    driver: RefCell<Option<Rc<dyn FrameDriver>>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_driver(driver: Rc<dyn FrameDriver>) -> Self {
        let scheduler = Self::new();
        scheduler.install_driver(driver);
        scheduler
    }

    /// Install (or replace) the frame clock. Requests a frame if tasks are
    /// already waiting.
    pub fn install_driver(&self, driver: Rc<dyn FrameDriver>) {
        *self.driver.borrow_mut() = Some(driver);
        if !self.queue.borrow().is_empty() {
            self.request_frame();
        }
    }

    /// Queue `task` for the next frame.
    ///
    /// With `ensure_unique`, nothing happens if the same task (by pointer
    /// identity) is already queued.
    pub fn push_task(&self, task: &FrameTask, ensure_unique: bool) {
        {
            let mut queue = self.queue.borrow_mut();
            if ensure_unique && queue.iter().any(|queued| Rc::ptr_eq(queued, task)) {
                return;
            }
            queue.push(task.clone());
        }
        if !self.frame_requested.get() {
            self.request_frame();
        }
    }

    /// Remove `task` from the queue. With `ensure_cleared`, every copy of it
    /// is removed, otherwise only the first.
    pub fn remove_task(&self, task: &FrameTask, ensure_cleared: bool) {
        let mut queue = self.queue.borrow_mut();
        if ensure_cleared {
            queue.retain(|queued| !Rc::ptr_eq(queued, task));
        } else if let Some(idx) = queue.iter().position(|queued| Rc::ptr_eq(queued, task)) {
            queue.remove(idx);
        }
    }

    /// Whether a frame is pending or being processed.
    pub fn is_processing(&self) -> bool {
        self.frame_requested.get()
    }

    /// Number of tasks waiting for the next frame.
    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Frame callback: drain the queue (last scheduled first) and keep the
    /// frame loop alive. An empty queue ends the loop.
    pub fn run_frame(&self, timestamp: f64) {
        if self.queue.borrow().is_empty() {
            self.frame_requested.set(false);
            return;
        }
        // Pop under a short borrow so tasks may schedule more tasks.
        loop {
            let task = self.queue.borrow_mut().pop();
            match task {
                Some(task) => task(timestamp),
                None => break,
            }
        }
        self.request_frame();
    }

    /// Drop every queued task and forget the pending frame.
    pub fn reset(&self) {
        self.queue.borrow_mut().clear();
        self.frame_requested.set(false);
    }

    fn request_frame(&self) {
        let driver = self.driver.borrow().clone();
        match driver {
            Some(driver) => {
                self.frame_requested.set(true);
                driver.request_frame();
            }
            None => log::debug!("no frame driver installed; {} task(s) waiting", self.queued()),
        }
    }
}
