//! Services shared by every line on a page.

use crate::bounds::BoundsSampler;
use crate::element::Features;
use crate::frame::FrameScheduler;
use std::rc::Rc;

/// Bounds sampler, frame queue and element features.
///
/// One instance is shared per thread through [`Services::shared`]; tests
/// build their own with [`Services::new`].
#[derive(Clone, Default)]
pub struct Services {
    pub bounds: Rc<BoundsSampler>,
    pub frames: Rc<FrameScheduler>,
    pub features: Rc<Features>,
}

thread_local! {
    static SHARED: Services = Services::new();
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// The thread's shared services.
    pub fn shared() -> Services {
        SHARED.with(Services::clone)
    }

    /// Drop all state: pending samples, queued frame tasks, features.
    pub fn reset(&self) {
        self.bounds.reset();
        self.frames.reset();
        self.features.reset();
    }
}
