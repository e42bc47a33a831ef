//! Layout-free bounds sampling.
//!
//! Reading an element's bounding rect synchronously forces a style and
//! layout pass. Instead, every sampled element is handed to one shared
//! observation mechanism (an `IntersectionObserver` in the browser) whose
//! callback reports the element's current rect asynchronously. All requests
//! made before that callback fires are resolved from the same observation.

use crate::element::ElementId;
use futures::channel::oneshot;
use kurbo::Rect;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// The platform's asynchronous observation mechanism.
///
/// After [`BoundsObserver::observe`] the platform must eventually call
/// [`BoundsSampler::deliver`] with the element's rect, unless the element is
/// unobserved first.
pub trait BoundsObserver {
    fn observe(&self, element: ElementId);
    fn unobserve(&self, element: ElementId);
}

/// Per-element sampling state.
#[derive(Default)]
struct Sampled {
    /// Number of owners holding the sampling capability.
    attachments: usize,
    /// Resolvers waiting for the next observation.
    pending: Vec<oneshot::Sender<Rect>>,
}

/// Shared bounds sampling service.
#[derive(Default)]
pub struct BoundsSampler {
    observer: RefCell<Option<Rc<dyn BoundsObserver>>>,
    elements: RefCell<HashMap<ElementId, Sampled>>,
}

impl BoundsSampler {
    /// Create a sampler with no observer installed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sampler bound to `observer`.
    pub fn with_observer(observer: Rc<dyn BoundsObserver>) -> Self {
        let sampler = Self::new();
        sampler.install_observer(observer);
        sampler
    }

    /// Install (or replace) the observation mechanism. Elements that already
    /// have pending samples are observed right away.
    pub fn install_observer(&self, observer: Rc<dyn BoundsObserver>) {
        *self.observer.borrow_mut() = Some(observer.clone());
        let waiting: Vec<ElementId> = self
            .elements
            .borrow()
            .iter()
            .filter(|(_, sampled)| !sampled.pending.is_empty())
            .map(|(id, _)| *id)
            .collect();
        for id in waiting {
            observer.observe(id);
        }
    }

    /// Attach the sampling capability to an element (reference counted).
    pub fn attach(&self, element: ElementId) {
        self.elements.borrow_mut().entry(element).or_default().attachments += 1;
    }

    /// Whether the element currently has the sampling capability.
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.elements.borrow().contains_key(&element)
    }

    /// Drop one attachment. The last one disposes the capability: the element
    /// is unobserved and its pending samples are abandoned, never resolving.
    pub fn release(&self, element: ElementId) {
        let disposed = {
            let mut elements = self.elements.borrow_mut();
            match elements.get_mut(&element) {
                Some(sampled) if sampled.attachments > 1 => {
                    sampled.attachments -= 1;
                    false
                }
                Some(_) => {
                    elements.remove(&element);
                    true
                }
                None => false,
            }
        };
        if disposed {
            log::debug!("bounds sampling disposed for {element}");
            self.unobserve(element);
        }
    }

    /// Asynchronously sample the element's bounding rect.
    ///
    /// The observation is only registered when the pending queue was empty;
    /// later calls piggyback on it.
    pub fn sample(&self, element: ElementId) -> BoundsFuture {
        let (sender, receiver) = oneshot::channel();
        let first = {
            let mut elements = self.elements.borrow_mut();
            let sampled = elements.entry(element).or_insert_with(|| Sampled {
                attachments: 1,
                pending: Vec::new(),
            });
            sampled.pending.push(sender);
            sampled.pending.len() == 1
        };
        if first {
            self.observe(element);
        }
        BoundsFuture { receiver }
    }

    /// Ask for a fresh observation without waiting on it.
    pub fn request_update(&self, element: ElementId) {
        self.observe(element);
    }

    /// Observation callback: resolve every pending request for `element` with
    /// `rect`, then stop observing it.
    pub fn deliver(&self, element: ElementId, rect: Rect) {
        let resolvers = self
            .elements
            .borrow_mut()
            .get_mut(&element)
            .map(|sampled| std::mem::take(&mut sampled.pending))
            .unwrap_or_default();
        if !resolvers.is_empty() {
            log::trace!("resolving {} bounds sample(s) for {element}", resolvers.len());
        }
        for resolver in resolvers {
            // A dropped receiver just means the caller stopped waiting.
            let _ = resolver.send(rect);
        }
        self.unobserve(element);
    }

    /// Number of requests waiting on the next observation of `element`.
    pub fn pending_count(&self, element: ElementId) -> usize {
        self.elements.borrow().get(&element).map_or(0, |s| s.pending.len())
    }

    /// Forget every element. Pending samples are abandoned.
    pub fn reset(&self) {
        let ids: Vec<ElementId> = self.elements.borrow_mut().drain().map(|(id, _)| id).collect();
        for id in ids {
            self.unobserve(id);
        }
    }

    fn observer(&self) -> Option<Rc<dyn BoundsObserver>> {
        self.observer.borrow().clone()
    }

    fn observe(&self, element: ElementId) {
        match self.observer() {
            Some(observer) => observer.observe(element),
            None => log::debug!("no bounds observer installed; sample for {element} deferred"),
        }
    }

    fn unobserve(&self, element: ElementId) {
        if let Some(observer) = self.observer() {
            observer.unobserve(element);
        }
    }
}

/// Future returned by [`BoundsSampler::sample`].
///
/// Resolves with the observed rect. If the element's sampling capability is
/// disposed first the future stays pending forever; impose a timeout by
/// dropping it.
#[must_use = "futures do nothing unless polled"]
pub struct BoundsFuture {
    receiver: oneshot::Receiver<Rect>,
}

impl Future for BoundsFuture {
    type Output = Rect;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Rect> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(rect)) => Poll::Ready(rect),
            // Abandoned: the sender is gone and will never wake us again.
            Poll::Ready(Err(_)) | Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect_from_xywh;
    use futures::FutureExt;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingObserver {
        calls: RefCell<Vec<(&'static str, ElementId)>>,
    }

    impl RecordingObserver {
        fn count(&self, kind: &str) -> usize {
            self.calls.borrow().iter().filter(|(k, _)| *k == kind).count()
        }
    }

    impl BoundsObserver for RecordingObserver {
        fn observe(&self, element: ElementId) {
            self.calls.borrow_mut().push(("observe", element));
        }

        fn unobserve(&self, element: ElementId) {
            self.calls.borrow_mut().push(("unobserve", element));
        }
    }

    fn setup() -> (Rc<RecordingObserver>, BoundsSampler) {
        let observer = Rc::new(RecordingObserver::default());
        let sampler = BoundsSampler::with_observer(observer.clone());
        (observer, sampler)
    }

    #[test]
    fn test_sample_resolves_on_delivery() {
        let (_, sampler) = setup();
        let id = Uuid::new_v4();
        let mut sample = sampler.sample(id);
        assert!((&mut sample).now_or_never().is_none());

        let rect = rect_from_xywh(1.0, 2.0, 3.0, 4.0);
        sampler.deliver(id, rect);
        assert_eq!(sample.now_or_never(), Some(rect));
    }

    #[test]
    fn test_concurrent_samples_coalesce() {
        let (observer, sampler) = setup();
        let id = Uuid::new_v4();
        let a = sampler.sample(id);
        let b = sampler.sample(id);
        let c = sampler.sample(id);
        assert_eq!(observer.count("observe"), 1);
        assert_eq!(sampler.pending_count(id), 3);

        let rect = rect_from_xywh(0.0, 0.0, 10.0, 10.0);
        sampler.deliver(id, rect);
        assert_eq!(sampler.pending_count(id), 0);
        assert_eq!(observer.count("unobserve"), 1);
        for sample in [a, b, c] {
            assert_eq!(sample.now_or_never(), Some(rect));
        }
    }

    #[test]
    fn test_new_request_after_delivery_observes_again() {
        let (observer, sampler) = setup();
        let id = Uuid::new_v4();
        let _ = sampler.sample(id);
        sampler.deliver(id, Rect::ZERO);
        let _ = sampler.sample(id);
        assert_eq!(observer.count("observe"), 2);
    }

    #[test]
    fn test_disposed_sample_never_resolves() {
        let (observer, sampler) = setup();
        let id = Uuid::new_v4();
        sampler.attach(id);
        let mut sample = sampler.sample(id);
        sampler.release(id);
        assert!(!sampler.is_attached(id));
        assert_eq!(observer.count("unobserve"), 1);

        sampler.deliver(id, Rect::ZERO);
        assert!((&mut sample).now_or_never().is_none());
    }

    #[test]
    fn test_attachments_are_counted() {
        let (_, sampler) = setup();
        let id = Uuid::new_v4();
        sampler.attach(id);
        sampler.attach(id);
        sampler.release(id);
        assert!(sampler.is_attached(id));
        sampler.release(id);
        assert!(!sampler.is_attached(id));
    }

    #[test]
    fn test_request_update_observes_without_pending() {
        let (observer, sampler) = setup();
        let id = Uuid::new_v4();
        sampler.attach(id);
        sampler.request_update(id);
        assert_eq!(observer.count("observe"), 1);
        assert_eq!(sampler.pending_count(id), 0);

        // The refresh resolves nothing but still ends the observation.
        sampler.deliver(id, Rect::ZERO);
        assert_eq!(observer.count("unobserve"), 1);
        assert!(sampler.is_attached(id));
    }

    #[test]
    fn test_late_observer_installation() {
        let sampler = BoundsSampler::new();
        let id = Uuid::new_v4();
        let sample = sampler.sample(id);

        let observer = Rc::new(RecordingObserver::default());
        sampler.install_observer(observer.clone());
        assert_eq!(observer.count("observe"), 1);

        sampler.deliver(id, Rect::ZERO);
        assert_eq!(sample.now_or_never(), Some(Rect::ZERO));
    }

    #[test]
    fn test_reset_abandons_everything() {
        let (observer, sampler) = setup();
        let id = Uuid::new_v4();
        let mut sample = sampler.sample(id);
        sampler.reset();
        assert!(!sampler.is_attached(id));
        assert_eq!(observer.count("unobserve"), 1);
        assert!((&mut sample).now_or_never().is_none());
    }
}
