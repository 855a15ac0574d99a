use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::foundation::core::Direction;

/// A scene change asked for by a scene (end of video, completed loop, menu selection).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TransitionRequest {
    /// Scene to switch to.
    pub target: String,
    pub direction: Direction,
    /// Scene that raised the request, `None` for requests from outside any scene.
    ///
    /// Requests from a scene that is no longer current when drained are dropped.
    pub origin: Option<String>,
}

/// Non-owning handle scenes use to ask the coordinator for a transition.
///
/// Handed to every scene at construction. Requests are queued FIFO and drained by the coordinator
/// on its next update, so a scene never calls back into the coordinator while it is being driven.
#[derive(Clone, Debug, Default)]
pub struct TransitionRequests {
    queue: Rc<RefCell<VecDeque<TransitionRequest>>>,
}

impl TransitionRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request raised by the scene `origin`.
    pub fn push(&self, target: impl Into<String>, direction: Direction, origin: impl Into<String>) {
        self.enqueue(TransitionRequest {
            target: target.into(),
            direction,
            origin: Some(origin.into()),
        });
    }

    /// Queue a request that does not belong to any scene.
    pub fn push_external(&self, target: impl Into<String>, direction: Direction) {
        self.enqueue(TransitionRequest {
            target: target.into(),
            direction,
            origin: None,
        });
    }

    fn enqueue(&self, req: TransitionRequest) {
        tracing::debug!(
            target_scene = %req.target,
            origin = ?req.origin,
            direction = ?req.direction,
            "transition requested"
        );
        self.queue.borrow_mut().push_back(req);
    }

    pub fn pop(&self) -> Option<TransitionRequest> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Drop every queued request raised by `origin`.
    pub fn discard_from(&self, origin: &str) -> usize {
        let mut queue = self.queue.borrow_mut();
        let before = queue.len();
        queue.retain(|r| r.origin.as_deref() != Some(origin));
        before - queue.len()
    }

    pub fn pending(&self) -> Vec<TransitionRequest> {
        self.queue.borrow().iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/requests.rs"]
mod tests;
