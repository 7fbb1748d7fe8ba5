//! Deferred navigation requests.
//!
//! Views never hold the stack they live on. They queue requests on the
//! [`Navigator`] in their [`Context`](crate::context::Context), and the view
//! manager applies them once the current think has returned.

use std::collections::VecDeque;
use std::fmt;

use super::TransitionKind;
use crate::responder::View;

/// One queued navigation operation.
pub enum NavRequest {
    Push(Box<dyn View>, TransitionKind),
    Pop(TransitionKind),
    Replace(Box<dyn View>, TransitionKind),
}

impl fmt::Debug for NavRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavRequest::Push(_, kind) => f.debug_tuple("Push").field(kind).finish(),
            NavRequest::Pop(kind) => f.debug_tuple("Pop").field(kind).finish(),
            NavRequest::Replace(_, kind) => f.debug_tuple("Replace").field(kind).finish(),
        }
    }
}

/// FIFO of navigation requests.
#[derive(Debug, Default)]
pub struct Navigator {
    queue: VecDeque<NavRequest>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that `view` be pushed on top of the current view.
    pub fn push(&mut self, view: Box<dyn View>, kind: TransitionKind) {
        self.queue.push_back(NavRequest::Push(view, kind));
    }

    /// Request that the current view be popped.
    pub fn pop(&mut self, kind: TransitionKind) {
        self.queue.push_back(NavRequest::Pop(kind));
    }

    /// Request that the current view be swapped for `view`.
    pub fn replace(&mut self, view: Box<dyn View>, kind: TransitionKind) {
        self.queue.push_back(NavRequest::Replace(view, kind));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every queued request, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = NavRequest> + '_ {
        self.queue.drain(..)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Graphics;
    use crate::responder::FnView;

    #[test]
    fn drains_in_order() {
        let mut nav = Navigator::new();
        nav.push(Box::new(FnView::new(|_: &mut Graphics| {})), TransitionKind::Blend);
        nav.pop(TransitionKind::SwipeRight);
        assert_eq!(nav.len(), 2);
        let drained: Vec<String> = nav.drain().map(|r| format!("{r:?}")).collect();
        assert_eq!(drained, vec!["Push(Blend)", "Pop(SwipeRight)"]);
        assert!(nav.is_empty());
    }
}
