//! Detach handles for attached behaviors.

use std::fmt;
use std::sync::Arc;

use crate::dom::{Document, EventType, Listener, ListenerId, NodeId};

type DetachHook = Box<dyn FnOnce() + Send>;

/// A behavior attached to a node.
///
/// Holds every listener the behavior registered. [`Attachment::detach`]
/// removes them and runs the behavior's cleanup (clearing node references);
/// dropping the attachment does the same, so a behavior is detached exactly
/// once.
#[must_use = "dropping an Attachment detaches the behavior immediately"]
pub struct Attachment {
    document: Arc<dyn Document>,
    node: NodeId,
    listeners: Vec<(EventType, ListenerId)>,
    on_detach: Option<DetachHook>,
}

impl Attachment {
    pub(crate) fn new(document: Arc<dyn Document>, node: NodeId) -> Self {
        Self {
            document,
            node,
            listeners: Vec::new(),
            on_detach: None,
        }
    }

    /// Register a listener that is removed on detach.
    pub(crate) fn listen(&mut self, kind: EventType, listener: Listener) {
        let id = self.document.add_event_listener(self.node, kind, listener);
        self.listeners.push((kind, id));
    }

    /// Replace every listener of `kind` with `listener`.
    pub(crate) fn replace_listener(&mut self, kind: EventType, listener: Listener) {
        let document = &self.document;
        let node = self.node;
        self.listeners.retain(|(existing, id)| {
            if *existing == kind {
                document.remove_event_listener(node, *id);
                false
            } else {
                true
            }
        });
        self.listen(kind, listener);
    }

    /// Run `hook` when the behavior detaches.
    pub(crate) fn on_detach(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_detach = Some(Box::new(hook));
        self
    }

    /// The node this behavior is attached to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Number of listeners this behavior holds.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Remove the behavior's listeners and node references.
    pub fn detach(self) {
        // Drop does the work.
    }

    fn release(&mut self) {
        for (_, id) in self.listeners.drain(..) {
            self.document.remove_event_listener(self.node, id);
        }
        if let Some(hook) = self.on_detach.take() {
            hook();
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("node", &self.node)
            .field("listeners", &self.listeners.len())
            .field("has_detach_hook", &self.on_detach.is_some())
            .finish()
    }
}

static_assertions::assert_impl_all!(Attachment: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomEvent, MemoryDocument};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Listener {
        Arc::new(|_: &mut DomEvent| {})
    }

    #[test]
    fn test_detach_removes_listeners_and_runs_hook_once() {
        let doc = Arc::new(MemoryDocument::new());
        let node = doc.create_element("input");
        let detached = Arc::new(AtomicUsize::new(0));

        let detached_clone = detached.clone();
        let mut attachment = Attachment::new(doc.clone(), node)
            .on_detach(move || {
                detached_clone.fetch_add(1, Ordering::SeqCst);
            });
        attachment.listen(EventType::Focus, noop());
        attachment.listen(EventType::Blur, noop());
        assert_eq!(doc.listener_count(node), 2);
        assert_eq!(attachment.listener_count(), 2);

        attachment.detach();
        assert_eq!(doc.listener_count(node), 0);
        assert_eq!(detached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_detaches() {
        let doc = Arc::new(MemoryDocument::new());
        let node = doc.create_element("li");
        {
            let mut attachment = Attachment::new(doc.clone(), node);
            attachment.listen(EventType::Click, noop());
            assert_eq!(doc.listener_count(node), 1);
        }
        assert_eq!(doc.listener_count(node), 0);
    }

    #[test]
    fn test_replace_listener_keeps_other_kinds() {
        let doc = Arc::new(MemoryDocument::new());
        let node = doc.create_element("li");
        let mut attachment = Attachment::new(doc.clone(), node);
        attachment.listen(EventType::Click, noop());
        attachment.listen(EventType::MouseEnter, noop());

        attachment.replace_listener(EventType::Click, noop());
        assert_eq!(doc.listener_count(node), 2);
        assert_eq!(attachment.listener_count(), 2);
    }
}
