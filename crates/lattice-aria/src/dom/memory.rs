//! A headless, in-memory [`Document`].
//!
//! `MemoryDocument` keeps a node tree with attributes, form values, layout
//! boxes and listeners, and simulates the user-agent parts the behaviors
//! depend on: focus changes with blur/focus pairs and related targets,
//! bubbling, and the focus change a pointer press causes unless a listener
//! prevents it.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use slotmap::SlotMap;

use super::{
    Document, DomEvent, EventType, Key, Listener, ListenerId, NodeId, ScrollBlock,
};
use crate::error::DocumentError;
use crate::geometry::Rect;
use lattice_aria_core::logging::targets;

/// Tags that take focus on pointer press without a `tabindex`.
const FOCUSABLE_TAGS: &[&str] = &["input", "button", "select", "textarea", "a"];

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    value: String,
    rect: Option<Rect>,
    listeners: Vec<(ListenerId, EventType)>,
}

struct DocumentState {
    nodes: SlotMap<NodeId, NodeData>,
    listeners: SlotMap<ListenerId, Listener>,
    active: Option<NodeId>,
    viewport: Option<Rect>,
    device_pixel_ratio: f32,
    scroll_log: Vec<(NodeId, ScrollBlock)>,
}

/// An in-memory document.
pub struct MemoryDocument {
    state: RwLock<DocumentState>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DocumentState {
                nodes: SlotMap::with_key(),
                listeners: SlotMap::with_key(),
                active: None,
                viewport: None,
                device_pixel_ratio: 1.0,
                scroll_log: Vec::new(),
            }),
        }
    }

    // =========================================================================
    // Tree
    // =========================================================================

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.state.write().nodes.insert(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        })
    }

    /// Create an element and append it to `parent`.
    pub fn create_child(&self, parent: NodeId, tag: &str) -> Result<NodeId, DocumentError> {
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Move `child` under `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let mut state = self.state.write();
        for node in [parent, child] {
            if !state.nodes.contains_key(node) {
                return Err(DocumentError::UnknownNode(node));
            }
        }
        if is_ancestor_or_self(&state.nodes, child, parent) {
            return Err(DocumentError::HierarchyCycle { child, parent });
        }
        detach_from_parent(&mut state.nodes, child);
        state.nodes[child].parent = Some(parent);
        state.nodes[parent].children.push(child);
        Ok(())
    }

    /// Remove a node and its subtree, dropping their listeners.
    pub fn remove(&self, node: NodeId) -> Result<(), DocumentError> {
        let mut state = self.state.write();
        if !state.nodes.contains_key(node) {
            return Err(DocumentError::UnknownNode(node));
        }
        detach_from_parent(&mut state.nodes, node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(data) = state.nodes.remove(current) {
                for (listener, _) in data.listeners {
                    state.listeners.remove(listener);
                }
                stack.extend(data.children);
            }
            if state.active == Some(current) {
                state.active = None;
            }
        }
        Ok(())
    }

    /// Parent of a node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.read().nodes.get(node).and_then(|data| data.parent)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Set the layout box of a node.
    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        if let Some(data) = self.state.write().nodes.get_mut(node) {
            data.rect = Some(rect);
        }
    }

    /// Set the viewport used for flip and shift.
    pub fn set_viewport(&self, viewport: Rect) {
        self.state.write().viewport = Some(viewport);
    }

    /// Set the device pixel ratio reported for every node.
    pub fn set_device_pixel_ratio(&self, ratio: f32) {
        self.state.write().device_pixel_ratio = ratio;
    }

    /// Every `scroll_into_view` request so far, oldest first.
    pub fn scroll_log(&self) -> Vec<(NodeId, ScrollBlock)> {
        self.state.read().scroll_log.clone()
    }

    /// Number of listeners registered on a node.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.state
            .read()
            .nodes
            .get(node)
            .map_or(0, |data| data.listeners.len())
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Dispatch an event, bubbling through ancestors if its type bubbles.
    ///
    /// Returns the event after every listener ran.
    pub fn dispatch(&self, mut event: DomEvent) -> DomEvent {
        let path = self.propagation_path(event.target, event.kind);
        for node in path {
            let listeners = self.listeners_for(node, event.kind);
            event.current_target = node;
            for listener in listeners {
                listener(&mut event);
            }
        }
        event.current_target = event.target;
        event
    }

    /// Remove focus from the active element.
    pub fn blur(&self) {
        let previous = self.state.write().active.take();
        if let Some(previous) = previous {
            self.dispatch(DomEvent::new(EventType::Blur, previous));
        }
    }

    /// Simulate typing: replace the value and dispatch an input event.
    pub fn type_text(&self, node: NodeId, value: &str) -> DomEvent {
        self.set_value(node, value);
        self.dispatch(DomEvent::input(node, value))
    }

    /// Dispatch a keydown event.
    pub fn key_down(&self, node: NodeId, key: Key) -> DomEvent {
        self.dispatch(DomEvent::key_down(node, key))
    }

    /// Simulate a pointer press.
    ///
    /// Unless a listener prevents the default action, focus moves to the node
    /// if it is focusable, otherwise the active element loses focus.
    pub fn pointer_down(&self, node: NodeId) -> DomEvent {
        let event = self.dispatch(DomEvent::new(EventType::PointerDown, node));
        if !event.default_prevented() {
            if self.is_focusable(node) {
                self.focus(node);
            } else {
                self.blur();
            }
        }
        event
    }

    /// Simulate a full click: pointer press followed by a click event.
    pub fn click(&self, node: NodeId) -> DomEvent {
        self.pointer_down(node);
        self.dispatch(DomEvent::new(EventType::Click, node))
    }

    /// Simulate the pointer entering a node.
    pub fn mouse_enter(&self, node: NodeId) -> DomEvent {
        self.dispatch(DomEvent::new(EventType::MouseEnter, node))
    }

    /// Simulate the pointer leaving a node.
    pub fn mouse_leave(&self, node: NodeId) -> DomEvent {
        self.dispatch(DomEvent::new(EventType::MouseLeave, node))
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        let state = self.state.read();
        state.nodes.get(node).is_some_and(|data| {
            data.attributes.contains_key("tabindex") || FOCUSABLE_TAGS.contains(&data.tag.as_str())
        })
    }

    fn propagation_path(&self, target: NodeId, kind: EventType) -> Vec<NodeId> {
        let state = self.state.read();
        let mut path = Vec::new();
        let mut current = state.nodes.contains_key(target).then_some(target);
        while let Some(node) = current {
            path.push(node);
            if !kind.bubbles() {
                break;
            }
            current = state.nodes.get(node).and_then(|data| data.parent);
        }
        path
    }

    fn listeners_for(&self, node: NodeId, kind: EventType) -> Vec<Listener> {
        let state = self.state.read();
        let Some(data) = state.nodes.get(node) else {
            return Vec::new();
        };
        data.listeners
            .iter()
            .filter(|(_, listener_kind)| *listener_kind == kind)
            .filter_map(|(id, _)| state.listeners.get(*id).cloned())
            .collect()
    }
}

fn is_ancestor_or_self(
    nodes: &SlotMap<NodeId, NodeData>,
    ancestor: NodeId,
    node: NodeId,
) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = nodes.get(id).and_then(|data| data.parent);
    }
    false
}

fn detach_from_parent(nodes: &mut SlotMap<NodeId, NodeData>, node: NodeId) {
    if let Some(parent) = nodes.get_mut(node).and_then(|data| data.parent.take())
        && let Some(parent_data) = nodes.get_mut(parent)
    {
        parent_data.children.retain(|child| *child != node);
    }
}

impl Document for MemoryDocument {
    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.state.read().nodes.get(node).map(|data| data.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .read()
            .nodes
            .get(node)
            .and_then(|data| data.attributes.get(name).cloned())
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.state.write().nodes.get_mut(node) {
            data.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(data) = self.state.write().nodes.get_mut(node) {
            data.attributes.remove(name);
        }
    }

    fn value(&self, node: NodeId) -> String {
        self.state
            .read()
            .nodes
            .get(node)
            .map(|data| data.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, node: NodeId, value: &str) {
        if let Some(data) = self.state.write().nodes.get_mut(node) {
            data.value = value.to_string();
        }
    }

    fn focus(&self, node: NodeId) {
        let previous = {
            let mut state = self.state.write();
            if !state.nodes.contains_key(node) || state.active == Some(node) {
                return;
            }
            state.active.replace(node)
        };
        tracing::trace!(target: targets::DOM, ?previous, ?node, "focus moved");
        if let Some(previous) = previous {
            self.dispatch(DomEvent::new(EventType::Blur, previous).with_related_target(Some(node)));
            // A blur listener moved focus elsewhere.
            if self.state.read().active != Some(node) {
                return;
            }
        }
        self.dispatch(DomEvent::new(EventType::Focus, node).with_related_target(previous));
    }

    fn active_element(&self) -> Option<NodeId> {
        self.state.read().active
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        is_ancestor_or_self(&self.state.read().nodes, ancestor, node)
    }

    fn scroll_into_view(&self, node: NodeId, block: ScrollBlock) {
        let mut state = self.state.write();
        if state.nodes.contains_key(node) {
            state.scroll_log.push((node, block));
        }
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.state.read().nodes.get(node).and_then(|data| data.rect)
    }

    fn viewport(&self) -> Option<Rect> {
        self.state.read().viewport
    }

    fn device_pixel_ratio(&self, _node: NodeId) -> f32 {
        self.state.read().device_pixel_ratio
    }

    fn add_event_listener(&self, node: NodeId, kind: EventType, listener: Listener) -> ListenerId {
        let mut state = self.state.write();
        let id = state.listeners.insert(listener);
        match state.nodes.get_mut(node) {
            Some(data) => data.listeners.push((id, kind)),
            None => {
                // Unknown node: the listener can never fire.
                state.listeners.remove(id);
            }
        }
        id
    }

    fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut state = self.state.write();
        let Some(data) = state.nodes.get_mut(node) else {
            return false;
        };
        let before = data.listeners.len();
        data.listeners.retain(|(existing, _)| *existing != id);
        let removed = data.listeners.len() != before;
        if removed {
            state.listeners.remove(id);
        }
        removed
    }
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryDocument")
            .field("nodes", &state.nodes.len())
            .field("listeners", &state.listeners.len())
            .field("active", &state.active)
            .finish()
    }
}

static_assertions::assert_impl_all!(MemoryDocument: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &'static str) -> Listener {
        let log = log.clone();
        Arc::new(move |event: &mut DomEvent| {
            log.lock()
                .push(format!("{label}:{:?}:{:?}", event.kind, event.related_target.is_some()));
        })
    }

    #[test]
    fn test_tree_and_contains() {
        let doc = MemoryDocument::new();
        let list = doc.create_element("UL");
        let item = doc.create_child(list, "li").unwrap();
        let other = doc.create_element("div");

        assert_eq!(doc.tag_name(list).as_deref(), Some("ul"));
        assert!(doc.contains(list, item));
        assert!(doc.contains(list, list));
        assert!(!doc.contains(item, list));
        assert!(!doc.contains(list, other));
        assert_eq!(
            doc.append_child(item, list),
            Err(DocumentError::HierarchyCycle {
                child: list,
                parent: item
            })
        );
    }

    #[test]
    fn test_focus_dispatches_blur_then_focus() {
        let doc = MemoryDocument::new();
        let a = doc.create_element("input");
        let b = doc.create_element("input");
        let log = Arc::new(Mutex::new(Vec::new()));
        doc.add_event_listener(a, EventType::Blur, recorder(&log, "a"));
        doc.add_event_listener(b, EventType::Focus, recorder(&log, "b"));

        doc.focus(a);
        doc.focus(b);
        doc.focus(b);

        assert_eq!(doc.active_element(), Some(b));
        assert_eq!(*log.lock(), vec!["a:Blur:true", "b:Focus:true"]);
    }

    #[test]
    fn test_blur_listener_can_take_focus_back() {
        let doc = Arc::new(MemoryDocument::new());
        let input = doc.create_element("input");
        let list = doc.create_element("ul");
        let log = Arc::new(Mutex::new(Vec::new()));
        doc.add_event_listener(list, EventType::Focus, recorder(&log, "list"));
        doc.add_event_listener(list, EventType::Blur, recorder(&log, "list"));
        let weak = Arc::downgrade(&doc);
        doc.add_event_listener(
            input,
            EventType::Blur,
            Arc::new(move |_: &mut DomEvent| {
                if let Some(doc) = weak.upgrade() {
                    doc.focus(input);
                }
            }),
        );

        doc.focus(input);
        doc.focus(list);

        assert_eq!(doc.active_element(), Some(input));
        assert_eq!(*log.lock(), vec!["list:Blur:true"]);
    }

    #[test]
    fn test_click_bubbles_but_focus_does_not() {
        let doc = MemoryDocument::new();
        let parent = doc.create_element("div");
        let child = doc.create_child(parent, "button").unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        doc.add_event_listener(parent, EventType::Click, recorder(&log, "parent"));
        doc.add_event_listener(parent, EventType::Focus, recorder(&log, "parent"));

        doc.click(child);

        assert_eq!(*log.lock(), vec!["parent:Click:false"]);
        assert_eq!(doc.active_element(), Some(child));
    }

    #[test]
    fn test_prevented_pointer_down_keeps_focus() {
        let doc = MemoryDocument::new();
        let input = doc.create_element("input");
        let option = doc.create_element("li");
        doc.set_attribute(option, "tabindex", "-1");
        doc.focus(input);

        doc.add_event_listener(
            option,
            EventType::PointerDown,
            Arc::new(|event: &mut DomEvent| event.prevent_default()),
        );
        let event = doc.pointer_down(option);

        assert!(event.default_prevented());
        assert_eq!(doc.active_element(), Some(input));
    }

    #[test]
    fn test_pointer_down_on_plain_node_blurs() {
        let doc = MemoryDocument::new();
        let input = doc.create_element("input");
        let body = doc.create_element("div");
        doc.focus(input);

        doc.pointer_down(body);
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn test_remove_listener_and_subtree() {
        let doc = MemoryDocument::new();
        let list = doc.create_element("ul");
        let item = doc.create_child(list, "li").unwrap();
        let id = doc.add_event_listener(item, EventType::Click, Arc::new(|_: &mut DomEvent| {}));
        assert_eq!(doc.listener_count(item), 1);
        assert!(doc.remove_event_listener(item, id));
        assert!(!doc.remove_event_listener(item, id));

        doc.add_event_listener(item, EventType::Click, Arc::new(|_: &mut DomEvent| {}));
        doc.remove(list).unwrap();
        assert_eq!(doc.tag_name(item), None);
        assert_eq!(doc.remove(list), Err(DocumentError::UnknownNode(list)));
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let doc = Arc::new(MemoryDocument::new());
        let input = doc.create_element("input");
        let doc_clone = doc.clone();
        doc.add_event_listener(
            input,
            EventType::Input,
            Arc::new(move |event: &mut DomEvent| {
                doc_clone.set_attribute(event.target, "data-seen", "true");
            }),
        );

        doc.type_text(input, "foo");
        assert_eq!(doc.value(input), "foo");
        assert_eq!(doc.attribute(input, "data-seen").as_deref(), Some("true"));
    }
}
