//! The host document abstraction.
//!
//! Behaviors never render. They read and write node attributes, move focus
//! and register event listeners through the [`Document`] trait, which the
//! host implements over its real node tree. [`MemoryDocument`] is a headless
//! implementation used by tests and server-side tooling.
//!
//! Operations on nodes a document does not know are silently ignored, like
//! DOM mutations on detached nodes.

mod memory;

use std::fmt;
use std::sync::Arc;

use slotmap::new_key_type;

use crate::geometry::Rect;

pub use memory::MemoryDocument;

new_key_type! {
    /// Handle to a node of the host document.
    ///
    /// Hosts that keep their own node handles can mint ids with
    /// `NodeId::from(slotmap::KeyData::from_ffi(raw))`.
    pub struct NodeId;

    /// Handle to a registered event listener.
    pub struct ListenerId;
}

/// Event types the behaviors listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The node gained focus.
    Focus,
    /// The node lost focus.
    Blur,
    /// The text value of an input changed.
    Input,
    /// A key was pressed.
    KeyDown,
    /// A pointer was pressed over the node.
    PointerDown,
    /// The pointer entered the node.
    MouseEnter,
    /// The pointer left the node.
    MouseLeave,
    /// The node was clicked.
    Click,
}

impl EventType {
    /// Whether events of this type propagate to ancestors.
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            Self::Focus | Self::Blur | Self::MouseEnter | Self::MouseLeave
        )
    }
}

/// Logical key values for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,
    /// A printable character.
    Character(char),
}

/// An event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    /// The event type.
    pub kind: EventType,
    /// The node the event was dispatched to.
    pub target: NodeId,
    /// The node whose listener is currently running.
    pub current_target: NodeId,
    /// For focus and blur: the node gaining or losing focus in exchange.
    pub related_target: Option<NodeId>,
    /// For key events: the key.
    pub key: Option<Key>,
    /// For input events: the new text value.
    pub value: Option<String>,
    default_prevented: bool,
}

impl DomEvent {
    /// Create an event targeting `target`.
    pub fn new(kind: EventType, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            related_target: None,
            key: None,
            value: None,
            default_prevented: false,
        }
    }

    /// A keydown event.
    pub fn key_down(target: NodeId, key: Key) -> Self {
        Self::new(EventType::KeyDown, target).with_key(key)
    }

    /// An input event carrying the new value.
    pub fn input(target: NodeId, value: impl Into<String>) -> Self {
        Self::new(EventType::Input, target).with_value(value)
    }

    /// Set the key using builder pattern.
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Set the value using builder pattern.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the related target using builder pattern.
    pub fn with_related_target(mut self, related: Option<NodeId>) -> Self {
        self.related_target = related;
        self
    }

    /// Cancel the platform's default action for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a listener cancelled the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Vertical alignment for [`Document::scroll_into_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBlock {
    Start,
    Center,
    End,
    /// Scroll the minimum distance that makes the node visible.
    #[default]
    Nearest,
}

/// An event listener callback.
pub type Listener = Arc<dyn Fn(&mut DomEvent) + Send + Sync>;

/// The host document the behaviors operate on.
///
/// Implementations must not hold internal locks while invoking listeners:
/// listeners call back into the document (set attributes, move focus).
pub trait Document: Send + Sync {
    /// Lowercase tag name of the node, if known.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// Read an attribute.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Write an attribute.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    /// Remove an attribute.
    fn remove_attribute(&self, node: NodeId, name: &str);

    /// Current text value of a form control.
    fn value(&self, node: NodeId) -> String;

    /// Replace the text value of a form control without dispatching events.
    fn set_value(&self, node: NodeId, value: &str);

    /// Move keyboard focus to the node.
    fn focus(&self, node: NodeId);

    /// The node holding keyboard focus.
    fn active_element(&self) -> Option<NodeId>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Scroll the node's scroll container so the node is visible.
    fn scroll_into_view(&self, node: NodeId, block: ScrollBlock);

    /// Layout box of the node in document coordinates.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// The visible area, used for flip and shift.
    fn viewport(&self) -> Option<Rect>;

    /// Device pixels per CSS pixel for the node's window.
    fn device_pixel_ratio(&self, _node: NodeId) -> f32 {
        1.0
    }

    /// Register a listener for `kind` events on `node`.
    fn add_event_listener(&self, node: NodeId, kind: EventType, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns `true` if it was registered.
    fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool;

    /// The node's `id` attribute, or an empty string.
    fn id(&self, node: NodeId) -> String {
        self.attribute(node, "id").unwrap_or_default()
    }

    /// Whether the node is a `<label>` element.
    fn is_label(&self, node: NodeId) -> bool {
        self.tag_name(node).as_deref() == Some("label")
    }
}

impl fmt::Debug for dyn Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Document")
    }
}
