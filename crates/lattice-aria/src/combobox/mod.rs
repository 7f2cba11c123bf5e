//! Combobox behavior: an autocomplete input with a listbox of suggestions.
//!
//! A [`Combobox`] owns the widget state as [`Store`]s and exposes one
//! behavior per region of the widget. The host attaches each behavior to the
//! node rendering that region and keeps the returned [`Attachment`] for as
//! long as the node is mounted:
//!
//! | behavior | node |
//! |----------|------|
//! | [`Combobox::label`] | the label (a `<label>` or any element) |
//! | [`Combobox::input`] | the text input |
//! | [`Combobox::button`] | an optional toggle button |
//! | [`Combobox::listbox`] | the popup container |
//! | [`Combobox::item`] | each rendered option |
//!
//! # State
//!
//! - `listbox_visible`: whether the listbox is open. Hiding it clears the
//!   focused item.
//! - `filtered`: the items whose display string contains the query, in
//!   source order. The host renders these.
//! - `focused`: the highlighted option, always one of `filtered`.
//! - `query`: the input text.
//! - `position`: where the listbox goes, relative to the input.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lattice_aria::combobox::{Combobox, ComboboxOptions, Value};
//! use lattice_aria::dom::{Document, MemoryDocument};
//!
//! let doc = Arc::new(MemoryDocument::new());
//! let input = doc.create_element("input");
//! let listbox = doc.create_element("ul");
//!
//! let items = vec![Value::new("foo"), Value::new("bar"), Value::new("baz")];
//! let combobox = Combobox::new(doc.clone(), items, ComboboxOptions::new());
//! let _input = combobox.input(input);
//! let _listbox = combobox.listbox(listbox);
//!
//! doc.type_text(input, "ba");
//! assert_eq!(combobox.filtered().get(), vec![Value::new("bar"), Value::new("baz")]);
//! assert!(combobox.listbox_visible().get());
//! assert_eq!(doc.attribute(input, "aria-expanded").as_deref(), Some("true"));
//! ```

mod filter;
mod item;
mod options;

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use lattice_aria_core::logging::targets;
use lattice_aria_core::{ConnectionId, PerfSpan, Store};

use crate::attachment::Attachment;
use crate::dom::{Document, DomEvent, EventType, Key, Listener, NodeId, ScrollBlock};
use crate::error::AriaError;
use crate::geometry::Point;
use crate::ids::WidgetIds;
use crate::position::{
    ComputedPosition, LayoutPositioner, Middleware, Placement, PositionConfig, Positioner,
};

pub use filter::filter;
pub use item::{Item, ItemSource, Value};
pub use options::{ComboboxOptions, FocusOpenPolicy, SelectionCallback};

/// Distance between the input and the listbox.
const LISTBOX_OFFSET: f32 = 8.0;

#[derive(Debug, Default, Clone, Copy)]
struct Nodes {
    input: Option<NodeId>,
    button: Option<NodeId>,
    listbox: Option<NodeId>,
    /// A non-`<label>` label, referenced by the input's `aria-labelledby`.
    label: Option<NodeId>,
}

/// Option nodes and the items they show, in attach order.
///
/// Several nodes may show equal items. The earliest attached one is the
/// one that gets marked and referenced.
struct ItemNodes<T> {
    entries: Vec<(NodeId, T)>,
}

impl<T> Default for ItemNodes<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Item> ItemNodes<T> {
    fn insert(&mut self, node: NodeId, item: T) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == node) {
            Some(entry) => entry.1 = item,
            None => self.entries.push((node, item)),
        }
    }

    fn remove(&mut self, node: NodeId) {
        self.entries.retain(|(existing, _)| *existing != node);
    }

    fn get(&self, node: NodeId) -> Option<&T> {
        self.entries
            .iter()
            .find_map(|(existing, item)| (*existing == node).then_some(item))
    }

    fn node_for(&self, item: &T) -> Option<NodeId> {
        self.entries
            .iter()
            .find_map(|(node, candidate)| (candidate == item).then_some(*node))
    }
}

struct Inner<T: Item> {
    document: Arc<dyn Document>,
    positioner: Arc<dyn Positioner>,
    options: ComboboxOptions<T>,
    ids: WidgetIds,

    listbox_visible: Store<bool>,
    filtered: Store<Vec<T>>,
    focused: Store<Option<T>>,
    query: Store<String>,
    position: Store<Point>,

    /// Latest snapshot of the item source.
    items: RwLock<Vec<T>>,
    nodes: Mutex<Nodes>,
    item_nodes: Mutex<ItemNodes<T>>,
    /// The node currently carrying `aria-selected`.
    marked: Mutex<Option<NodeId>>,
    source: Mutex<Option<(Store<Vec<T>>, ConnectionId)>>,
}

/// An accessible combobox.
///
/// Cheap to clone: clones control the same widget.
pub struct Combobox<T: Item> {
    inner: Arc<Inner<T>>,
}

impl<T: Item> Clone for Combobox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Item> Combobox<T> {
    /// Create a combobox over `items`.
    ///
    /// A live source is observed until the combobox is dropped.
    pub fn new(
        document: Arc<dyn Document>,
        items: impl Into<ItemSource<T>>,
        options: ComboboxOptions<T>,
    ) -> Self {
        let positioner = options
            .positioner
            .clone()
            .unwrap_or_else(|| Arc::new(LayoutPositioner::new(document.clone())));

        let inner = Arc::new(Inner {
            document,
            positioner,
            options,
            ids: WidgetIds::new(),
            listbox_visible: Store::new(false),
            filtered: Store::new(Vec::new()),
            focused: Store::new(None),
            query: Store::new(String::new()),
            position: Store::new(Point::ZERO),
            items: RwLock::new(Vec::new()),
            nodes: Mutex::new(Nodes::default()),
            item_nodes: Mutex::new(ItemNodes::default()),
            marked: Mutex::new(None),
            source: Mutex::new(None),
        });

        // Subscription order is observable: source first, then the state
        // stores in the order their side effects depend on each other.
        match items.into() {
            ItemSource::Static(items) => inner.assign_items(items),
            ItemSource::Live(store) => {
                let weak = Arc::downgrade(&inner);
                let id = store.subscribe(move |items: &Vec<T>| {
                    if let Some(inner) = weak.upgrade() {
                        inner.assign_items(items.clone());
                    }
                });
                *inner.source.lock() = Some((store, id));
            }
        }
        Inner::watch(&inner, &inner.listbox_visible, |inner, visible| {
            inner.on_visible_changed(*visible)
        });
        Inner::watch(&inner, &inner.filtered, Inner::on_filtered_changed);
        Inner::watch(&inner, &inner.focused, |inner, focused| {
            inner.on_focused_changed(focused.as_ref())
        });
        Inner::watch(&inner, &inner.query, |inner, query| inner.on_query_changed(query));

        tracing::debug!(target: targets::COMBOBOX, prefix = inner.ids.prefix(), "combobox created");
        Self { inner }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Whether the listbox is open.
    pub fn listbox_visible(&self) -> Store<bool> {
        self.inner.listbox_visible.clone()
    }

    /// Items matching the query, in source order.
    pub fn filtered(&self) -> Store<Vec<T>> {
        self.inner.filtered.clone()
    }

    /// The highlighted option.
    pub fn focused(&self) -> Store<Option<T>> {
        self.inner.focused.clone()
    }

    /// The input text.
    pub fn query(&self) -> Store<String> {
        self.inner.query.clone()
    }

    /// Last computed listbox position for the attached input and listbox.
    pub fn position(&self) -> Store<Point> {
        self.inner.position.clone()
    }

    /// Latest snapshot of the item source.
    pub fn items(&self) -> Vec<T> {
        self.inner.items.read().clone()
    }

    /// Id assigned to the input.
    pub fn input_id(&self) -> String {
        self.inner.ids.input()
    }

    /// Id assigned to the listbox.
    pub fn listbox_id(&self) -> String {
        self.inner.ids.listbox()
    }

    /// Id assigned to a non-`<label>` label.
    pub fn label_id(&self) -> String {
        self.inner.ids.label()
    }

    /// Open the listbox if there is something to show. An open listbox
    /// stays open.
    pub fn open(&self) {
        self.inner.open_listbox();
    }

    /// Close the listbox.
    pub fn close(&self) {
        self.inner.listbox_visible.set(false);
    }

    /// Accept `item` as if the user picked it.
    pub fn accept(&self, item: T) {
        self.inner.accept(item);
    }

    // =========================================================================
    // Behaviors
    // =========================================================================

    /// Attach the label behavior.
    ///
    /// A `<label>` element is pointed at the input with `for`. Any other
    /// element gets an id and is referenced by the input's
    /// `aria-labelledby`, whenever the input attaches.
    pub fn label(&self, node: NodeId) -> Attachment {
        let inner = &self.inner;
        let doc = &inner.document;
        if doc.is_label(node) {
            doc.set_attribute(node, "for", &inner.ids.input());
        } else {
            doc.set_attribute(node, "id", &inner.ids.label());
            let input = {
                let mut nodes = inner.nodes.lock();
                nodes.label = Some(node);
                nodes.input
            };
            if let Some(input) = input {
                doc.set_attribute(input, "aria-labelledby", &inner.ids.label());
            }
        }

        let weak = Arc::downgrade(inner);
        Attachment::new(doc.clone(), node).on_detach(move || {
            let Some(inner) = weak.upgrade() else { return };
            let input = {
                let mut nodes = inner.nodes.lock();
                if nodes.label != Some(node) {
                    return;
                }
                nodes.label = None;
                nodes.input
            };
            if let Some(input) = input {
                inner.document.remove_attribute(input, "aria-labelledby");
            }
        })
    }

    /// Attach the input behavior.
    pub fn input(&self, node: NodeId) -> Attachment {
        let inner = &self.inner;
        let doc = &inner.document;
        doc.set_attribute(node, "id", &inner.ids.input());
        doc.set_attribute(node, "role", "combobox");
        doc.set_attribute(node, "autocomplete", "off");
        doc.set_attribute(node, "aria-autocomplete", "list");
        doc.set_attribute(node, "aria-expanded", expanded(inner.listbox_visible.get()));
        doc.set_attribute(node, "aria-controls", &inner.ids.listbox());

        let nodes = {
            let mut nodes = inner.nodes.lock();
            nodes.input = Some(node);
            *nodes
        };
        if nodes.label.is_some() {
            doc.set_attribute(node, "aria-labelledby", &inner.ids.label());
        }

        let mut attachment = Attachment::new(doc.clone(), node);
        attachment.listen(EventType::Focus, inner.listener(|inner, _| inner.on_input_focus()));
        attachment.listen(EventType::Blur, inner.listener(Inner::on_input_blur));
        attachment.listen(EventType::Input, inner.listener(Inner::on_input_input));
        attachment.listen(EventType::KeyDown, inner.listener(Inner::on_input_keydown));

        if let Some(listbox) = nodes.listbox {
            inner.update_position(node, listbox);
        }

        let weak = Arc::downgrade(inner);
        attachment.on_detach(move || {
            if let Some(inner) = weak.upgrade() {
                let mut nodes = inner.nodes.lock();
                if nodes.input == Some(node) {
                    nodes.input = None;
                }
            }
        })
    }

    /// Attach the toggle button behavior.
    pub fn button(&self, node: NodeId) -> Attachment {
        let inner = &self.inner;
        let doc = &inner.document;
        doc.set_attribute(node, "tabindex", "-1");
        if doc.attribute(node, "aria-label").is_none() {
            doc.set_attribute(node, "aria-label", "Show suggestions");
        }
        doc.set_attribute(node, "aria-labelledby", &inner.ids.label());
        doc.set_attribute(node, "aria-expanded", expanded(inner.listbox_visible.get()));
        doc.set_attribute(node, "aria-controls", &inner.ids.listbox());
        inner.nodes.lock().button = Some(node);

        let mut attachment = Attachment::new(doc.clone(), node);
        attachment.listen(EventType::PointerDown, inner.listener(Inner::on_button_pointer_down));

        let weak = Arc::downgrade(inner);
        attachment.on_detach(move || {
            if let Some(inner) = weak.upgrade() {
                let mut nodes = inner.nodes.lock();
                if nodes.button == Some(node) {
                    nodes.button = None;
                }
            }
        })
    }

    /// Attach the listbox behavior.
    pub fn listbox(&self, node: NodeId) -> Attachment {
        let inner = &self.inner;
        let doc = &inner.document;
        doc.set_attribute(node, "id", &inner.ids.listbox());
        doc.set_attribute(node, "role", "listbox");
        doc.set_attribute(node, "aria-label", "Suggestions");

        let input = {
            let mut nodes = inner.nodes.lock();
            nodes.listbox = Some(node);
            nodes.input
        };
        if let Some(input) = input {
            inner.update_position(input, node);
        }

        let weak = Arc::downgrade(inner);
        Attachment::new(doc.clone(), node).on_detach(move || {
            if let Some(inner) = weak.upgrade() {
                let mut nodes = inner.nodes.lock();
                if nodes.listbox == Some(node) {
                    nodes.listbox = None;
                }
            }
        })
    }

    /// Attach the option behavior to a node rendering `item`.
    pub fn item(&self, node: NodeId, item: T) -> ItemAttachment<T> {
        let inner = &self.inner;
        let doc = &inner.document;
        doc.set_attribute(node, "id", &inner.ids.item(item.id_slug()));
        doc.set_attribute(node, "role", "option");
        doc.set_attribute(node, "tabindex", "-1");
        inner.item_nodes.lock().insert(node, item.clone());

        let mut attachment = Attachment::new(doc.clone(), node);
        attachment.listen(EventType::Click, inner.accept_listener(item));
        attachment.listen(EventType::MouseEnter, inner.listener(Inner::on_item_mouse_enter));
        attachment.listen(EventType::MouseLeave, inner.listener(|inner, _| {
            inner.focused.set(None);
        }));
        attachment.listen(
            EventType::PointerDown,
            Arc::new(|event: &mut DomEvent| event.prevent_default()),
        );

        let weak = Arc::downgrade(inner);
        let attachment = attachment.on_detach(move || {
            if let Some(inner) = weak.upgrade() {
                inner.item_nodes.lock().remove(node);
                let mut marked = inner.marked.lock();
                if *marked == Some(node) {
                    *marked = None;
                }
            }
        });

        ItemAttachment {
            attachment,
            inner: Arc::downgrade(inner),
        }
    }
}

impl<T: Item> fmt::Debug for Combobox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combobox")
            .field("prefix", &self.inner.ids.prefix())
            .field("listbox_visible", &self.inner.listbox_visible.get())
            .field("query", &self.inner.query.get())
            .field("focused", &self.inner.focused.get())
            .field("nodes", &*self.inner.nodes.lock())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Item attachment
// =============================================================================

/// An option behavior attached to a node.
#[must_use = "dropping an ItemAttachment detaches the behavior immediately"]
pub struct ItemAttachment<T: Item> {
    attachment: Attachment,
    inner: Weak<Inner<T>>,
}

impl<T: Item> ItemAttachment<T> {
    /// Make the node represent another item.
    ///
    /// Refreshes the node's id and association, and replaces the click
    /// listener so clicking accepts the new item.
    pub fn update(&mut self, item: T) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let node = self.attachment.node();
        inner
            .document
            .set_attribute(node, "id", &inner.ids.item(item.id_slug()));
        inner.item_nodes.lock().insert(node, item.clone());
        self.attachment
            .replace_listener(EventType::Click, inner.accept_listener(item));
    }

    /// The node this behavior is attached to.
    pub fn node(&self) -> NodeId {
        self.attachment.node()
    }

    /// Number of listeners this behavior currently holds on the node.
    pub fn listener_count(&self) -> usize {
        self.attachment.listener_count()
    }

    /// Remove the behavior's listeners and the node's item association.
    pub fn detach(self) {
        self.attachment.detach();
    }
}

impl<T: Item> fmt::Debug for ItemAttachment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemAttachment")
            .field("attachment", &self.attachment)
            .finish()
    }
}

// =============================================================================
// State machine
// =============================================================================

impl<T: Item> Inner<T> {
    /// Subscribe to `store` without keeping the combobox alive.
    fn watch<S, F>(this: &Arc<Self>, store: &Store<S>, handler: F)
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(&Arc<Self>, &S) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(this);
        store.subscribe(move |value| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, value);
            }
        });
    }

    /// Wrap an event handler into a listener that does not keep the
    /// combobox alive.
    fn listener<F>(self: &Arc<Self>, handler: F) -> Listener
    where
        F: Fn(&Arc<Self>, &mut DomEvent) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(self);
        Arc::new(move |event: &mut DomEvent| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, event);
            }
        })
    }

    fn accept_listener(self: &Arc<Self>, item: T) -> Listener {
        self.listener(move |inner, _| inner.accept(item.clone()))
    }

    fn nodes(&self) -> Nodes {
        *self.nodes.lock()
    }

    fn node_for(&self, item: &T) -> Option<NodeId> {
        self.item_nodes.lock().node_for(item)
    }

    fn has_matches(&self) -> bool {
        self.options.show_when_empty || self.filtered.with(|filtered| !filtered.is_empty())
    }

    /// Open the listbox if there is something to show, close it otherwise.
    fn show_listbox(&self) {
        self.listbox_visible.set(self.has_matches());
    }

    /// Open the listbox if there is something to show. Never closes it.
    fn open_listbox(&self) {
        if !self.listbox_visible.get() && self.has_matches() {
            self.listbox_visible.set(true);
        }
    }

    fn open_on_focus(&self) {
        let open = match self.options.focus_open_policy {
            FocusOpenPolicy::Unconditional => true,
            FocusOpenPolicy::WhenMatches => self.has_matches(),
        };
        if open {
            self.listbox_visible.set(true);
        }
    }

    fn refilter(&self) {
        let query = self.query.get();
        let filtered = filter(&self.items.read(), &query);
        self.filtered.set(filtered);
    }

    fn assign_items(&self, items: Vec<T>) {
        tracing::trace!(target: targets::COMBOBOX, count = items.len(), "items assigned");
        *self.items.write() = items;
        self.refilter();

        if self.options.show_on_focus && !self.listbox_visible.get() {
            let input = self.nodes().input;
            if input.is_some() && self.document.active_element() == input {
                self.open_on_focus();
            }
        }
    }

    /// Highlight `item`. Refused while the listbox is hidden or when the
    /// item is not in the filtered view.
    fn set_focused(&self, item: Option<T>) {
        if let Some(candidate) = &item {
            let visible = self.listbox_visible.get();
            let listed = self.filtered.with(|filtered| filtered.contains(candidate));
            if !visible || !listed {
                tracing::trace!(target: targets::COMBOBOX, visible, listed, "focus refused");
                return;
            }
        }
        self.focused.set(item);
    }

    fn accept(&self, item: T) {
        tracing::debug!(target: targets::COMBOBOX, item = item.value(), "item accepted");
        let value = item.value().to_string();
        if !self.query.set(value.clone()) {
            // Unchanged query: the subscriber did not run.
            self.write_input_value(&value);
        }
        self.listbox_visible.set(false);
        let all = self.items.read().clone();
        self.filtered.set(all);
        if let Some(on_selection) = &self.options.on_selection {
            on_selection(&item);
        }
    }

    fn write_input_value(&self, value: &str) {
        if let Some(input) = self.nodes().input {
            self.document.set_value(input, value);
        }
    }

    fn move_focus(&self, forward: bool) {
        let current = self.focused.get();
        let index = current.and_then(|item| {
            self.filtered
                .with(|filtered| filtered.iter().position(|candidate| *candidate == item))
        });

        let next = match index {
            Some(index) => self.filtered.with(|filtered| {
                let next = if forward {
                    (index + 1).min(filtered.len() - 1)
                } else {
                    index.saturating_sub(1)
                };
                filtered.get(next).cloned()
            }),
            None => {
                self.open_listbox();
                self.filtered.with(|filtered| {
                    if forward {
                        filtered.first().cloned()
                    } else {
                        filtered.last().cloned()
                    }
                })
            }
        };
        self.set_focused(next);
    }

    fn update_position(self: &Arc<Self>, input: NodeId, listbox: NodeId) {
        let config = PositionConfig::new(Placement::BottomStart)
            .with_middleware(Middleware::Offset(LISTBOX_OFFSET));
        let weak = Arc::downgrade(self);
        self.positioner.compute_position(
            input,
            listbox,
            &config,
            Box::new(move |result: ComputedPosition| {
                let Some(inner) = weak.upgrade() else { return };
                let nodes = inner.nodes();
                if nodes.input != Some(input) || nodes.listbox != Some(listbox) {
                    tracing::debug!(target: targets::COMBOBOX, "stale listbox position dropped");
                    return;
                }
                inner.position.set(Point::new(result.x, result.y));
            }),
        );
    }

    // -------------------------------------------------------------------------
    // Store side effects
    // -------------------------------------------------------------------------

    fn on_visible_changed(&self, visible: bool) {
        if !visible {
            self.focused.set(None);
        }
        let nodes = self.nodes();
        for node in [nodes.input, nodes.button].into_iter().flatten() {
            self.document
                .set_attribute(node, "aria-expanded", expanded(visible));
        }
        tracing::debug!(target: targets::COMBOBOX, visible, "listbox visibility");
    }

    fn on_filtered_changed(self: &Arc<Self>, filtered: &Vec<T>) {
        let stale = self
            .focused
            .with(|focused| focused.as_ref().is_some_and(|item| !filtered.contains(item)));
        if stale {
            self.focused.set(None);
        }
        let nodes = self.nodes();
        if let (Some(input), Some(listbox)) = (nodes.input, nodes.listbox) {
            self.update_position(input, listbox);
        }
    }

    fn on_focused_changed(&self, focused: Option<&T>) {
        let doc = &self.document;
        let previous = self.marked.lock().take();
        if let Some(previous) = previous {
            doc.remove_attribute(previous, "aria-selected");
        }

        let node = focused.and_then(|item| self.node_for(item));
        if let Some(node) = node {
            doc.scroll_into_view(node, ScrollBlock::Nearest);
            doc.set_attribute(node, "aria-selected", "true");
            *self.marked.lock() = Some(node);
        }

        let Some(input) = self.nodes().input else {
            return;
        };
        match focused {
            Some(item) => {
                let id = node.map(|node| doc.id(node)).unwrap_or_default();
                if id.is_empty() {
                    let err = AriaError::MissingItemId {
                        item: item.value().to_string(),
                    };
                    tracing::error!(target: targets::COMBOBOX, %err, "focused option cannot be referenced");
                    panic!("{err}");
                }
                doc.set_attribute(input, "aria-activedescendant", &id);
            }
            None => doc.remove_attribute(input, "aria-activedescendant"),
        }
    }

    fn on_query_changed(&self, query: &str) {
        self.write_input_value(query);
    }

    // -------------------------------------------------------------------------
    // Event handlers
    // -------------------------------------------------------------------------

    fn on_input_input(self: &Arc<Self>, event: &mut DomEvent) {
        let value = event
            .value
            .clone()
            .unwrap_or_else(|| self.document.value(event.target));
        self.focused.set(None);
        self.query.set(value);
        self.refilter();
        self.show_listbox();
    }

    fn on_input_focus(&self) {
        if self.options.refilter_on_focus {
            self.refilter();
        }
        if self.options.show_on_focus {
            self.open_on_focus();
        }
    }

    fn on_input_blur(self: &Arc<Self>, event: &mut DomEvent) {
        let nodes = self.nodes();
        if let Some(related) = event.related_target {
            let into_listbox = nodes
                .listbox
                .is_some_and(|listbox| self.document.contains(listbox, related));
            if into_listbox {
                // Keep focus on the input so the next blur is seen here.
                tracing::trace!(target: targets::COMBOBOX, "blur into listbox, refocusing input");
                if let Some(input) = nodes.input {
                    self.document.focus(input);
                }
                return;
            }
            if nodes.button == Some(related) {
                tracing::trace!(target: targets::COMBOBOX, "blur to toggle button ignored");
                return;
            }
        }
        self.listbox_visible.set(false);
    }

    fn on_input_keydown(self: &Arc<Self>, event: &mut DomEvent) {
        let _span = PerfSpan::new("combobox.keydown");
        let Some(key) = event.key else { return };
        tracing::trace!(target: targets::COMBOBOX, ?key, "keydown");
        match key {
            Key::ArrowDown => {
                event.prevent_default();
                self.move_focus(true);
            }
            Key::ArrowUp => {
                event.prevent_default();
                self.move_focus(false);
            }
            Key::Home | Key::End | Key::ArrowLeft | Key::ArrowRight => {
                self.focused.set(None);
            }
            Key::Enter => {
                if let Some(item) = self.focused.get() {
                    self.accept(item);
                }
            }
            Key::Escape | Key::Tab => {
                self.listbox_visible.set(false);
            }
            _ => {}
        }
    }

    fn on_button_pointer_down(self: &Arc<Self>, event: &mut DomEvent) {
        event.prevent_default();
        let was_visible = self.listbox_visible.get();
        if let Some(input) = self.nodes().input {
            self.document.focus(input);
        }
        self.listbox_visible.set(!was_visible);
    }

    fn on_item_mouse_enter(self: &Arc<Self>, event: &mut DomEvent) {
        let item = self.item_nodes.lock().get(event.current_target).cloned();
        if item.is_some() {
            self.set_focused(item);
        }
    }
}

impl<T: Item> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some((store, id)) = self.source.lock().take() {
            store.unsubscribe(id);
        }
    }
}

fn expanded(visible: bool) -> &'static str {
    if visible { "true" } else { "false" }
}

static_assertions::assert_impl_all!(Combobox<Value>: Send, Sync);
static_assertions::assert_impl_all!(ItemAttachment<Value>: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn values(names: &[&str]) -> Vec<Value> {
        names.iter().copied().map(Value::from).collect()
    }

    fn setup(names: &[&str]) -> (Arc<MemoryDocument>, Combobox<Value>) {
        let doc = Arc::new(MemoryDocument::new());
        let combobox = Combobox::new(doc.clone(), values(names), ComboboxOptions::new());
        (doc, combobox)
    }

    #[test]
    fn test_initial_state() {
        let (_doc, combobox) = setup(&["foo", "bar"]);
        assert!(!combobox.listbox_visible().get());
        assert_eq!(combobox.filtered().get(), values(&["foo", "bar"]));
        assert_eq!(combobox.focused().get(), None);
        assert_eq!(combobox.query().get(), "");
    }

    #[test]
    fn test_hiding_clears_focus() {
        let (_doc, combobox) = setup(&["foo", "bar"]);
        combobox.open();
        combobox.inner.set_focused(Some(Value::from("bar")));
        assert_eq!(combobox.focused().get(), Some(Value::from("bar")));

        combobox.close();
        assert_eq!(combobox.focused().get(), None);
    }

    #[test]
    fn test_focus_refused_while_hidden_or_unlisted() {
        let (_doc, combobox) = setup(&["foo", "bar"]);
        combobox.inner.set_focused(Some(Value::from("foo")));
        assert_eq!(combobox.focused().get(), None);

        combobox.open();
        combobox.inner.set_focused(Some(Value::from("qux")));
        assert_eq!(combobox.focused().get(), None);
    }

    #[test]
    fn test_move_focus_clamps_without_input() {
        let (_doc, combobox) = setup(&["a", "b"]);
        combobox.inner.move_focus(true);
        assert!(combobox.listbox_visible().get());
        assert_eq!(combobox.focused().get(), Some(Value::from("a")));
        combobox.inner.move_focus(true);
        combobox.inner.move_focus(true);
        assert_eq!(combobox.focused().get(), Some(Value::from("b")));
        combobox.inner.move_focus(false);
        combobox.inner.move_focus(false);
        assert_eq!(combobox.focused().get(), Some(Value::from("a")));
    }

    #[test]
    fn test_move_focus_on_empty_view() {
        let (_doc, combobox) = setup(&[]);
        combobox.inner.move_focus(true);
        assert!(!combobox.listbox_visible().get());
        assert_eq!(combobox.focused().get(), None);
    }

    #[test]
    fn test_open_respects_show_when_empty() {
        let doc = Arc::new(MemoryDocument::new());
        let combobox = Combobox::new(
            doc,
            Vec::<Value>::new(),
            ComboboxOptions::new().with_show_when_empty(true),
        );
        combobox.open();
        assert!(combobox.listbox_visible().get());
    }

    #[test]
    fn test_live_source_is_released_on_drop() {
        let doc = Arc::new(MemoryDocument::new());
        let source = Store::new(values(&["a"]));
        let combobox = Combobox::new(doc, source.clone(), ComboboxOptions::new());
        assert_eq!(source.subscriber_count(), 1);

        source.set(values(&["a", "b"]));
        assert_eq!(combobox.filtered().get(), values(&["a", "b"]));

        drop(combobox);
        assert_eq!(source.subscriber_count(), 0);
    }
}
