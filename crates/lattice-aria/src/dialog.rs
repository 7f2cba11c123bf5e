//! Modal dialog behavior.
//!
//! A [`Dialog`] tracks whether the dialog is open and wires the ARIA
//! relationships between the dialog container, its title and its content.
//! Rendering the dialog (or not) from [`Dialog::is_open`] is up to the host.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lattice_aria::dialog::{Dialog, DialogOptions};
//! use lattice_aria::dom::{Document, MemoryDocument};
//!
//! let doc = Arc::new(MemoryDocument::new());
//! let open_button = doc.create_element("button");
//! let container = doc.create_element("div");
//! let heading = doc.create_child(container, "h2").unwrap();
//!
//! let dialog = Dialog::new(doc.clone(), DialogOptions::default());
//! let _trigger = dialog.trigger(open_button);
//! let _dialog = dialog.dialog(container);
//! let _title = dialog.title(heading);
//!
//! doc.click(open_button);
//! assert!(dialog.is_open().get());
//! assert_eq!(doc.attribute(container, "aria-labelledby"), Some(dialog.title_id()));
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use lattice_aria_core::Store;
use lattice_aria_core::logging::targets;

use crate::attachment::Attachment;
use crate::dom::{Document, DomEvent, EventType, Key, Listener, NodeId};
use crate::ids::WidgetIds;

/// Options for a [`Dialog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogOptions {
    /// Close when the dialog container itself (the backdrop area around the
    /// content) is clicked.
    pub click_outside_to_close: bool,
    /// Close on Escape.
    pub close_on_escape: bool,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            click_outside_to_close: false,
            close_on_escape: true,
        }
    }
}

impl DialogOptions {
    /// Set `click_outside_to_close` using builder pattern.
    pub fn with_click_outside_to_close(mut self, close: bool) -> Self {
        self.click_outside_to_close = close;
        self
    }

    /// Set `close_on_escape` using builder pattern.
    pub fn with_close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct DialogNodes {
    dialog: Option<NodeId>,
    title: Option<NodeId>,
}

struct DialogInner {
    document: Arc<dyn Document>,
    options: DialogOptions,
    ids: WidgetIds,
    is_open: Store<bool>,
    nodes: Mutex<DialogNodes>,
}

/// A modal dialog.
///
/// Cheap to clone: clones control the same dialog.
#[derive(Clone)]
pub struct Dialog {
    inner: Arc<DialogInner>,
}

impl Dialog {
    pub fn new(document: Arc<dyn Document>, options: DialogOptions) -> Self {
        let ids = WidgetIds::new();
        let is_open = Store::new(false);
        let prefix = ids.prefix().to_string();
        is_open.connect(move |open| {
            tracing::debug!(target: targets::DIALOG, prefix = %prefix, open = *open, "dialog toggled");
        });

        Self {
            inner: Arc::new(DialogInner {
                document,
                options,
                ids,
                is_open,
                nodes: Mutex::new(DialogNodes::default()),
            }),
        }
    }

    /// Whether the dialog is open.
    pub fn is_open(&self) -> Store<bool> {
        self.inner.is_open.clone()
    }

    pub fn show(&self) {
        self.inner.is_open.set(true);
    }

    pub fn hide(&self) {
        self.inner.is_open.set(false);
    }

    pub fn toggle(&self) {
        self.inner.is_open.update(|open| !open);
    }

    /// Id assigned to the title.
    pub fn title_id(&self) -> String {
        self.inner.ids.title()
    }

    /// Id assigned to the content.
    pub fn content_id(&self) -> String {
        self.inner.ids.content()
    }

    /// Attach to the element that opens the dialog.
    pub fn trigger(&self, node: NodeId) -> Attachment {
        let mut attachment = Attachment::new(self.inner.document.clone(), node);
        attachment.listen(EventType::Click, self.on_click(|dialog| dialog.show()));
        attachment
    }

    /// Attach to the dialog container.
    pub fn dialog(&self, node: NodeId) -> Attachment {
        let inner = &self.inner;
        let doc = &inner.document;
        doc.set_attribute(node, "role", "dialog");
        doc.set_attribute(node, "aria-modal", "true");
        doc.set_attribute(
            node,
            "aria-describedby",
            &format!("{} {}", inner.ids.title(), inner.ids.content()),
        );
        let has_title = {
            let mut nodes = inner.nodes.lock();
            nodes.dialog = Some(node);
            nodes.title.is_some()
        };
        if has_title {
            doc.set_attribute(node, "aria-labelledby", &inner.ids.title());
        }

        let mut attachment = Attachment::new(doc.clone(), node);
        if inner.options.click_outside_to_close {
            let weak = Arc::downgrade(inner);
            attachment.listen(
                EventType::Click,
                Arc::new(move |event: &mut DomEvent| {
                    if event.target == event.current_target
                        && let Some(inner) = weak.upgrade()
                    {
                        inner.is_open.set(false);
                    }
                }),
            );
        }
        if inner.options.close_on_escape {
            let weak = Arc::downgrade(inner);
            attachment.listen(
                EventType::KeyDown,
                Arc::new(move |event: &mut DomEvent| {
                    if event.key == Some(Key::Escape)
                        && let Some(inner) = weak.upgrade()
                    {
                        inner.is_open.set(false);
                    }
                }),
            );
        }

        let weak = Arc::downgrade(inner);
        attachment.on_detach(move || {
            if let Some(inner) = weak.upgrade() {
                let mut nodes = inner.nodes.lock();
                if nodes.dialog == Some(node) {
                    nodes.dialog = None;
                }
            }
        })
    }

    /// Attach to the element naming the dialog.
    ///
    /// Without a title, the host must set `aria-label` on the dialog.
    pub fn title(&self, node: NodeId) -> Attachment {
        let inner = &self.inner;
        let doc = &inner.document;
        doc.set_attribute(node, "id", &inner.ids.title());
        let dialog = {
            let mut nodes = inner.nodes.lock();
            nodes.title = Some(node);
            nodes.dialog
        };
        if let Some(dialog) = dialog {
            doc.set_attribute(dialog, "aria-labelledby", &inner.ids.title());
        }

        let weak = Arc::downgrade(inner);
        Attachment::new(doc.clone(), node).on_detach(move || {
            let Some(inner) = weak.upgrade() else { return };
            let dialog = {
                let mut nodes = inner.nodes.lock();
                if nodes.title != Some(node) {
                    return;
                }
                nodes.title = None;
                nodes.dialog
            };
            if let Some(dialog) = dialog {
                inner.document.remove_attribute(dialog, "aria-labelledby");
            }
        })
    }

    /// Attach to the element describing the dialog's purpose.
    pub fn content(&self, node: NodeId) -> Attachment {
        let doc = &self.inner.document;
        doc.set_attribute(node, "id", &self.inner.ids.content());
        Attachment::new(doc.clone(), node)
    }

    /// Attach to a button that closes the dialog.
    pub fn close(&self, node: NodeId) -> Attachment {
        let mut attachment = Attachment::new(self.inner.document.clone(), node);
        attachment.listen(EventType::Click, self.on_click(|dialog| dialog.hide()));
        attachment
    }

    fn on_click(&self, action: fn(&Dialog)) -> Listener {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |_: &mut DomEvent| {
            if let Some(inner) = weak.upgrade() {
                action(&Dialog { inner });
            }
        })
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("prefix", &self.inner.ids.prefix())
            .field("is_open", &self.inner.is_open.get())
            .field("options", &self.inner.options)
            .finish()
    }
}

static_assertions::assert_impl_all!(Dialog: Send, Sync);
