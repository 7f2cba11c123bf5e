//! Lattice ARIA - headless, accessible UI behaviors.
//!
//! Behaviors attach to nodes of a host document and keep their ARIA
//! attributes, keyboard interaction and focus handling correct. They never
//! render: the host renders from the state each behavior publishes as
//! [`Store`]s.
//!
//! - [`combobox`]: autocomplete input with a filtered listbox
//! - [`dialog`]: modal dialog open state and labelling
//! - [`floating`]: positioning a floating node next to a reference node
//!
//! The host document is reached through the [`dom::Document`] trait.
//! [`dom::MemoryDocument`] is a headless implementation for tests and
//! server-side use.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lattice_aria::combobox::{Combobox, ComboboxOptions, Value};
//! use lattice_aria::dom::{Key, MemoryDocument};
//!
//! let doc = Arc::new(MemoryDocument::new());
//! let input = doc.create_element("input");
//! let listbox = doc.create_element("ul");
//! let option = doc.create_child(listbox, "li").unwrap();
//!
//! let selected = Arc::new(parking_lot::Mutex::new(None));
//! let selected_clone = selected.clone();
//! let combobox = Combobox::new(
//!     doc.clone(),
//!     vec![Value::new("Lisbon")],
//!     ComboboxOptions::new().with_on_selection(move |item: &Value| {
//!         *selected_clone.lock() = Some(item.value.clone());
//!     }),
//! );
//! let _input = combobox.input(input);
//! let _listbox = combobox.listbox(listbox);
//! let _option = combobox.item(option, Value::new("Lisbon"));
//!
//! doc.key_down(input, Key::ArrowDown);
//! doc.key_down(input, Key::Enter);
//! assert_eq!(selected.lock().as_deref(), Some("Lisbon"));
//! ```

pub mod attachment;
pub mod combobox;
pub mod dialog;
pub mod dom;
pub mod error;
pub mod floating;
pub mod geometry;
pub mod ids;
pub mod position;

pub use attachment::Attachment;
pub use combobox::{Combobox, ComboboxOptions, Item, ItemAttachment, Value};
pub use dialog::{Dialog, DialogOptions};
pub use error::{AriaError, DocumentError};
pub use floating::{Floating, FloatingData, FloatingOptions};
pub use lattice_aria_core::{Signal, Store};
