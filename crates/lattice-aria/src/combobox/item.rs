//! Combobox items and item sources.

use std::fmt;

use lattice_aria_core::Store;

/// A value that can be offered by a combobox.
///
/// Identity is `PartialEq`: the focused item is looked up in the filtered
/// view by equality.
pub trait Item: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The display string, matched against the query and written to the
    /// input on acceptance.
    fn value(&self) -> &str;

    /// A stable key used for the option's element id.
    fn key(&self) -> Option<&str> {
        None
    }

    /// The string the option's element id is derived from.
    fn id_slug(&self) -> &str {
        self.key().unwrap_or_else(|| self.value())
    }
}

/// The stock item: a display string with an optional key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub value: String,
    pub key: Option<String>,
}

impl Value {
    /// Create an item without a key.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            key: None,
        }
    }

    /// Set the key using builder pattern.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl Item for Value {
    fn value(&self) -> &str {
        &self.value
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Where a combobox takes its candidate items from.
#[derive(Debug, Clone)]
pub enum ItemSource<T> {
    /// A list supplied once.
    Static(Vec<T>),
    /// A live list. The combobox re-filters on every change.
    Live(Store<Vec<T>>),
}

impl<T> From<Vec<T>> for ItemSource<T> {
    fn from(items: Vec<T>) -> Self {
        ItemSource::Static(items)
    }
}

impl<T> From<Store<Vec<T>>> for ItemSource<T> {
    fn from(store: Store<Vec<T>>) -> Self {
        ItemSource::Live(store)
    }
}
