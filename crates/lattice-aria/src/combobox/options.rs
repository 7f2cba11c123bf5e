//! Combobox configuration.

use std::fmt;
use std::sync::Arc;

use crate::position::Positioner;

/// Callback invoked when an item is accepted.
pub type SelectionCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// How `show_on_focus` opens the listbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusOpenPolicy {
    /// Open only if there is something to show: matches exist, or
    /// `show_when_empty` is set.
    #[default]
    WhenMatches,
    /// Always open.
    Unconditional,
}

/// Options for a [`Combobox`](super::Combobox).
pub struct ComboboxOptions<T> {
    /// Show the listbox even when no item matches.
    pub show_when_empty: bool,
    /// Open the listbox when the input gains focus.
    pub show_on_focus: bool,
    pub focus_open_policy: FocusOpenPolicy,
    /// Re-run the filter when the input gains focus.
    pub refilter_on_focus: bool,
    pub on_selection: Option<SelectionCallback<T>>,
    /// Geometry collaborator for the listbox position. Defaults to a
    /// [`LayoutPositioner`](crate::position::LayoutPositioner) over the
    /// combobox's document.
    pub positioner: Option<Arc<dyn Positioner>>,
}

impl<T> ComboboxOptions<T> {
    pub fn new() -> Self {
        Self {
            show_when_empty: false,
            show_on_focus: false,
            focus_open_policy: FocusOpenPolicy::default(),
            refilter_on_focus: false,
            on_selection: None,
            positioner: None,
        }
    }

    /// Set `show_when_empty` using builder pattern.
    pub fn with_show_when_empty(mut self, show: bool) -> Self {
        self.show_when_empty = show;
        self
    }

    /// Set `show_on_focus` using builder pattern.
    pub fn with_show_on_focus(mut self, show: bool) -> Self {
        self.show_on_focus = show;
        self
    }

    /// Set the focus-open policy using builder pattern.
    pub fn with_focus_open_policy(mut self, policy: FocusOpenPolicy) -> Self {
        self.focus_open_policy = policy;
        self
    }

    /// Set `refilter_on_focus` using builder pattern.
    pub fn with_refilter_on_focus(mut self, refilter: bool) -> Self {
        self.refilter_on_focus = refilter;
        self
    }

    /// Set the selection callback using builder pattern.
    pub fn with_on_selection<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_selection = Some(Arc::new(callback));
        self
    }

    /// Set the positioner using builder pattern.
    pub fn with_positioner(mut self, positioner: Arc<dyn Positioner>) -> Self {
        self.positioner = Some(positioner);
        self
    }
}

impl<T> Default for ComboboxOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ComboboxOptions<T> {
    fn clone(&self) -> Self {
        Self {
            show_when_empty: self.show_when_empty,
            show_on_focus: self.show_on_focus,
            focus_open_policy: self.focus_open_policy,
            refilter_on_focus: self.refilter_on_focus,
            on_selection: self.on_selection.clone(),
            positioner: self.positioner.clone(),
        }
    }
}

impl<T> fmt::Debug for ComboboxOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComboboxOptions")
            .field("show_when_empty", &self.show_when_empty)
            .field("show_on_focus", &self.show_on_focus)
            .field("focus_open_policy", &self.focus_open_policy)
            .field("refilter_on_focus", &self.refilter_on_focus)
            .field("on_selection", &self.on_selection.is_some())
            .field("positioner", &self.positioner.is_some())
            .finish()
    }
}
