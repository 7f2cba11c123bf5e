//! Per-widget unique id prefixes.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PREFIX: AtomicU64 = AtomicU64::new(1);

/// Element ids derived from a prefix unique within the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetIds {
    prefix: String,
}

impl WidgetIds {
    /// Allocate a fresh prefix.
    pub fn new() -> Self {
        let raw = NEXT_PREFIX.fetch_add(1, Ordering::Relaxed);
        Self {
            prefix: format!("{raw:x}"),
        }
    }

    /// The bare prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn input(&self) -> String {
        format!("input-{}", self.prefix)
    }

    pub fn label(&self) -> String {
        format!("label-{}", self.prefix)
    }

    pub fn listbox(&self) -> String {
        format!("listbox-{}", self.prefix)
    }

    /// Id of a listbox option; whitespace in `slug` becomes `-`.
    pub fn item(&self, slug: &str) -> String {
        let slug: String = slug
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .collect();
        format!("item-{}-{slug}", self.prefix)
    }

    pub fn title(&self) -> String {
        format!("title-{}", self.prefix)
    }

    pub fn content(&self) -> String {
        format!("content-{}", self.prefix)
    }
}

impl Default for WidgetIds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_unique() {
        let a = WidgetIds::new();
        let b = WidgetIds::new();
        assert_ne!(a.prefix(), b.prefix());
        assert_ne!(a.input(), b.input());
    }

    #[test]
    fn test_item_id_replaces_whitespace() {
        let ids = WidgetIds::new();
        let id = ids.item("new york\tcity");
        assert_eq!(id, format!("item-{}-new-york-city", ids.prefix()));
    }

    #[test]
    fn test_id_shapes() {
        let ids = WidgetIds::new();
        let p = ids.prefix().to_string();
        assert_eq!(ids.label(), format!("label-{p}"));
        assert_eq!(ids.listbox(), format!("listbox-{p}"));
        assert_eq!(ids.title(), format!("title-{p}"));
        assert_eq!(ids.content(), format!("content-{p}"));
    }
}
