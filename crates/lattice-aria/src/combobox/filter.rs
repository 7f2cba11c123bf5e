use super::Item;

/// Keep the items whose display string contains `query`, ignoring case.
///
/// Order is preserved. An empty query keeps everything. Case folding is
/// plain Unicode lowercasing, with no locale rules.
pub fn filter<T: Item>(items: &[T], query: &str) -> Vec<T> {
    let query = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.value().to_lowercase().contains(&query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combobox::Value;

    fn values(names: &[&str]) -> Vec<Value> {
        names.iter().copied().map(Value::from).collect()
    }

    #[test]
    fn test_filter_substring_keeps_order() {
        let items = values(&["foo", "bar", "baz"]);
        assert_eq!(filter(&items, "ba"), values(&["bar", "baz"]));
    }

    #[test]
    fn test_filter_ignores_case() {
        let items = values(&["Apple", "pineapple", "Banana"]);
        assert_eq!(filter(&items, "APP"), values(&["Apple", "pineapple"]));
    }

    #[test]
    fn test_filter_empty_query_and_no_match() {
        let items = values(&["foo", "bar"]);
        assert_eq!(filter(&items, ""), items);
        assert!(filter(&items, "zzz").is_empty());
        assert!(filter::<Value>(&[], "a").is_empty());
    }

    #[test]
    fn test_filter_matches_key_never() {
        let items = vec![Value::new("Paris").with_key("fr-75")];
        assert!(filter(&items, "fr").is_empty());
    }
}
