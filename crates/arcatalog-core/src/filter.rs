//! Category filtering for the catalog view

use std::fmt;

use crate::entry::CatalogEntry;

/// Label of the sentinel category that matches everything
pub const ALL_LABEL: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn from_label(label: &str) -> Self {
        if label == ALL_LABEL {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_LABEL,
            CategoryFilter::Named(name) => name,
        }
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => entry.category.as_deref() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entries visible under a filter, in their original order
pub fn filter_entries<'a>(entries: &'a [CatalogEntry], filter: &CategoryFilter) -> Vec<&'a CatalogEntry> {
    entries.iter().filter(|e| filter.matches(e)).collect()
}

/// Filter bar labels: "All" followed by each category in order of first use
pub fn category_labels(entries: &[CatalogEntry]) -> Vec<String> {
    let mut labels = vec![ALL_LABEL.to_string()];
    for category in entries.iter().filter_map(|e| e.category.as_deref()) {
        if !labels.iter().any(|l| l == category) {
            labels.push(category.to_string());
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new(1u64, "Margherita", "pizza.glb").with_category("Pizza"),
            CatalogEntry::new(2u64, "Cola", "cola.glb").with_category("Drinks"),
            CatalogEntry::new(3u64, "Salad", "salad.glb"),
            CatalogEntry::new(4u64, "Lemonade", "lemonade.glb").with_category("Drinks"),
            CatalogEntry::new(5u64, "Calzone", "calzone.glb").with_category("Pizza"),
        ]
    }

    #[test]
    fn test_all_returns_everything() {
        let entries = menu();
        let visible = filter_entries(&entries, &CategoryFilter::All);
        assert_eq!(visible.len(), entries.len());
        assert!(visible.iter().zip(&entries).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_named_category_preserves_order() {
        let entries = menu();
        let labels = category_labels(&entries);
        assert_eq!(labels, vec!["All", "Pizza", "Drinks"]);

        let drinks = CategoryFilter::from_label("Drinks");
        let ids: Vec<&str> = filter_entries(&entries, &drinks)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_drinks_only_menu() {
        let entries = vec![
            CatalogEntry::new(1u64, "Pizza", "pizza.glb"),
            CatalogEntry::new(2u64, "Cola", "cola.glb").with_category("Drinks"),
            CatalogEntry::new(3u64, "Burger", "burger.glb"),
            CatalogEntry::new(4u64, "Fries", "fries.glb"),
            CatalogEntry::new(5u64, "Shake", "shake.glb").with_category("Drinks"),
        ];
        assert_eq!(category_labels(&entries), vec!["All", "Drinks"]);

        let drinks = filter_entries(&entries, &CategoryFilter::from_label("Drinks"));
        assert_eq!(drinks, vec![&entries[1], &entries[4]]);
    }

    #[test]
    fn test_unknown_category_is_empty() {
        let entries = menu();
        assert!(filter_entries(&entries, &CategoryFilter::from_label("Desserts")).is_empty());
    }

    #[test]
    fn test_from_label_sentinel() {
        assert_eq!(CategoryFilter::from_label("All"), CategoryFilter::All);
        assert_eq!(CategoryFilter::All.to_string(), "All");
        assert_eq!(
            CategoryFilter::from_label("all"),
            CategoryFilter::Named("all".to_string())
        );
    }
}
