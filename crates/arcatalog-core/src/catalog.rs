//! Catalog documents and the catalog store
//!
//! A catalog is loaded once (bundled, from disk on the server, or fetched by
//! the browser) and is immutable for the rest of the session. Entries may be
//! listed at the top level or grouped under category labels:
//!
//! ```toml
//! title = "Pizzeria"
//!
//! [[group]]
//! label = "Pizza"
//!
//! [[group.entry]]
//! id = 1
//! name = "Margherita"
//! model = "models/pizza.glb"
//! scale = "5 5 5"
//! rotation = "0 180 0"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::entry::{CatalogEntry, EntryId};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse catalog JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("failed to parse catalog TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("duplicate entry id: {0}")]
    DuplicateId(EntryId),
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// A display-only grouping of entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub label: String,
    #[serde(default, rename = "entry")]
    pub entries: Vec<CatalogEntry>,
}

/// A parsed catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub title: Option<String>,
    /// Entries not belonging to any group
    #[serde(default, rename = "entry", skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<CatalogEntry>,
    #[serde(default, rename = "group", skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<CategoryGroup>,
}

impl Catalog {
    /// Build an ungrouped catalog
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self {
            title: None,
            entries,
            groups: Vec::new(),
        }
    }

    /// Parse a JSON catalog document, or a bare JSON array of entries
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let catalog = if content.trim_start().starts_with('[') {
            Self::from_entries(serde_json::from_str(content)?)
        } else {
            serde_json::from_str(content)?
        };
        catalog.normalized()
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.normalized()
    }

    /// Load a catalog file, choosing the parser by extension
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            Some("toml") => Self::from_toml(&content)?,
            other => {
                return Err(CatalogError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        info!(path = %path.display(), entries = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Fill in group categories and reject duplicate ids
    fn normalized(mut self) -> Result<Self, CatalogError> {
        for group in &mut self.groups {
            for entry in &mut group.entries {
                if entry.category.is_none() {
                    entry.category = Some(group.label.clone());
                }
            }
        }

        {
            let mut seen = HashSet::new();
            for entry in self.iter() {
                if !seen.insert(&entry.id) {
                    return Err(CatalogError::DuplicateId(entry.id.clone()));
                }
            }
        }

        Ok(self)
    }

    /// All entries in document order: ungrouped first, then each group
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.entries.iter()))
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.groups.iter().map(|g| g.entries.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &EntryId) -> Option<&CatalogEntry> {
        self.iter().find(|e| &e.id == id)
    }

    /// Groups for display, keyed by entry category in order of first use
    ///
    /// Grouped entries already carry their group label as category, so an
    /// ungrouped entry tagged with the same label lands in the same group.
    pub fn grouped(&self) -> Vec<CategoryGroup> {
        let mut groups: Vec<CategoryGroup> = Vec::new();

        for entry in self.iter() {
            let label = entry.category.clone().unwrap_or_default();
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.entries.push(entry.clone()),
                None => groups.push(CategoryGroup {
                    label,
                    entries: vec![entry.clone()],
                }),
            }
        }

        groups
    }
}

/// Read-only access to the catalog
pub trait CatalogStore {
    fn list_entries(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
    fn list_groups(&self) -> Result<Vec<CategoryGroup>, CatalogError>;
}

/// A catalog known up front
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    catalog: Catalog,
}

impl StaticCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl CatalogStore for StaticCatalog {
    fn list_entries(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.catalog.iter().cloned().collect())
    }

    fn list_groups(&self) -> Result<Vec<CategoryGroup>, CatalogError> {
        Ok(self.catalog.grouped())
    }
}

/// Load state of a fetched catalog
///
/// `Unavailable` is a failed load; `Ready` with no entries is a successful
/// load of an empty catalog.
#[derive(Debug, Clone, Default)]
pub enum CatalogLoad {
    #[default]
    Loading,
    Ready(Catalog),
    Unavailable(String),
}

impl CatalogLoad {
    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            CatalogLoad::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }
}

impl CatalogStore for CatalogLoad {
    fn list_entries(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        match self {
            CatalogLoad::Ready(catalog) => Ok(catalog.iter().cloned().collect()),
            CatalogLoad::Loading => Err(CatalogError::Unavailable("still loading".to_string())),
            CatalogLoad::Unavailable(reason) => Err(CatalogError::Unavailable(reason.clone())),
        }
    }

    fn list_groups(&self) -> Result<Vec<CategoryGroup>, CatalogError> {
        match self {
            CatalogLoad::Ready(catalog) => Ok(catalog.grouped()),
            CatalogLoad::Loading => Err(CatalogError::Unavailable("still loading".to_string())),
            CatalogLoad::Unavailable(reason) => Err(CatalogError::Unavailable(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Vec3;
    use std::io::Write;

    const MENU_TOML: &str = r#"
title = "Pizzeria"

[[entry]]
id = "special"
name = "Chef's Special"
model = "models/special.glb"

[[group]]
label = "Pizza"

[[group.entry]]
id = 1
name = "Margherita"
price = "$9.50"
model = "models/pizza.glb"
scale = "5 5 5"
rotation = "0 180 0"

[[group]]
label = "Drinks"

[[group.entry]]
id = 2
name = "Lemonade"
model = "models/lemonade.glb"
category = "Cold Drinks"
"#;

    #[test]
    fn test_parse_grouped_toml() {
        let catalog = Catalog::from_toml(MENU_TOML).unwrap();

        assert_eq!(catalog.title.as_deref(), Some("Pizzeria"));
        assert_eq!(catalog.len(), 3);

        let ids: Vec<&str> = catalog.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["special", "1", "2"]);

        let pizza = catalog.find(&EntryId::from(1u64)).unwrap();
        assert_eq!(pizza.category.as_deref(), Some("Pizza"));
        assert_eq!(pizza.transform.scale, Vec3::splat(5.0));
        assert_eq!(pizza.price, "$9.50");

        // An explicit category wins over the group label
        let lemonade = catalog.find(&EntryId::from(2u64)).unwrap();
        assert_eq!(lemonade.category.as_deref(), Some("Cold Drinks"));
    }

    #[test]
    fn test_parse_json_array() {
        let catalog = Catalog::from_json(
            r#"[{"id": 1, "name": "Pizza", "model": "a.glb"},
                {"id": 2, "name": "Mystery", "model": ""}]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.groups.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Catalog::from_json(
            r#"{"entry": [{"id": 1, "name": "A"}],
                "group": [{"label": "X", "entry": [{"id": "1", "name": "B"}]}]}"#,
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateId(id) if id.as_str() == "1"));
    }

    #[test]
    fn test_from_path_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("menu.toml");
        std::fs::File::create(&toml_path)
            .unwrap()
            .write_all(MENU_TOML.as_bytes())
            .unwrap();
        assert_eq!(Catalog::from_path(&toml_path).unwrap().len(), 3);

        let yaml_path = dir.path().join("menu.yaml");
        std::fs::write(&yaml_path, "entries: []").unwrap();
        assert!(matches!(
            Catalog::from_path(&yaml_path),
            Err(CatalogError::UnsupportedFormat(ext)) if ext == "yaml"
        ));

        assert!(matches!(
            Catalog::from_path(&dir.path().join("missing.json")),
            Err(CatalogError::IoError(_))
        ));
    }

    #[test]
    fn test_json_round_trip_of_toml_catalog() {
        let catalog = Catalog::from_toml(MENU_TOML).unwrap();
        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(Catalog::from_json(&json).unwrap(), catalog);
    }

    #[test]
    fn test_static_store_empty_is_success() {
        let store = StaticCatalog::default();
        assert!(store.list_entries().unwrap().is_empty());
        assert!(store.list_groups().unwrap().is_empty());
    }

    #[test]
    fn test_grouped_collects_ungrouped_by_category() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new(1u64, "Cola", "cola.glb").with_category("Drinks"),
            CatalogEntry::new(2u64, "Pizza", "pizza.glb").with_category("Food"),
            CatalogEntry::new(3u64, "Tea", "tea.glb").with_category("Drinks"),
        ]);

        let groups = StaticCatalog::new(catalog).list_groups().unwrap();
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Drinks", "Food"]);
        assert_eq!(groups[0].entries.len(), 2);
    }

    #[test]
    fn test_grouped_merges_same_label() {
        let catalog = Catalog::from_toml(
            r#"
[[entry]]
id = 1
name = "Cola"
model = "cola.glb"
category = "Drinks"

[[group]]
label = "Drinks"

[[group.entry]]
id = 2
name = "Tea"
model = "tea.glb"
"#,
        )
        .unwrap();

        let groups = catalog.grouped();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Drinks");
        let names: Vec<&str> = groups[0].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Cola", "Tea"]);
    }

    #[test]
    fn test_grouped_follows_explicit_category() {
        let groups = Catalog::from_toml(MENU_TOML).unwrap().grouped();
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["", "Pizza", "Cold Drinks"]);
    }

    #[test]
    fn test_load_states() {
        assert!(matches!(
            CatalogLoad::Loading.list_entries(),
            Err(CatalogError::Unavailable(_))
        ));
        assert!(matches!(
            CatalogLoad::Unavailable("HTTP 500".to_string()).list_entries(),
            Err(CatalogError::Unavailable(reason)) if reason == "HTTP 500"
        ));

        let ready = CatalogLoad::Ready(Catalog::default());
        assert!(ready.list_entries().unwrap().is_empty());
        assert!(ready.catalog().is_some());
    }
}
