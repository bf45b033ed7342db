//! Catalog entry types and their AR transform

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::session::SessionError;

/// Three-component vector used for scale, position and rotation
///
/// Documents may spell it as an array (`[0, 180, 0]`) or as an A-Frame
/// style attribute string (`"0 180 0"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vec3(pub [f32; 3]);

impl Vec3 {
    pub const ZERO: Vec3 = Vec3([0.0, 0.0, 0.0]);
    pub const ONE: Vec3 = Vec3([1.0, 1.0, 1.0]);

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self([x, y, z])
    }

    pub fn splat(v: f32) -> Self {
        Self([v, v, v])
    }

    pub fn x(&self) -> f32 {
        self.0[0]
    }

    pub fn y(&self) -> f32 {
        self.0[1]
    }

    pub fn z(&self) -> f32 {
        self.0[2]
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0[0], self.0[1], self.0[2])
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseVec3Error {
    #[error("expected 3 components, found {0}")]
    WrongArity(usize),
    #[error("invalid component '{0}'")]
    InvalidComponent(String),
}

impl FromStr for Vec3 {
    type Err = ParseVec3Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseVec3Error::WrongArity(parts.len()));
        }
        let mut out = [0.0f32; 3];
        for (slot, part) in out.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| ParseVec3Error::InvalidComponent(part.to_string()))?;
        }
        Ok(Self(out))
    }
}

impl<'de> Deserialize<'de> for Vec3 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Array([f32; 3]),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Array(v) => Ok(Vec3(v)),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Stable unique key of a catalog entry
///
/// Catalog documents may use integers or strings; both normalize to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for EntryId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            Unsigned(u64),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Int(n) => EntryId(n.to_string()),
            Repr::Unsigned(n) => EntryId(n.to_string()),
            Repr::Text(s) => EntryId(s),
        })
    }
}

/// Initial transform of a model relative to the marker frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_zero")]
    pub position: Vec3,
    /// Euler angles in degrees
    #[serde(default = "default_zero")]
    pub rotation: Vec3,
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_zero() -> Vec3 {
    Vec3::ZERO
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            position: default_zero(),
            rotation: default_zero(),
        }
    }
}

impl ModelTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Continuous rotation animation applied to the bound model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    #[serde(default = "default_spin_axis")]
    pub axis: Vec3,
    pub degrees_per_second: f32,
}

fn default_spin_axis() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// One viewable item of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Pre-formatted price, shown as-is
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Reference to the glTF/GLB asset shown in AR
    #[serde(default, alias = "modelRef", alias = "model_ref")]
    pub model: String,
    #[serde(flatten)]
    pub transform: ModelTransform,
    #[serde(default)]
    pub spin: Option<Spin>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<EntryId>, name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price: String::new(),
            image: None,
            category: None,
            model: model.into(),
            transform: ModelTransform::default(),
            spin: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_transform(mut self, transform: ModelTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    /// Check that the entry can be opened in AR
    pub fn validate_for_ar(&self) -> Result<(), SessionError> {
        if self.model.trim().is_empty() {
            return Err(SessionError::InvalidEntry {
                id: self.id.clone(),
                reason: "model reference is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve an asset reference against a base path
///
/// Absolute URLs and root-relative paths are returned unchanged.
pub fn resolve_asset(base: &str, reference: &str) -> String {
    if reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("data:")
        || reference.starts_with('/')
        || base.is_empty()
    {
        return reference.to_string();
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        reference.trim_start_matches("./")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_from_attribute_string() {
        let v: Vec3 = "0 180 0".parse().unwrap();
        assert_eq!(v, Vec3::new(0.0, 180.0, 0.0));

        let v: Vec3 = "  5   5 5 ".parse().unwrap();
        assert_eq!(v, Vec3::splat(5.0));

        assert_eq!("1 2".parse::<Vec3>(), Err(ParseVec3Error::WrongArity(2)));
        assert!(matches!(
            "1 x 2".parse::<Vec3>(),
            Err(ParseVec3Error::InvalidComponent(_))
        ));
    }

    #[test]
    fn test_vec3_deserialize_both_forms() {
        let a: Vec3 = serde_json::from_str("[1, 2.5, 3]").unwrap();
        let b: Vec3 = serde_json::from_str("\"1 2.5 3\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1 2.5 3");
    }

    #[test]
    fn test_entry_defaults_to_identity_transform() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"id": 1, "name": "Pizza", "model": "models/pizza.glb"}"#)
                .unwrap();

        assert_eq!(entry.id, EntryId::from(1u64));
        assert!(entry.transform.is_identity());
        assert_eq!(entry.transform.scale, Vec3::ONE);
        assert_eq!(entry.transform.rotation, Vec3::ZERO);
        assert!(entry.spin.is_none());
    }

    #[test]
    fn test_entry_id_forms() {
        let ids: Vec<EntryId> =
            serde_json::from_str(r#"[-3, 7, 18446744073709551615, "pizza"]"#).unwrap();
        assert_eq!(ids[0].as_str(), "-3");
        assert_eq!(ids[1], EntryId::from(7u64));
        assert_eq!(ids[2], EntryId::from(u64::MAX));
        assert_eq!(ids[3].as_str(), "pizza");

        // Flattened entries buffer their fields before the id is decoded
        let entry: CatalogEntry = serde_json::from_str(
            r#"{"id": 18446744073709551615, "name": "Pizza", "model": "pizza.glb", "scale": "2 2 2"}"#,
        )
        .unwrap();
        assert_eq!(entry.id.as_str(), "18446744073709551615");
    }

    #[test]
    fn test_entry_partial_transform() {
        let entry: CatalogEntry = serde_json::from_str(
            r#"{"id": "pizza", "name": "Pizza", "model": "pizza.glb",
                "scale": "5 5 5", "rotation": [0, 180, 0]}"#,
        )
        .unwrap();

        assert_eq!(entry.transform.scale, Vec3::splat(5.0));
        assert_eq!(entry.transform.position, Vec3::ZERO);
        assert_eq!(entry.transform.rotation, Vec3::new(0.0, 180.0, 0.0));
    }

    #[test]
    fn test_model_ref_alias() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"id": 2, "name": "Soda", "modelRef": "soda.glb"}"#).unwrap();
        assert_eq!(entry.model, "soda.glb");
    }

    #[test]
    fn test_validate_for_ar() {
        assert!(CatalogEntry::new(1u64, "Pizza", "a.glb").validate_for_ar().is_ok());

        let err = CatalogEntry::new(2u64, "Empty", "").validate_for_ar().unwrap_err();
        assert!(matches!(err, SessionError::InvalidEntry { ref id, .. } if id.as_str() == "2"));

        assert!(CatalogEntry::new(3u64, "Blank", "   ").validate_for_ar().is_err());
    }

    #[test]
    fn test_resolve_asset() {
        assert_eq!(resolve_asset("", "models/pizza.glb"), "models/pizza.glb");
        assert_eq!(resolve_asset("assets/", "./models/pizza.glb"), "assets/models/pizza.glb");
        assert_eq!(resolve_asset("assets", "/models/pizza.glb"), "/models/pizza.glb");
        assert_eq!(
            resolve_asset("assets", "https://cdn.example.com/pizza.glb"),
            "https://cdn.example.com/pizza.glb"
        );
    }
}
