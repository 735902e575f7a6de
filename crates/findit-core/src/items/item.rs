use crate::feature::{FeatureError, FeatureVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a registered item.
///
/// Ordered so that ties between items can be broken deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One captured reference of an item, stored as its serialized feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePhoto {
    pub id: Uuid,
    pub feature_blob: Vec<u8>,
    pub angle: String,
    pub created_at: DateTime<Utc>,
}

impl ReferencePhoto {
    pub fn new(feature: &FeatureVector, angle: impl Into<String>) -> Self {
        Self::from_blob(feature.to_bytes(), angle)
    }

    /// Wrap an already serialized blob (e.g. read back from storage)
    pub fn from_blob(feature_blob: Vec<u8>, angle: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            feature_blob,
            angle: angle.into(),
            created_at: Utc::now(),
        }
    }

    pub fn feature(&self) -> Result<FeatureVector, FeatureError> {
        FeatureVector::from_bytes(&self.feature_blob)
    }
}

/// An object the player can be asked to find
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub hint: String,
    pub difficulty: u8,
    pub created_at: DateTime<Utc>,
    pub photos: Vec<ReferencePhoto>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            hint: String::new(),
            difficulty: 2,
            created_at: Utc::now(),
            photos: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn with_photo(mut self, photo: ReferencePhoto) -> Self {
        self.photos.push(photo);
        self
    }

    /// Decode every reference vector, skipping blobs that fail to decode
    pub fn reference_vectors(&self) -> Vec<FeatureVector> {
        self.photos
            .iter()
            .filter_map(|photo| match photo.feature() {
                Ok(vector) => Some(vector),
                Err(e) => {
                    tracing::warn!(item = %self.id, photo = %photo.id, "skipping reference: {}", e);
                    None
                }
            })
            .collect()
    }

    /// An item can be played only if at least one reference decodes
    pub fn is_playable(&self) -> bool {
        self.photos.iter().any(|photo| photo.feature().is_ok())
    }

    pub fn references(&self) -> ItemReferences {
        ItemReferences {
            id: self.id,
            name: self.name.clone(),
            references: self.reference_vectors(),
        }
    }
}

/// Decoded view of one item, as handed to recognition
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReferences {
    pub id: ItemId,
    pub name: String,
    pub references: Vec<FeatureVector>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_photos_are_skipped() {
        let good = FeatureVector::new(1, vec![1.0, 2.0]).unwrap();
        let item = Item::new("mug")
            .with_photo(ReferencePhoto::from_blob(vec![1, 2, 3], "front"))
            .with_photo(ReferencePhoto::new(&good, "left"));

        assert!(item.is_playable());
        assert_eq!(item.reference_vectors(), vec![good]);
    }

    #[test]
    fn references_view_is_exported_at_the_crate_root() {
        let good = FeatureVector::new(1, vec![0.5]).unwrap();
        let item = Item::new("mug").with_photo(ReferencePhoto::new(&good, "front"));

        let view: crate::ItemReferences = item.references();
        assert_eq!(view.id, item.id);
        assert_eq!(view.name, "mug");
        assert_eq!(view.references, vec![good]);
    }

    #[test]
    fn item_without_decodable_photo_is_not_playable() {
        let item = Item::new("mug").with_photo(ReferencePhoto::from_blob(Vec::new(), "front"));
        assert!(!item.is_playable());
        assert!(item.references().references.is_empty());
    }
}
