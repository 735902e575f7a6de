//! FindIt core data model
//!
//! Feature vectors, the items they describe, and the library that stores them.

pub mod feature;
pub mod items;

pub use feature::{DistanceMetric, FeatureError, FeatureVector};
pub use items::{Item, ItemId, ItemLibrary, ItemReferences, LibraryError, ReferencePhoto};
