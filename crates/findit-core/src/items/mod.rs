//! Registered items, their reference photos and the library holding them

pub mod item;
pub mod library;

pub use item::{Item, ItemId, ItemReferences, ReferencePhoto};
pub use library::{ItemLibrary, LibraryError};
