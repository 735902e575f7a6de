use super::item::{Item, ItemId, ItemReferences, ReferencePhoto};
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LibraryError {
    #[error("item name must not be empty")]
    EmptyName,

    #[error("an item needs at least one reference photo")]
    NoPhotos,

    #[error("difficulty {0} is outside 1..=3")]
    DifficultyOutOfRange(u8),

    #[error("item not found: {0}")]
    NotFound(ItemId),
}

/// In-memory item store. Items own their photos; removing an item drops them too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemLibrary {
    items: Vec<Item>,
}

impl ItemLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new item from its captured reference photos
    pub fn register(
        &mut self,
        name: &str,
        hint: &str,
        difficulty: u8,
        photos: Vec<ReferencePhoto>,
    ) -> Result<ItemId, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        if photos.is_empty() {
            return Err(LibraryError::NoPhotos);
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
            return Err(LibraryError::DifficultyOutOfRange(difficulty));
        }

        let mut item = Item::new(name).with_hint(hint.trim());
        item.difficulty = difficulty;
        item.photos = photos;

        let id = item.id;
        tracing::info!(item = %id, name, photos = item.photos.len(), "registered item");
        self.items.push(item);
        Ok(id)
    }

    /// Insert an already built item, replacing any item with the same id
    pub fn insert(&mut self, item: Item) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, id: ItemId) -> Result<Item, LibraryError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(LibraryError::NotFound(id))?;
        Ok(self.items.remove(index))
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Item> {
        let name = name.trim();
        self.items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items with at least one usable reference
    pub fn playable_items(&self) -> Vec<&Item> {
        self.items.iter().filter(|item| item.is_playable()).collect()
    }

    pub fn random_playable<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Item> {
        self.playable_items().choose(rng).copied()
    }

    /// Decoded reference sets for every item, in library order
    pub fn candidates(&self) -> Vec<ItemReferences> {
        self.items.iter().map(Item::references).collect()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open library: {:?}", path))?;
        let library: ItemLibrary = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse library: {:?}", path))?;

        tracing::info!("Loaded {} items from {:?}", library.len(), path);
        Ok(library)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("Failed to create library: {:?}", path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write library: {:?}", path))?;
        Ok(())
    }
}
