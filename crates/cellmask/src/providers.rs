//! Narrow contracts with the subsystems around the engine, plus in-memory
//! implementations for embedding and tests.

use std::collections::HashMap;

use crate::{error::Result, model::Image, validation::Destination};

/// Supplies images one at a time. Every fetch returns a fresh source image.
pub trait NavigationProvider {
    fn current_image(&mut self) -> Result<Option<Image>>;
    fn next_image(&mut self) -> Result<Option<Image>>;
    fn previous_image(&mut self) -> Result<Option<Image>>;
    /// Moves to `index` when it exists.
    fn image_at(&mut self, index: usize) -> Result<Option<Image>>;
    fn image_count(&self) -> usize;
    fn current_index(&self) -> usize;
}

/// Expected region counts, keyed by image name without extension.
pub trait ReferenceCounts {
    fn lookup_reference_count(&self, image_name: &str) -> Option<u32>;
}

impl<T: ReferenceCounts + ?Sized> ReferenceCounts for Box<T> {
    fn lookup_reference_count(&self, image_name: &str) -> Option<u32> {
        (**self).lookup_reference_count(image_name)
    }
}

/// Writes images somewhere. The engine picks the destination, never the path.
pub trait PersistenceProvider {
    fn save(&mut self, image: &Image, name: &str, format: &str, destination: &Destination) -> Result<()>;
}

/// Navigator over images already held in memory; wraps around at both ends.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNavigator {
    images: Vec<Image>,
    index: usize,
}

impl InMemoryNavigator {
    pub fn new(images: Vec<Image>) -> Self {
        Self { images, index: 0 }
    }

    fn fetch(&self) -> Option<Image> {
        self.images.get(self.index).cloned()
    }
}

impl NavigationProvider for InMemoryNavigator {
    fn current_image(&mut self) -> Result<Option<Image>> {
        Ok(self.fetch())
    }

    fn next_image(&mut self) -> Result<Option<Image>> {
        if !self.images.is_empty() {
            self.index = (self.index + 1) % self.images.len();
        }
        Ok(self.fetch())
    }

    fn previous_image(&mut self) -> Result<Option<Image>> {
        if !self.images.is_empty() {
            self.index = (self.index + self.images.len() - 1) % self.images.len();
        }
        Ok(self.fetch())
    }

    fn image_at(&mut self, index: usize) -> Result<Option<Image>> {
        if index >= self.images.len() {
            return Ok(None);
        }
        self.index = index;
        Ok(self.fetch())
    }

    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn current_index(&self) -> usize {
        self.index
    }
}

/// Fixed table of reference counts.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceCounts {
    counts: HashMap<String, u32>,
}

impl StaticReferenceCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_name: impl Into<String>, count: u32) {
        self.counts.insert(image_name.into(), count);
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u32)> for StaticReferenceCounts {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self { counts: iter.into_iter().collect() }
    }
}

impl ReferenceCounts for StaticReferenceCounts {
    fn lookup_reference_count(&self, image_name: &str) -> Option<u32> {
        self.counts.get(image_name).copied()
    }
}

/// No reference data at all; every image routes as `NoReference`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceCounts;

impl ReferenceCounts for NoReferenceCounts {
    fn lookup_reference_count(&self, _image_name: &str) -> Option<u32> {
        None
    }
}

/// One recorded save.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedImage {
    pub name: String,
    pub format: String,
    pub destination: Destination,
    pub covered_cells: usize,
}

/// Persistence that only remembers what it was asked to save.
#[derive(Debug, Clone, Default)]
pub struct RecordingPersistence {
    pub saved: Vec<SavedImage>,
}

impl PersistenceProvider for RecordingPersistence {
    fn save(&mut self, image: &Image, name: &str, format: &str, destination: &Destination) -> Result<()> {
        self.saved.push(SavedImage {
            name: name.to_string(),
            format: format.to_string(),
            destination: destination.clone(),
            covered_cells: image.mask().covered_count(),
        });
        Ok(())
    }
}
