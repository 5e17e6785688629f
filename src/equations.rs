//! Equation image cache.
//!
//! Equation particles draw pre-rendered bitmaps described by a JSON
//! manifest:
//!
//! ```json
//! { "equations": [
//!     { "id": "euler", "path": "eq/euler.png", "width": 320, "height": 64,
//!       "complexity": "simple", "description": "Euler's identity" }
//! ] }
//! ```
//!
//! Images are loaded on demand and memoized for the session. Loading is
//! fire-and-forget from the simulation's point of view: [`EquationCache::request`]
//! only queues the asset, and [`EquationCache::pump`] resolves a bounded
//! number of queued loads per frame. Until an asset is ready its particles
//! draw nothing. A failed load is logged and left alone; the next request for
//! it (when a particle is recycled) tries again.

use crate::error::AssetError;
use crate::spawn::SpawnContext;
use glam::Vec2;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// Index of an entry in the manifest.
pub type EquationHandle = usize;

/// Visual density tag of an equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationEntry {
    pub id: String,
    /// Path handed to the [`AssetSource`].
    pub path: String,
    /// Pixel width of the image.
    pub width: u32,
    /// Pixel height of the image.
    pub height: u32,
    pub complexity: Complexity,
    #[serde(default)]
    pub description: String,
}

impl EquationEntry {
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// The set of available equations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationManifest {
    pub equations: Vec<EquationEntry>,
}

impl EquationManifest {
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.equations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    #[inline]
    pub fn get(&self, handle: EquationHandle) -> Option<&EquationEntry> {
        self.equations.get(handle)
    }
}

/// Where image bytes come from.
pub trait AssetSource {
    /// Fetch the raw (encoded) bytes at `path`.
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// Reads assets relative to a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirectorySource {
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>, AssetError> {
        Ok(std::fs::read(self.root.join(path))?)
    }
}

/// Assets held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }
}

impl AssetSource for MemorySource {
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::Missing(path.to_string()))
    }
}

/// A decoded equation bitmap.
#[derive(Debug, Clone)]
pub struct EquationImage {
    pub pixels: RgbaImage,
}

/// Public view of an asset's load progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Pending,
    Ready,
    Failed,
}

#[derive(Debug)]
enum Slot {
    Unloaded,
    Pending,
    Ready(EquationImage),
    Failed,
}

/// On-demand, memoizing equation image loader.
pub struct EquationCache {
    manifest: EquationManifest,
    source: Box<dyn AssetSource>,
    slots: Vec<Slot>,
    queue: VecDeque<EquationHandle>,
    loads_per_frame: usize,
}

impl EquationCache {
    pub fn new(manifest: EquationManifest, source: impl AssetSource + 'static) -> Self {
        let slots = manifest.equations.iter().map(|_| Slot::Unloaded).collect();
        Self {
            manifest,
            source: Box::new(source),
            slots,
            queue: VecDeque::new(),
            loads_per_frame: 1,
        }
    }

    /// A cache with no equations. Equation particles spawn without an asset
    /// and draw nothing.
    pub fn empty() -> Self {
        Self::new(EquationManifest::default(), MemorySource::new())
    }

    /// How many queued loads [`pump`](Self::pump) resolves per call.
    pub fn with_loads_per_frame(mut self, loads: usize) -> Self {
        self.loads_per_frame = loads.max(1);
        self
    }

    #[inline]
    pub fn manifest(&self) -> &EquationManifest {
        &self.manifest
    }

    /// Manifest size of an asset, or `None` for an unknown handle.
    pub fn size(&self, handle: EquationHandle) -> Option<Vec2> {
        self.manifest.get(handle).map(EquationEntry::size)
    }

    /// Queue `handle` for loading unless it is loaded or already queued.
    /// A previously failed asset is queued again.
    pub fn request(&mut self, handle: EquationHandle) {
        match self.slots.get_mut(handle) {
            Some(slot @ (Slot::Unloaded | Slot::Failed)) => {
                *slot = Slot::Pending;
                self.queue.push_back(handle);
            }
            Some(_) => {}
            None => log::warn!("Requested unknown equation handle {}", handle),
        }
    }

    pub fn state(&self, handle: EquationHandle) -> LoadState {
        match self.slots.get(handle) {
            Some(Slot::Unloaded) | None => LoadState::Unloaded,
            Some(Slot::Pending) => LoadState::Pending,
            Some(Slot::Ready(_)) => LoadState::Ready,
            Some(Slot::Failed) => LoadState::Failed,
        }
    }

    /// The decoded image, once loaded.
    pub fn image(&self, handle: EquationHandle) -> Option<&EquationImage> {
        match self.slots.get(handle) {
            Some(Slot::Ready(image)) => Some(image),
            _ => None,
        }
    }

    /// Resolve up to `loads_per_frame` queued loads. Returns how many were
    /// attempted.
    pub fn pump(&mut self) -> usize {
        let mut attempted = 0;
        while attempted < self.loads_per_frame {
            let Some(handle) = self.queue.pop_front() else {
                break;
            };
            attempted += 1;
            let Some(entry) = self.manifest.get(handle) else {
                continue;
            };
            let id = entry.id.clone();
            let slot = match self.load(handle) {
                Ok(image) => {
                    log::debug!(
                        "Loaded equation '{}' ({}x{})",
                        id,
                        image.pixels.width(),
                        image.pixels.height()
                    );
                    Slot::Ready(image)
                }
                Err(e) => {
                    log::warn!("Equation '{}' failed to load: {}", id, e);
                    Slot::Failed
                }
            };
            self.slots[handle] = slot;
        }
        attempted
    }

    fn load(&mut self, handle: EquationHandle) -> Result<EquationImage, AssetError> {
        let path = &self.manifest.equations[handle].path;
        let bytes = self.source.fetch(path)?;
        let pixels = image::load_from_memory(&bytes)?.into_rgba8();
        Ok(EquationImage { pixels })
    }

    /// Pick a random asset, avoiding `exclude` when anything else exists.
    /// Assets known to have failed are only picked when nothing else is left.
    pub fn pick(&self, spawn: &mut SpawnContext, exclude: Option<EquationHandle>) -> Option<EquationHandle> {
        if self.manifest.is_empty() {
            return None;
        }
        let healthy: Vec<EquationHandle> = (0..self.manifest.len())
            .filter(|&h| Some(h) != exclude && !matches!(self.slots[h], Slot::Failed))
            .collect();
        if !healthy.is_empty() {
            return Some(healthy[spawn.random_index(healthy.len())]);
        }
        let others: Vec<EquationHandle> = (0..self.manifest.len()).filter(|&h| Some(h) != exclude).collect();
        if others.is_empty() {
            exclude
        } else {
            Some(others[spawn.random_index(others.len())])
        }
    }
}

impl Default for EquationCache {
    fn default() -> Self {
        Self::empty()
    }
}
