//! Image storage collaborators.
//!
//! The scheduler asks a store for the decoded image behind a resolved path.
//! Any error from `load` means the image is unavailable; the scheduler treats
//! that as fatal and never retries.

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, GenericImageView};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait ImageStore {
    fn load(&self, path: &Path) -> Result<DynamicImage>;
}

impl<S: ImageStore + ?Sized> ImageStore for &S {
    fn load(&self, path: &Path) -> Result<DynamicImage> {
        (**self).load(path)
    }
}

/// Reads and decodes images from local disk.
///
/// The format is detected from file content and pixels keep their stored
/// channel layout and bit depth.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilesystemImageStore;

impl FilesystemImageStore {
    pub fn new() -> Self {
        Self
    }
}

impl ImageStore for FilesystemImageStore {
    fn load(&self, path: &Path) -> Result<DynamicImage> {
        let image = image::ImageReader::open(path)
            .with_context(|| format!("open {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("probe {}", path.display()))?
            .decode()
            .with_context(|| format!("decode {}", path.display()))?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(anyhow!("decoded image {} is empty", path.display()));
        }
        Ok(image)
    }
}

/// Serves images registered by path. Unregistered paths are unavailable.
#[derive(Clone, Debug, Default)]
pub struct InMemoryImageStore {
    images: HashMap<PathBuf, DynamicImage>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, image: DynamicImage) {
        self.images.insert(path.into(), image);
    }

    pub fn remove(&mut self, path: &Path) -> Option<DynamicImage> {
        self.images.remove(path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageStore for InMemoryImageStore {
    fn load(&self, path: &Path) -> Result<DynamicImage> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no image registered at {}", path.display()))
    }
}
