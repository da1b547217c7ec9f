//! Processed images handed to the assembler.
//!
//! Every image exists at two scales. Kind atlases are named after the kind
//! collection (`jokers`, `consumables`, ...); the mod icon and title image
//! use whatever name the metadata gives them.

use crate::error::AssetError;
use jokerforge_core::ObjectKind;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// PNG bytes at 1x and 2x.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub x1: Vec<u8>,
    pub x2: Vec<u8>,
}

impl ImageAsset {
    pub fn new(x1: Vec<u8>, x2: Vec<u8>) -> Self {
        Self { x1, x2 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBundle {
    images: BTreeMap<String, ImageAsset>,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_atlas(self, kind: ObjectKind, image: ImageAsset) -> Self {
        self.with_image(kind.collection(), image)
    }

    pub fn with_image(mut self, name: &str, image: ImageAsset) -> Self {
        self.insert(name, image);
        self
    }

    pub fn insert(&mut self, name: &str, image: ImageAsset) {
        self.images.insert(name.to_string(), image);
    }

    pub fn atlas(&self, kind: ObjectKind) -> Option<&ImageAsset> {
        self.image(kind.collection())
    }

    pub fn image(&self, name: &str) -> Option<&ImageAsset> {
        self.images.get(name)
    }

    /// Look up `name`, failing with [`AssetError::Missing`].
    pub fn require(&self, name: &str) -> Result<&ImageAsset, AssetError> {
        self.image(name).ok_or_else(|| AssetError::Missing {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Read `dir/1x/*.png` and `dir/2x/*.png`. Each image must exist at both
    /// scales.
    pub fn from_dir(dir: &Path) -> Result<Self, AssetError> {
        let x1 = read_pngs(&dir.join("1x"))?;
        let mut x2 = read_pngs(&dir.join("2x"))?;
        let mut bundle = Self::new();
        for (name, small) in x1 {
            let large = x2.remove(&name).ok_or_else(|| AssetError::Incomplete {
                name: name.clone(),
                scale: "2x",
            })?;
            bundle.insert(&name, ImageAsset::new(small, large));
        }
        if let Some(name) = x2.into_keys().next() {
            return Err(AssetError::Incomplete { name, scale: "1x" });
        }
        debug!(dir = %dir.display(), images = bundle.len(), "loaded assets");
        Ok(bundle)
    }
}

fn read_pngs(dir: &Path) -> Result<BTreeMap<String, Vec<u8>>, AssetError> {
    let mut out = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
            out.insert(name.to_string(), fs::read(&path)?);
        }
    }
    Ok(out)
}
