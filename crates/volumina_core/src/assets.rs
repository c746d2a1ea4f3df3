//! Asset lookup used by overlay initialization (fonts, shader sources).
//!
//! A missing asset is never fatal: overlays fall back to built-in defaults.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{OverlayError, OverlayResult};

/// Source of named binary assets.
pub trait AssetSource: Send + Sync {
    /// Loads the asset stored under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Asset`] if the asset does not exist or cannot
    /// be read.
    fn load(&self, path: &str) -> OverlayResult<Vec<u8>>;
}

/// Assets read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirectoryAssets {
    fn load(&self, path: &str) -> OverlayResult<Vec<u8>> {
        let full = self.root.join(path.trim_start_matches('/'));
        std::fs::read(&full).map_err(|e| OverlayError::Asset {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// In-memory assets, for embedded resources and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.entries.insert(path.into(), bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn load(&self, path: &str) -> OverlayResult<Vec<u8>> {
        self.entries.get(path).cloned().ok_or_else(|| OverlayError::Asset {
            path: path.to_string(),
            reason: "not found".to_string(),
        })
    }
}

/// Family used when a font asset cannot be loaded.
pub const FALLBACK_FONT_FAMILY: &str = "Sans";

/// A font resolved during overlay initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    /// Family name passed to the text renderer.
    pub family: String,
    /// Size in points.
    pub size: f32,
    /// Font file contents; `None` for a system font.
    pub data: Option<Arc<[u8]>>,
}

impl FontFace {
    /// System fallback font.
    #[must_use]
    pub fn fallback(size: f32) -> Self {
        Self {
            family: FALLBACK_FONT_FAMILY.to_string(),
            size,
            data: None,
        }
    }

    /// Loads a font file, using the file stem as family name.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Asset`] if the file is missing or empty.
    pub fn load(assets: &dyn AssetSource, path: &str, size: f32) -> OverlayResult<Self> {
        let bytes = assets.load(path)?;
        if bytes.is_empty() {
            return Err(OverlayError::Asset {
                path: path.to_string(),
                reason: "empty font file".to_string(),
            });
        }
        let family = std::path::Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(FALLBACK_FONT_FAMILY)
            .to_string();
        Ok(Self {
            family,
            size,
            data: Some(bytes.into()),
        })
    }

    /// Loads a font file, falling back to the system font on any failure.
    #[must_use]
    pub fn load_or_fallback(assets: &dyn AssetSource, path: &str, size: f32) -> Self {
        Self::load(assets, path, size).unwrap_or_else(|err| {
            tracing::warn!(
                "Could not use font \"{}\" ({}), falling back to {}",
                path,
                err,
                FALLBACK_FONT_FAMILY
            );
            Self::fallback(size)
        })
    }
}
