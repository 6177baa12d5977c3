//! Catalog folder layout configuration.

use serde::{Deserialize, Serialize};

/// Folder layout of the vinyl catalog inside the vault.
///
/// All paths are vault-relative. Defaults match the original layout:
/// a collection root, a per-artist notes tree and a flat covers folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Collection root folder
    pub collection_folder: String,
    /// Folder holding one subfolder per artist; catalog notes live inside
    /// those subfolders
    pub artists_folder: String,
    /// Where downloaded covers are saved
    pub covers_folder: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collection_folder: "Vinyl".to_string(),
            artists_folder: "Vinyl/Artists".to_string(),
            covers_folder: "Vinyl/covers".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn with_collection_folder(mut self, folder: impl Into<String>) -> Self {
        self.collection_folder = folder.into();
        self
    }

    pub fn with_artists_folder(mut self, folder: impl Into<String>) -> Self {
        self.artists_folder = folder.into();
        self
    }

    pub fn with_covers_folder(mut self, folder: impl Into<String>) -> Self {
        self.covers_folder = folder.into();
        self
    }

    /// Artists folder normalized to a `.../` prefix for path matching.
    pub fn artists_prefix(&self) -> String {
        format!("{}/", self.artists_folder.trim_end_matches('/'))
    }
}
