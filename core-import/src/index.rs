//! Identity Index
//!
//! Per-run lookup tables resolving upsert targets: one keyed by the external
//! Discogs release id, one by normalized artist+title. Built fresh from the
//! current catalog at the start of every import so it always reflects the
//! latest vault state; entries touched mid-run are inserted back immediately
//! so later rows of the same run resolve to them.

use crate::config::CatalogConfig;
use crate::error::Result;
use crate::fields;
use crate::mapper::ImportRecord;
use std::collections::HashMap;
use tracing::debug;
use vault_traits::store::NoteStore;

/// Upsert-target lookup tables for one import run.
///
/// Values are note paths. On duplicate keys the last entry in scan order
/// wins; scan order follows the storage listing and is not guaranteed
/// stable.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    by_release_id: HashMap<String, String>,
    by_artist_title: HashMap<String, String>,
}

impl IdentityIndex {
    /// Build the index from the catalog notes under the artists folder.
    pub async fn build(store: &dyn NoteStore, config: &CatalogConfig) -> Result<Self> {
        let mut index = Self::default();

        for path in catalog_note_paths(store, config).await? {
            let frontmatter = store.read_frontmatter(&path).await?;

            let artist = frontmatter.text(fields::ARTIST);
            let title = {
                let explicit = frontmatter.text(fields::TITLE);
                if explicit.is_empty() {
                    note_stem(&path).to_string()
                } else {
                    explicit
                }
            };
            let release_id = read_release_id(&frontmatter);

            if !artist.is_empty() && !title.is_empty() {
                index
                    .by_artist_title
                    .insert(fields::artist_title_key(&artist, &title), path.clone());
            }
            if !release_id.is_empty() {
                index.by_release_id.insert(release_id, path);
            }
        }

        debug!(
            by_release_id = index.by_release_id.len(),
            by_artist_title = index.by_artist_title.len(),
            "Built identity index"
        );

        Ok(index)
    }

    /// Resolve the upsert target for a record: release id first, then
    /// normalized artist+title.
    pub fn resolve(&self, record: &ImportRecord) -> Option<&str> {
        if !record.release_id.is_empty() {
            if let Some(path) = self.by_release_id.get(&record.release_id) {
                return Some(path);
            }
        }
        self.by_artist_title
            .get(&fields::artist_title_key(&record.artist, &record.title))
            .map(String::as_str)
    }

    /// Insert or refresh a record's target so later duplicate rows in the
    /// same run resolve to it.
    pub fn insert(&mut self, record: &ImportRecord, path: &str) {
        if !record.release_id.is_empty() {
            self.by_release_id
                .insert(record.release_id.clone(), path.to_string());
        }
        self.by_artist_title.insert(
            fields::artist_title_key(&record.artist, &record.title),
            path.to_string(),
        );
    }
}

/// Release id of a note, honoring the legacy field name.
pub fn read_release_id(frontmatter: &vault_traits::store::Frontmatter) -> String {
    let current = frontmatter.text(fields::RELEASE_ID);
    if current.is_empty() {
        frontmatter.text(fields::RELEASE_ID_LEGACY)
    } else {
        current
    }
}

/// Catalog note paths: notes under the artists folder that sit inside a
/// per-artist subfolder (loose notes directly under the folder are not
/// catalog entries).
pub async fn catalog_note_paths(
    store: &dyn NoteStore,
    config: &CatalogConfig,
) -> Result<Vec<String>> {
    let prefix = config.artists_prefix();
    let paths = store
        .list_notes(config.artists_folder.trim_end_matches('/'))
        .await?
        .into_iter()
        .filter(|path| {
            path.strip_prefix(&prefix)
                .map(|tail| tail.contains('/'))
                .unwrap_or(false)
        })
        .collect();
    Ok(paths)
}

fn note_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".md").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_traits::store::{Frontmatter, MemoryNoteStore};

    fn note(artist: &str, title: &str, release_id: &str) -> Frontmatter {
        let mut fm = Frontmatter::new();
        if !artist.is_empty() {
            fm.set_text(fields::ARTIST, artist);
        }
        if !title.is_empty() {
            fm.set_text(fields::TITLE, title);
        }
        if !release_id.is_empty() {
            fm.set_text(fields::RELEASE_ID, release_id);
        }
        fm
    }

    fn record(artist: &str, title: &str, release_id: &str) -> ImportRecord {
        ImportRecord {
            artist: artist.to_string(),
            title: title.to_string(),
            release_id: release_id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_build_and_resolve() {
        let store = MemoryNoteStore::new();
        let config = CatalogConfig::default();
        store.insert_note(
            "Vinyl/Artists/Tool/Tool — Lateralus.md",
            note("Tool", "Lateralus", "111"),
            "",
        );
        store.insert_note(
            "Vinyl/Artists/Opeth/Opeth — Damnation.md",
            note("Opeth", "Damnation", ""),
            "",
        );

        let index = IdentityIndex::build(&store, &config).await.unwrap();

        assert_eq!(
            index.resolve(&record("x", "y", "111")),
            Some("Vinyl/Artists/Tool/Tool — Lateralus.md")
        );
        assert_eq!(
            index.resolve(&record("OPETH", " damnation ", "")),
            Some("Vinyl/Artists/Opeth/Opeth — Damnation.md")
        );
        assert_eq!(index.resolve(&record("Nobody", "Nothing", "")), None);
    }

    #[tokio::test]
    async fn test_release_id_wins_over_artist_title() {
        let store = MemoryNoteStore::new();
        let config = CatalogConfig::default();
        store.insert_note("Vinyl/Artists/a/by-id.md", note("Other", "Album", "42"), "");
        store.insert_note("Vinyl/Artists/b/by-name.md", note("Tool", "Lateralus", ""), "");

        let index = IdentityIndex::build(&store, &config).await.unwrap();
        assert_eq!(
            index.resolve(&record("Tool", "Lateralus", "42")),
            Some("Vinyl/Artists/a/by-id.md")
        );
    }

    #[tokio::test]
    async fn test_entry_missing_artist_still_indexed_by_release_id() {
        let store = MemoryNoteStore::new();
        let config = CatalogConfig::default();
        store.insert_note("Vinyl/Artists/a/orphan.md", note("", "", "77"), "");

        let index = IdentityIndex::build(&store, &config).await.unwrap();
        assert_eq!(
            index.resolve(&record("a", "b", "77")),
            Some("Vinyl/Artists/a/orphan.md")
        );
        assert_eq!(index.resolve(&record("a", "orphan", "")), None);
    }

    #[tokio::test]
    async fn test_title_falls_back_to_note_stem() {
        let store = MemoryNoteStore::new();
        let config = CatalogConfig::default();
        store.insert_note("Vinyl/Artists/Tool/Lateralus.md", note("Tool", "", ""), "");

        let index = IdentityIndex::build(&store, &config).await.unwrap();
        assert_eq!(
            index.resolve(&record("Tool", "Lateralus", "")),
            Some("Vinyl/Artists/Tool/Lateralus.md")
        );
    }

    #[tokio::test]
    async fn test_legacy_release_id_field() {
        let store = MemoryNoteStore::new();
        let config = CatalogConfig::default();
        let mut fm = note("A", "B", "");
        fm.set_text(fields::RELEASE_ID_LEGACY, "legacy-9");
        store.insert_note("Vinyl/Artists/a/old.md", fm, "");

        let index = IdentityIndex::build(&store, &config).await.unwrap();
        assert_eq!(
            index.resolve(&record("x", "y", "legacy-9")),
            Some("Vinyl/Artists/a/old.md")
        );
    }

    #[tokio::test]
    async fn test_loose_notes_directly_under_artists_folder_excluded() {
        let store = MemoryNoteStore::new();
        let config = CatalogConfig::default();
        store.insert_note("Vinyl/Artists/readme.md", note("A", "B", "1"), "");

        let index = IdentityIndex::build(&store, &config).await.unwrap();
        assert_eq!(index.resolve(&record("A", "B", "1")), None);
    }

    #[tokio::test]
    async fn test_insert_shadows_existing_target() {
        let store = MemoryNoteStore::new();
        let config = CatalogConfig::default();
        store.insert_note("Vinyl/Artists/a/one.md", note("A", "B", "5"), "");

        let mut index = IdentityIndex::build(&store, &config).await.unwrap();
        let rec = record("A", "B", "5");
        index.insert(&rec, "Vinyl/Artists/a/two.md");

        assert_eq!(index.resolve(&rec), Some("Vinyl/Artists/a/two.md"));
    }
}
