//! Cover Artwork Service
//!
//! Fetches release artwork and links it into record notes. Cover linking is
//! never destructive: an existing cover value always wins, and the value is
//! re-checked right before writing in case the note changed while the image
//! was downloading.

use crate::config::CatalogConfig;
use crate::discogs::{DiscogsClient, ThrottleState};
use crate::error::Result;
use crate::fields;
use std::sync::Arc;
use tracing::{debug, info};
use vault_traits::store::NoteStore;

pub struct CoverService {
    store: Arc<dyn NoteStore>,
    discogs: DiscogsClient,
    config: CatalogConfig,
}

impl CoverService {
    pub fn new(store: Arc<dyn NoteStore>, discogs: DiscogsClient, config: CatalogConfig) -> Self {
        Self {
            store,
            discogs,
            config,
        }
    }

    /// Attach the Discogs artwork for `release_id` to the note, unless the
    /// note already carries a cover. Returns whether a cover was attached.
    ///
    /// No network traffic happens when the note already has a cover or the
    /// release id is blank.
    pub async fn resolve_and_attach(
        &self,
        note_path: &str,
        release_id: &str,
        state: &mut ThrottleState,
    ) -> Result<bool> {
        let release_id = release_id.trim();
        if release_id.is_empty() {
            return Ok(false);
        }

        let frontmatter = self.store.read_frontmatter(note_path).await?;
        if fields::has_cover(&frontmatter) {
            return Ok(false);
        }

        let Some(image_url) = self.discogs.release_image_url(release_id, state).await? else {
            debug!(note_path, release_id, "No artwork available for release");
            return Ok(false);
        };

        let stem = format!("discogs-{}", safe_stem(release_id));
        let Some(cover_path) = self.download_by_url(&image_url, &stem).await? else {
            return Ok(false);
        };

        self.link_cover(note_path, &cover_path).await
    }

    /// Download an image into the covers folder under `stem`, deriving the
    /// extension from the URL and correcting it from the Content-Type.
    ///
    /// A file already present at the target path is reused without a
    /// request, which makes repeated attaches for the same release free.
    /// Returns `None` when the download fails with a client/server status.
    pub async fn download_by_url(&self, url: &str, stem: &str) -> Result<Option<String>> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }

        self.store.ensure_folder(&self.config.covers_folder).await?;

        let mut ext = fields::ext_from_url(url).unwrap_or("jpg");
        let mut target = self.cover_path(stem, ext);
        if self.store.exists(&target).await? {
            return Ok(Some(target));
        }

        let response = self.discogs.fetch_image(url).await?;
        if response.status >= 400 {
            debug!(url, status = response.status, "Cover download failed");
            return Ok(None);
        }

        if let Some(by_type) = response
            .header("content-type")
            .and_then(fields::ext_from_content_type)
        {
            if by_type != ext {
                ext = by_type;
                target = self.cover_path(stem, ext);
                if self.store.exists(&target).await? {
                    return Ok(Some(target));
                }
            }
        }

        self.store.write_binary(&target, response.body).await?;
        info!(target, "Saved cover image");
        Ok(Some(target))
    }

    /// Download a cover for a manually created record. The file is named
    /// after the artist and title, and collisions get a unique suffix
    /// instead of being reused.
    pub async fn download_cover_for(
        &self,
        url: &str,
        artist: &str,
        title: &str,
    ) -> Result<Option<String>> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }

        self.store.ensure_folder(&self.config.covers_folder).await?;

        let stem = fields::slugify(&format!("{artist} {title}"));
        let mut ext = fields::ext_from_url(url).unwrap_or("jpg");

        let response = self.discogs.fetch_image(url).await?;
        if response.status >= 400 {
            debug!(url, status = response.status, "Cover download failed");
            return Ok(None);
        }

        if let Some(by_type) = response
            .header("content-type")
            .and_then(fields::ext_from_content_type)
        {
            ext = by_type;
        }

        let target = self
            .store
            .unique_path(&self.cover_path(&stem, ext))
            .await?;
        self.store.write_binary(&target, response.body).await?;
        info!(target, "Saved cover image");
        Ok(Some(target))
    }

    /// Point the note's cover field at `cover_path`, unless a cover appeared
    /// since the caller last looked.
    async fn link_cover(&self, note_path: &str, cover_path: &str) -> Result<bool> {
        let mut frontmatter = self.store.read_frontmatter(note_path).await?;
        if fields::has_cover(&frontmatter) {
            return Ok(false);
        }

        frontmatter.set_text(fields::COVER, format!("[[{cover_path}]]"));
        self.store.write_frontmatter(note_path, &frontmatter).await?;
        Ok(true)
    }

    fn cover_path(&self, stem: &str, ext: &str) -> String {
        format!("{}/{stem}.{ext}", self.config.covers_folder.trim_end_matches('/'))
    }
}

/// File-name-safe rendition of a release id.
fn safe_stem(release_id: &str) -> String {
    let sanitized = fields::sanitize_name(release_id);
    if sanitized.is_empty() {
        fields::slugify(release_id)
    } else {
        sanitized
    }
}
