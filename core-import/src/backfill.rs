//! Cover Backfill
//!
//! Sweeps the existing catalog and attaches Discogs artwork to notes that
//! have a release id but no cover yet. Shares the throttle and lookup memo
//! with the importer so a long sweep stays within rate limits.

use crate::config::CatalogConfig;
use crate::covers::CoverService;
use crate::discogs::ThrottleState;
use crate::error::Result;
use crate::fields;
use crate::import::ProgressFn;
use crate::index::{catalog_note_paths, read_release_id};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use vault_traits::store::NoteStore;

#[derive(Default)]
pub struct BackfillOptions<'a> {
    pub on_progress: Option<ProgressFn<'a>>,
}

impl<'a> BackfillOptions<'a> {
    pub fn on_progress(mut self, callback: impl FnMut(usize, usize) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

/// Outcome of one backfill sweep.
///
/// `candidates` counts notes that had a release id and no cover; each one
/// ends up attached, skipped (no artwork found) or in `errors`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillSummary {
    pub scanned: usize,
    pub candidates: usize,
    pub attached: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

pub struct CoverBackfill {
    store: Arc<dyn NoteStore>,
    config: CatalogConfig,
    covers: CoverService,
}

impl CoverBackfill {
    pub fn new(store: Arc<dyn NoteStore>, config: CatalogConfig, covers: CoverService) -> Self {
        Self {
            store,
            config,
            covers,
        }
    }

    /// Attach covers across the whole catalog. Per-note failures are
    /// recorded as "path: reason" and the sweep continues.
    #[instrument(skip_all)]
    pub async fn run(&self, mut options: BackfillOptions<'_>) -> Result<BackfillSummary> {
        let paths = catalog_note_paths(self.store.as_ref(), &self.config).await?;

        let mut summary = BackfillSummary {
            scanned: paths.len(),
            ..Default::default()
        };
        let mut state = ThrottleState::new();

        for (position, path) in paths.iter().enumerate() {
            if let Some(on_progress) = options.on_progress.as_mut() {
                on_progress(position + 1, paths.len());
            }

            let release_id = match self.candidate_release_id(path).await {
                Ok(Some(release_id)) => release_id,
                Ok(None) => {
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    summary.errors.push(format!("{path}: {e}"));
                    continue;
                }
            };

            summary.candidates += 1;
            match self.covers.resolve_and_attach(path, &release_id, &mut state).await {
                Ok(true) => summary.attached += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => summary.errors.push(format!("{path}: {e}")),
            }
        }

        info!(
            scanned = summary.scanned,
            candidates = summary.candidates,
            attached = summary.attached,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Backfill finished"
        );
        Ok(summary)
    }

    /// Release id of a backfill candidate: a note that has one and carries
    /// no cover yet.
    async fn candidate_release_id(&self, path: &str) -> Result<Option<String>> {
        let frontmatter = self.store.read_frontmatter(path).await?;
        let release_id = read_release_id(&frontmatter);

        if release_id.is_empty() || fields::has_cover(&frontmatter) {
            Ok(None)
        } else {
            Ok(Some(release_id))
        }
    }
}
