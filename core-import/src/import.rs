//! CSV Import Engine
//!
//! Drives a full Discogs collection import: parse the export, map rows,
//! resolve each row to an existing note or create a new one, and optionally
//! attach cover art. Rows are processed strictly sequentially; one failing
//! row is recorded in the summary and never aborts the run.

use crate::config::CatalogConfig;
use crate::covers::CoverService;
use crate::csv::parse_rows;
use crate::discogs::ThrottleState;
use crate::error::{ImportError, Result};
use crate::index::IdentityIndex;
use crate::mapper::{map_discogs_row, ImportRecord};
use crate::record::RecordService;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use vault_traits::store::NoteStore;

/// Progress callback: 1-based position and total mapped row count.
pub type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + Send + 'a>;

/// Knobs for one import run.
pub struct ImportOptions<'a> {
    /// Match rows against existing notes and update them in place. When
    /// off, every row creates a new note.
    pub upsert: bool,
    /// Fetch and attach Discogs artwork for each processed row.
    pub auto_fetch_covers: bool,
    pub on_progress: Option<ProgressFn<'a>>,
}

impl Default for ImportOptions<'_> {
    fn default() -> Self {
        Self {
            upsert: true,
            auto_fetch_covers: false,
            on_progress: None,
        }
    }
}

impl<'a> ImportOptions<'a> {
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn auto_fetch_covers(mut self, fetch: bool) -> Self {
        self.auto_fetch_covers = fetch;
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(usize, usize) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

/// Outcome of one import run.
///
/// `total` counts raw CSV rows; `skipped` is the portion dropped by mapping
/// (missing artist or title), so `total - skipped` rows were processed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub covers_attached: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

pub struct DiscogsImporter {
    store: Arc<dyn NoteStore>,
    config: CatalogConfig,
    records: RecordService,
    covers: CoverService,
}

impl DiscogsImporter {
    pub fn new(
        store: Arc<dyn NoteStore>,
        config: CatalogConfig,
        records: RecordService,
        covers: CoverService,
    ) -> Self {
        Self {
            store,
            config,
            records,
            covers,
        }
    }

    /// Import a Discogs collection CSV export.
    ///
    /// Fails outright only when the CSV yields no rows at all, or no row has
    /// both Artist and Title; nothing is touched in either case. Per-row
    /// failures land in the summary's `errors` as "Artist — Title: reason".
    #[instrument(skip_all, fields(bytes = csv_text.len()))]
    pub async fn import_csv(
        &self,
        csv_text: &str,
        mut options: ImportOptions<'_>,
    ) -> Result<ImportSummary> {
        let raw_rows = parse_rows(csv_text);
        if raw_rows.is_empty() {
            return Err(ImportError::EmptyCsv);
        }

        let mapped: Vec<ImportRecord> =
            raw_rows.iter().filter_map(map_discogs_row).collect();

        let mut summary = ImportSummary {
            total: raw_rows.len(),
            skipped: raw_rows.len() - mapped.len(),
            ..Default::default()
        };

        if mapped.is_empty() {
            return Err(ImportError::NoValidRows);
        }

        let mut index = IdentityIndex::build(self.store.as_ref(), &self.config).await?;
        let mut state = ThrottleState::new();

        for (position, record) in mapped.iter().enumerate() {
            if let Some(on_progress) = options.on_progress.as_mut() {
                on_progress(position + 1, mapped.len());
            }

            if let Err(e) = self
                .process_row(record, &options, &mut index, &mut state, &mut summary)
                .await
            {
                summary
                    .errors
                    .push(format!("{} — {}: {}", record.artist, record.title, e));
            }
        }

        info!(
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            covers_attached = summary.covers_attached,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Import finished"
        );
        Ok(summary)
    }

    async fn process_row(
        &self,
        record: &ImportRecord,
        options: &ImportOptions<'_>,
        index: &mut IdentityIndex,
        state: &mut ThrottleState,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let target = if options.upsert {
            index.resolve(record).map(str::to_string)
        } else {
            None
        };

        let note_path = match target {
            Some(path) => {
                self.records.update_from_discogs(&path, record).await?;
                summary.updated += 1;
                path
            }
            None => {
                let path = self.records.create_from_discogs(record).await?;
                summary.created += 1;
                path
            }
        };

        index.insert(record, &note_path);

        if options.auto_fetch_covers {
            let attached = self
                .covers
                .resolve_and_attach(&note_path, &record.release_id, state)
                .await?;
            if attached {
                summary.covers_attached += 1;
            }
        }

        Ok(())
    }
}
