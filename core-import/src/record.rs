//! Record Notes
//!
//! Creation and update of catalog record notes: folder bootstrapping, the
//! frontmatter field mapping for imported rows, the rendered note bodies,
//! and the hidden flag used to exclude a record from catalog views.

use crate::config::CatalogConfig;
use crate::covers::CoverService;
use crate::error::Result;
use crate::fields;
use crate::mapper::ImportRecord;
use serde_yaml::Value;
use std::sync::Arc;
use tracing::{info, warn};
use vault_traits::store::{render_document, Frontmatter, NoteStore};

/// Input for creating a record by hand rather than from a CSV row.
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub artist: String,
    pub title: String,
    pub year: String,
    pub price: String,
    pub cover_url: String,
}

pub struct RecordService {
    store: Arc<dyn NoteStore>,
    config: CatalogConfig,
}

impl RecordService {
    pub fn new(store: Arc<dyn NoteStore>, config: CatalogConfig) -> Self {
        Self { store, config }
    }

    /// Create the collection, artists and covers folders if missing.
    pub async fn ensure_structure(&self) -> Result<()> {
        self.store.ensure_folder(&self.config.collection_folder).await?;
        self.store.ensure_folder(&self.config.artists_folder).await?;
        self.store.ensure_folder(&self.config.covers_folder).await?;
        Ok(())
    }

    /// Create a new note for an imported row. Returns the note path, which
    /// gets a unique suffix when an identically named note already exists.
    pub async fn create_from_discogs(&self, record: &ImportRecord) -> Result<String> {
        self.ensure_structure().await?;

        let artist_folder = format!(
            "{}/{}",
            self.config.artists_folder.trim_end_matches('/'),
            fields::sanitize_name(&record.artist)
        );
        self.store.ensure_folder(&artist_folder).await?;

        let base_name = format!(
            "{} — {}",
            fields::sanitize_name(&record.artist),
            fields::sanitize_name(&record.title)
        );
        let note_path = self
            .store
            .unique_path(&format!("{artist_folder}/{base_name}.md"))
            .await?;

        let content = build_discogs_content(record)?;
        self.store.create_note(&note_path, &content).await?;
        info!(note_path, "Created record");
        Ok(note_path)
    }

    /// Fold an imported row into an existing note's frontmatter, keeping the
    /// body untouched.
    pub async fn update_from_discogs(&self, note_path: &str, record: &ImportRecord) -> Result<()> {
        let mut frontmatter = self.store.read_frontmatter(note_path).await?;
        apply_discogs_fields(&mut frontmatter, record);
        self.store.write_frontmatter(note_path, &frontmatter).await?;
        Ok(())
    }

    /// Create a record from manual input, optionally downloading its cover.
    /// A failed cover download is logged and the record is created without
    /// artwork.
    pub async fn create_record(&self, draft: &RecordDraft, covers: &CoverService) -> Result<String> {
        self.ensure_structure().await?;

        let artist_folder = format!(
            "{}/{}",
            self.config.artists_folder.trim_end_matches('/'),
            fields::sanitize_name(&draft.artist)
        );
        self.store.ensure_folder(&artist_folder).await?;

        let cover_path = if draft.cover_url.trim().is_empty() {
            None
        } else {
            match covers
                .download_cover_for(&draft.cover_url, &draft.artist, &draft.title)
                .await
            {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Cover download failed, creating record without it");
                    None
                }
            }
        };

        let base_name = format!(
            "{} — {}",
            fields::sanitize_name(&draft.artist),
            fields::sanitize_name(&draft.title)
        );
        let note_path = self
            .store
            .unique_path(&format!("{artist_folder}/{base_name}.md"))
            .await?;

        let content = build_manual_content(draft, cover_path.as_deref())?;
        self.store.create_note(&note_path, &content).await?;
        info!(note_path, "Created record");
        Ok(note_path)
    }

    /// Mark a record hidden from catalog views, or unhide it. Unhiding
    /// removes the field entirely.
    pub async fn set_hidden(&self, note_path: &str, hidden: bool) -> Result<()> {
        let mut frontmatter = self.store.read_frontmatter(note_path).await?;
        if hidden {
            frontmatter.set(fields::HIDDEN, Value::Bool(true));
        } else {
            frontmatter.remove(fields::HIDDEN);
        }
        self.store.write_frontmatter(note_path, &frontmatter).await?;
        Ok(())
    }
}

/// Overlay an imported row onto frontmatter.
///
/// Artist, title and source are written unconditionally; every other field
/// is only written when the row carries a value, so a re-import with a
/// sparser export never erases data. The `vinyl` tag is appended to the
/// existing tag list if absent.
pub fn apply_discogs_fields(frontmatter: &mut Frontmatter, record: &ImportRecord) {
    frontmatter.set_text(fields::ARTIST, &record.artist);
    frontmatter.set_text(fields::TITLE, &record.title);

    let optional = [
        (fields::YEAR, &record.year),
        (fields::RELEASE_ID, &record.release_id),
        (fields::CATALOG_NUMBER, &record.catalog_number),
        (fields::LABEL, &record.label),
        (fields::FORMAT, &record.format),
        (fields::RATING, &record.rating),
        (fields::DATE_ADDED, &record.date_added),
        (fields::MEDIA_CONDITION, &record.media_condition),
        (fields::SLEEVE_CONDITION, &record.sleeve_condition),
    ];
    for (key, value) in optional {
        if !value.is_empty() {
            frontmatter.set_text(key, value.as_str());
        }
    }

    frontmatter.set_text(fields::SOURCE, "discogs");

    let mut tags = frontmatter.string_list(fields::TAGS);
    if !tags.iter().any(|tag| tag == fields::VINYL_TAG) {
        tags.push(fields::VINYL_TAG.to_string());
    }
    frontmatter.set(
        fields::TAGS,
        Value::Sequence(tags.into_iter().map(Value::String).collect()),
    );
}

/// Full note content for a row-imported record.
pub fn build_discogs_content(record: &ImportRecord) -> Result<String> {
    let mut frontmatter = Frontmatter::new();
    apply_discogs_fields(&mut frontmatter, record);

    let line = |value: &str| -> String {
        if value.is_empty() {
            "—".to_string()
        } else {
            value.to_string()
        }
    };
    let body = [
        format!("**Artist:** {}", record.artist),
        String::new(),
        "### Discogs".to_string(),
        format!("- Release ID: {}", line(&record.release_id)),
        format!("- Catalog number: {}", line(&record.catalog_number)),
        format!("- Label: {}", line(&record.label)),
        format!("- Format: {}", line(&record.format)),
        format!("- Added to Discogs collection: {}", line(&record.date_added)),
        String::new(),
        "### Notes".to_string(),
        format!("- Media condition: {}", record.media_condition),
        format!("- Sleeve condition: {}", record.sleeve_condition),
        "- Edition:".to_string(),
        format!("- Comments: {}", record.notes),
        String::new(),
    ]
    .join("\n");

    Ok(render_document(&frontmatter, &body)?)
}

/// Full note content for a manually created record.
fn build_manual_content(draft: &RecordDraft, cover_path: Option<&str>) -> Result<String> {
    let mut frontmatter = Frontmatter::new();
    frontmatter.set_text(fields::ARTIST, &draft.artist);
    frontmatter.set_text(fields::TITLE, &draft.title);
    frontmatter.set(
        fields::TAGS,
        Value::Sequence(vec![Value::String(fields::VINYL_TAG.to_string())]),
    );

    let year = draft.year.trim();
    if !year.is_empty() {
        frontmatter.set_text(fields::YEAR, year);
    }
    if let Some(price) = fields::parse_price(&draft.price) {
        frontmatter.set(fields::PRICE, Value::Number(serde_yaml::Number::from(price)));
    }
    if let Some(path) = cover_path {
        frontmatter.set_text(fields::COVER, format!("[[{path}]]"));
    }

    let mut lines = Vec::new();
    if let Some(path) = cover_path {
        lines.push(format!("![[{path}|300]]"));
        lines.push(String::new());
    }
    lines.push(format!("**Artist:** {}", draft.artist));
    lines.push(String::new());
    lines.push(String::new());
    lines.push("### Notes".to_string());
    lines.push("- Condition:".to_string());
    lines.push("- Edition:".to_string());
    lines.push("- Comments:".to_string());
    lines.push(String::new());

    Ok(render_document(&frontmatter, &lines.join("\n"))?)
}
