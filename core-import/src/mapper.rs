//! Discogs Row Mapping
//!
//! Pure translation from a raw CSV row to a canonical [`ImportRecord`].
//! Rows without both an artist and a title are rejected; everything else is
//! carried through verbatim (trimmed).

use crate::csv::CsvRow;
use serde::Serialize;

/// Canonical import record produced from one Discogs CSV row.
///
/// `artist` and `title` are guaranteed non-empty; all other fields may be
/// empty strings when the export omitted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportRecord {
    pub artist: String,
    pub title: String,
    pub year: String,
    pub release_id: String,
    pub catalog_number: String,
    pub label: String,
    pub format: String,
    pub rating: String,
    pub date_added: String,
    pub media_condition: String,
    pub sleeve_condition: String,
    pub notes: String,
}

/// Map one raw row to an [`ImportRecord`].
///
/// Returns `None` when the row has no artist or no title after trimming.
/// The source column names are fixed by the Discogs collection export
/// format; unrecognized columns are ignored.
pub fn map_discogs_row(row: &CsvRow) -> Option<ImportRecord> {
    let artist = row.text("Artist");
    let title = row.text("Title");
    if artist.is_empty() || title.is_empty() {
        return None;
    }

    Some(ImportRecord {
        artist,
        title,
        year: row.text("Released"),
        release_id: row.text("release_id"),
        catalog_number: row.text("Catalog#"),
        label: row.text("Label"),
        format: row.text("Format"),
        rating: row.text("Rating"),
        date_added: row.text("Date Added"),
        media_condition: row.text("Collection Media Condition"),
        sleeve_condition: row.text("Collection Sleeve Condition"),
        notes: row.text("Collection Notes"),
    })
}
