//! Catalog Field Conventions
//!
//! Reserved frontmatter field names plus the normalization helpers shared by
//! the identity index, the cover service and record building: cover-value
//! unwrapping, artist+title lookup keys, filename hygiene and image
//! extension sniffing.

use serde_yaml::Value;
use vault_traits::store::Frontmatter;

pub const ARTIST: &str = "artist";
pub const TITLE: &str = "title";
pub const YEAR: &str = "year";
pub const PRICE: &str = "price";
pub const COVER: &str = "cover";
pub const TAGS: &str = "tags";
pub const RELEASE_ID: &str = "discogs_release_id";
/// Legacy field name still honored when reading older notes.
pub const RELEASE_ID_LEGACY: &str = "release_id";
pub const CATALOG_NUMBER: &str = "catalog_number";
pub const LABEL: &str = "label";
pub const FORMAT: &str = "format";
pub const RATING: &str = "discogs_rating";
pub const DATE_ADDED: &str = "discogs_date_added";
pub const MEDIA_CONDITION: &str = "media_condition";
pub const SLEEVE_CONDITION: &str = "sleeve_condition";
pub const SOURCE: &str = "source";
pub const HIDDEN: &str = "hidden";

/// The tag every catalog entry carries.
pub const VINYL_TAG: &str = "vinyl";

// =============================================================================
// Cover values
// =============================================================================

/// Unwrap a raw cover value into plain text.
///
/// Covers may be stored as a bare string, as the first element of a list, or
/// as a structured reference carrying a `path`, `url` or `value` key.
fn unwrap_cover_value(raw: &Value) -> String {
    match raw {
        Value::Sequence(items) => items.first().map(unwrap_cover_value).unwrap_or_default(),
        Value::Mapping(map) => {
            if let Some(path) = map.get("path").map(scalar_text).filter(|s| !s.is_empty()) {
                format!("[[{}]]", path)
            } else if let Some(url) = map.get("url").map(scalar_text).filter(|s| !s.is_empty()) {
                url
            } else {
                map.get("value").map(scalar_text).unwrap_or_default()
            }
        }
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Normalize a cover reference down to its link target.
///
/// Accepts wiki links (`[[target]]`), markdown image embeds
/// (`![alt](target)`), bare URLs and plain vault paths; an `alias|` suffix is
/// stripped from non-URL targets.
pub fn normalize_cover_target(raw: &str) -> String {
    let mut cover = raw.trim().to_string();
    if cover.is_empty() {
        return cover;
    }

    if let Some(target) = extract_markdown_image(&cover) {
        cover = target.to_string();
    }

    if let Some(inner) = cover
        .strip_prefix("[[")
        .and_then(|rest| rest.strip_suffix("]]"))
    {
        cover = inner.trim().to_string();
    }

    if cover.contains('|') && !has_url_scheme(&cover) {
        if let Some(target) = cover.split('|').next() {
            cover = target.trim().to_string();
        }
    }

    cover
}

fn extract_markdown_image(text: &str) -> Option<&str> {
    let bang = text.find("![")?;
    let rest = &text[bang..];
    let open = rest.find("](")? + 2;
    let close = rest[open..].find(')')? + open;
    let target = rest[open..close].trim();
    (!target.is_empty()).then_some(target)
}

fn has_url_scheme(value: &str) -> bool {
    ["https:", "http:", "data:", "file:", "app:"]
        .iter()
        .any(|scheme| {
            value
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        })
}

/// Whether a frontmatter already holds a usable cover reference.
pub fn has_cover(frontmatter: &Frontmatter) -> bool {
    frontmatter
        .get(COVER)
        .map(|raw| !normalize_cover_target(&unwrap_cover_value(raw)).is_empty())
        .unwrap_or(false)
}

// =============================================================================
// Identity keys
// =============================================================================

fn normalize_lookup_value(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lookup key for the artist+title identity map: both halves lowercased,
/// whitespace-collapsed and trimmed, joined with `::`.
pub fn artist_title_key(artist: &str, title: &str) -> String {
    format!(
        "{}::{}",
        normalize_lookup_value(artist),
        normalize_lookup_value(title)
    )
}

// =============================================================================
// Filenames
// =============================================================================

/// Strip characters that are unsafe in note filenames.
pub fn sanitize_name(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// ASCII slug for cover file stems; Russian text is transliterated.
pub fn slugify(value: &str) -> String {
    let mut transliterated = String::with_capacity(value.len());
    for c in value.chars() {
        match translit_ru(c) {
            Some(mapped) => transliterated.push_str(mapped),
            None => transliterated.push(c),
        }
    }

    let mut slug = String::with_capacity(transliterated.len());
    let mut pending_dash = false;

    for c in transliterated.chars() {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(lower);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "cover".to_string()
    } else {
        slug
    }
}

/// Transliteration for one Cyrillic character; `None` means pass through.
fn translit_ru(c: char) -> Option<&'static str> {
    let mapped = match c.to_lowercase().next().unwrap_or(c) {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(mapped)
}

// =============================================================================
// Image extensions & prices
// =============================================================================

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "svg"];

/// File extension inferred from a URL's path suffix (`jpeg` folds to `jpg`).
pub fn ext_from_url(url: &str) -> Option<&'static str> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme)
        .to_ascii_lowercase();

    IMAGE_EXTENSIONS
        .iter()
        .find(|ext| path.ends_with(&format!(".{}", ext)))
        .map(|ext| if *ext == "jpeg" { "jpg" } else { *ext })
}

/// File extension inferred from a Content-Type header.
pub fn ext_from_content_type(content_type: &str) -> Option<&'static str> {
    let raw = content_type.trim().to_ascii_lowercase();
    if raw.contains("svg") {
        Some("svg")
    } else if raw.contains("png") {
        Some("png")
    } else if raw.contains("webp") {
        Some("webp")
    } else if raw.contains("jpeg") || raw.contains("jpg") {
        Some("jpg")
    } else {
        None
    }
}

/// Parse a price, accepting a decimal comma. Only positive finite values are
/// kept.
pub fn parse_price(value: &str) -> Option<f64> {
    let normalized = value.replace(',', ".");
    let parsed: f64 = normalized.trim().parse().ok()?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed)
}
