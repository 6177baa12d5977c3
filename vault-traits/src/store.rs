//! Note Store Abstraction
//!
//! The catalog is a vault of plain-text notes, each carrying a YAML
//! frontmatter block followed by a free-text body. This module defines:
//!
//! - [`Frontmatter`] - an open string-keyed map; unknown/custom fields
//!   round-trip untouched, a small set of reserved fields is interpreted by
//!   the import engine
//! - [`NoteStore`] - the vault access trait (list, read/write frontmatter
//!   wholesale, create notes, persist binary blobs, folder management)
//! - [`MemoryNoteStore`] - an in-memory implementation for tests and demos
//!
//! All paths are vault-relative, forward-slash separated strings.

use async_trait::async_trait;
use bytes::Bytes;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::error::{BridgeError, Result};

// =============================================================================
// Frontmatter
// =============================================================================

/// Open key-value metadata block of a note.
///
/// Backed by a YAML mapping so arbitrary user-added fields survive a
/// read-modify-write cycle. Reads and writes are wholesale; there are no
/// partial-field transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter(Mapping);

impl Frontmatter {
    pub fn new() -> Self {
        Self(Mapping::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(Value::String(key.to_string()), value);
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, Value::String(value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }

    /// Scalar value as trimmed text; missing/null yield an empty string and
    /// a sequence yields the text of its first element.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(value_to_text).unwrap_or_default()
    }

    /// Value as a list of non-empty trimmed strings; a scalar becomes a
    /// one-element list, anything else is empty.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .map(value_to_text)
                .filter(|s| !s.is_empty())
                .collect(),
            Some(value) => {
                let text = value_to_text(value);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
            None => Vec::new(),
        }
    }

    /// Boolean flag: `true` or the text "true" (any case).
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(value) => value_to_text(value).eq_ignore_ascii_case("true"),
            None => false,
        }
    }

    /// Serialize to a YAML block (no `---` fences, trailing newline trimmed).
    pub fn to_yaml(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.0).map_err(|e| {
            BridgeError::OperationFailed(format!("frontmatter serialization failed: {}", e))
        })?;
        Ok(yaml.trim_end().to_string())
    }

    /// Parse a YAML block. A non-mapping document (scalar, sequence, empty)
    /// yields an empty frontmatter rather than an error.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_yaml::from_str(raw).map_err(|e| BridgeError::InvalidFrontmatter {
            path: String::new(),
            message: e.to_string(),
        })?;
        match value {
            Value::Mapping(mapping) => Ok(Self(mapping)),
            _ => Ok(Self::new()),
        }
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Sequence(items) => items.first().map(value_to_text).unwrap_or_default(),
        _ => String::new(),
    }
}

// =============================================================================
// Document format
// =============================================================================

/// Split note content into its raw frontmatter block and body.
///
/// Returns `None` when the content does not start with a `---` fence.
pub fn split_document(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    for (offset, _) in rest.match_indices("\n---") {
        let after = &rest[offset + 4..];
        // Closing fence must terminate its line.
        let body = if let Some(stripped) = after.strip_prefix("\r\n") {
            stripped
        } else if let Some(stripped) = after.strip_prefix('\n') {
            stripped
        } else if after.is_empty() {
            after
        } else {
            continue;
        };

        let raw = rest[..offset].strip_suffix('\r').unwrap_or(&rest[..offset]);
        return Some((raw, body));
    }

    None
}

/// Render a note document from frontmatter and body.
pub fn render_document(frontmatter: &Frontmatter, body: &str) -> Result<String> {
    let yaml = frontmatter.to_yaml()?;
    Ok(format!("---\n{}\n---\n\n{}", yaml, body.trim_start()))
}

// =============================================================================
// NoteStore trait
// =============================================================================

/// Vault access trait.
///
/// The import engine holds this as an `Arc<dyn NoteStore>`; desktop hosts
/// provide a filesystem-backed implementation, tests use
/// [`MemoryNoteStore`].
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List note paths under a folder prefix (the prefix itself excluded).
    /// Order follows the underlying storage listing and is not guaranteed
    /// stable.
    async fn list_notes(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read a note's current frontmatter. A note without a frontmatter block
    /// yields an empty map.
    async fn read_frontmatter(&self, path: &str) -> Result<Frontmatter>;

    /// Replace a note's frontmatter wholesale, preserving its body.
    async fn write_frontmatter(&self, path: &str, frontmatter: &Frontmatter) -> Result<()>;

    /// Create a new note from full document content. Fails if the path is
    /// already taken.
    async fn create_note(&self, path: &str, content: &str) -> Result<()>;

    /// Persist a binary blob (cover image) at the given path.
    async fn write_binary(&self, path: &str, data: Bytes) -> Result<()>;

    /// Check whether a note, blob or folder exists at the path.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a folder and any missing parents.
    async fn ensure_folder(&self, path: &str) -> Result<()>;

    /// Find a collision-free variant of `initial`: the path itself when
    /// free, otherwise ` 2`, ` 3`, ... appended before the extension.
    async fn unique_path(&self, initial: &str) -> Result<String> {
        if !self.exists(initial).await? {
            return Ok(initial.to_string());
        }

        let (stem, ext) = split_extension(initial);
        let mut counter = 2u32;
        loop {
            let candidate = format!("{} {}{}", stem, counter, ext);
            if !self.exists(&candidate).await? {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}

/// Split a path into (stem, extension-with-dot). The extension is only taken
/// from the final path segment.
fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => path.split_at(name_start + dot),
        _ => (path, ""),
    }
}

// =============================================================================
// In-memory implementation
// =============================================================================

#[derive(Debug, Clone)]
struct Note {
    frontmatter: Frontmatter,
    body: String,
}

#[derive(Default)]
struct MemoryState {
    notes: BTreeMap<String, Note>,
    blobs: BTreeMap<String, Bytes>,
    folders: HashSet<String>,
}

/// In-memory [`NoteStore`] for tests and demos.
#[derive(Default)]
pub struct MemoryNoteStore {
    state: Mutex<MemoryState>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a note directly from frontmatter and body.
    pub fn insert_note(&self, path: &str, frontmatter: Frontmatter, body: &str) {
        let mut state = self.state.lock().expect("memory store lock");
        state.notes.insert(
            path.to_string(),
            Note {
                frontmatter,
                body: body.to_string(),
            },
        );
    }

    /// Seed a binary blob directly.
    pub fn insert_blob(&self, path: &str, data: &[u8]) {
        let mut state = self.state.lock().expect("memory store lock");
        state.blobs.insert(path.to_string(), Bytes::copy_from_slice(data));
    }

    /// Number of notes currently stored.
    pub fn note_count(&self) -> usize {
        self.state.lock().expect("memory store lock").notes.len()
    }

    /// Full body text of a note, for assertions.
    pub fn note_body(&self, path: &str) -> Option<String> {
        let state = self.state.lock().expect("memory store lock");
        state.notes.get(path).map(|n| n.body.clone())
    }

    /// Raw bytes of a stored blob, for assertions.
    pub fn blob(&self, path: &str) -> Option<Bytes> {
        let state = self.state.lock().expect("memory store lock");
        state.blobs.get(path).cloned()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn list_notes(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        let state = self.state.lock().expect("memory store lock");
        Ok(state
            .notes
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn read_frontmatter(&self, path: &str) -> Result<Frontmatter> {
        let state = self.state.lock().expect("memory store lock");
        state
            .notes
            .get(path)
            .map(|n| n.frontmatter.clone())
            .ok_or_else(|| BridgeError::NoteNotFound(path.to_string()))
    }

    async fn write_frontmatter(&self, path: &str, frontmatter: &Frontmatter) -> Result<()> {
        let mut state = self.state.lock().expect("memory store lock");
        let note = state
            .notes
            .get_mut(path)
            .ok_or_else(|| BridgeError::NoteNotFound(path.to_string()))?;
        note.frontmatter = frontmatter.clone();
        Ok(())
    }

    async fn create_note(&self, path: &str, content: &str) -> Result<()> {
        let (frontmatter, body) = match split_document(content) {
            Some((raw, body)) => (Frontmatter::from_yaml(raw)?, body.to_string()),
            None => (Frontmatter::new(), content.to_string()),
        };

        let mut state = self.state.lock().expect("memory store lock");
        if state.notes.contains_key(path) {
            return Err(BridgeError::OperationFailed(format!(
                "note already exists: {}",
                path
            )));
        }
        state.notes.insert(path.to_string(), Note { frontmatter, body });
        Ok(())
    }

    async fn write_binary(&self, path: &str, data: Bytes) -> Result<()> {
        let mut state = self.state.lock().expect("memory store lock");
        state.blobs.insert(path.to_string(), data);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let state = self.state.lock().expect("memory store lock");
        Ok(state.notes.contains_key(path)
            || state.blobs.contains_key(path)
            || state.folders.contains(path))
    }

    async fn ensure_folder(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock().expect("memory store lock");
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if current.is_empty() {
                current = segment.to_string();
            } else {
                current = format!("{}/{}", current, segment);
            }
            state.folders.insert(current.clone());
        }
        Ok(())
    }
}
