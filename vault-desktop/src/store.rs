//! Markdown Vault Implementation using Tokio
//!
//! A [`NoteStore`] backed by a plain folder hierarchy: every note is a
//! Markdown file whose leading `---` block holds the YAML frontmatter.
//! Vault-relative forward-slash paths are mapped under a single root
//! directory.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use vault_traits::{
    error::{BridgeError, Result},
    store::{render_document, split_document, Frontmatter, NoteStore},
};

/// Filesystem-backed note store.
pub struct MarkdownVault {
    root: PathBuf,
}

impl MarkdownVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, rel: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in rel.split('/').filter(|s| !s.is_empty() && *s != ".") {
            path.push(segment);
        }
        path
    }

    async fn read_document(&self, rel: &str) -> Result<(Frontmatter, String)> {
        let abs = self.absolute(rel);
        let content = fs::read_to_string(&abs).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NoteNotFound(rel.to_string())
            } else {
                BridgeError::Io(e)
            }
        })?;

        match split_document(&content) {
            Some((raw, body)) => {
                let frontmatter =
                    Frontmatter::from_yaml(raw).map_err(|e| BridgeError::InvalidFrontmatter {
                        path: rel.to_string(),
                        message: e.to_string(),
                    })?;
                Ok((frontmatter, body.to_string()))
            }
            None => Ok((Frontmatter::new(), content)),
        }
    }

    async fn ensure_parent(&self, abs: &Path) -> Result<()> {
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MarkdownVault {
    async fn list_notes(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim_end_matches('/');
        let base = self.absolute(prefix);
        if !fs::try_exists(&base).await? {
            return Ok(Vec::new());
        }

        let mut notes = Vec::new();
        let mut pending = vec![(base, prefix.to_string())];

        while let Some((dir, rel)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                let child_rel = format!("{}/{}", rel, name);
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push((entry.path(), child_rel));
                } else if name.ends_with(".md") {
                    notes.push(child_rel);
                }
            }
        }

        Ok(notes)
    }

    async fn read_frontmatter(&self, path: &str) -> Result<Frontmatter> {
        let (frontmatter, _) = self.read_document(path).await?;
        Ok(frontmatter)
    }

    async fn write_frontmatter(&self, path: &str, frontmatter: &Frontmatter) -> Result<()> {
        let (_, body) = self.read_document(path).await?;
        let content = render_document(frontmatter, &body)?;
        fs::write(self.absolute(path), content).await?;
        Ok(())
    }

    async fn create_note(&self, path: &str, content: &str) -> Result<()> {
        let abs = self.absolute(path);
        if fs::try_exists(&abs).await? {
            return Err(BridgeError::OperationFailed(format!(
                "note already exists: {}",
                path
            )));
        }
        self.ensure_parent(&abs).await?;
        fs::write(&abs, content).await?;
        debug!(path, "Created note");
        Ok(())
    }

    async fn write_binary(&self, path: &str, data: Bytes) -> Result<()> {
        let abs = self.absolute(path);
        self.ensure_parent(&abs).await?;
        fs::write(&abs, &data).await?;
        debug!(path, bytes = data.len(), "Wrote binary blob");
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.absolute(path)).await?)
    }

    async fn ensure_folder(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.absolute(path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> (tempfile::TempDir, MarkdownVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = MarkdownVault::new(dir.path());
        (dir, vault)
    }

    #[tokio::test]
    async fn test_create_and_read_note() {
        let (_dir, vault) = vault();
        vault
            .create_note(
                "Vinyl/Artists/Tool/Tool — Lateralus.md",
                "---\nartist: Tool\ntitle: Lateralus\n---\n\nBody text\n",
            )
            .await
            .unwrap();

        let fm = vault
            .read_frontmatter("Vinyl/Artists/Tool/Tool — Lateralus.md")
            .await
            .unwrap();
        assert_eq!(fm.text("artist"), "Tool");
        assert_eq!(fm.text("title"), "Lateralus");
    }

    #[tokio::test]
    async fn test_write_frontmatter_preserves_body() {
        let (_dir, vault) = vault();
        let path = "Vinyl/Artists/a/x.md";
        vault
            .create_note(path, "---\nartist: A\n---\n\nKeep this body\n")
            .await
            .unwrap();

        let mut fm = vault.read_frontmatter(path).await.unwrap();
        fm.set_text("label", "4AD");
        vault.write_frontmatter(path, &fm).await.unwrap();

        let content = fs::read_to_string(vault.absolute(path)).await.unwrap();
        assert!(content.contains("label: 4AD"));
        assert!(content.contains("Keep this body"));

        let back = vault.read_frontmatter(path).await.unwrap();
        assert_eq!(back.text("artist"), "A");
        assert_eq!(back.text("label"), "4AD");
    }

    #[tokio::test]
    async fn test_note_without_frontmatter_reads_empty() {
        let (_dir, vault) = vault();
        vault
            .create_note("Vinyl/Artists/a/plain.md", "just text")
            .await
            .unwrap();

        let fm = vault.read_frontmatter("Vinyl/Artists/a/plain.md").await.unwrap();
        assert!(fm.is_empty());
    }

    #[tokio::test]
    async fn test_list_notes_recurses_and_skips_non_markdown() {
        let (_dir, vault) = vault();
        vault.create_note("Vinyl/Artists/a/one.md", "x").await.unwrap();
        vault.create_note("Vinyl/Artists/b/deep/two.md", "x").await.unwrap();
        vault
            .write_binary("Vinyl/Artists/a/cover.jpg", Bytes::from_static(b"img"))
            .await
            .unwrap();

        let mut listed = vault.list_notes("Vinyl/Artists").await.unwrap();
        listed.sort();
        assert_eq!(
            listed,
            vec![
                "Vinyl/Artists/a/one.md".to_string(),
                "Vinyl/Artists/b/deep/two.md".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_notes_missing_folder_is_empty() {
        let (_dir, vault) = vault();
        assert!(vault.list_notes("Vinyl/Artists").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unique_path_on_disk() {
        let (_dir, vault) = vault();
        vault.create_note("Vinyl/Artists/a/x.md", "1").await.unwrap();
        let unique = vault.unique_path("Vinyl/Artists/a/x.md").await.unwrap();
        assert_eq!(unique, "Vinyl/Artists/a/x 2.md");
    }
}
