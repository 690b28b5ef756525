//! Object storage for uploaded source documents.

use std::path::PathBuf;

use async_trait::async_trait;
use decipher_core::{DecipherError, Result, UserId};
use rand::Rng;
use tracing::debug;

/// Content types accepted by the upload route, with their extension.
pub const SUPPORTED_FILE_TYPES: [(&str, &str); 4] = [
    ("application/pdf", ".pdf"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
];

pub fn is_supported_type(content_type: &str) -> bool {
    SUPPORTED_FILE_TYPES.iter().any(|(mime, _)| *mime == content_type)
}

/// Replace anything outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn random_suffix(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Object key for a new upload: `uploads/<user>/<millis>-<rand>-<name>`.
pub fn upload_key(user: &UserId, filename: &str) -> String {
    format!(
        "uploads/{}/{}-{}-{}",
        sanitize_filename(user.as_str()),
        chrono::Utc::now().timestamp_millis(),
        random_suffix(6),
        sanitize_filename(filename)
    )
}

/// Blob store addressed by key.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn public_url(&self, key: &str) -> String;
}

/// Stores objects as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(DecipherError::validation(format!("invalid object key '{key}'")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DecipherError::persistence(format!("create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DecipherError::persistence(format!("write {}: {e}", path.display())))?;
        debug!(key, bytes = bytes.len(), "stored object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Paper (v2).pdf"), "My_Paper__v2_.pdf");
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
    }

    #[test]
    fn test_upload_key_shape() {
        let key = upload_key(&UserId::new("alice"), "notes final.docx");
        let rest = key.strip_prefix("uploads/alice/").unwrap();
        let mut parts = rest.splitn(3, '-');
        assert!(parts.next().unwrap().parse::<i64>().is_ok());
        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(parts.next().unwrap(), "notes_final.docx");
    }

    #[test]
    fn test_supported_types() {
        assert!(is_supported_type("application/pdf"));
        assert!(!is_supported_type("image/png"));
    }

    #[tokio::test]
    async fn test_local_storage_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://files.test/");

        storage.put("uploads/alice/1-abc-a.pdf", b"%PDF").await.unwrap();
        let written = std::fs::read(dir.path().join("uploads/alice/1-abc-a.pdf")).unwrap();
        assert_eq!(written, b"%PDF");
        assert_eq!(
            storage.public_url("uploads/alice/1-abc-a.pdf"),
            "http://files.test/uploads/alice/1-abc-a.pdf"
        );

        assert!(storage.put("uploads/../escape", b"x").await.is_err());
    }
}
