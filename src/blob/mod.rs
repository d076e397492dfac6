//! Filesystem blob store
//!
//! System of record for binary attachments (print files, merch designs,
//! avatars), independent of the relational store. Blobs are addressed by a
//! deterministic natural key `(order_id, order_item_id)` so a retried write
//! overwrites instead of duplicating; merch designs are additionally
//! addressable by the design id assigned at upload time.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::util;

/// Blob collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    PrintFiles,
    MerchDesigns,
    Avatars,
}

impl BlobKind {
    fn dir(&self) -> &'static str {
        match self {
            Self::PrintFiles => "print_files",
            Self::MerchDesigns => "merch_designs",
            Self::Avatars => "avatars",
        }
    }
}

/// Sidecar metadata stored next to each blob
#[derive(Debug, Serialize, Deserialize)]
struct BlobMeta {
    content_type: String,
    uploaded_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
}

/// A blob read back from the store
#[derive(Debug)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub uploaded_at: i64,
}

pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        for kind in [BlobKind::PrintFiles, BlobKind::MerchDesigns, BlobKind::Avatars] {
            fs::create_dir_all(root.join(kind.dir()))
                .map_err(|e| AppError::internal(format!("Failed to create blob dir: {e}")))?;
        }
        Ok(Self { root })
    }

    fn natural_key_path(&self, kind: BlobKind, order_id: &str, item_id: &str) -> AppResult<PathBuf> {
        if !util::is_safe_id(order_id) || !util::is_safe_id(item_id) {
            return Err(AppError::validation("invalid blob key"));
        }
        Ok(self.root.join(kind.dir()).join(order_id).join(item_id))
    }

    fn design_path(&self, design_id: &str) -> AppResult<PathBuf> {
        if !util::is_safe_id(design_id) {
            return Err(AppError::validation("invalid design id"));
        }
        Ok(self
            .root
            .join(BlobKind::MerchDesigns.dir())
            .join("by_design")
            .join(design_id))
    }

    fn write(path: &Path, bytes: &[u8], meta: &BlobMeta) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::internal(format!("Failed to create blob dir: {e}")))?;
        }
        fs::write(path.with_extension("bin"), bytes)
            .map_err(|e| AppError::internal(format!("Failed to write blob: {e}")))?;
        let meta_json = serde_json::to_vec(meta)
            .map_err(|e| AppError::internal(format!("Failed to encode blob meta: {e}")))?;
        fs::write(path.with_extension("json"), meta_json)
            .map_err(|e| AppError::internal(format!("Failed to write blob meta: {e}")))?;
        Ok(())
    }

    fn read(path: &Path) -> AppResult<Option<StoredBlob>> {
        let bin = path.with_extension("bin");
        if !bin.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&bin)
            .map_err(|e| AppError::internal(format!("Failed to read blob: {e}")))?;
        let meta: BlobMeta = match fs::read(path.with_extension("json")) {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| AppError::internal(format!("Corrupt blob meta: {e}")))?,
            Err(_) => BlobMeta {
                content_type: "application/octet-stream".into(),
                uploaded_at: 0,
                filename: None,
            },
        };
        Ok(Some(StoredBlob {
            bytes,
            content_type: meta.content_type,
            uploaded_at: meta.uploaded_at,
        }))
    }

    /// Write (or overwrite) a blob under its natural key. Deterministic
    /// keying makes retries after a crashed post-commit step safe.
    pub fn upsert_by_natural_key(
        &self,
        kind: BlobKind,
        order_id: &str,
        item_id: &str,
        bytes: &[u8],
        content_type: &str,
        filename: Option<&str>,
    ) -> AppResult<()> {
        let path = self.natural_key_path(kind, order_id, item_id)?;
        let meta = BlobMeta {
            content_type: content_type.to_string(),
            uploaded_at: util::now_millis(),
            filename: filename.map(String::from),
        };
        Self::write(&path, bytes, &meta)
    }

    pub fn find_by_natural_key(
        &self,
        kind: BlobKind,
        order_id: &str,
        item_id: &str,
    ) -> AppResult<Option<StoredBlob>> {
        let path = self.natural_key_path(kind, order_id, item_id)?;
        Self::read(&path)
    }

    /// Store a merch design under its upload-time identifier
    pub fn put_design(&self, design_id: &str, bytes: &[u8], content_type: &str) -> AppResult<()> {
        let path = self.design_path(design_id)?;
        let meta = BlobMeta {
            content_type: content_type.to_string(),
            uploaded_at: util::now_millis(),
            filename: None,
        };
        Self::write(&path, bytes, &meta)
    }

    pub fn find_by_design_id(&self, design_id: &str) -> AppResult<Option<StoredBlob>> {
        let path = self.design_path(design_id)?;
        Self::read(&path)
    }

    /// Resolve a blob by design id when given, falling back to the natural
    /// key when the identifier is absent or stale.
    pub fn find_by_natural_key_or_design_id(
        &self,
        kind: BlobKind,
        order_id: &str,
        item_id: &str,
        design_id: Option<&str>,
    ) -> AppResult<Option<StoredBlob>> {
        if let Some(design_id) = design_id
            && let Some(blob) = self.find_by_design_id(design_id)?
        {
            return Ok(Some(blob));
        }
        self.find_by_natural_key(kind, order_id, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (BlobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn upsert_overwrites_on_retry() {
        let (store, _dir) = store();
        store
            .upsert_by_natural_key(BlobKind::PrintFiles, "ord1", "item1", b"v1", "application/pdf", None)
            .unwrap();
        store
            .upsert_by_natural_key(BlobKind::PrintFiles, "ord1", "item1", b"v2", "application/pdf", None)
            .unwrap();

        let blob = store
            .find_by_natural_key(BlobKind::PrintFiles, "ord1", "item1")
            .unwrap()
            .unwrap();
        assert_eq!(blob.bytes, b"v2");
        assert_eq!(blob.content_type, "application/pdf");
    }

    #[test]
    fn missing_blob_is_none() {
        let (store, _dir) = store();
        assert!(store
            .find_by_natural_key(BlobKind::PrintFiles, "ord1", "nope")
            .unwrap()
            .is_none());
    }

    #[test]
    fn design_id_lookup_with_natural_key_fallback() {
        let (store, _dir) = store();
        store
            .upsert_by_natural_key(BlobKind::MerchDesigns, "ord1", "item1", b"nk", "image/png", None)
            .unwrap();

        // Stale design id falls back to the natural key
        let blob = store
            .find_by_natural_key_or_design_id(BlobKind::MerchDesigns, "ord1", "item1", Some("gone"))
            .unwrap()
            .unwrap();
        assert_eq!(blob.bytes, b"nk");

        // A live design id takes precedence
        store.put_design("d42", b"design", "image/png").unwrap();
        let blob = store
            .find_by_natural_key_or_design_id(BlobKind::MerchDesigns, "ord1", "item1", Some("d42"))
            .unwrap()
            .unwrap();
        assert_eq!(blob.bytes, b"design");
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let (store, _dir) = store();
        assert!(store
            .upsert_by_natural_key(BlobKind::PrintFiles, "../x", "item", b"", "a/b", None)
            .is_err());
        assert!(store.find_by_design_id("../../etc").is_err());
    }
}
