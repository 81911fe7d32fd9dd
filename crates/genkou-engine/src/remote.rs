//! The authoritative backing store.
//!
//! [`RemoteStore`] is the external collaborator holding the durable
//! server copy of every document. It may be slow and it may fail; the
//! engine treats it as the lowest-priority content source and the only
//! save failure worth surfacing. [`LocalFsStore`] is the product's
//! store — documents are plain files under a vault directory.

use std::io;
use std::path::{Component, PathBuf};

use async_trait::async_trait;
use genkou_types::DocumentId;
use tracing::debug;

use crate::error::RemoteError;

/// Result of a remote read. `found: false` means the document does not
/// exist yet — a valid state the product shows as a blank new document,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRead {
    pub found: bool,
    pub text: String,
}

impl RemoteRead {
    /// A read that found content.
    pub fn found(text: impl Into<String>) -> Self {
        Self {
            found: true,
            text: text.into(),
        }
    }

    /// A read for a document that does not exist yet.
    pub fn absent() -> Self {
        Self {
            found: false,
            text: String::new(),
        }
    }
}

/// Read/write access to the authoritative store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read a document's current text. Absence is reported in-band via
    /// [`RemoteRead::found`], never as an error.
    async fn read(&self, id: &DocumentId) -> Result<RemoteRead, RemoteError>;

    /// Write a document's text, creating it if needed.
    async fn write(&self, id: &DocumentId, text: &str) -> Result<(), RemoteError>;
}

/// Store backed by a local vault directory, one file per document.
#[derive(Debug, Clone)]
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    /// Create a store rooted at a vault directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an identifier to a path under the root. Identifiers are
    /// treated as absolute within the vault; traversal out of it is
    /// rejected.
    fn resolve(&self, id: &DocumentId) -> Result<PathBuf, RemoteError> {
        let relative = id.as_str().trim_start_matches('/');
        let candidate = PathBuf::from(relative);
        if relative.is_empty()
            || candidate
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(RemoteError::InvalidPath(id.to_string()));
        }
        Ok(self.root.join(candidate))
    }
}

#[async_trait]
impl RemoteStore for LocalFsStore {
    async fn read(&self, id: &DocumentId) -> Result<RemoteRead, RemoteError> {
        let path = self.resolve(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(RemoteRead::found(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(%id, "document does not exist on remote yet");
                Ok(RemoteRead::absent())
            }
            Err(e) => Err(RemoteError::Io(e)),
        }
    }

    async fn write(&self, id: &DocumentId, text: &str) -> Result<(), RemoteError> {
        let path = self.resolve(id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, text).await?;
        debug!(%id, bytes = text.len(), "document written to remote");
        Ok(())
    }
}
