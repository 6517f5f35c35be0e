use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use codeflow_model::{NodeKind, NodeRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::util::write_atomic;

/// Version written into every document envelope.
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Pluggable persistence for document trees.
pub trait DocumentStore {
    /// Writes `document` to `path`, replacing whatever is there.
    fn persist(&self, path: &Path, document: &NodeRecord) -> Result<(), StoreError>;

    /// Reads the document stored at `path`. The root must be a slide collection.
    fn restore(&self, path: &Path) -> Result<NodeRecord, StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {path} does not exist")]
    NotFound { path: PathBuf },
    #[error("failed to access document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize document {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("document {path} uses unsupported format version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
    #[error("document {path} has a {kind} root, expected a SlideCollection")]
    UnexpectedRoot { path: PathBuf, kind: NodeKind },
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    root: T,
}

/// Stores documents as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFileStore;

impl JsonFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for JsonFileStore {
    fn persist(&self, path: &Path, document: &NodeRecord) -> Result<(), StoreError> {
        let envelope = Envelope {
            version: DOCUMENT_FORMAT_VERSION,
            root: document,
        };
        let payload =
            serde_json::to_vec_pretty(&envelope).map_err(|source| StoreError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        write_atomic(path, &payload).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), nodes = document.node_count(), "persisted document");
        Ok(())
    }

    fn restore(&self, path: &Path) -> Result<NodeRecord, StoreError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let envelope: Envelope<NodeRecord> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if envelope.version != DOCUMENT_FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: envelope.version,
            });
        }
        let kind = envelope.root.kind();
        if kind != NodeKind::SlideCollection {
            return Err(StoreError::UnexpectedRoot {
                path: path.to_path_buf(),
                kind,
            });
        }
        debug!(path = %path.display(), nodes = envelope.root.node_count(), "restored document");
        Ok(envelope.root)
    }
}

#[cfg(test)]
mod tests {
    use codeflow_model::{NodeBody, NodeId};
    use tempfile::tempdir;

    use super::*;

    fn collection() -> NodeRecord {
        NodeRecord {
            id: NodeId::new(),
            name: "document".into(),
            body: NodeBody::SlideCollection,
            children: vec![NodeRecord {
                id: NodeId::new(),
                name: "New Slide".into(),
                body: NodeBody::Slide,
                children: Vec::new(),
            }],
        }
    }

    #[test]
    fn persist_then_restore_returns_the_same_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flow.cfl");
        let record = collection();

        JsonFileStore.persist(&path, &record).unwrap();
        assert_eq!(JsonFileStore.restore(&path).unwrap(), record);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = JsonFileStore
            .restore(&dir.path().join("absent.cfl"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn slide_root_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("slide.cfl");
        let slide = collection().children.remove(0);
        JsonFileStore.persist(&path, &slide).unwrap();

        let err = JsonFileStore.restore(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnexpectedRoot {
                kind: NodeKind::Slide,
                ..
            }
        ));
    }

    #[test]
    fn future_versions_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.cfl");
        let payload = serde_json::json!({
            "version": DOCUMENT_FORMAT_VERSION + 1,
            "root": collection(),
        });
        fs::write(&path, payload.to_string()).unwrap();

        let err = JsonFileStore.restore(&path).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion { version: 2, .. }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.cfl");
        fs::write(&path, "<SlideCollection/>").unwrap();
        assert!(matches!(
            JsonFileStore.restore(&path).unwrap_err(),
            StoreError::Parse { .. }
        ));
    }
}
