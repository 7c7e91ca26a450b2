use crate::Snapshot;
use archmap_auditor_k8s_api::{decode, DecodeError, ManifestDoc};
use serde::Deserialize;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid document in {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Loads every `*.yaml`/`*.yml` document under `root` into a snapshot.
///
/// Files are visited in sorted order and any parse or decode failure aborts
/// the whole load: a partial snapshot would make the downstream audit
/// unsound. Multi-document files are supported.
pub fn load_tree(root: &Path) -> Result<Snapshot, LoadError> {
    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    files.sort();
    tracing::debug!(root = %root.display(), files = files.len(), "loading manifest tree");

    let mut snapshot = Snapshot::default();
    for path in files {
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        for document in serde_yaml::Deserializer::from_str(&text) {
            let value =
                serde_yaml::Value::deserialize(document).map_err(|source| LoadError::Parse {
                    path: path.clone(),
                    source,
                })?;
            let doc = decode(&value).map_err(|source| LoadError::Decode {
                path: path.clone(),
                source,
            })?;
            match doc {
                ManifestDoc::Workload { kind, metadata } => snapshot
                    .ingest_workload(kind, &metadata)
                    .map_err(|source| LoadError::Decode {
                        path: path.clone(),
                        source,
                    })?,
                ManifestDoc::Policy(policy) => snapshot.ingest_policy(&policy),
                ManifestDoc::Skipped => {}
            }
        }
    }
    Ok(snapshot)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if matches!(
            path.extension().and_then(OsStr::to_str),
            Some("yaml") | Some("yml")
        ) {
            files.push(path);
        }
    }
    Ok(())
}
