use crate::{NetworkPolicy, ObjectMeta};
use archmap_auditor_core::WorkloadKind;
use serde::Deserialize;
use thiserror::Error;

/// A single decoded YAML document from the manifest tree.
#[derive(Debug)]
pub enum ManifestDoc {
    /// A workload of one of the supported kinds, carrying its metadata.
    Workload {
        kind: WorkloadKind,
        metadata: ObjectMeta,
    },

    /// An existing NetworkPolicy, consumed by the coverage check.
    Policy(Box<NetworkPolicy>),

    /// A document of some other kind (Namespace, Route, ConfigMap, ...),
    /// irrelevant to the dependency graph.
    Skipped,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("document is not a mapping")]
    NotAMapping,

    #[error("document has no kind")]
    MissingKind,

    #[error("{kind} document has no metadata.name")]
    MissingName { kind: String },

    #[error("invalid {kind} document: {source}")]
    Invalid {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
struct WorkloadDoc {
    #[serde(default)]
    metadata: ObjectMeta,
}

/// Classifies one YAML document by its `kind`.
///
/// Empty documents (a bare `---` separator) decode to [`ManifestDoc::Skipped`].
/// A mapping without a `kind`, or a supported kind whose body does not decode,
/// is an error: extraction is fail-fast, since an incomplete component list
/// would make every downstream audit conclusion unsound.
pub fn decode(doc: &serde_yaml::Value) -> Result<ManifestDoc, DecodeError> {
    use serde_yaml::Value;

    let mapping = match doc {
        Value::Null => return Ok(ManifestDoc::Skipped),
        Value::Mapping(mapping) => mapping,
        _ => return Err(DecodeError::NotAMapping),
    };

    let kind = mapping
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingKind)?;

    if let Ok(kind) = kind.parse::<WorkloadKind>() {
        let WorkloadDoc { metadata } =
            serde_yaml::from_value(doc.clone()).map_err(|source| DecodeError::Invalid {
                kind: kind.to_string(),
                source,
            })?;
        if metadata.name.is_none() {
            return Err(DecodeError::MissingName {
                kind: kind.to_string(),
            });
        }
        return Ok(ManifestDoc::Workload { kind, metadata });
    }

    if kind == "NetworkPolicy" {
        let policy =
            serde_yaml::from_value(doc.clone()).map_err(|source| DecodeError::Invalid {
                kind: kind.to_string(),
                source,
            })?;
        return Ok(ManifestDoc::Policy(Box::new(policy)));
    }

    Ok(ManifestDoc::Skipped)
}
