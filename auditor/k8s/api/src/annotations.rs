use crate::{manifest::DecodeError, ObjectMeta};
use archmap_auditor_core::{
    Component, ComponentId, Domain, Finding, WorkloadKind, DEFAULT_PORT,
};
use std::collections::{BTreeMap, BTreeSet};

/// Business classification of the component.
pub const DOMAIN: &str = "architecture.domain";

/// Free-text description of the component's role.
pub const FUNCTION: &str = "architecture.function";

/// Comma-separated names of components this component invokes.
pub const CALLS: &str = "architecture.calls";

/// Comma-separated names of components declared to invoke this component.
pub const INVOKED_BY: &str = "architecture.invoked_by";

/// The larger system the component belongs to.
pub const PART_OF: &str = "architecture.part_of";

/// Overrides the assumed service port (8080).
pub const PORT: &str = "architecture.port";

/// Written by the synthesizer onto generated policies to document call
/// targets that have no in-cluster selector.
pub const EXTERNAL_CALLS: &str = "architecture.external-calls";

/// A component extracted from one workload document, along with any warnings
/// raised while parsing its annotations.
#[derive(Debug)]
pub struct Extraction {
    pub component: Component,
    pub advisories: Vec<Finding>,
}

/// Builds a [`Component`] from a workload's metadata.
///
/// Missing annotations are defaults, not errors. A malformed `domain` or
/// `port` value is ignored with a warning rather than silently coerced or
/// fatally rejected.
pub fn extract(kind: WorkloadKind, metadata: &ObjectMeta) -> Result<Extraction, DecodeError> {
    let name = metadata.name.clone().ok_or_else(|| DecodeError::MissingName {
        kind: kind.to_string(),
    })?;
    let namespace = metadata
        .namespace
        .clone()
        .unwrap_or_else(|| "default".to_string());
    let annotations = metadata.annotations.clone().unwrap_or_default();

    let id = ComponentId {
        namespace: namespace.clone(),
        name: name.clone(),
    };
    let mut advisories = Vec::new();

    let domain = parsed::<Domain>(&annotations, DOMAIN, &id, &mut advisories);
    let port = parsed(&annotations, PORT, &id, &mut advisories).unwrap_or(DEFAULT_PORT);

    let component = Component {
        name,
        namespace,
        kind,
        domain,
        function: text(&annotations, FUNCTION),
        part_of: text(&annotations, PART_OF),
        port,
        calls: split_list(annotations.get(CALLS).map_or("", String::as_str)),
        invoked_by: split_list(annotations.get(INVOKED_BY).map_or("", String::as_str)),
    };
    Ok(Extraction {
        component,
        advisories,
    })
}

/// Splits a comma-separated annotation value, trimming whitespace and
/// discarding empty tokens.
pub fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Into::into)
        .collect()
}

fn text(annotations: &BTreeMap<String, String>, key: &str) -> Option<String> {
    let value = annotations.get(key)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parsed<T>(
    annotations: &BTreeMap<String, String>,
    key: &str,
    id: &ComponentId,
    advisories: &mut Vec<Finding>,
) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = annotations.get(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            advisories.push(Finding::MalformedAnnotation {
                component: id.clone(),
                key: key.to_string(),
                value: value.clone(),
                detail: error.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn meta(annotations: &[(&str, &str)]) -> ObjectMeta {
        ObjectMeta {
            name: Some("api".to_string()),
            namespace: Some("business-domain".to_string()),
            annotations: Some(
                annotations
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn splits_and_trims_call_lists() {
        assert_eq!(
            split_list(" data-access, orchestrator ,,access-control,"),
            ["data-access", "orchestrator", "access-control"]
                .iter()
                .map(ToString::to_string)
                .collect()
        );
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn missing_annotations_are_defaults() {
        let meta = ObjectMeta {
            name: Some("api".to_string()),
            namespace: Some("business-domain".to_string()),
            ..Default::default()
        };
        let Extraction {
            component,
            advisories,
        } = extract(WorkloadKind::Deployment, &meta).unwrap();

        assert!(advisories.is_empty());
        assert_eq!(component.domain, None);
        assert_eq!(component.function, None);
        assert_eq!(component.port, DEFAULT_PORT);
        assert!(component.calls.is_empty());
        assert!(component.invoked_by.is_empty());
    }

    #[test]
    fn extracts_declared_metadata() {
        let meta = meta(&[
            (DOMAIN, "business"),
            (FUNCTION, "rest-facade"),
            (CALLS, "data-access, external-database"),
            (INVOKED_BY, "ui"),
            (PORT, "9090"),
        ]);
        let Extraction {
            component,
            advisories,
        } = extract(WorkloadKind::Deployment, &meta).unwrap();

        assert!(advisories.is_empty());
        assert_eq!(component.domain, Some(Domain::Business));
        assert_eq!(component.function.as_deref(), Some("rest-facade"));
        assert_eq!(component.port.get(), 9090);
        assert_eq!(component.calls.len(), 2);
        assert!(component.invoked_by.contains("ui"));
    }

    #[test]
    fn malformed_values_warn_and_fall_back() {
        let meta = meta(&[(DOMAIN, "businessy"), (PORT, "eight-thousand")]);
        let Extraction {
            component,
            advisories,
        } = extract(WorkloadKind::Deployment, &meta).unwrap();

        assert_eq!(component.domain, None);
        assert_eq!(component.port, DEFAULT_PORT);
        assert_eq!(advisories.len(), 2);
        assert!(advisories
            .iter()
            .all(|f| matches!(f, Finding::MalformedAnnotation { .. })));
    }

    #[test]
    fn missing_name_is_an_error() {
        let meta = ObjectMeta::default();
        assert!(matches!(
            extract(WorkloadKind::Service, &meta),
            Err(DecodeError::MissingName { .. })
        ));
    }
}
