//! Typed boundary between Kubernetes objects and the core model.
//!
//! Manifest documents are decoded through a closed set of supported kinds
//! rather than generic YAML traversal: workloads contribute [`Component`]
//! records via their `architecture.*` annotations, NetworkPolicies are
//! digested into the allow-rule form the auditor consumes, and everything
//! else is skipped.
//!
//! [`Component`]: archmap_auditor_core::Component

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
pub mod manifest;
pub mod policy;

pub use self::{
    annotations::{extract, Extraction},
    manifest::{decode, DecodeError, ManifestDoc},
    policy::rules,
};
pub use k8s_openapi::{
    api::{
        apps::v1::{Deployment, StatefulSet},
        batch::v1::CronJob,
        core::v1::Service,
        networking::v1::NetworkPolicy,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
