use anyhow::{anyhow, Error, Result};
use std::{collections::BTreeSet, num::NonZeroU16};

/// The port assumed for a component when no `architecture.port` annotation is
/// present.
pub const DEFAULT_PORT: NonZeroU16 = match NonZeroU16::new(8080) {
    Some(port) => port,
    None => unreachable!(),
};

/// A workload extracted from a single manifest document.
///
/// This is an immutable snapshot record: constructed once per run from the
/// manifest tree (or the live cluster) and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub namespace: String,
    pub kind: WorkloadKind,

    /// Classification from `architecture.domain`, when present and valid.
    pub domain: Option<Domain>,

    /// Free-text role from `architecture.function`.
    pub function: Option<String>,

    /// Grouping tag from `architecture.part_of`.
    pub part_of: Option<String>,

    /// Declared service port; defaults to [`DEFAULT_PORT`].
    pub port: NonZeroU16,

    /// Bare component names this component declares it invokes.
    pub calls: BTreeSet<String>,

    /// Bare component names declared to invoke this component.
    pub invoked_by: BTreeSet<String>,
}

/// The supported workload kinds, as a closed set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    CronJob,
    Service,
}

/// Business classification of a component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Domain {
    Business,
    Support,
    Shared,
}

// === impl Component ===

impl Component {
    pub fn id(&self) -> crate::ComponentId {
        crate::ComponentId {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

// === impl WorkloadKind ===

impl std::str::FromStr for WorkloadKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Deployment" => Ok(Self::Deployment),
            "StatefulSet" => Ok(Self::StatefulSet),
            "CronJob" => Ok(Self::CronJob),
            "Service" => Ok(Self::Service),
            s => Err(anyhow!("unsupported workload kind: {:?}", s)),
        }
    }
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deployment => "Deployment".fmt(f),
            Self::StatefulSet => "StatefulSet".fmt(f),
            Self::CronJob => "CronJob".fmt(f),
            Self::Service => "Service".fmt(f),
        }
    }
}

// === impl Domain ===

impl std::str::FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "business" => Ok(Self::Business),
            "support" => Ok(Self::Support),
            "shared" => Ok(Self::Shared),
            s => Err(anyhow!("invalid domain: {:?}", s)),
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Business => "business".fmt(f),
            Self::Support => "support".fmt(f),
            Self::Shared => "shared".fmt(f),
        }
    }
}
