use crate::Snapshot;
use anyhow::{Context, Result};
use archmap_auditor_core::WorkloadKind;
use archmap_auditor_k8s_api::{CronJob, Deployment, NetworkPolicy, Service, StatefulSet};
use kube::{
    api::{Api, ListParams},
    Client, Resource,
};

/// Harvests annotations from a live cluster.
///
/// One batched `list` per supported kind per namespace; there are no watches
/// and no retries. Any API failure aborts the run so the audit never reasons
/// over a partially fetched snapshot.
pub async fn load_cluster(client: Client, namespaces: &[String]) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();
    for namespace in namespaces {
        tracing::debug!(%namespace, "listing workloads");
        list_workloads::<Deployment>(&client, namespace, WorkloadKind::Deployment, &mut snapshot)
            .await?;
        list_workloads::<StatefulSet>(&client, namespace, WorkloadKind::StatefulSet, &mut snapshot)
            .await?;
        list_workloads::<CronJob>(&client, namespace, WorkloadKind::CronJob, &mut snapshot)
            .await?;
        list_workloads::<Service>(&client, namespace, WorkloadKind::Service, &mut snapshot)
            .await?;

        let policies = Api::<NetworkPolicy>::namespaced(client.clone(), namespace)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("listing NetworkPolicies in {}", namespace))?;
        for policy in &policies.items {
            snapshot.ingest_policy(policy);
        }
    }
    Ok(snapshot)
}

async fn list_workloads<K>(
    client: &Client,
    namespace: &str,
    kind: WorkloadKind,
    snapshot: &mut Snapshot,
) -> Result<()>
where
    K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>,
    K: Clone + std::fmt::Debug + serde::de::DeserializeOwned,
{
    let list = Api::<K>::namespaced(client.clone(), namespace)
        .list(&ListParams::default())
        .await
        .with_context(|| format!("listing {}s in {}", kind, namespace))?;
    for item in &list.items {
        snapshot
            .ingest_workload(kind, item.meta())
            .with_context(|| format!("extracting {} in {}", kind, namespace))?;
    }
    Ok(())
}
