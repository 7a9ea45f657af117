// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dependent-Object Reconcilers: the ensure-singleton pattern shared by the
//! head `Service`, optional `Ingress`, and the optional autoscaler
//! `ServiceAccount`/`Role`/`RoleBinding` trio.
//!
//! Every one of these objects is looked up (by label for the service and
//! ingress, by name for the RBAC trio since they use `RayCluster.Name`
//! directly), and the reconciler takes one of three actions depending on
//! how many matches were found. Object-template drift is never
//! reconciled: once exactly one match exists, the reconciler logs and
//! returns without comparing its spec against the desired template.

use k8s_openapi::api::core::v1::{Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use kube::api::{ListParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use tracing::{debug, warn};

use crate::builders;
use crate::crd::RayCluster;
use crate::errors::{is_already_exists, Error};
use crate::events;
use crate::labels::RAY_CLUSTER_LABEL;
use crate::metrics;

/// The decision an ensure-singleton reconciler makes based on how many
/// matching objects currently exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonAction {
    /// No matching object exists yet: build and create one.
    Create,
    /// Exactly one matching object exists: nothing to do.
    NoOp,
    /// More than one matching object exists: log a warning, take no
    /// mutating action (duplicates are not auto-resolved).
    WarnDuplicates,
}

/// Decide the ensure-singleton action from a count of matching objects.
#[must_use]
pub fn decide(existing_count: usize) -> SingletonAction {
    match existing_count {
        0 => SingletonAction::Create,
        1 => SingletonAction::NoOp,
        _ => SingletonAction::WarnDuplicates,
    }
}

/// Reconcile the singleton head `Service`, scoped by the cluster label.
///
/// # Errors
///
/// Returns an error if listing or creating the service fails (other than
/// `AlreadyExists`, which is tolerated as a success).
pub async fn ensure_head_service(client: &Client, cluster: &RayCluster) -> Result<(), Error> {
    let namespace = cluster.namespace().unwrap_or_default();
    let cluster_name = cluster.name_any();
    let api: Api<Service> = Api::namespaced(client.clone(), &namespace);

    let selector = format!("{RAY_CLUSTER_LABEL}={cluster_name}");
    let existing = api
        .list(&ListParams::default().labels(&selector))
        .await?;

    match decide(existing.items.len()) {
        SingletonAction::Create => {
            let service = builders::build_head_service(cluster, &cluster.spec.head_group_spec)?;
            create_tolerating_already_exists(client, cluster, &api, &service, "Service", &cluster_name, &namespace)
                .await
        }
        SingletonAction::NoOp => {
            debug!(cluster = %cluster_name, namespace = %namespace, "head service already exists");
            Ok(())
        }
        SingletonAction::WarnDuplicates => {
            warn!(
                cluster = %cluster_name,
                namespace = %namespace,
                count = existing.items.len(),
                "multiple head services found, not auto-resolving"
            );
            Ok(())
        }
    }
}

/// Reconcile the singleton head `Ingress`, scoped by the cluster label and
/// gated by `spec.headGroupSpec.enableIngress`.
///
/// # Errors
///
/// Returns an error if listing or creating the ingress fails (other than
/// `AlreadyExists`, which is tolerated as a success).
pub async fn ensure_head_ingress(client: &Client, cluster: &RayCluster) -> Result<(), Error> {
    let namespace = cluster.namespace().unwrap_or_default();
    let cluster_name = cluster.name_any();

    if !cluster.spec.head_group_spec.enable_ingress {
        return Ok(());
    }

    let api: Api<Ingress> = Api::namespaced(client.clone(), &namespace);
    let selector = format!("{RAY_CLUSTER_LABEL}={cluster_name}");
    let existing = api.list(&ListParams::default().labels(&selector)).await?;

    match decide(existing.items.len()) {
        SingletonAction::Create => {
            let ingress = builders::build_head_ingress(cluster)?;
            create_tolerating_already_exists(client, cluster, &api, &ingress, "Ingress", &cluster_name, &namespace)
                .await
        }
        SingletonAction::NoOp => {
            debug!(cluster = %cluster_name, namespace = %namespace, "head ingress already exists");
            Ok(())
        }
        SingletonAction::WarnDuplicates => {
            warn!(
                cluster = %cluster_name,
                namespace = %namespace,
                count = existing.items.len(),
                "multiple head ingresses found, not auto-resolving"
            );
            Ok(())
        }
    }
}

/// Reconcile the autoscaler RBAC trio (`ServiceAccount`, `Role`,
/// `RoleBinding`), each looked up by name (`RayCluster.Name`), gated by
/// `spec.enableInTreeAutoscaling`.
///
/// A name-based lookup (rather than label-scoped) carries a known
/// collision risk with identically-named objects created by other
/// tenants; see the design notes for why this is accepted as-is.
///
/// # Errors
///
/// Returns the first error encountered creating any of the three objects.
pub async fn ensure_autoscaler_rbac(client: &Client, cluster: &RayCluster) -> Result<(), Error> {
    if !cluster.spec.enable_in_tree_autoscaling {
        return Ok(());
    }

    let namespace = cluster.namespace().unwrap_or_default();
    let cluster_name = cluster.name_any();

    let sa_api: Api<ServiceAccount> = Api::namespaced(client.clone(), &namespace);
    ensure_named_singleton(client, cluster, &sa_api, &cluster_name, &namespace, "ServiceAccount", || {
        builders::build_autoscaler_service_account(cluster)
    })
    .await?;

    let role_api: Api<Role> = Api::namespaced(client.clone(), &namespace);
    ensure_named_singleton(client, cluster, &role_api, &cluster_name, &namespace, "Role", || {
        builders::build_autoscaler_role(cluster)
    })
    .await?;

    let rb_api: Api<RoleBinding> = Api::namespaced(client.clone(), &namespace);
    ensure_named_singleton(client, cluster, &rb_api, &cluster_name, &namespace, "RoleBinding", || {
        builders::build_autoscaler_role_binding(cluster)
    })
    .await?;

    Ok(())
}

/// Ensure exactly one object named `name` exists, building and creating it
/// via `build` if it's missing. Used for the RBAC trio, where the lookup
/// key is the object name rather than a label selector.
async fn ensure_named_singleton<T, F>(
    client: &Client,
    cluster: &RayCluster,
    api: &Api<T>,
    name: &str,
    namespace: &str,
    kind: &str,
    build: F,
) -> Result<(), Error>
where
    T: Resource<DynamicType = (), Scope = kube::core::NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
    F: FnOnce() -> Result<T, Error>,
{
    match api.get(name).await {
        Ok(_) => {
            debug!(name, namespace, kind, "RBAC object already exists");
            Ok(())
        }
        Err(kube_err @ kube::Error::Api(_)) if crate::errors::is_not_found(&kube_err) => {
            let object = build()?;
            create_tolerating_already_exists(client, cluster, api, &object, kind, name, namespace).await
        }
        Err(e) => Err(Error::from(e)),
    }
}

/// Create `object`, tolerating an `AlreadyExists` response as success (the
/// caller already checked for absence, but a racing reconcile may have
/// created it first). Publishes a `Created` event against `cluster` on
/// success.
async fn create_tolerating_already_exists<T>(
    client: &Client,
    cluster: &RayCluster,
    api: &Api<T>,
    object: &T,
    kind: &str,
    cluster_name: &str,
    namespace: &str,
) -> Result<(), Error>
where
    T: Resource<DynamicType = (), Scope = kube::core::NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    match api.create(&PostParams::default(), object).await {
        Ok(created) => {
            let name = created.name_any();
            metrics::record_resource_created(kind);
            let recorder = events::recorder_for(client, cluster);
            if let Err(e) = events::record_created(&recorder, cluster_name, namespace, kind, &name).await {
                warn!(cluster = cluster_name, namespace, kind, name = %name, error = %e, "failed to publish event");
            }
            Ok(())
        }
        Err(e) if is_already_exists(&e) => {
            debug!(cluster = cluster_name, namespace, kind, "already exists, treating as success");
            Ok(())
        }
        Err(e) => Err(Error::from(e)),
    }
}

#[cfg(test)]
#[path = "dependents_tests.rs"]
mod dependents_tests;
