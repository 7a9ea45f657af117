// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Object Builders: turn a `RayCluster` spec into concrete Kubernetes
//! objects (pods, head service, ingress, autoscaler RBAC trio).
//!
//! These builders are the "external collaborator" the reconcilers depend
//! on through plain function calls rather than a trait object, since there
//! is exactly one implementation and no need to mock it in tests (the
//! reconcilers are tested against the pure decision functions instead, not
//! against builder output).

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Pod, PodTemplateSpec, Service, ServiceAccount, ServicePort, ServiceSpec};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use kube::api::ObjectMeta;

use crate::constants::{
    API_GROUP_VERSION, APP_NAME_RAY, MANAGED_BY_RAY_CLUSTER, NODE_TYPE_HEAD, NODE_TYPE_WORKER,
};
use crate::crd::{HeadGroupSpec, RayCluster, WorkerGroupSpec};
use crate::errors::Error;
use crate::labels::{
    K8S_INSTANCE, K8S_MANAGED_BY, K8S_NAME, RAY_CLUSTER_LABEL, RAY_NODE_GROUP_LABEL,
    RAY_NODE_TYPE_LABEL,
};
use crate::naming::{head_pod_generate_name, worker_pod_generate_name};

/// Standard labels every object this controller creates must carry.
fn base_labels(cluster_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(K8S_NAME.to_string(), APP_NAME_RAY.to_string());
    labels.insert(K8S_MANAGED_BY.to_string(), MANAGED_BY_RAY_CLUSTER.to_string());
    labels.insert(K8S_INSTANCE.to_string(), cluster_name.to_string());
    labels.insert(RAY_CLUSTER_LABEL.to_string(), cluster_name.to_string());
    labels
}

/// Labels used to select the singleton head pod/service/ingress for a cluster.
#[must_use]
pub fn head_selector_labels(cluster_name: &str) -> BTreeMap<String, String> {
    let mut labels = base_labels(cluster_name);
    labels.insert(RAY_NODE_TYPE_LABEL.to_string(), NODE_TYPE_HEAD.to_string());
    labels
}

/// Labels used to select worker pods in a specific group.
#[must_use]
pub fn worker_selector_labels(cluster_name: &str, group_name: &str) -> BTreeMap<String, String> {
    let mut labels = base_labels(cluster_name);
    labels.insert(RAY_NODE_TYPE_LABEL.to_string(), NODE_TYPE_WORKER.to_string());
    labels.insert(RAY_NODE_GROUP_LABEL.to_string(), group_name.to_string());
    labels
}

/// Build an owner reference pointing at `cluster`, marking the owner as
/// the controller so the platform garbage collector cascades deletion.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if `cluster` has no `metadata.uid` yet
/// (this happens only for objects not yet persisted by the API server).
pub fn owner_reference(cluster: &RayCluster) -> Result<kube::api::OwnerReference, Error> {
    let name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;
    let uid = cluster
        .metadata
        .uid
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.uid".to_string()))?;

    Ok(kube::api::OwnerReference {
        api_version: API_GROUP_VERSION.to_string(),
        kind: "RayCluster".to_string(),
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

fn apply_template_metadata(
    mut template: PodTemplateSpec,
    labels: BTreeMap<String, String>,
) -> PodTemplateSpec {
    let meta = template.metadata.get_or_insert_with(ObjectMeta::default);
    let mut merged = meta.labels.clone().unwrap_or_default();
    for (k, v) in labels {
        merged.insert(k, v);
    }
    meta.labels = Some(merged);
    template
}

/// Build the head pod for `cluster` from `head_group_spec.template`,
/// stamped with the head selector labels, owner reference, and a
/// `generateName` stem (never a fixed name).
///
/// # Errors
///
/// Returns [`Error::InvalidName`] if the cluster name cannot be turned
/// into a valid DNS label, or [`Error::MissingField`] if the cluster has
/// no name/uid yet.
pub fn build_head_pod(cluster: &RayCluster, head_group_spec: &HeadGroupSpec) -> Result<Pod, Error> {
    let cluster_name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;

    let generate_name = head_pod_generate_name(&cluster_name)?;
    let labels = head_selector_labels(&cluster_name);
    let template = apply_template_metadata(head_group_spec.template.clone(), labels.clone());

    let mut pod = Pod {
        metadata: ObjectMeta {
            generate_name: Some(generate_name),
            namespace: cluster.metadata.namespace.clone(),
            labels: Some(labels),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        spec: template.spec,
        status: None,
    };
    pod.metadata.annotations = template.metadata.and_then(|m| m.annotations);
    Ok(pod)
}

/// Build a new worker pod for `group` owned by `cluster`, stamped with the
/// worker selector labels (including group name), owner reference, and a
/// `generateName` stem.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] if the cluster or group name cannot be
/// turned into a valid DNS label, or [`Error::MissingField`] if the
/// cluster has no name/uid yet.
pub fn build_worker_pod(cluster: &RayCluster, group: &WorkerGroupSpec) -> Result<Pod, Error> {
    let cluster_name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;

    let generate_name = worker_pod_generate_name(&cluster_name, &group.group_name)?;
    let labels = worker_selector_labels(&cluster_name, &group.group_name);
    let template = apply_template_metadata(group.template.clone(), labels.clone());

    let mut pod = Pod {
        metadata: ObjectMeta {
            generate_name: Some(generate_name),
            namespace: cluster.metadata.namespace.clone(),
            labels: Some(labels),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        spec: template.spec,
        status: None,
    };
    pod.metadata.annotations = template.metadata.and_then(|m| m.annotations);
    Ok(pod)
}

/// Build the singleton head `Service` fronting the head pod.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the cluster has no name/uid yet.
pub fn build_head_service(cluster: &RayCluster, head_group_spec: &HeadGroupSpec) -> Result<Service, Error> {
    let cluster_name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;

    let labels = head_selector_labels(&cluster_name);
    let service_name = format!("{cluster_name}-head-svc");

    Ok(Service {
        metadata: ObjectMeta {
            name: Some(service_name),
            namespace: cluster.metadata.namespace.clone(),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: head_group_spec.service_type.clone().or_else(|| Some("ClusterIP".to_string())),
            selector: Some(labels),
            ports: Some(vec![
                ServicePort {
                    name: Some("client".to_string()),
                    port: 10001,
                    ..Default::default()
                },
                ServicePort {
                    name: Some("dashboard".to_string()),
                    port: 8265,
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }),
        status: None,
    })
}

/// Build the singleton `Ingress` fronting the head service, gated by
/// `head_group_spec.enable_ingress` at the call site.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the cluster has no name/uid yet.
pub fn build_head_ingress(cluster: &RayCluster) -> Result<Ingress, Error> {
    use k8s_openapi::api::networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule, IngressServiceBackend,
        IngressSpec, ServiceBackendPort,
    };

    let cluster_name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;

    let labels = head_selector_labels(&cluster_name);
    let service_name = format!("{cluster_name}-head-svc");

    Ok(Ingress {
        metadata: ObjectMeta {
            name: Some(format!("{cluster_name}-head-ingress")),
            namespace: cluster.metadata.namespace.clone(),
            labels: Some(labels),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: None,
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: service_name,
                                port: Some(ServiceBackendPort {
                                    number: Some(8265),
                                    ..Default::default()
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        status: None,
    })
}

/// Build the autoscaler `ServiceAccount` for `cluster`.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the cluster has no name/uid yet.
pub fn build_autoscaler_service_account(cluster: &RayCluster) -> Result<ServiceAccount, Error> {
    let cluster_name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;

    Ok(ServiceAccount {
        metadata: ObjectMeta {
            name: Some(cluster_name.clone()),
            namespace: cluster.metadata.namespace.clone(),
            labels: Some(head_selector_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        ..Default::default()
    })
}

/// Build the autoscaler `Role` for `cluster`, granting the permissions the
/// in-tree autoscaler needs to scale worker pods.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the cluster has no name/uid yet.
pub fn build_autoscaler_role(cluster: &RayCluster) -> Result<Role, Error> {
    let cluster_name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;

    Ok(Role {
        metadata: ObjectMeta {
            name: Some(cluster_name.clone()),
            namespace: cluster.metadata.namespace.clone(),
            labels: Some(head_selector_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec![String::new()]),
            resources: Some(vec!["pods".to_string(), "pods/status".to_string()]),
            verbs: vec![
                "get".to_string(),
                "list".to_string(),
                "watch".to_string(),
                "create".to_string(),
                "delete".to_string(),
                "patch".to_string(),
            ],
            ..Default::default()
        }]),
    })
}

/// Build the autoscaler `RoleBinding` for `cluster`, binding the
/// autoscaler `ServiceAccount` to the autoscaler `Role`.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the cluster has no name/uid yet.
pub fn build_autoscaler_role_binding(cluster: &RayCluster) -> Result<RoleBinding, Error> {
    let cluster_name = cluster
        .metadata
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;
    let namespace = cluster.metadata.namespace.clone().unwrap_or_default();

    Ok(RoleBinding {
        metadata: ObjectMeta {
            name: Some(cluster_name.clone()),
            namespace: cluster.metadata.namespace.clone(),
            labels: Some(head_selector_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "Role".to_string(),
            name: cluster_name.clone(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: cluster_name,
            namespace: Some(namespace),
            ..Default::default()
        }]),
    })
}

#[cfg(test)]
#[path = "builders_tests.rs"]
mod builders_tests;
