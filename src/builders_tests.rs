// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;
use crate::crd::{RayClusterSpec, ScaleStrategy};
use kube::api::ObjectMeta as KubeObjectMeta;

fn test_cluster(name: &str) -> RayCluster {
    RayCluster {
        metadata: KubeObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            uid: Some("11111111-1111-1111-1111-111111111111".to_string()),
            ..Default::default()
        },
        spec: RayClusterSpec {
            head_group_spec: HeadGroupSpec {
                service_type: None,
                enable_ingress: false,
                ray_start_params: Default::default(),
                template: PodTemplateSpec::default(),
            },
            worker_group_specs: vec![],
            enable_in_tree_autoscaling: false,
        },
        status: None,
    }
}

fn test_group(name: &str, replicas: i32) -> WorkerGroupSpec {
    WorkerGroupSpec {
        group_name: name.to_string(),
        replicas,
        min_replicas: None,
        max_replicas: None,
        ray_start_params: Default::default(),
        template: PodTemplateSpec::default(),
        scale_strategy: ScaleStrategy::default(),
    }
}

#[test]
fn owner_reference_requires_uid() {
    let mut cluster = test_cluster("c1");
    cluster.metadata.uid = None;
    let err = owner_reference(&cluster).unwrap_err();
    assert!(matches!(err, Error::MissingField(_)));
}

#[test]
fn owner_reference_is_controller_and_blocks_deletion() {
    let cluster = test_cluster("c1");
    let owner = owner_reference(&cluster).unwrap();
    assert_eq!(owner.kind, "RayCluster");
    assert_eq!(owner.name, "c1");
    assert_eq!(owner.controller, Some(true));
    assert_eq!(owner.block_owner_deletion, Some(true));
}

#[test]
fn build_head_pod_has_head_labels_and_generate_name() {
    let cluster = test_cluster("my-cluster");
    let pod = build_head_pod(&cluster, &cluster.spec.head_group_spec).unwrap();
    assert_eq!(pod.metadata.generate_name.as_deref(), Some("my-cluster-head-"));
    assert!(pod.metadata.name.is_none());
    let labels = pod.metadata.labels.unwrap();
    assert_eq!(labels.get(RAY_NODE_TYPE_LABEL).map(String::as_str), Some(NODE_TYPE_HEAD));
    assert_eq!(labels.get(RAY_CLUSTER_LABEL).map(String::as_str), Some("my-cluster"));
    assert_eq!(pod.metadata.owner_references.unwrap().len(), 1);
}

#[test]
fn build_worker_pod_has_worker_and_group_labels() {
    let cluster = test_cluster("my-cluster");
    let group = test_group("cpu-group", 3);
    let pod = build_worker_pod(&cluster, &group).unwrap();
    assert_eq!(
        pod.metadata.generate_name.as_deref(),
        Some("my-cluster-worker-cpu-group-")
    );
    let labels = pod.metadata.labels.unwrap();
    assert_eq!(labels.get(RAY_NODE_TYPE_LABEL).map(String::as_str), Some(NODE_TYPE_WORKER));
    assert_eq!(labels.get(RAY_NODE_GROUP_LABEL).map(String::as_str), Some("cpu-group"));
}

#[test]
fn build_head_service_selects_head_pods_only() {
    let cluster = test_cluster("my-cluster");
    let svc = build_head_service(&cluster, &cluster.spec.head_group_spec).unwrap();
    let selector = svc.spec.unwrap().selector.unwrap();
    assert_eq!(selector.get(RAY_NODE_TYPE_LABEL).map(String::as_str), Some(NODE_TYPE_HEAD));
    assert_eq!(svc.metadata.name.as_deref(), Some("my-cluster-head-svc"));
}

#[test]
fn build_autoscaler_role_binding_references_matching_role_and_service_account() {
    let cluster = test_cluster("my-cluster");
    let rb = build_autoscaler_role_binding(&cluster).unwrap();
    assert_eq!(rb.role_ref.name, "my-cluster");
    let subjects = rb.subjects.unwrap();
    assert_eq!(subjects[0].name, "my-cluster");
    assert_eq!(subjects[0].namespace.as_deref(), Some("default"));
}
