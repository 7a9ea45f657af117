// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;
use k8s_openapi::api::core::v1::{PodCondition, PodStatus};
use kube::api::ObjectMeta;

fn pod_with(phase: &str, ready: bool) -> Pod {
    Pod {
        metadata: ObjectMeta::default(),
        spec: None,
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            conditions: Some(vec![PodCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

fn group(name: &str, replicas: i32, min: Option<i32>, max: Option<i32>) -> WorkerGroupSpec {
    WorkerGroupSpec {
        group_name: name.to_string(),
        replicas,
        min_replicas: min,
        max_replicas: max,
        ray_start_params: Default::default(),
        template: Default::default(),
        scale_strategy: Default::default(),
    }
}

#[test]
fn is_available_requires_running_and_ready() {
    assert!(is_available(&pod_with("Running", true)));
    assert!(!is_available(&pod_with("Running", false)));
    assert!(!is_available(&pod_with("Pending", true)));
}

#[test]
fn compute_replica_counts_sums_across_groups() {
    let groups = vec![
        group("a", 3, None, None),
        group("b", 2, Some(1), Some(5)),
    ];
    let pods = vec![
        pod_with("Running", true),
        pod_with("Running", true),
        pod_with("Pending", true),
    ];
    let counts = compute_replica_counts(&groups, &pods);
    assert_eq!(counts.available, 2);
    assert_eq!(counts.desired, 5);
    assert_eq!(counts.min, 1 + 3); // group a has no min -> replicas(3), group b min=1
    assert_eq!(counts.max, 3 + 5); // group a has no max -> replicas(3), group b max=5
}

#[test]
fn counts_changed_detects_any_differing_counter() {
    let existing = RayClusterStatus {
        available_worker_replicas: 2,
        desired_worker_replicas: 5,
        min_worker_replicas: 4,
        max_worker_replicas: 6,
        last_update_time: None,
        observed_generation: None,
    };
    let same = ReplicaCounts {
        available: 2,
        desired: 5,
        min: 4,
        max: 6,
    };
    assert!(!counts_changed(&existing, &same));

    let changed = ReplicaCounts { available: 3, ..same };
    assert!(counts_changed(&existing, &changed));
}
