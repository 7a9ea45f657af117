// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;

fn pod(name: &str, phase: &str) -> PodInfo {
    PodInfo {
        name: name.to_string(),
        phase: phase.to_string(),
        terminating: false,
    }
}

// ============================================================================
// Phase A: head singleton planner
// ============================================================================

#[test]
fn zero_head_pods_creates() {
    assert_eq!(plan_head_action(&[]), HeadAction::Create);
}

#[test]
fn one_running_head_pod_accepted() {
    let pods = vec![pod("c-head-abcde", "Running")];
    assert_eq!(plan_head_action(&pods), HeadAction::Accept);
}

#[test]
fn one_pending_head_pod_accepted() {
    let pods = vec![pod("c-head-abcde", "Pending")];
    assert_eq!(plan_head_action(&pods), HeadAction::Accept);
}

#[test]
fn one_failed_head_pod_is_unhealthy() {
    let pods = vec![pod("c-head-abcde", "Failed")];
    assert_eq!(
        plan_head_action(&pods),
        HeadAction::Unhealthy {
            name: "c-head-abcde".to_string(),
            phase: "Failed".to_string(),
        }
    );
}

/// Duplicate head cleanup: two Running pods, one survivor retained.
#[test]
fn two_running_head_pods_retains_first_and_deletes_rest() {
    let pods = vec![pod("c-head-1", "Running"), pod("c-head-2", "Running")];
    assert_eq!(
        plan_head_action(&pods),
        HeadAction::RetainAndDelete {
            survivor: "c-head-1".to_string(),
            victims: vec!["c-head-2".to_string()],
        }
    );
}

#[test]
fn duplicate_head_pods_prefer_live_survivor_over_scan_order() {
    let pods = vec![pod("c-head-failed", "Failed"), pod("c-head-running", "Running")];
    assert_eq!(
        plan_head_action(&pods),
        HeadAction::RetainAndDelete {
            survivor: "c-head-running".to_string(),
            victims: vec!["c-head-failed".to_string()],
        }
    );
}

#[test]
fn duplicate_head_pods_with_none_live_keeps_first_anyway() {
    let pods = vec![pod("c-head-1", "Failed"), pod("c-head-2", "Succeeded")];
    assert_eq!(
        plan_head_action(&pods),
        HeadAction::RetainAndDelete {
            survivor: "c-head-1".to_string(),
            victims: vec!["c-head-2".to_string()],
        }
    );
}

#[test]
fn is_live_phase_covers_running_and_pending_only() {
    assert!(is_live_phase("Running"));
    assert!(is_live_phase("Pending"));
    assert!(!is_live_phase("Failed"));
    assert!(!is_live_phase("Succeeded"));
    assert!(!is_live_phase("Unknown"));
}

// ============================================================================
// Phase B: worker-group convergence planner
// ============================================================================

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn scale_up_creates_the_shortfall() {
    let running = names(&["w1", "w2"]);
    let plan = plan_worker_scale(5, &running, &[], false);
    assert_eq!(plan.create_count, 3);
    assert!(plan.delete_names.is_empty());
}

#[test]
fn scale_down_with_no_named_victims_deletes_arbitrary_overflow() {
    let running = names(&["w1", "w2", "w3"]);
    let plan = plan_worker_scale(1, &running, &[], false);
    assert_eq!(plan.create_count, 0);
    assert_eq!(plan.delete_names.len(), 2);
}

#[test]
fn exact_match_is_a_noop() {
    let running = names(&["w1", "w2", "w3"]);
    let plan = plan_worker_scale(3, &running, &[], false);
    assert_eq!(plan.create_count, 0);
    assert!(plan.delete_names.is_empty());
}

/// Autoscaler victim removal with `PrioritizeWorkersToDelete=true`:
/// replicas=3, live={w1,w2,w3,w4}, workersToDelete=[w2] -> live becomes
/// {w1,w3,w4} (size 3), no further deletions.
#[test]
fn prioritize_workers_to_delete_folds_victim_into_diff() {
    let running = names(&["w1", "w2", "w3", "w4"]);
    let victims = names(&["w2"]);
    let plan = plan_worker_scale(3, &running, &victims, true);
    assert_eq!(plan.create_count, 0);
    assert_eq!(plan.delete_names, vec!["w2".to_string()]);
}

/// A named victim is honored even while the group is exactly at its
/// desired replica count: replicas=3, live={w1,w2,w3}, workersToDelete=
/// [w2] -> w2 is deleted regardless, since diff==0 never re-triggers its
/// removal on a later reconcile once it's pruned down to "present but
/// unwanted".
#[test]
fn named_victim_honored_even_at_exact_replica_count() {
    let running = names(&["w1", "w2", "w3"]);
    let victims = names(&["w2"]);
    let plan = plan_worker_scale(3, &running, &victims, false);
    assert_eq!(plan.create_count, 0);
    assert_eq!(plan.delete_names, vec!["w2".to_string()]);
}

/// A named victim is honored even while the group is scaling up:
/// replicas=4, live={w1,w2,w3}, workersToDelete=[w2] -> one pod is
/// created for the shortfall and w2 is still deleted.
#[test]
fn named_victim_honored_while_scaling_up() {
    let running = names(&["w1", "w2", "w3"]);
    let victims = names(&["w2"]);
    let plan = plan_worker_scale(4, &running, &victims, false);
    assert_eq!(plan.create_count, 1);
    assert_eq!(plan.delete_names, vec!["w2".to_string()]);
}

/// Named shrink exactly covers drift: replicas=2, live={w1,w2,w3},
/// workersToDelete=[w3] -> only w3 deleted, no random pick.
#[test]
fn named_victims_exactly_cover_drift() {
    let running = names(&["w1", "w2", "w3"]);
    let victims = names(&["w3"]);
    let plan = plan_worker_scale(2, &running, &victims, false);
    assert_eq!(plan.create_count, 0);
    assert_eq!(plan.delete_names, vec!["w3".to_string()]);
}

/// Named shrink insufficient: replicas=1, live={w1,w2,w3},
/// workersToDelete=[w2] -> w2 deleted plus one of {w1,w3}, final size 1.
#[test]
fn named_victims_insufficient_triggers_overflow_shrink() {
    let running = names(&["w1", "w2", "w3"]);
    let victims = names(&["w2"]);
    let plan = plan_worker_scale(1, &running, &victims, false);
    assert_eq!(plan.create_count, 0);
    assert_eq!(plan.delete_names.len(), 2);
    assert!(plan.delete_names.contains(&"w2".to_string()));
}

/// Victims naming pods absent from the live set are pruned silently and
/// never appear in the delete list.
#[test]
fn victim_pruning_drops_names_absent_from_running() {
    let running = names(&["w1", "w2"]);
    let victims = names(&["w2", "ghost"]);
    let plan = plan_worker_scale(1, &running, &victims, false);
    assert_eq!(plan.delete_names, vec!["w2".to_string()]);
}

#[test]
fn victim_pruning_with_prioritize_also_drops_absent_names() {
    let running = names(&["w1", "w2"]);
    let victims = names(&["ghost"]);
    // diff = 2 - 2 + 0 = 0 once "ghost" is pruned away, since it never
    // matched a running pod.
    let plan = plan_worker_scale(2, &running, &victims, true);
    assert_eq!(plan.create_count, 0);
    assert!(plan.delete_names.is_empty());
}

#[test]
fn overflow_shrink_deletes_named_victims_before_arbitrary_overflow() {
    let running = names(&["w1", "w2", "w3", "w4"]);
    let victims = names(&["w3"]);
    // replicas=1, |R|=4, so diff=-3, named victims len=1 -> overflow path,
    // 2 additional deletions drawn from running minus named victims.
    let plan = plan_worker_scale(1, &running, &victims, false);
    assert_eq!(plan.create_count, 0);
    assert_eq!(plan.delete_names.len(), 3);
    assert!(plan.delete_names.contains(&"w3".to_string()));
}

#[test]
fn overflow_shrink_tie_break_is_first_encountered_order() {
    let running = names(&["a", "b", "c", "d"]);
    let plan = plan_worker_scale(2, &running, &[], false);
    assert_eq!(plan.create_count, 0);
    // deterministic first-encountered order: a, b dropped first.
    assert_eq!(plan.delete_names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn empty_running_set_with_zero_replicas_is_a_noop() {
    let plan = plan_worker_scale(0, &[], &[], false);
    assert_eq!(plan.create_count, 0);
    assert!(plan.delete_names.is_empty());
}

#[test]
fn prioritize_flag_with_victims_larger_than_drift_still_deletes_all_victims() {
    // replicas=4, running={w1,w2,w3,w4,w5}, victims=[w1,w2]; after folding
    // the two immediate deletions in, diff = 4 - 5 + 2 = 1, so one more
    // pod is created on top of the two victim deletions.
    let running = names(&["w1", "w2", "w3", "w4", "w5"]);
    let victims = names(&["w1", "w2"]);
    let plan = plan_worker_scale(4, &running, &victims, true);
    assert_eq!(plan.create_count, 1);
    assert_eq!(plan.delete_names, vec!["w1".to_string(), "w2".to_string()]);
}
