use proptest::prelude::*;
use tasker_admission::constants::{Phase, TaskPriority};
use tasker_admission::models::WorkspaceMetrics;

/// Strategy for workspace identifiers
pub fn workspace_id_strategy() -> impl Strategy<Value = String> {
    "ws-[a-z0-9]{1,12}"
}

/// Strategy for lifecycle phases
pub fn phase_strategy() -> impl Strategy<Value = Phase> {
    prop::sample::select(Phase::ALL.to_vec())
}

/// Strategy for task priorities
pub fn priority_strategy() -> impl Strategy<Value = TaskPriority> {
    prop_oneof![
        Just(TaskPriority::Low),
        Just(TaskPriority::Medium),
        Just(TaskPriority::High),
        Just(TaskPriority::Critical),
    ]
}

/// Strategy for values inside `[0, 1]`
pub fn unit_strategy() -> impl Strategy<Value = f64> {
    0.0f64..=1.0
}

/// Strategy for arbitrary, possibly out-of-range or non-finite rates
pub fn noisy_rate_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => -2.0f64..3.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

/// Strategy for well-formed workspace metrics
pub fn workspace_metrics_strategy() -> impl Strategy<Value = WorkspaceMetrics> {
    (
        workspace_id_strategy(),
        (0u64..60, 0u64..40, 0u64..12, 0u64..40),
        unit_strategy(),
        unit_strategy(),
        unit_strategy(),
        phase_strategy(),
    )
        .prop_map(
            |(workspace_id, (pending, completed, in_progress, failed), skip_rate, goal_rate, utilization, phase)| {
                WorkspaceMetrics {
                    total_tasks: pending + completed + in_progress + failed,
                    pending,
                    completed,
                    in_progress,
                    failed,
                    skip_rate,
                    goal_completion_rate: goal_rate,
                    agent_utilization: utilization,
                    phase,
                    ..WorkspaceMetrics::empty(workspace_id)
                }
            },
        )
}

/// Strategy for metrics whose rates may be out of range or non-finite
pub fn noisy_metrics_strategy() -> impl Strategy<Value = WorkspaceMetrics> {
    (
        0u64..80,
        0u64..80,
        noisy_rate_strategy(),
        noisy_rate_strategy(),
        noisy_rate_strategy(),
        noisy_rate_strategy(),
        phase_strategy(),
    )
        .prop_map(
            |(total_tasks, pending, skip_rate, goal_rate, utilization, performance, phase)| {
                WorkspaceMetrics {
                    total_tasks,
                    pending,
                    skip_rate,
                    goal_completion_rate: goal_rate,
                    agent_utilization: utilization,
                    performance_score: performance,
                    phase,
                    ..WorkspaceMetrics::empty("ws-noisy")
                }
            },
        )
}
