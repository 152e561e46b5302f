//! Values computed from client input when documents are created.

use super::payloads::{GoalStatus, WorkoutType};

/// Body weight assumed by the calorie estimate.
pub const REFERENCE_WEIGHT_KG: f64 = 70.0;

/// Percentage of `target` reached by `current`, clamped to 0–100 with one decimal.
pub fn goal_progress(current: f64, target: f64) -> f64 {
    if target <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    let percent = (current / target * 100.0).clamp(0.0, 100.0);
    (percent * 10.0).round() / 10.0
}

/// Status implied by progress when the client did not close the goal itself.
pub fn goal_status(requested: GoalStatus, progress: f64) -> GoalStatus {
    match requested {
        GoalStatus::Abandoned | GoalStatus::Completed => requested,
        _ if progress >= 100.0 => GoalStatus::Completed,
        GoalStatus::NotStarted if progress > 0.0 => GoalStatus::InProgress,
        other => other,
    }
}

/// Metabolic equivalent of a workout type.
pub fn met(kind: WorkoutType) -> f64 {
    match kind {
        WorkoutType::Strength => 5.0,
        WorkoutType::Cardio => 7.0,
        WorkoutType::Hiit => 8.0,
        WorkoutType::Flexibility => 2.5,
        WorkoutType::Sports => 6.0,
        WorkoutType::Other => 4.0,
    }
}

/// Estimated kcal burned: `MET * 3.5 * weight / 200` per minute.
pub fn calories_burned(kind: WorkoutType, duration_minutes: u32) -> u32 {
    let per_minute = met(kind) * 3.5 * REFERENCE_WEIGHT_KG / 200.0;
    (per_minute * f64::from(duration_minutes)).round() as u32
}
