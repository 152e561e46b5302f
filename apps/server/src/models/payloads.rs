//! Create payloads for each collection.
//!
//! Unknown fields are dropped. Enumerated fields are rejected by serde, and
//! lengths and ranges by `validator`. Both surface as `VALIDATION_ERROR`.

use super::catalog::EntityKind;
use super::derived;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Strength,
    Cardio,
    Flexibility,
    Weight,
    Nutrition,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Strength,
    Cardio,
    Hiit,
    Flexibility,
    Sports,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Flexibility,
    Balance,
    Plyometric,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, max = 50, message = "name must be 1-50 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 13, max = 120, message = "age must be between 13 and 120"))]
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub user: Uuid,
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    pub category: GoalCategory,
    #[validate(range(exclusive_min = 0.0, message = "targetValue must be positive"))]
    pub target_value: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "currentValue must not be negative"))]
    pub current_value: f64,
    #[validate(length(min = 1, max = 20, message = "unit must be 1-20 characters"))]
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: GoalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkout {
    pub user: Uuid,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WorkoutType,
    pub date: NaiveDate,
    #[validate(range(min = 1, max = 600, message = "durationMinutes must be between 1 and 600"))]
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewExercise {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 50, message = "muscleGroup must be 1-50 characters"))]
    pub muscle_group: String,
    pub category: ExerciseCategory,
    #[serde(default = "default_equipment")]
    #[validate(length(min = 1, max = 50, message = "equipment must be 1-50 characters"))]
    pub equipment: String,
}

fn default_equipment() -> String {
    "none".to_string()
}

/// A create payload after validation and derivation.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Document body without `id` and `createdAt`.
    pub body: JsonValue,
    /// Documents this one refers to; each must exist.
    pub references: Vec<(EntityKind, Uuid)>,
}

fn parse<T>(body: JsonValue) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_value(body).map_err(|e| Error::Validation(e.to_string()))?;
    payload
        .validate()
        .map_err(|e| Error::Validation(describe(&e)))?;
    Ok(payload)
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

fn to_body<T: Serialize>(payload: &T) -> Result<JsonValue> {
    serde_json::to_value(payload).map_err(|e| Error::Internal(format!("serialize payload: {e}")))
}

/// Validate a create body for `entity` and compute its derived fields.
pub fn prepare(entity: EntityKind, body: JsonValue) -> Result<Prepared> {
    match entity {
        EntityKind::Users => {
            let user: NewUser = parse(body)?;
            let mut body = to_body(&user)?;
            body["email"] = JsonValue::String(user.email.trim().to_lowercase());
            Ok(Prepared {
                body,
                references: Vec::new(),
            })
        }
        EntityKind::Goals => {
            let mut goal: NewGoal = parse(body)?;
            let progress = derived::goal_progress(goal.current_value, goal.target_value);
            goal.status = derived::goal_status(goal.status, progress);
            let mut body = to_body(&goal)?;
            body["progress"] = serde_json::json!(progress);
            Ok(Prepared {
                body,
                references: vec![(EntityKind::Users, goal.user)],
            })
        }
        EntityKind::Workouts => {
            let mut workout: NewWorkout = parse(body)?;
            if workout.calories_burned.is_none() {
                workout.calories_burned = Some(derived::calories_burned(
                    workout.kind,
                    workout.duration_minutes,
                ));
            }
            let mut references = vec![(EntityKind::Users, workout.user)];
            references.extend(workout.exercises.iter().map(|id| (EntityKind::Exercises, *id)));
            Ok(Prepared {
                body: to_body(&workout)?,
                references,
            })
        }
        EntityKind::Exercises => {
            let exercise: NewExercise = parse(body)?;
            Ok(Prepared {
                body: to_body(&exercise)?,
                references: Vec::new(),
            })
        }
    }
}
