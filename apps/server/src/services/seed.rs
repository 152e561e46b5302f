//! Deterministic sample data, inserted through [`DocumentService::create`].

use super::documents::DocumentService;
use crate::models::EntityKind;
use crate::{Error, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

const EXERCISES: &[(&str, &str, &str, &str)] = &[
    ("Back Squat", "legs", "strength", "barbell"),
    ("Bench Press", "chest", "strength", "barbell"),
    ("Deadlift", "back", "strength", "barbell"),
    ("Pull-up", "back", "strength", "bodyweight"),
    ("Plank", "core", "strength", "none"),
    ("Treadmill Run", "full body", "cardio", "treadmill"),
    ("Rowing Sprint", "full body", "cardio", "rower"),
    ("Box Jump", "legs", "plyometric", "box"),
    ("Hamstring Stretch", "legs", "flexibility", "none"),
    ("Single-leg Stand", "legs", "balance", "none"),
];

const WORKOUT_TYPES: &[&str] = &["strength", "cardio", "hiit", "flexibility", "sports", "other"];

#[derive(Debug, Clone)]
pub struct SeedPlan {
    /// Clear every collection first.
    pub reset: bool,
    pub users: usize,
    pub workouts_per_user: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            reset: false,
            users: 5,
            workouts_per_user: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub exercises: usize,
    pub users: usize,
    pub goals: usize,
    pub workouts: usize,
}

fn id_of(document: &JsonValue) -> Result<JsonValue> {
    document
        .get("id")
        .cloned()
        .ok_or_else(|| Error::Internal("stored document has no id".to_string()))
}

pub async fn seed(service: &DocumentService, plan: &SeedPlan) -> Result<SeedReport> {
    if plan.reset {
        for entity in [
            EntityKind::Workouts,
            EntityKind::Goals,
            EntityKind::Users,
            EntityKind::Exercises,
        ] {
            service.clear(entity).await?;
        }
    }

    let mut report = SeedReport::default();
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1)
        .ok_or_else(|| Error::Internal("invalid seed start date".to_string()))?;

    let mut exercise_ids = Vec::with_capacity(EXERCISES.len());
    for (name, muscle_group, category, equipment) in EXERCISES {
        let exercise = service
            .create(
                EntityKind::Exercises,
                json!({
                    "name": name,
                    "description": format!("{name} for {muscle_group}"),
                    "muscleGroup": muscle_group,
                    "category": category,
                    "equipment": equipment,
                }),
            )
            .await?;
        exercise_ids.push(id_of(&exercise)?);
        report.exercises += 1;
    }

    for n in 0..plan.users {
        let user = service
            .create(
                EntityKind::Users,
                json!({
                    "name": format!("Athlete {}", n + 1),
                    "email": format!("athlete{}@fittrack.test", n + 1),
                    "role": if n == 0 { "admin" } else { "user" },
                    "age": 20 + (n % 40),
                }),
            )
            .await?;
        let user_id = id_of(&user)?;
        report.users += 1;

        let goals = [
            json!({
                "user": user_id,
                "title": "Run 100 km this quarter",
                "category": "cardio",
                "targetValue": 100,
                "currentValue": (n * 15) % 120,
                "unit": "km",
                "deadline": "2024-03-31",
            }),
            json!({
                "user": user_id,
                "title": "Squat body weight",
                "category": "strength",
                "targetValue": 80,
                "currentValue": 40 + n * 5,
                "unit": "kg",
                "status": if n % 4 == 3 { "abandoned" } else { "not-started" },
            }),
        ];
        for goal in goals {
            service.create(EntityKind::Goals, goal).await?;
            report.goals += 1;
        }

        for w in 0..plan.workouts_per_user {
            let kind = WORKOUT_TYPES[(n + w) % WORKOUT_TYPES.len()];
            let date = first_day
                .checked_add_days(Days::new((n * 7 + w * 2) as u64))
                .unwrap_or(first_day);
            let exercises: Vec<JsonValue> = (0..2)
                .map(|k| exercise_ids[(n + w + k * 3) % exercise_ids.len()].clone())
                .collect();
            service
                .create(
                    EntityKind::Workouts,
                    json!({
                        "user": user_id,
                        "name": format!("{} session {}", kind, w + 1),
                        "type": kind,
                        "date": date.to_string(),
                        "durationMinutes": 20 + 5 * ((n + w) % 9),
                        "rating": 1 + (n * 3 + w) % 5,
                        "notes": format!("Week {} block", w / 3 + 1),
                        "exercises": exercises,
                    }),
                )
                .await?;
            report.workouts += 1;
        }
    }

    tracing::info!(?report, "Seed complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListingConfig;
    use crate::db::MemoryDocumentStore;
    use crate::models::Catalog;
    use std::sync::Arc;

    #[tokio::test]
    async fn seeds_and_reseeds_with_reset() {
        let catalog = Arc::new(Catalog::new(&ListingConfig::default()).unwrap());
        let store = Arc::new(MemoryDocumentStore::with_unique_fields(catalog.unique_fields()));
        let service = DocumentService::new(store, catalog);

        let plan = SeedPlan {
            reset: true,
            users: 3,
            workouts_per_user: 2,
        };
        let first = seed(&service, &plan).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                exercises: EXERCISES.len(),
                users: 3,
                goals: 6,
                workouts: 6,
            }
        );

        // Unique exercise names make a second run without reset fail.
        let again = seed(&service, &SeedPlan { reset: false, ..plan.clone() }).await;
        assert_eq!(again.unwrap_err().code(), "DUPLICATE_KEY");

        assert_eq!(seed(&service, &plan).await.unwrap(), first);
    }
}
