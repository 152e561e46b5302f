use axum::body::Bytes;
use serde_json::{json, Value};

/// Converts a JSON value to request body bytes
pub fn to_json_body(value: &Value) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

pub fn user(name: &str, email: &str) -> Value {
    json!({ "name": name, "email": email })
}

pub fn exercise(name: &str, muscle_group: &str) -> Value {
    json!({
        "name": name,
        "muscleGroup": muscle_group,
        "category": "strength",
    })
}

/// Builder for workout payloads
pub struct WorkoutBuilder {
    body: Value,
}

impl WorkoutBuilder {
    pub fn new(user: &str, kind: &str) -> Self {
        Self {
            body: json!({
                "user": user,
                "name": format!("{kind} session"),
                "type": kind,
                "date": "2024-05-01",
                "durationMinutes": 30,
            }),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.body["name"] = json!(name);
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.body["date"] = json!(date);
        self
    }

    pub fn duration(mut self, minutes: u32) -> Self {
        self.body["durationMinutes"] = json!(minutes);
        self
    }

    pub fn rating(mut self, rating: u8) -> Self {
        self.body["rating"] = json!(rating);
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.body["notes"] = json!(notes);
        self
    }

    pub fn exercises(mut self, ids: &[&str]) -> Self {
        self.body["exercises"] = json!(ids);
        self
    }

    pub fn build(self) -> Value {
        self.body
    }
}
