#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use termine::models::{
    AppState, Appointment, AppointmentFields, Category, Clock, Patient,
};
use termine::routes;
use termine::store::{MemoryStore, Store, StoreError};

/// Wednesday 2024-03-06 10:00 in Berlin.
pub fn fixed_now() -> DateTime<Utc> {
    Berlin
        .with_ymd_and_hms(2024, 3, 6, 10, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn berlin(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Berlin
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn patient(id: &str, first: &str, last: &str) -> Patient {
    Patient {
        id: id.into(),
        firstname: Some(first.into()),
        lastname: Some(last.into()),
        birth_date: None,
        care_level: Some(2),
        pronoun: None,
        email: None,
        active: Some(true),
    }
}

pub fn category(id: &str, label: &str, color: Option<&str>) -> Category {
    Category {
        id: id.into(),
        label: Some(label.into()),
        description: None,
        color: color.map(str::to_string),
        icon: None,
    }
}

pub fn raw_appointment(id: &str, start: Option<DateTime<Utc>>) -> Appointment {
    Appointment {
        id: id.into(),
        created_at: Some(fixed_now()),
        updated_at: None,
        start_time: start,
        end_time: None,
        title: Some(id.into()),
        location: None,
        notes: None,
        patient: None,
        category: None,
        patients: None,
        categories: None,
    }
}

pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_data(
        vec![
            patient("P2", "Max", "Schulz"),
            patient("P1", "Erika", "Mustermann"),
        ],
        vec![
            category("C2", "Hausbesuch", None),
            category("C1", "Beratung", Some("#2563eb")),
        ],
    ))
}

pub fn state_with(store: Arc<dyn Store>) -> AppState {
    AppState {
        store,
        timezone: Berlin,
        clock: Clock::Fixed(fixed_now()),
    }
}

pub fn app(store: Arc<dyn Store>) -> Router {
    routes::router(state_with(store))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Every operation fails, as if the backend were unreachable.
pub struct BrokenStore;

fn down() -> StoreError {
    StoreError::Backend {
        status: 503,
        body: "service unavailable".into(),
    }
}

#[async_trait]
impl Store for BrokenStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        Err(down())
    }
    async fn list_patients(&self) -> Result<Vec<Patient>, StoreError> {
        Err(down())
    }
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Err(down())
    }
    async fn get_appointment(&self, _id: &str) -> Result<Appointment, StoreError> {
        Err(down())
    }
    async fn create_appointment(&self, _f: &AppointmentFields) -> Result<Appointment, StoreError> {
        Err(down())
    }
    async fn update_appointment(
        &self,
        _id: &str,
        _f: &AppointmentFields,
    ) -> Result<Appointment, StoreError> {
        Err(down())
    }
    async fn delete_appointment(&self, _id: &str) -> Result<(), StoreError> {
        Err(down())
    }
}
