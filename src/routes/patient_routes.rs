// src/routes/patient_routes.rs

use axum::{extract::State, routing::get, Json, Router};

use super::ApiOk;
use crate::{
    models::{AppState, Patient},
    schedule::or_empty,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/patients", get(list_patients))
}

/// Patients are owned by the backend; this service only reads them.
pub async fn list_patients(State(state): State<AppState>) -> Json<ApiOk<Vec<Patient>>> {
    Json(ApiOk {
        data: or_empty("patients", state.store.list_patients().await),
    })
}
