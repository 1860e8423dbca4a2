// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info};

use super::ApiOk;
use super::extract::{ApiJson, ApiQuery};
use crate::{
    error::ApiError,
    filter::{self, FilterCriteria},
    form::AppointmentForm,
    models::{AppState, Appointment},
    schedule::or_empty,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

/* ============================================================
   GET /appointments
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
) -> Json<ApiOk<Vec<Appointment>>> {
    let all = or_empty("appointments", state.store.list_appointments().await);
    Json(ApiOk {
        data: filter::filter(&all, &criteria, state.now()),
    })
}

/* ============================================================
   GET /appointments/{id}
   ============================================================ */

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    let appointment = state.store.get_appointment(&appointment_id).await?;
    Ok(Json(ApiOk { data: appointment }))
}

/* ============================================================
   POST /appointments (create)
   ============================================================ */

pub async fn create_appointment(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<AppointmentForm>,
) -> Result<(StatusCode, Json<ApiOk<Appointment>>), ApiError> {
    let fields = form.to_fields(&state.timezone)?;

    let created = state
        .store
        .create_appointment(&fields)
        .await
        .map_err(|e| {
            error!(error = %e, "creating appointment failed");
            ApiError::from(e)
        })?;

    info!(id = %created.id, "appointment created");
    Ok((StatusCode::CREATED, Json(ApiOk { data: created })))
}

/* ============================================================
   PUT /appointments/{id} (full overwrite)
   ============================================================ */

pub async fn update_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
    ApiJson(form): ApiJson<AppointmentForm>,
) -> Result<Json<ApiOk<Appointment>>, ApiError> {
    let fields = form.to_fields(&state.timezone)?;

    let updated = state
        .store
        .update_appointment(&appointment_id, &fields)
        .await
        .map_err(|e| {
            error!(id = %appointment_id, error = %e, "updating appointment failed");
            ApiError::from(e)
        })?;

    info!(id = %updated.id, "appointment updated");
    Ok(Json(ApiOk { data: updated }))
}

/* ============================================================
   DELETE /appointments/{id}
   ============================================================ */

pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_appointment(&appointment_id)
        .await
        .map_err(|e| {
            error!(id = %appointment_id, error = %e, "deleting appointment failed");
            ApiError::from(e)
        })?;

    info!(id = %appointment_id, "appointment deleted");
    Ok(StatusCode::NO_CONTENT)
}
