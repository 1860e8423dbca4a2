use axum::{Json, Router, extract::State, routing::get};

use super::ApiOk;
use crate::models::AppState;
use crate::schedule::{Overview, Snapshot};

#[derive(serde::Serialize)]
pub struct HealthData {
    pub ok: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/overview", get(overview))
}

pub async fn health() -> Json<ApiOk<HealthData>> {
    Json(ApiOk {
        data: HealthData { ok: true },
    })
}

/// Header counters of the scheduling page.
pub async fn overview(State(state): State<AppState>) -> Json<ApiOk<Overview>> {
    let snapshot = Snapshot::load(state.store.as_ref()).await;
    Json(ApiOk {
        data: snapshot.overview(),
    })
}
