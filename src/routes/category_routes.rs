// src/routes/category_routes.rs

use axum::{extract::State, routing::get, Json, Router};

use super::ApiOk;
use crate::{
    models::{AppState, Category},
    schedule::or_empty,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<ApiOk<Vec<Category>>> {
    Json(ApiOk {
        data: or_empty("categories", state.store.list_categories().await),
    })
}
