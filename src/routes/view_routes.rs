// src/routes/view_routes.rs

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;

use super::ApiOk;
use super::extract::ApiQuery;
use crate::{
    calendar::{DayGroup, MonthGrid, WeekGrid},
    error::ApiError,
    filter::FilterCriteria,
    models::AppState,
    schedule::Page,
};

/// Anchors outside these years are rejected before any date arithmetic.
pub const ANCHOR_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_view))
        .route("/week", get(week_view))
        .route("/month", get(month_view))
}

/* ============================================================
   Query params
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct AnchorQuery {
    // YYYY-MM-DD in practice time; defaults to today
    pub date: Option<String>,
}

impl AnchorQuery {
    pub fn resolve(&self, today: NaiveDate) -> Result<NaiveDate, ApiError> {
        let Some(s) = self.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(today);
        };
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            ApiError::BadRequest("VALIDATION_ERROR", "date must be YYYY-MM-DD".into())
        })?;
        if !ANCHOR_YEARS.contains(&date.year()) {
            return Err(ApiError::BadRequest(
                "VALIDATION_ERROR",
                "date must lie between years 1 and 9999".into(),
            ));
        }
        Ok(date)
    }
}

/// One request's worth of page state: fresh snapshot, filters from the query.
async fn page_for(state: &AppState, now: DateTime<Tz>, criteria: FilterCriteria) -> Page<'_> {
    let mut page = Page::open(state.store.as_ref(), now).await;
    page.criteria = criteria;
    page
}

/* ============================================================
   GET /views/list
   ============================================================ */

pub async fn list_view(
    State(state): State<AppState>,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
) -> Json<ApiOk<Vec<DayGroup>>> {
    let now = state.now();
    let page = page_for(&state, now, criteria).await;
    Json(ApiOk {
        data: page.list_view(now),
    })
}

/* ============================================================
   GET /views/week?date=
   ============================================================ */

pub async fn week_view(
    State(state): State<AppState>,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
    ApiQuery(anchor): ApiQuery<AnchorQuery>,
) -> Result<Json<ApiOk<WeekGrid>>, ApiError> {
    let now = state.now();
    let anchor = anchor.resolve(now.date_naive())?;
    let mut page = page_for(&state, now, criteria).await;
    page.week_anchor = anchor;
    Ok(Json(ApiOk {
        data: page.week_view(now),
    }))
}

/* ============================================================
   GET /views/month?date=
   ============================================================ */

pub async fn month_view(
    State(state): State<AppState>,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
    ApiQuery(anchor): ApiQuery<AnchorQuery>,
) -> Result<Json<ApiOk<MonthGrid>>, ApiError> {
    let now = state.now();
    let anchor = anchor.resolve(now.date_naive())?;
    let mut page = page_for(&state, now, criteria).await;
    page.month_anchor = anchor;
    Ok(Json(ApiOk {
        data: page.month_view(now),
    }))
}
