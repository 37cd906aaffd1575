use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::core::db::{
    ActivityItem, DashboardStats, Kpis, MonthTotal, Overview, DEFAULT_ACTIVITY_LIMIT,
    DEFAULT_TREND_MONTHS,
};
use crate::server::error::ApiResult;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrendQuery {
    pub months: Option<u32>,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.db()?.dashboard_stats()?))
}

pub async fn overview(State(state): State<Arc<AppState>>) -> ApiResult<Json<Overview>> {
    Ok(Json(state.db()?.dashboard_overview()?))
}

pub async fn activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityItem>>> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    Ok(Json(state.db()?.recent_activity(limit)?))
}

pub async fn emissions_trend(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendQuery>,
) -> ApiResult<Json<Vec<MonthTotal>>> {
    let months = query.months.unwrap_or(DEFAULT_TREND_MONTHS);
    Ok(Json(state.db()?.emissions_trend(months)?))
}

pub async fn kpis(State(state): State<Arc<AppState>>) -> ApiResult<Json<Kpis>> {
    Ok(Json(state.db()?.kpis()?))
}
