use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::http::{Admin, AppState, QueryParams};
use crate::services::Dashboard;
use crate::StoreResult;

#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    year: Option<i32>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

async fn dashboard(
    State(state): State<AppState>,
    Admin(grant): Admin,
    QueryParams(query): QueryParams<DashboardQuery>,
) -> StoreResult<Json<Dashboard>> {
    state.dashboard.dashboard(grant, query.year).await.map(Json)
}
