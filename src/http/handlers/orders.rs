use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::Principal;
use crate::http::{Admin, AppState, PathParam, Payload};
use crate::models::{Order, OrderDetails, PlaceOrder, PlacedOrder, StatusUpdate};
use crate::{StoreError, StoreResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(place))
        .route("/:id", get(show).put(update_status))
}

async fn place(
    State(state): State<AppState>,
    principal: Principal,
    Payload(request): Payload<PlaceOrder>,
) -> StoreResult<(StatusCode, Json<PlacedOrder>)> {
    let placed = state.orders.place_order(principal.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

async fn list(
    State(state): State<AppState>,
    principal: Principal,
) -> StoreResult<Json<Vec<OrderDetails>>> {
    state.orders.list_orders(&principal).await.map(Json)
}

async fn show(
    State(state): State<AppState>,
    principal: Principal,
    PathParam(id): PathParam<i64>,
) -> StoreResult<Json<OrderDetails>> {
    state.orders.get_order(&principal, id).await.map(Json)
}

async fn update_status(
    State(state): State<AppState>,
    Admin(grant): Admin,
    PathParam(id): PathParam<i64>,
    Payload(update): Payload<StatusUpdate>,
) -> StoreResult<Json<Order>> {
    let status = update
        .status
        .ok_or_else(|| StoreError::validation("status is required"))?;
    state.orders.update_status(grant, id, &status).await.map(Json)
}
