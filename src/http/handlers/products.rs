use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::http::{Admin, AppState, PathParam, Payload};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::StoreResult;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> StoreResult<Json<Vec<Product>>> {
    state.catalog.list_products().await.map(Json)
}

async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> StoreResult<Json<Product>> {
    state.catalog.get_product(id).await.map(Json)
}

async fn create(
    State(state): State<AppState>,
    Admin(grant): Admin,
    Payload(product): Payload<NewProduct>,
) -> StoreResult<(StatusCode, Json<Product>)> {
    let created = state.catalog.create_product(grant, &product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    Admin(grant): Admin,
    PathParam(id): PathParam<i64>,
    Payload(patch): Payload<ProductPatch>,
) -> StoreResult<Json<Product>> {
    state.catalog.update_product(grant, id, &patch).await.map(Json)
}

async fn remove(
    State(state): State<AppState>,
    Admin(grant): Admin,
    PathParam(id): PathParam<i64>,
) -> StoreResult<StatusCode> {
    state.catalog.delete_product(grant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
