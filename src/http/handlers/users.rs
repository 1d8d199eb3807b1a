use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::Principal;
use crate::http::{AppState, Payload};
use crate::models::{Credentials, NewAccount, ProfilePatch, UserProfile};
use crate::services::SignedIn;
use crate::StoreResult;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(profile).put(update_profile))
}

async fn register(
    State(state): State<AppState>,
    Payload(account): Payload<NewAccount>,
) -> StoreResult<(StatusCode, Json<UserProfile>)> {
    let user = state.accounts.register(&account).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Payload(credentials): Payload<Credentials>,
) -> StoreResult<Json<SignedIn>> {
    state.accounts.login(&credentials).await.map(Json)
}

async fn profile(State(state): State<AppState>, principal: Principal) -> StoreResult<Json<UserProfile>> {
    state.accounts.profile(principal.user_id).await.map(Json)
}

async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    Payload(patch): Payload<ProfilePatch>,
) -> StoreResult<Json<UserProfile>> {
    state
        .accounts
        .update_profile(principal.user_id, &patch)
        .await
        .map(Json)
}
