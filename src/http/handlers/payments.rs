use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::http::{AppState, Payload};
use crate::payments::CreateIntentRequest;
use crate::StoreResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecret {
    pub client_secret: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/create-payment-intent", post(create_payment_intent))
}

async fn create_payment_intent(
    State(state): State<AppState>,
    principal: Principal,
    Payload(request): Payload<CreateIntentRequest>,
) -> StoreResult<Json<ClientSecret>> {
    let intent = state.payments.create_intent(&principal, &request.items).await?;
    Ok(Json(ClientSecret {
        client_secret: intent.client_secret,
    }))
}
