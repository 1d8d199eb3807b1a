use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::error;
use uuid::Uuid;

use super::{PaymentGateway, PaymentIntent, PaymentIntentRequest};
use crate::config::PaymentsConfig;
use crate::{StoreError, StoreResult};

/// Stripe PaymentIntents client.
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: String,
}

impl StripeGateway {
    pub fn new(settings: &PaymentsConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| StoreError::Internal(format!("payment client setup failed: {e}")))?;
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> StoreResult<PaymentIntent> {
        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(&form)
            .send()
            .await
            .map_err(|e| StoreError::Internal(format!("payment processor unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "payment processor rejected intent");
            return Err(StoreError::Internal(format!(
                "payment processor returned {status}"
            )));
        }

        let intent: StripeIntent = response
            .json()
            .await
            .map_err(|e| StoreError::Internal(format!("invalid payment processor response: {e}")))?;
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
