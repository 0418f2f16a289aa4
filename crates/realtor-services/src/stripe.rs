//! Stripe payment intents over the REST API

use crate::constants::TOPUP_INTENT_TYPE;
use async_trait::async_trait;
use realtor_core::{
    config::StripeConfig,
    traits::{PaymentGateway, PaymentIntent},
    AppError, AppResult,
};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
    code: Option<String>,
}

/// Stripe implementation of `PaymentGateway`
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    secret_key: String,
    currency: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(config: &StripeConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            currency: config.currency.to_lowercase(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn intent_params(&self, amount_cents: i64) -> Vec<(&'static str, String)> {
        vec![
            ("amount", amount_cents.to_string()),
            ("currency", self.currency.clone()),
            ("payment_method_types[]", "card".to_string()),
            ("metadata[type]", TOPUP_INTENT_TYPE.to_string()),
        ]
    }

    async fn send_form(
        &self,
        url: String,
        params: &[(&'static str, String)],
    ) -> AppResult<PaymentIntent> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::handle_response(response).await
    }

    fn transport_error(e: reqwest::Error) -> AppError {
        error!("Stripe request failed: {}", e);
        AppError::PaymentGateway(format!("request failed: {}", e))
    }

    async fn handle_response(response: reqwest::Response) -> AppResult<PaymentIntent> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(|e| {
                error!("Failed to decode Stripe response: {}", e);
                AppError::PaymentGateway(format!("invalid response: {}", e))
            });
        }

        let message = match response.json::<StripeErrorResponse>().await {
            Ok(body) => format!(
                "{} ({}{})",
                body.error.message,
                body.error.error_type,
                body.error
                    .code
                    .map(|c| format!(", {}", c))
                    .unwrap_or_default()
            ),
            Err(_) => format!("HTTP {}", status),
        };

        error!("Stripe API error: {}", message);
        Err(AppError::PaymentGateway(message))
    }
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("currency", &self.currency)
            .field("api_base", &self.api_base)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self))]
    async fn create_intent(&self, amount_cents: i64, user_id: Uuid) -> AppResult<PaymentIntent> {
        debug!("Creating payment intent");

        let mut params = self.intent_params(amount_cents);
        params.push(("metadata[user_id]", user_id.to_string()));

        self.send_form(format!("{}/payment_intents", self.api_base), &params)
            .await
    }

    #[instrument(skip(self))]
    async fn update_intent(&self, intent_id: &str, amount_cents: i64) -> AppResult<PaymentIntent> {
        debug!("Updating payment intent");

        let params = [("amount", amount_cents.to_string())];
        self.send_form(
            format!("{}/payment_intents/{}", self.api_base, intent_id),
            &params,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn retrieve_intent(&self, intent_id: &str) -> AppResult<PaymentIntent> {
        let response = self
            .client
            .get(format!("{}/payment_intents/{}", self.api_base, intent_id))
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realtor_core::traits::IntentStatus;

    fn config() -> StripeConfig {
        StripeConfig {
            secret_key: "sk_test_123".to_string(),
            currency: "CAD".to_string(),
            api_base: "https://api.stripe.com/v1/".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_gateway_normalizes_config() {
        let gateway = StripeGateway::new(&config()).unwrap();
        assert_eq!(gateway.currency, "cad");
        assert_eq!(gateway.api_base, "https://api.stripe.com/v1");
        assert!(!format!("{:?}", gateway).contains("sk_test_123"));
    }

    #[test]
    fn test_intent_params() {
        let gateway = StripeGateway::new(&config()).unwrap();
        let params = gateway.intent_params(50_000);
        assert!(params.contains(&("amount", "50000".to_string())));
        assert!(params.contains(&("currency", "cad".to_string())));
        assert!(params.contains(&("metadata[type]", "credit_topup".to_string())));
    }

    #[test]
    fn test_decode_payment_intent() {
        let body = r#"{
            "id": "pi_3Nx9",
            "object": "payment_intent",
            "amount": 55000,
            "currency": "cad",
            "status": "succeeded",
            "client_secret": "pi_3Nx9_secret_abc",
            "metadata": {"user_id": "u1", "type": "credit_topup"},
            "livemode": false
        }"#;
        let intent: PaymentIntent = serde_json::from_str(body).unwrap();
        assert_eq!(intent.amount, 55_000);
        assert_eq!(intent.status, IntentStatus::Succeeded);
        assert_eq!(intent.metadata["type"], "credit_topup");
    }

    #[test]
    fn test_decode_error_body() {
        let body = r#"{"error": {"type": "invalid_request_error", "message": "No such payment_intent"}}"#;
        let parsed: StripeErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.error_type, "invalid_request_error");
        assert!(parsed.error.code.is_none());
    }
}
