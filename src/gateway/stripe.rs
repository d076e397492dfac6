//! Stripe-backed gateway client via REST API (no SDK dependency)
//!
//! Payment-mode checkout sessions with dynamic `price_data` line items,
//! form-encoded the way the Stripe API expects.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{
    CheckoutSession, CreateSessionRequest, GatewayError, PaymentGateway, SessionDetails,
};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Outbound calls are bounded; a timed-out call counts as failed and the
/// HTTP caller decides whether to retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const CURRENCY: &str = "eur";

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_api_base(secret_key, DEFAULT_API_BASE)
    }

    pub fn with_api_base(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            secret_key: secret_key.into(),
            api_base: api_base.into(),
        }
    }

    fn map_transport_err(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() || e.is_connect() {
            GatewayError::Unavailable(e.to_string())
        } else {
            GatewayError::Protocol(e.to_string())
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        req: &CreateSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("customer_email".into(), req.customer_email.clone()),
            ("success_url".into(), req.success_url.clone()),
            ("cancel_url".into(), req.cancel_url.clone()),
        ];

        for (i, item) in req.line_items.iter().enumerate() {
            form.push((
                format!("line_items[{i}][price_data][currency]"),
                CURRENCY.into(),
            ));
            form.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount.to_string(),
            ));
            form.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            if let Some(desc) = &item.description {
                form.push((
                    format!("line_items[{i}][price_data][product_data][description]"),
                    desc.clone(),
                ));
            }
            form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }

        // Metadata is the fallback reconciliation path; flatten object keys.
        if let Some(map) = req.metadata.as_object() {
            for (key, value) in map {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                form.push((format!("metadata[{key}]"), rendered));
            }
        }

        let resp: Value = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(Self::map_transport_err)?
            .json()
            .await
            .map_err(Self::map_transport_err)?;

        match (resp["id"].as_str(), resp["url"].as_str()) {
            (Some(id), Some(url)) => Ok(CheckoutSession {
                id: id.to_string(),
                url: url.to_string(),
            }),
            _ => Err(GatewayError::Protocol(format!(
                "create checkout session failed: {resp}"
            ))),
        }
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError> {
        let resp: Value = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{session_id}",
                self.api_base
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(Self::map_transport_err)?
            .json()
            .await
            .map_err(Self::map_transport_err)?;

        let id = resp["id"]
            .as_str()
            .ok_or_else(|| GatewayError::Protocol(format!("retrieve session failed: {resp}")))?;

        Ok(SessionDetails {
            id: id.to_string(),
            payment_status: resp["payment_status"].as_str().unwrap_or("").to_string(),
            payment_intent_id: resp["payment_intent"].as_str().map(String::from),
            amount_total: resp["amount_total"].as_i64(),
            currency: resp["currency"].as_str().map(String::from),
            metadata: resp["metadata"].clone(),
        })
    }
}
