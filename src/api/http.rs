//! reqwest implementation of the order API

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use crate::api::{ApiEnvelope, OrderApi, UpdateStatusRequest, VerifyPaymentRequest, LIST_PATH, STATUS_PATH, VERIFY_PAYMENT_PATH};
use crate::config::DeskConfig;
use crate::domain::aggregates::Order;
use crate::{DeskError, Result};

/// Header the backend reads the admin token from.
pub const TOKEN_HEADER: &str = "token";

const NOT_AUTHORIZED: &str = "Not Authorized";

#[derive(Debug, Clone)]
pub struct HttpOrderApi {
    client: Client,
    base_url: String,
}

impl HttpOrderApi {
    pub fn new(config: &DeskConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, base_url: config.api_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    async fn get(&self, token: &str, path: &str) -> Result<ApiEnvelope> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).header(TOKEN_HEADER, token).send().await?;
        Self::handle_response(path, response).await
    }

    async fn post<B: Serialize + ?Sized>(&self, token: &str, path: &str, body: &B) -> Result<ApiEnvelope> {
        debug!(path, "POST");
        let response = self.client.post(self.url(path)).header(TOKEN_HEADER, token).json(body).send().await?;
        Self::handle_response(path, response).await
    }

    /// Maps 401s and "Not Authorized" messages to `Unauthorized`, and
    /// `success: false` to `Rejected` carrying the server's message.
    async fn handle_response(path: &str, response: reqwest::Response) -> Result<ApiEnvelope> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "unauthorized");
            return Err(DeskError::Unauthorized);
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str::<ApiEnvelope>(&text);
        let message = parsed.as_ref().ok().and_then(|e| e.message.clone());

        if message.as_deref().is_some_and(|m| m.contains(NOT_AUTHORIZED)) {
            warn!(path, "backend reported not authorized");
            return Err(DeskError::Unauthorized);
        }

        if !status.is_success() {
            warn!(path, status = status.as_u16(), "request failed");
            return Err(DeskError::Server { status: status.as_u16(), message });
        }

        let envelope = parsed.map_err(|e| DeskError::InvalidResponse(format!("{path}: {e}")))?;
        if !envelope.success {
            warn!(path, message = ?envelope.message, "request rejected");
            return Err(DeskError::Rejected(message.unwrap_or_else(|| crate::GENERIC_FAILURE.to_string())));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn list_orders(&self, token: &str) -> Result<Vec<Order>> {
        let envelope = self.get(token, LIST_PATH).await?;
        envelope.orders.ok_or_else(|| DeskError::InvalidResponse("order list missing".into()))
    }

    async fn update_status(&self, token: &str, req: &UpdateStatusRequest) -> Result<String> {
        let envelope = self.post(token, STATUS_PATH, req).await?;
        Ok(envelope.message.unwrap_or_else(|| "Status updated".into()))
    }

    async fn verify_payment(&self, token: &str, req: &VerifyPaymentRequest) -> Result<(String, Order)> {
        let envelope = self.post(token, VERIFY_PAYMENT_PATH, req).await?;
        let order = envelope.order.ok_or_else(|| DeskError::InvalidResponse("verified order missing".into()))?;
        Ok((envelope.message.unwrap_or_else(|| "Payment updated".into()), order))
    }
}
