//! Order REST contract consumed by the desk.
//!
//! Every call takes the session token explicitly; implementations hold no
//! credentials of their own.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::aggregates::Order;
use crate::domain::value_objects::OrderStatus;
use crate::Result;

pub const LIST_PATH: &str = "/api/order/list";
pub const STATUS_PATH: &str = "/api/order/status";
pub const VERIFY_PAYMENT_PATH: &str = "/api/order/verify-payment";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Approve,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_id: String,
    pub status: OrderStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "reason_required_for_reject"))]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1))]
    pub order_id: String,
    pub action: VerifyAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerifyPaymentRequest {
    pub fn approve(order_id: impl Into<String>) -> Self {
        Self { order_id: order_id.into(), action: VerifyAction::Approve, reason: None }
    }

    pub fn reject(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { order_id: order_id.into(), action: VerifyAction::Reject, reason: Some(reason.into()) }
    }
}

pub const REJECT_REASON_REQUIRED: &str = "Please provide a reason for rejection";

fn reason_required_for_reject(req: &VerifyPaymentRequest) -> std::result::Result<(), ValidationError> {
    let blank = req.reason.as_deref().map_or(true, |r| r.trim().is_empty());
    if req.action == VerifyAction::Reject && blank {
        let mut err = ValidationError::new("reason_required");
        err.message = Some(REJECT_REASON_REQUIRED.into());
        return Err(err);
    }
    Ok(())
}

/// Body shared by all order endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<Order>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn list_orders(&self, token: &str) -> Result<Vec<Order>>;

    /// Returns the server's confirmation message.
    async fn update_status(&self, token: &str, req: &UpdateStatusRequest) -> Result<String>;

    /// Returns the server's message and its authoritative copy of the order.
    async fn verify_payment(&self, token: &str, req: &VerifyPaymentRequest) -> Result<(String, Order)>;
}
