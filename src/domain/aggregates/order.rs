//! Order Aggregate
//!
//! Orders are created and persisted by the backend. This side only reads
//! them, asks the backend to mutate them, and derives view state from them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{lenient, timestamp, OrderStatus, PaymentMethod, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_charges: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_payment: Option<VerifiedPayment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default, with = "timestamp")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub is_from_deal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_description: Option<String>,
}

impl LineItem {
    /// Saturates at the `Decimal` bounds instead of overflowing.
    pub fn line_total(&self) -> Decimal { self.price.saturating_mul(Decimal::from(self.quantity)) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, with = "timestamp")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)] pub first_name: Option<String>,
    #[serde(default)] pub last_name: Option<String>,
    #[serde(default)] pub street: Option<String>,
    #[serde(default)] pub city: Option<String>,
    #[serde(default)] pub state: Option<String>,
    #[serde(default)] pub zipcode: Option<String>,
    #[serde(default)] pub country: Option<String>,
    #[serde(default)] pub phone: Option<String>,
    #[serde(default)] pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)] pub name: Option<String>,
    #[serde(default)] pub email: Option<String>,
    #[serde(default)] pub phone: Option<String>,
}

/// Where an order stands in the manual payment verification flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationState {
    /// Online payment submitted, waiting for an operator decision.
    NeedsVerification,
    /// COD, or an online payment an operator approved.
    Verified,
    Rejected,
    /// Online method without a recognised payment status.
    Unsubmitted,
}

impl Order {
    pub fn id(&self) -> &str { &self.id }
    pub fn status(&self) -> &OrderStatus { &self.status }

    /// Only an explicit `COD` counts; a missing method is merely displayed as COD.
    pub fn is_cod(&self) -> bool { self.payment_method.as_ref().is_some_and(PaymentMethod::is_cod) }

    pub fn display_payment_method(&self) -> PaymentMethod {
        self.payment_method.clone().unwrap_or(PaymentMethod::Cod)
    }

    pub fn payment_status_is(&self, status: &PaymentStatus) -> bool { self.payment_status.as_ref() == Some(status) }

    pub fn is_payment_verified(&self) -> bool { self.is_cod() || self.payment_status_is(&PaymentStatus::Verified) }

    pub fn verification_state(&self) -> VerificationState {
        if self.is_cod() { return VerificationState::Verified; }
        match self.payment_status {
            Some(PaymentStatus::Pending) => VerificationState::NeedsVerification,
            Some(PaymentStatus::Verified) => VerificationState::Verified,
            Some(PaymentStatus::Rejected) => VerificationState::Rejected,
            _ => VerificationState::Unsubmitted,
        }
    }

    pub fn needs_verification(&self) -> bool { self.verification_state() == VerificationState::NeedsVerification }

    /// Whether the fulfillment status control is offered at all.
    pub fn can_update_status(&self) -> bool {
        (self.is_cod() || self.payment_status_is(&PaymentStatus::Verified)) && !self.status.is_terminal()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Proof of payment, preferring the copy stored at verification time.
    pub fn screenshot(&self) -> Option<&str> {
        self.verified_payment.as_ref().and_then(|v| v.screenshot.as_deref()).or(self.payment_screenshot.as_deref())
    }

    pub fn customer_name(&self) -> Option<&str> { self.customer_details.as_ref().and_then(|c| c.name.as_deref()) }
    pub fn customer_email(&self) -> Option<&str> { self.customer_details.as_ref().and_then(|c| c.email.as_deref()) }
    pub fn phone(&self) -> Option<&str> { self.address.as_ref().and_then(|a| a.phone.as_deref()) }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn order(id: &str, status: &str, method: Option<&str>, payment: Option<&str>) -> Order {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "status": status,
            "paymentMethod": method,
            "paymentStatus": payment,
            "items": [],
        }))
        .unwrap()
    }

    #[test]
    fn test_deserializes_backend_order() {
        let o: Order = serde_json::from_value(serde_json::json!({
            "_id": "665f1c2a9b",
            "status": "Order Placed",
            "paymentMethod": "easypaisa",
            "paymentStatus": "pending",
            "amount": 1250,
            "deliveryCharges": null,
            "items": [{ "name": "Kurta", "price": 600, "quantity": 2, "size": "M" }],
            "address": { "firstName": "Ayesha", "phone": "03001234567" },
            "paymentScreenshot": "https://cdn.example.com/proof.png",
            "date": 1717000000000i64
        }))
        .unwrap();
        assert_eq!(o.payment_method, Some(PaymentMethod::Easypaisa));
        assert_eq!(o.delivery_charges, None);
        assert_eq!(o.subtotal(), Decimal::new(1200, 0));
        assert_eq!(o.phone(), Some("03001234567"));
        assert_eq!(o.screenshot(), Some("https://cdn.example.com/proof.png"));
        assert!(o.needs_verification());
    }

    #[test]
    fn test_null_and_float_item_fields_use_defaults() {
        let o: Order = serde_json::from_value(serde_json::json!({
            "_id": "665f1c2b01",
            "status": "Packing",
            "paymentMethod": "COD",
            "items": [
                { "name": "Cap", "price": null, "quantity": 1.0, "isFromDeal": null },
                { "name": null, "price": 450, "quantity": 2.0, "isFromDeal": true, "dealName": "Summer Bundle" }
            ]
        }))
        .unwrap();
        assert_eq!(o.items[0].price, Decimal::ZERO);
        assert_eq!(o.items[0].quantity, 1);
        assert!(!o.items[0].is_from_deal);
        assert_eq!(o.items[1].name, "");
        assert_eq!(o.subtotal(), Decimal::new(900, 0));
    }

    #[test]
    fn test_huge_line_totals_saturate() {
        let item = LineItem { price: Decimal::from_scientific("5e28").unwrap(), quantity: 2, ..Default::default() };
        assert_eq!(item.line_total(), Decimal::MAX);
        let mut o = order("1", "Packing", Some("COD"), None);
        o.items = vec![item.clone(), item];
        assert_eq!(o.subtotal(), Decimal::MAX);
    }

    #[test]
    fn test_cod_is_always_verified() {
        let o = order("1", "Order Placed", Some("COD"), Some("rejected"));
        assert_eq!(o.verification_state(), VerificationState::Verified);
        assert!(o.can_update_status());
    }

    #[test]
    fn test_missing_method_is_not_cod() {
        let o = order("1", "Order Placed", None, None);
        assert_eq!(o.display_payment_method(), PaymentMethod::Cod);
        assert!(!o.is_cod());
        assert!(!o.can_update_status());
        assert_eq!(o.verification_state(), VerificationState::Unsubmitted);
    }

    #[test]
    fn test_gate_requires_verified_online_payment() {
        assert!(!order("1", "Packing", Some("online"), Some("pending")).can_update_status());
        assert!(!order("1", "Packing", Some("online"), Some("rejected")).can_update_status());
        assert!(order("1", "Packing", Some("jazzcash"), Some("verified")).can_update_status());
    }

    #[test]
    fn test_gate_closed_for_terminal_statuses() {
        let payments = [
            (Some("COD"), None),
            (Some("COD"), Some("verified")),
            (Some("online"), Some("verified")),
            (Some("online"), Some("pending")),
            (Some("easypaisa"), Some("rejected")),
            (None, None),
        ];
        for status in ["Cancelled", "Delivered"] {
            for (method, payment) in payments {
                assert!(!order("1", status, method, payment).can_update_status(), "{status} {method:?} {payment:?}");
            }
        }
    }

    #[test]
    fn test_verified_screenshot_takes_precedence() {
        let mut o = order("1", "Packing", Some("online"), Some("verified"));
        o.payment_screenshot = Some("upload.png".into());
        o.verified_payment = Some(VerifiedPayment { screenshot: Some("verified.png".into()), ..Default::default() });
        assert_eq!(o.screenshot(), Some("verified.png"));
    }
}
