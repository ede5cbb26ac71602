//! Value Objects for the order desk

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfillment status of an order.
///
/// Labels are the exact strings the backend stores. `Pending` is a legacy
/// alias of `OrderPlaced` that still shows up in old data; it is matched by
/// filters but never offered as a transition target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    OrderPlaced,
    Pending,
    Packing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// Statuses an operator may pick from the status control.
    pub const OPERATOR_TARGETS: [OrderStatus; 6] = [
        OrderStatus::OrderPlaced,
        OrderStatus::Packing,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::OrderPlaced => "Order Placed",
            Self::Pending => "Pending",
            Self::Packing => "Packing",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Other(raw) => raw,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::OrderPlaced | Self::Pending => "clipboard-list",
            Self::Packing => "box",
            Self::Shipped => "truck",
            Self::OutForDelivery => "shipping-fast",
            Self::Delivered => "check-circle",
            Self::Cancelled => "times-circle",
            Self::Other(_) => "question-circle",
        }
    }

    /// No further transition is offered out of a terminal status.
    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// `Order Placed` and its legacy alias `Pending`.
    pub fn is_placed(&self) -> bool { matches!(self, Self::OrderPlaced | Self::Pending) }

    pub fn is_operator_target(&self) -> bool { Self::OPERATOR_TARGETS.contains(self) }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Order Placed" => Self::OrderPlaced,
            "Pending" => Self::Pending,
            "Packing" => Self::Packing,
            "Shipped" => Self::Shipped,
            "Out for delivery" => Self::OutForDelivery,
            "Delivered" => Self::Delivered,
            "Cancelled" => Self::Cancelled,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self { Self::from(raw.to_string()) }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self { status.label().to_string() }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.label()) }
}

/// How the customer pays.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    Cod,
    Online,
    Easypaisa,
    Jazzcash,
    Other(String),
}

impl PaymentMethod {
    pub fn label(&self) -> &str {
        match self {
            Self::Cod => "COD",
            Self::Online => "online",
            Self::Easypaisa => "easypaisa",
            Self::Jazzcash => "jazzcash",
            Self::Other(raw) => raw,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Online => "Online Payment",
            Self::Easypaisa => "EasyPaisa",
            Self::Jazzcash => "JazzCash",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_cod(&self) -> bool { matches!(self, Self::Cod) }
}

impl From<String> for PaymentMethod {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "COD" => Self::Cod,
            "online" => Self::Online,
            "easypaisa" => Self::Easypaisa,
            "jazzcash" => Self::Jazzcash,
            _ => Self::Other(raw),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self { method.label().to_string() }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.label()) }
}

/// Verification state of a submitted online payment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Rejected,
    Other(String),
}

impl PaymentStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Self::Pending,
            "verified" => Self::Verified,
            "rejected" => Self::Rejected,
            _ => Self::Other(raw),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self { status.label().to_string() }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.label()) }
}

/// Order timestamps arrive either as epoch milliseconds or as RFC 3339 strings.
pub mod timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw { Millis(i64), Float(f64), Text(String) }

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => s.serialize_i64(at.timestamp_millis()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<Raw>::deserialize(d)?;
        Ok(match raw {
            Some(Raw::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
            Some(Raw::Float(ms)) => Utc.timestamp_millis_opt(ms as i64).single(),
            Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(&text).ok().map(|at| at.with_timezone(&Utc)),
            None => None,
        })
    }
}

/// Line-item fields that older records carry as `null` or as floats.
pub mod lenient {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};

    /// `null` reads as the field's default.
    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    /// Quantities sent as `2`, `2.0` or `"2"`. Fractions round down; negative or null reads as 0.
    pub fn quantity<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let raw = Option::<Decimal>::deserialize(d)?;
        Ok(raw.and_then(|q| q.trunc().to_u32()).unwrap_or(0))
    }
}
