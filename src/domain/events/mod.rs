//! Domain events
//!
//! Raised by the store when a server object replaces the local copy.

use crate::domain::aggregates::Order;
use crate::domain::value_objects::{OrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Added { order_id: String },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
    PaymentVerified { order_id: String },
    PaymentRejected { order_id: String, reason: Option<String> },
    Removed { order_id: String },
}

impl OrderEvent {
    pub fn order_id(&self) -> &str {
        match self {
            Self::Added { order_id }
            | Self::StatusChanged { order_id, .. }
            | Self::PaymentVerified { order_id }
            | Self::PaymentRejected { order_id, .. }
            | Self::Removed { order_id } => order_id,
        }
    }

    /// Events implied by `next` replacing `prev`.
    pub fn diff(prev: Option<&Order>, next: &Order) -> Vec<OrderEvent> {
        let order_id = next.id.clone();
        let Some(prev) = prev else { return vec![Self::Added { order_id }] };
        let mut events = vec![];
        if prev.status != next.status {
            events.push(Self::StatusChanged { order_id: order_id.clone(), from: prev.status.clone(), to: next.status.clone() });
        }
        if prev.payment_status != next.payment_status {
            match next.payment_status {
                Some(PaymentStatus::Verified) => events.push(Self::PaymentVerified { order_id }),
                Some(PaymentStatus::Rejected) => events.push(Self::PaymentRejected {
                    order_id,
                    reason: next.verified_payment.as_ref().and_then(|v| v.rejection_reason.clone()),
                }),
                _ => {}
            }
        }
        events
    }
}
