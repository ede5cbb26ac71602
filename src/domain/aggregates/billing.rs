//! Billing breakdown derived from an order

use rust_decimal::Decimal;
use serde::Serialize;
use super::order::Order;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Billing {
    pub subtotal: Decimal,
    pub delivery_charges: Decimal,
    pub total: Decimal,
    pub is_cod: bool,
    pub is_payment_verified: bool,
    /// Already collected through a verified non-COD payment.
    pub prepaid_amount: Decimal,
    /// Still owed; collected on delivery for COD.
    pub remaining_amount: Decimal,
    pub is_fully_paid: bool,
}

impl Billing {
    pub fn for_order(order: &Order) -> Self {
        let subtotal = order.subtotal();
        let delivery_charges = order.delivery_charges.unwrap_or(Decimal::ZERO);
        let total = subtotal.saturating_add(delivery_charges);
        let is_cod = order.is_cod();
        let is_payment_verified = order.is_payment_verified();

        let prepaid_amount = if !is_cod && is_payment_verified {
            // zero counts as "not recorded", so fall through to the next source
            [order.payment_amount, order.amount]
                .into_iter()
                .flatten()
                .find(|v| !v.is_zero())
                .unwrap_or(total)
        } else {
            Decimal::ZERO
        };

        let remaining_amount = if is_cod || !is_payment_verified {
            total
        } else {
            total.saturating_sub(prepaid_amount).max(Decimal::ZERO)
        };

        Self {
            subtotal, delivery_charges, total, is_cod, is_payment_verified,
            prepaid_amount, remaining_amount, is_fully_paid: remaining_amount.is_zero(),
        }
    }
}

/// Totals over a set of orders, for the operator summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BillingSummary {
    pub orders: usize,
    pub gross_total: Decimal,
    pub prepaid_total: Decimal,
    pub outstanding_total: Decimal,
    pub fully_paid: usize,
    pub awaiting_verification: usize,
}

impl BillingSummary {
    pub fn over<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders.into_iter().fold(Self::default(), |mut acc, order| {
            let billing = Billing::for_order(order);
            acc.orders += 1;
            acc.gross_total = acc.gross_total.saturating_add(billing.total);
            acc.prepaid_total = acc.prepaid_total.saturating_add(billing.prepaid_amount);
            acc.outstanding_total = acc.outstanding_total.saturating_add(billing.remaining_amount);
            if billing.is_fully_paid { acc.fully_paid += 1; }
            if order.needs_verification() { acc.awaiting_verification += 1; }
            acc
        })
    }
}
