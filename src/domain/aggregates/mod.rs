//! Aggregates module
pub mod order;
pub mod billing;
pub mod deals;

pub use order::{Order, LineItem, Address, CustomerDetails, VerifiedPayment, VerificationState};
pub use billing::{Billing, BillingSummary};
pub use deals::{DealGroup, ItemGroups, UNKNOWN_DEAL};
