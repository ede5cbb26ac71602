//! OpenSASE Order Desk
//!
//! Admin-side order handling for the OpenSASE e-commerce backend.
//!
//! ## Features
//! - Order list mirroring with whole-object reconciliation
//! - Manual payment verification (approve / reject) for online methods
//! - Fulfillment status updates gated on payment state
//! - Billing breakdown: prepaid and remaining amounts per order
//! - Filtering, search, sorting and badge counts
//! - Deal bundle grouping of order lines

pub mod api;
pub mod config;
pub mod desk;
pub mod domain;
pub mod filter;
pub mod session;
pub mod store;

pub use api::{http::HttpOrderApi, OrderApi, VerifyAction, VerifyPaymentRequest};
pub use config::DeskConfig;
pub use desk::OrderDesk;
pub use domain::aggregates::{Billing, BillingSummary, ItemGroups, Order, VerificationState};
pub use domain::events::OrderEvent;
pub use domain::value_objects::{OrderStatus, PaymentMethod, PaymentStatus};
pub use filter::{FilterEngine, OrderFilter, OrderQuery, SortKey};
pub use session::{Notice, NoticeLevel, Session};
pub use store::OrderStore;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum DeskError {
    /// Caught locally; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("Not Authorized. Login again.")]
    Unauthorized,

    /// The backend answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer other than 401.
    #[error("server error {status}: {message:?}")]
    Server { status: u16, message: Option<String> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order {order_id} is {status}; its status cannot be changed until payment is verified or while it is final")]
    StatusLocked { order_id: String, status: String },

    #[error("Order {0} has no payment awaiting verification")]
    NotAwaitingVerification(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeskError {
    /// Text for the operator notice: the server's message when there is one.
    pub fn notice_message(&self) -> String {
        match self {
            Self::Http(_) | Self::InvalidResponse(_) | Self::Server { message: None, .. } => GENERIC_FAILURE.to_string(),
            Self::Server { message: Some(message), .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool { matches!(self, Self::Unauthorized) }
}

pub type Result<T> = std::result::Result<T, DeskError>;
