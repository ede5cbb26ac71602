//! The order desk: payment verification and status updates against the
//! backend, mirrored into a local store.
//!
//! Nothing is applied optimistically. A mutation either succeeds and the
//! server's copy replaces ours (or the list is refetched), or it fails and
//! the store is left exactly as it was. Every failure becomes an operator
//! notice; unauthorized answers additionally end the session.

use tracing::{info, warn};
use validator::{Validate, ValidationErrors};
use crate::api::{OrderApi, UpdateStatusRequest, VerifyPaymentRequest};
use crate::domain::aggregates::{Billing, Order};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::OrderStatus;
use crate::filter::{FilterCounts, FilterEngine, OrderQuery};
use crate::session::{Notice, Session};
use crate::store::OrderStore;
use crate::{DeskError, Result};

pub struct OrderDesk<A> {
    api: A,
    session: Session,
    store: OrderStore,
    engine: FilterEngine,
    notices: Vec<Notice>,
}

impl<A: OrderApi> OrderDesk<A> {
    pub fn new(api: A, session: Session) -> Self {
        Self { api, session, store: OrderStore::new(), engine: FilterEngine::new(), notices: vec![] }
    }

    pub fn api(&self) -> &A { &self.api }
    pub fn session(&self) -> &Session { &self.session }
    pub fn session_mut(&mut self) -> &mut Session { &mut self.session }
    pub fn store(&self) -> &OrderStore { &self.store }
    pub fn order(&self, order_id: &str) -> Option<&Order> { self.store.get(order_id) }
    pub fn billing(&self, order_id: &str) -> Option<&Billing> { self.store.billing(order_id) }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> { std::mem::take(&mut self.notices) }

    pub fn view(&mut self, query: &OrderQuery) -> Vec<&Order> { self.engine.view(&self.store, query) }

    pub fn filter_counts(&mut self) -> &FilterCounts { self.engine.counts(&self.store) }

    /// Refetch the full order list.
    pub async fn refresh(&mut self) -> Result<usize> {
        let token = self.token()?;
        match self.api.list_orders(&token).await {
            Ok(orders) => {
                let events = self.store.replace_all(orders);
                self.log_events(&events);
                info!(count = self.store.len(), "orders loaded");
                Ok(self.store.len())
            }
            Err(err) => Err(self.report(err)),
        }
    }

    /// Move an order to another fulfillment status, then refetch.
    pub async fn update_status(&mut self, order_id: &str, status: OrderStatus) -> Result<()> {
        if !status.is_operator_target() {
            return Err(self.report(DeskError::Validation(format!("'{status}' is not a selectable status"))));
        }
        let order = self.known_order(order_id)?;
        if !order.can_update_status() {
            let err = DeskError::StatusLocked { order_id: order_id.to_string(), status: order.status.to_string() };
            return Err(self.report(err));
        }

        let token = self.token()?;
        let req = UpdateStatusRequest { order_id: order_id.to_string(), status };
        match self.api.update_status(&token, &req).await {
            Ok(message) => {
                info!(order_id, status = %req.status, "status updated");
                self.notices.push(Notice::success(message));
                self.refresh().await.map(|_| ())
            }
            Err(err) => Err(self.report(err)),
        }
    }

    pub async fn approve_payment(&mut self, order_id: &str) -> Result<&Order> {
        self.verify_payment(VerifyPaymentRequest::approve(order_id)).await
    }

    pub async fn reject_payment(&mut self, order_id: &str, reason: &str) -> Result<&Order> {
        self.verify_payment(VerifyPaymentRequest::reject(order_id, reason)).await
    }

    /// Submit an approve/reject decision and adopt the server's copy of the order.
    pub async fn verify_payment(&mut self, req: VerifyPaymentRequest) -> Result<&Order> {
        if let Err(errors) = req.validate() {
            return Err(self.report(DeskError::Validation(validation_message(&errors))));
        }
        if !self.known_order(&req.order_id)?.needs_verification() {
            return Err(self.report(DeskError::NotAwaitingVerification(req.order_id.clone())));
        }

        let token = self.token()?;
        match self.api.verify_payment(&token, &req).await {
            Ok((message, order)) => {
                info!(order_id = %req.order_id, action = ?req.action, "payment decision recorded");
                if order.id != req.order_id {
                    warn!(requested = %req.order_id, returned = %order.id, "backend returned a different order");
                }
                let order_id = order.id.clone();
                let events = self.store.merge(order);
                self.log_events(&events);
                self.notices.push(Notice::success(message));
                self.store.get(&order_id).ok_or(DeskError::OrderNotFound(order_id))
            }
            Err(err) => Err(self.report(err)),
        }
    }

    fn known_order(&mut self, order_id: &str) -> Result<&Order> {
        if self.store.get(order_id).is_none() {
            return Err(self.report(DeskError::OrderNotFound(order_id.to_string())));
        }
        self.store.get(order_id).ok_or_else(|| DeskError::OrderNotFound(order_id.to_string()))
    }

    fn token(&mut self) -> Result<String> {
        match self.session.token() {
            Some(token) => Ok(token.to_string()),
            None => Err(self.report(DeskError::Unauthorized)),
        }
    }

    /// Turn a failure into a notice; unauthorized also ends the session.
    fn report(&mut self, err: DeskError) -> DeskError {
        warn!(error = %err, "order desk action failed");
        self.notices.push(Notice::error(err.notice_message()));
        if err.is_unauthorized() {
            self.session.logout();
            if let Some(login) = self.session.redirect() {
                self.notices.push(Notice::info(format!("Redirecting to {login}")));
            }
        }
        err
    }

    fn log_events(&self, events: &[OrderEvent]) {
        for event in events {
            info!(order_id = event.order_id(), ?event, "order event");
        }
    }
}

fn validation_message(errors: &ValidationErrors) -> String {
    errors.field_errors().values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid payment verification request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use async_trait::async_trait;
    use crate::api::REJECT_REASON_REQUIRED;
    use crate::domain::aggregates::order::tests::order;
    use crate::domain::value_objects::PaymentStatus;
    use crate::session::NoticeLevel;

    #[derive(Default)]
    struct FakeApi {
        orders: Mutex<Vec<Order>>,
        calls: AtomicUsize,
        fail_with: Mutex<Option<fn() -> DeskError>>,
        status_requests: Mutex<Vec<UpdateStatusRequest>>,
        verify_requests: Mutex<Vec<VerifyPaymentRequest>>,
    }

    impl FakeApi {
        fn with(orders: Vec<Order>) -> Self { Self { orders: Mutex::new(orders), ..Default::default() } }
        fn fail(&self, f: fn() -> DeskError) { *self.fail_with.lock().unwrap() = Some(f); }
        fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
        fn check(&self, token: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(token, "admin-token");
            match *self.fail_with.lock().unwrap() {
                Some(f) => Err(f()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl OrderApi for FakeApi {
        async fn list_orders(&self, token: &str) -> Result<Vec<Order>> {
            self.check(token)?;
            Ok(self.orders.lock().unwrap().clone())
        }

        async fn update_status(&self, token: &str, req: &UpdateStatusRequest) -> Result<String> {
            self.check(token)?;
            self.status_requests.lock().unwrap().push(req.clone());
            let mut orders = self.orders.lock().unwrap();
            if let Some(o) = orders.iter_mut().find(|o| o.id == req.order_id) {
                o.status = req.status.clone();
            }
            Ok("Status Updated".into())
        }

        async fn verify_payment(&self, token: &str, req: &VerifyPaymentRequest) -> Result<(String, Order)> {
            self.check(token)?;
            self.verify_requests.lock().unwrap().push(req.clone());
            let mut orders = self.orders.lock().unwrap();
            let o = orders.iter_mut().find(|o| o.id == req.order_id).ok_or(DeskError::Rejected("Order not found".into()))?;
            match req.action {
                crate::api::VerifyAction::Approve => o.payment_status = Some(PaymentStatus::Verified),
                crate::api::VerifyAction::Reject => {
                    o.payment_status = Some(PaymentStatus::Rejected);
                    o.status = OrderStatus::Cancelled;
                }
            }
            Ok(("Payment verified".into(), o.clone()))
        }
    }

    async fn loaded(orders: Vec<Order>) -> OrderDesk<FakeApi> {
        let mut desk = OrderDesk::new(FakeApi::with(orders), Session::new(Some("admin-token".into()), "/login"));
        desk.refresh().await.unwrap();
        desk
    }

    #[tokio::test]
    async fn test_reject_without_reason_makes_no_call() {
        let mut desk = loaded(vec![order("o1", "Order Placed", Some("online"), Some("pending"))]).await;
        let before = desk.api().calls();

        let err = desk.reject_payment("o1", "").await.unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
        assert_eq!(desk.api().calls(), before);

        let notices = desk.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, REJECT_REASON_REQUIRED);
    }

    #[tokio::test]
    async fn test_approve_adopts_server_copy() {
        let mut desk = loaded(vec![order("o1", "Order Placed", Some("easypaisa"), Some("pending"))]).await;
        let o = desk.approve_payment("o1").await.unwrap();
        assert_eq!(o.payment_status, Some(PaymentStatus::Verified));
        assert!(o.can_update_status());
        assert_eq!(desk.take_notices()[0].message, "Payment verified");
    }

    #[tokio::test]
    async fn test_reject_keeps_cascaded_server_status() {
        let mut desk = loaded(vec![order("o1", "Order Placed", Some("online"), Some("pending"))]).await;
        desk.reject_payment("o1", "screenshot does not match amount").await.unwrap();
        let o = desk.order("o1").unwrap();
        assert_eq!(o.status, OrderStatus::Cancelled);
        assert_eq!(o.payment_status, Some(PaymentStatus::Rejected));
        let sent = desk.api().verify_requests.lock().unwrap().clone();
        assert_eq!(sent[0].reason.as_deref(), Some("screenshot does not match amount"));
    }

    #[tokio::test]
    async fn test_cod_orders_never_go_to_verification() {
        let mut desk = loaded(vec![order("o1", "Order Placed", Some("COD"), Some("pending"))]).await;
        let before = desk.api().calls();
        let err = desk.approve_payment("o1").await.unwrap_err();
        assert!(matches!(err, DeskError::NotAwaitingVerification(_)));
        assert_eq!(desk.api().calls(), before);
    }

    #[tokio::test]
    async fn test_business_rejection_leaves_store_unchanged() {
        let mut desk = loaded(vec![order("o1", "Order Placed", Some("online"), Some("pending"))]).await;
        let snapshot = desk.order("o1").cloned();
        let revision = desk.store().revision();
        desk.api().fail(|| DeskError::Rejected("Screenshot already reviewed".into()));

        let err = desk.approve_payment("o1").await.unwrap_err();
        assert!(matches!(err, DeskError::Rejected(_)));
        assert_eq!(desk.order("o1").cloned(), snapshot);
        assert_eq!(desk.store().revision(), revision);
        assert_eq!(desk.take_notices()[0].message, "Screenshot already reviewed");
        assert!(desk.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_transport_failure_uses_generic_message() {
        let mut desk = loaded(vec![order("o1", "Packing", Some("COD"), None)]).await;
        desk.api().fail(|| DeskError::Server { status: 502, message: None });
        desk.update_status("o1", OrderStatus::Shipped).await.unwrap_err();
        assert_eq!(desk.take_notices()[0].message, crate::GENERIC_FAILURE);
        assert_eq!(desk.order("o1").unwrap().status, OrderStatus::Packing);
    }

    #[tokio::test]
    async fn test_unauthorized_logs_out() {
        let mut desk = loaded(vec![order("o1", "Packing", Some("COD"), None)]).await;
        desk.api().fail(|| DeskError::Unauthorized);

        let err = desk.refresh().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!desk.session().is_logged_in());
        assert_eq!(desk.session().redirect(), Some("/login"));
        let notices = desk.take_notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[1].level, NoticeLevel::Info);
        assert_eq!(notices[1].message, "Redirecting to /login");

        // without a token nothing else reaches the backend
        let before = desk.api().calls();
        assert!(desk.update_status("o1", OrderStatus::Shipped).await.unwrap_err().is_unauthorized());
        assert_eq!(desk.api().calls(), before);
    }

    #[tokio::test]
    async fn test_status_update_refetches() {
        let mut desk = loaded(vec![order("o1", "Packing", Some("COD"), None)]).await;
        let before = desk.api().calls();
        desk.update_status("o1", OrderStatus::OutForDelivery).await.unwrap();
        assert_eq!(desk.api().calls(), before + 2);
        assert_eq!(desk.order("o1").unwrap().status, OrderStatus::OutForDelivery);
        let sent = desk.api().status_requests.lock().unwrap().clone();
        assert_eq!(sent, vec![UpdateStatusRequest { order_id: "o1".into(), status: OrderStatus::OutForDelivery }]);
    }

    #[tokio::test]
    async fn test_gate_blocks_status_update_locally() {
        let mut desk = loaded(vec![
            order("unpaid", "Order Placed", Some("online"), Some("pending")),
            order("done", "Delivered", Some("COD"), None),
        ]).await;
        let before = desk.api().calls();
        for id in ["unpaid", "done"] {
            let err = desk.update_status(id, OrderStatus::Cancelled).await.unwrap_err();
            assert!(matches!(err, DeskError::StatusLocked { .. }), "{id}");
        }
        let err = desk.update_status("done", OrderStatus::Pending).await.unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
        assert_eq!(desk.api().calls(), before);
    }

    #[tokio::test]
    async fn test_unknown_order_is_reported() {
        let mut desk = loaded(vec![]).await;
        let err = desk.approve_payment("nope").await.unwrap_err();
        assert!(matches!(err, DeskError::OrderNotFound(_)));
        assert_eq!(desk.take_notices().len(), 1);
    }

    #[tokio::test]
    async fn test_view_and_counts() {
        let mut desk = loaded(vec![
            order("a", "Order Placed", Some("COD"), None),
            order("b", "Order Placed", Some("online"), Some("pending")),
        ]).await;
        let pending: Vec<String> = desk.view(&OrderQuery::new(crate::OrderFilter::Pending)).iter().map(|o| o.id.clone()).collect();
        assert_eq!(pending, vec!["a"]);
        assert_eq!(desk.filter_counts()[&crate::OrderFilter::PendingVerification], 1);

        desk.approve_payment("b").await.unwrap();
        assert_eq!(desk.filter_counts()[&crate::OrderFilter::PendingVerification], 0);
        assert_eq!(desk.filter_counts()[&crate::OrderFilter::Pending], 2);
    }
}
