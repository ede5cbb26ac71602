//! Filtering, search and sorting of the order list.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Order;
use crate::domain::value_objects::{OrderStatus, PaymentStatus};
use crate::store::OrderStore;
use crate::DeskError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderFilter {
    #[default]
    #[serde(rename = "all")] All,
    #[serde(rename = "pending_verification")] PendingVerification,
    #[serde(rename = "pending")] Pending,
    #[serde(rename = "packing")] Packing,
    #[serde(rename = "shipped")] Shipped,
    #[serde(rename = "out_for_delivery")] OutForDelivery,
    #[serde(rename = "delivered")] Delivered,
    #[serde(rename = "cancelled")] Cancelled,
    #[serde(rename = "COD")] Cod,
    #[serde(rename = "online")] Online,
}

impl OrderFilter {
    pub const ALL: [OrderFilter; 10] = [
        Self::All, Self::PendingVerification, Self::Pending, Self::Packing, Self::Shipped,
        Self::OutForDelivery, Self::Delivered, Self::Cancelled, Self::Cod, Self::Online,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::PendingVerification => "pending_verification",
            Self::Pending => "pending",
            Self::Packing => "packing",
            Self::Shipped => "shipped",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Cod => "COD",
            Self::Online => "online",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Orders",
            Self::PendingVerification => "Pending Verification",
            Self::Pending => "Pending",
            Self::Packing => "Packing",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled / Rejected",
            Self::Cod => "Cash on Delivery",
            Self::Online => "Online Payments",
        }
    }

    pub fn matches(self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::PendingVerification => !order.is_cod() && order.payment_status_is(&PaymentStatus::Pending),
            Self::Pending => order.status.is_placed() && order.is_payment_verified(),
            Self::Packing => order.status == OrderStatus::Packing,
            Self::Shipped => order.status == OrderStatus::Shipped,
            Self::OutForDelivery => order.status == OrderStatus::OutForDelivery,
            Self::Delivered => order.status == OrderStatus::Delivered,
            Self::Cancelled => order.status == OrderStatus::Cancelled || order.payment_status_is(&PaymentStatus::Rejected),
            Self::Cod => order.is_cod(),
            Self::Online => order.payment_method.is_some() && !order.is_cod(),
        }
    }
}

impl fmt::Display for OrderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.id()) }
}

impl FromStr for OrderFilter {
    type Err = DeskError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|f| f.id() == s)
            .ok_or_else(|| DeskError::Validation(format!("unknown filter '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    TotalHigh,
    TotalLow,
}

impl SortKey {
    pub fn id(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::TotalHigh => "total_high",
            Self::TotalLow => "total_low",
        }
    }
}

impl FromStr for SortKey {
    type Err = DeskError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Newest, Self::Oldest, Self::TotalHigh, Self::TotalLow].into_iter().find(|k| k.id() == s)
            .ok_or_else(|| DeskError::Validation(format!("unknown sort key '{s}'")))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OrderQuery {
    pub filter: OrderFilter,
    pub search: String,
    pub sort: SortKey,
}

impl OrderQuery {
    pub fn new(filter: OrderFilter) -> Self { Self { filter, ..Default::default() } }
    pub fn search(mut self, term: impl Into<String>) -> Self { self.search = term.into(); self }
    pub fn sort(mut self, sort: SortKey) -> Self { self.sort = sort; self }
}

/// Text fields match case-insensitively, the phone number as typed.
pub fn matches_search(order: &Order, term: &str) -> bool {
    if term.is_empty() { return true; }
    let needle = term.to_lowercase();
    let text_hit = |field: Option<&str>| field.is_some_and(|v| v.to_lowercase().contains(&needle));
    text_hit(Some(order.id.as_str()))
        || text_hit(order.customer_name())
        || text_hit(order.customer_email())
        || order.phone().is_some_and(|p| p.contains(term))
}

/// Filter, then search, then sort. Ties keep their input order.
pub fn apply<'a>(orders: impl IntoIterator<Item = &'a Order>, query: &OrderQuery) -> Vec<&'a Order> {
    let mut visible: Vec<&Order> = orders.into_iter()
        .filter(|o| query.filter.matches(o))
        .filter(|o| matches_search(o, &query.search))
        .collect();
    let date = |o: &Order| o.date.unwrap_or(DateTime::<Utc>::MIN_UTC);
    match query.sort {
        SortKey::Newest => visible.sort_by_key(|o| Reverse(date(*o))),
        SortKey::Oldest => visible.sort_by_key(|o| date(*o)),
        SortKey::TotalHigh => visible.sort_by_key(|o| Reverse(o.subtotal())),
        SortKey::TotalLow => visible.sort_by_key(|o| o.subtotal()),
    }
    visible
}

pub type FilterCounts = BTreeMap<OrderFilter, usize>;

/// Badge counts over the whole list, independent of any active query.
pub fn filter_counts<'a>(orders: impl IntoIterator<Item = &'a Order>) -> FilterCounts {
    let mut counts: FilterCounts = OrderFilter::ALL.into_iter().map(|f| (f, 0)).collect();
    for order in orders {
        for filter in OrderFilter::ALL {
            if filter.matches(order) {
                *counts.entry(filter).or_default() += 1;
            }
        }
    }
    counts
}

/// Memoizes the visible list on (store revision, query) and the counts on
/// the store revision alone.
#[derive(Debug, Default)]
pub struct FilterEngine {
    view: Option<((u64, OrderQuery), Vec<String>)>,
    counts: Option<(u64, FilterCounts)>,
}

impl FilterEngine {
    pub fn new() -> Self { Self::default() }

    pub fn view<'a>(&mut self, store: &'a OrderStore, query: &OrderQuery) -> Vec<&'a Order> {
        let key = (store.revision(), query.clone());
        let stale = self.view.as_ref().map_or(true, |(cached, _)| cached != &key);
        if stale {
            let ids = apply(store.iter(), query).into_iter().map(|o| o.id.clone()).collect();
            self.view = Some((key, ids));
        }
        self.view.as_ref()
            .map(|(_, ids)| ids.iter().filter_map(|id| store.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn counts(&mut self, store: &OrderStore) -> &FilterCounts {
        let revision = store.revision();
        if self.counts.as_ref().map_or(true, |(cached, _)| *cached != revision) {
            self.counts = Some((revision, filter_counts(store.iter())));
        }
        &self.counts.get_or_insert_with(|| (revision, FilterCounts::new())).1
    }

    /// Whether the last `view` call was served without recomputing.
    pub fn is_view_cached(&self, store: &OrderStore, query: &OrderQuery) -> bool {
        self.view.as_ref().is_some_and(|((rev, q), _)| *rev == store.revision() && q == query)
    }
}
