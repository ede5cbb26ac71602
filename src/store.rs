//! In-memory mirror of the backend's order list.
//!
//! Orders are only ever replaced whole: either the full list on refetch or a
//! single object returned by a mutation. Fields are never patched locally.

use std::collections::{HashMap, HashSet};
use tracing::debug;
use crate::domain::aggregates::{Billing, Order};
use crate::domain::events::OrderEvent;

#[derive(Debug, Default)]
pub struct OrderStore {
    orders: HashMap<String, Order>,
    /// Server order of ids, used as the stable base for sorting.
    sequence: Vec<String>,
    revision: u64,
    /// Computed when an order is stored, so each stored object is billed once.
    billing: HashMap<String, Billing>,
}

impl OrderStore {
    pub fn new() -> Self { Self::default() }

    /// Bumped on every mutation; view caches key on it.
    pub fn revision(&self) -> u64 { self.revision }
    pub fn len(&self) -> usize { self.sequence.len() }
    pub fn is_empty(&self) -> bool { self.sequence.is_empty() }
    pub fn get(&self, order_id: &str) -> Option<&Order> { self.orders.get(order_id) }
    pub fn billing(&self, order_id: &str) -> Option<&Billing> { self.billing.get(order_id) }

    pub fn iter(&self) -> impl Iterator<Item = &Order> + '_ {
        self.sequence.iter().filter_map(|id| self.orders.get(id))
    }

    /// Swap in a freshly fetched list.
    pub fn replace_all(&mut self, orders: Vec<Order>) -> Vec<OrderEvent> {
        let mut previous = std::mem::take(&mut self.orders);
        self.sequence.clear();
        self.billing.clear();
        let initial_load = self.revision == 0;
        let mut events = vec![];
        let mut seen = HashSet::new();
        for order in orders {
            if !seen.insert(order.id.clone()) {
                debug!(order_id = %order.id, "duplicate order in list, keeping the later copy");
                self.sequence.retain(|id| id != &order.id);
            }
            let prior = previous.remove(&order.id).or_else(|| self.orders.remove(&order.id));
            // Added events on first load would just be noise
            if !initial_load {
                events.extend(OrderEvent::diff(prior.as_ref(), &order));
            }
            self.sequence.push(order.id.clone());
            self.billing.insert(order.id.clone(), Billing::for_order(&order));
            self.orders.insert(order.id.clone(), order);
        }
        let mut removed: Vec<String> = previous.into_keys().collect();
        removed.sort();
        events.extend(removed.into_iter().map(|order_id| OrderEvent::Removed { order_id }));
        self.revision += 1;
        events
    }

    /// Replace one order with the server's copy, appending it if unknown.
    pub fn merge(&mut self, order: Order) -> Vec<OrderEvent> {
        let events = OrderEvent::diff(self.orders.get(&order.id), &order);
        if !self.orders.contains_key(&order.id) {
            self.sequence.push(order.id.clone());
        }
        self.billing.insert(order.id.clone(), Billing::for_order(&order));
        self.orders.insert(order.id.clone(), order);
        self.revision += 1;
        events
    }
}
