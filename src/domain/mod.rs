//! Order domain: value objects, the order aggregate and its derivations, events
pub mod value_objects;
pub mod aggregates;
pub mod events;
