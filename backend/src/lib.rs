//! ReciclAI backend library: recycling pickups, the collection lifecycle,
//! dispatch ranking and loyalty points.
//!
//! Layers follow a hexagonal layout: [`domain`] holds the rules and services,
//! [`inbound`] adapts HTTP onto the driving ports and [`outbound`] implements
//! the storage ports.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
