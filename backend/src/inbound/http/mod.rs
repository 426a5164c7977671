//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers resolve the session user through [`state::HttpState`], convert
//! wire bodies from [`schemas`] into domain inputs and call the driving ports.

pub mod accounts;
pub mod collections;
pub mod error;
pub mod health;
pub mod pickups;
pub mod points;
pub mod rewards;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
