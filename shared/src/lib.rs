//! Shared types and business rules for the Storefront platform
//!
//! This crate contains the domain model and the pure rules (stock levels,
//! cart totals, order status transitions, installments, financial
//! aggregation) used by the backend server and its tests.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
