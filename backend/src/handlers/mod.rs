//! HTTP request handlers

pub mod auth;
pub mod cart;
pub mod feedback;
pub mod finance;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod reporting;

pub use auth::*;
pub use cart::*;
pub use feedback::*;
pub use finance::*;
pub use health::*;
pub use inventory::*;
pub use orders::*;
pub use products::*;
pub use reporting::*;
