//! Domain models for the storefront

mod cart;
mod cost;
mod feedback;
mod finance;
mod order;
mod product;
mod stock;
mod user;

pub use cart::*;
pub use cost::*;
pub use feedback::*;
pub use finance::*;
pub use order::*;
pub use product::*;
pub use stock::*;
pub use user::*;
