//! External service integrations

pub mod messaging;

pub use messaging::CheckoutNotifier;
