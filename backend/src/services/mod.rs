//! Business logic services for the storefront and back office

pub mod auth;
pub mod cart;
pub mod cost;
pub mod expense;
pub mod feedback;
pub mod financial_entry;
pub mod inventory;
pub mod media;
pub mod order;
pub mod product;
pub mod reporting;

pub use auth::AuthService;
pub use cart::CartService;
pub use cost::CostService;
pub use expense::ExpenseService;
pub use feedback::FeedbackService;
pub use financial_entry::FinancialEntryService;
pub use inventory::InventoryService;
pub use order::OrderService;
pub use product::ProductService;
pub use reporting::ReportingService;
