//! Route definitions for the storefront API

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, optional_auth_middleware, require_staff},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes(state.clone()))
        // Storefront catalog (public)
        .nest("/products", catalog_routes())
        // Cart (guest session key or signed-in user)
        .nest("/cart", cart_routes(state.clone()))
        // Customer routes (protected)
        .merge(customer_routes(state.clone()))
        // Back office (staff only)
        .nest("/admin", admin_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route(
            "/me",
            get(handlers::me).route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}

/// Catalog routes (public)
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products))
        .route("/search", get(handlers::search_products))
        .route("/:product_id", get(handlers::get_product))
        .route("/:product_id/feedback", get(handlers::get_product_feedback))
}

/// Cart routes; a bearer token is optional
fn cart_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_cart).delete(handlers::clear_cart))
        .route("/items", post(handlers::add_cart_item))
        .route(
            "/items/:item_id",
            put(handlers::update_cart_item).delete(handlers::remove_cart_item),
        )
        .route_layer(middleware::from_fn_with_state(state, optional_auth_middleware))
}

/// Checkout, order history and feedback (protected)
fn customer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/checkout", post(handlers::checkout))
        .route("/orders", get(handlers::list_my_orders))
        .route("/orders/:order_id", get(handlers::get_my_order))
        .route("/feedback", post(handlers::create_feedback))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Back-office routes (staff)
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .nest("/products", admin_product_routes())
        .nest("/inventory", inventory_routes())
        .nest("/orders", admin_order_routes())
        .nest("/feedback", admin_feedback_routes())
        .nest("/finance", finance_routes())
        .nest("/reports", report_routes())
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product management routes
fn admin_product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::admin_list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::admin_get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/image", post(handlers::upload_product_image))
        .route("/:product_id/movements", post(handlers::record_stock_movement))
}

/// Inventory routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_stock_overview))
        .route("/limits", put(handlers::save_stock_limits))
        .route("/movements", get(handlers::list_stock_movements))
}

/// Order management routes
fn admin_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::admin_list_orders))
        .route("/status", post(handlers::bulk_change_order_status))
        .route("/:order_id", get(handlers::admin_get_order))
        .route("/:order_id/status", put(handlers::change_order_status))
}

/// Feedback moderation routes
fn admin_feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::admin_list_feedback))
        .route(
            "/:feedback_id",
            patch(handlers::set_feedback_visibility).delete(handlers::delete_feedback),
        )
}

/// Costs, expenses and financial entries
fn finance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/costs",
            get(handlers::list_product_costs).put(handlers::update_product_costs),
        )
        .route("/costs/history", get(handlers::list_cost_history))
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/:expense_id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route(
            "/entries",
            get(handlers::list_financial_entries).post(handlers::create_financial_entry),
        )
        .route(
            "/entries/:entry_id",
            axum::routing::delete(handlers::delete_financial_entry),
        )
}

/// Report routes; each accepts `format=csv`
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/financial", get(handlers::get_financial_summary))
        .route("/financial/daily", get(handlers::get_daily_financials))
        .route("/financial/orders", get(handlers::get_paid_order_financials))
        .route("/products", get(handlers::get_product_report))
        .route("/orders", get(handlers::get_order_report))
        .route("/stock-movements", get(handlers::get_stock_movement_report))
        .route("/feedback", get(handlers::get_feedback_report))
}
