//! HTTP route handlers for the backend API.
//!
//! Handlers are thin: they construct repositories over the shared pool,
//! delegate to the service layer, and map service errors to HTTP via
//! [`crate::error::AppError`].
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check
//!
//! # Catalog
//! GET  /books                               - List the catalog
//! GET  /books/{id}                          - Book detail
//!
//! # Discounts (admin)
//! GET    /discounts                         - List all discount records
//! PUT    /books/{id}/discount               - Set a book discount
//! DELETE /books/{id}/discount               - Remove active book discounts
//!
//! # Cart (one per user)
//! GET    /users/{user_id}/cart                    - Priced cart
//! DELETE /users/{user_id}/cart                    - Clear the cart
//! POST   /users/{user_id}/cart/items              - Add a book (quantity 1)
//! PUT    /users/{user_id}/cart/items/{book_id}    - Set line quantity
//! DELETE /users/{user_id}/cart/items/{book_id}    - Remove a line
//!
//! # Orders
//! POST /users/{user_id}/orders              - Convert the cart into an order
//! GET  /users/{user_id}/orders              - Order history, newest first
//! GET  /orders/{claim_code}                 - Look up an order by claim code
//! POST /orders/{claim_code}/verify          - Verify pickup by claim code
//! ```

pub mod books;
pub mod cart;
pub mod discounts;
pub mod orders;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index))
        .route("/{id}", get(books::show))
        .route(
            "/{id}/discount",
            put(discounts::set_for_book).delete(discounts::remove_from_book),
        )
}

/// Create the per-user cart and order routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/{user_id}/cart", get(cart::show).delete(cart::clear))
        .route("/{user_id}/cart/items", post(cart::add))
        .route(
            "/{user_id}/cart/items/{book_id}",
            put(cart::update).delete(cart::remove),
        )
        .route(
            "/{user_id}/orders",
            post(orders::create).get(orders::history),
        )
}

/// Create the claim-code order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/{claim_code}", get(orders::show))
        .route("/{claim_code}/verify", post(orders::verify))
}

/// Create all routes for the backend.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/books", book_routes())
        .route("/discounts", get(discounts::index))
        .nest("/users", user_routes())
        .nest("/orders", order_routes())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}
