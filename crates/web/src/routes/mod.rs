//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness check (DB ping)
//!
//! # Shop (server-rendered)
//! GET  /shop/products/                      - Non-archived products
//! GET  /shop/products/{id}/                 - Product detail (404 if absent)
//! GET  /shop/products/create/               - Create form (staff)
//! POST /shop/products/create/               - Create product (staff)
//! GET  /shop/products/{id}/update/          - Update form (staff)
//! POST /shop/products/{id}/update/          - Update product (staff)
//! GET  /shop/products/{id}/archive/         - Archive confirmation (staff)
//! POST /shop/products/{id}/archive/         - Soft-delete (staff)
//! POST /shop/products/{id}/unarchive/       - Restore (staff)
//! GET  /shop/products/export/               - JSON export, cached 60s
//!
//! GET  /shop/orders/                        - Orders (login required)
//! GET  /shop/orders/{id}/                   - Order detail (staff or owner)
//! GET  /shop/orders/create/                 - Create form (login)
//! POST /shop/orders/create/                 - Create order (login)
//! GET  /shop/orders/{id}/update/            - Update form (login)
//! POST /shop/orders/{id}/update/            - Update order (login)
//! POST /shop/orders/{id}/delete/            - Hard delete (staff)
//! GET  /shop/users/{id}/orders/             - One user's orders (login)
//! GET  /shop/users/{id}/orders/export/      - JSON export, cached 120s
//!
//! # Shop API (JSON)
//! GET    /shop/api/products/                - List with search/filter/order
//! POST   /shop/api/products/                - Create
//! GET    /shop/api/products/{id}/           - Detail
//! PUT    /shop/api/products/{id}/           - Update
//! DELETE /shop/api/products/{id}/           - Soft-delete (archive)
//! GET    /shop/api/products/download_csv/   - CSV attachment
//! POST   /shop/api/products/upload_csv/     - Multipart CSV import
//!
//! # Blog
//! GET  /blog/articles/                      - Published articles
//! GET  /blog/articles/{id}/                 - Article detail
//! GET  /blog/articles/latest/feed/          - RSS feed (5 most recent)
//!
//! # Auth
//! GET/POST /auth/login/                     - Login page / action
//! POST     /auth/logout/                    - Logout
//! GET/POST /auth/register/                  - Register page / action
//! GET      /auth/users/                     - Users (login)
//! GET      /auth/users/{id}/                - User detail (staff or self)
//! GET/POST /auth/users/{id}/update/         - Profile form / update
//! ```

pub mod api;
pub mod auth;
pub mod blog;
pub mod exports;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/export/", get(exports::products_export))
        .route(
            "/create/",
            get(products::create_form).post(products::create),
        )
        .route("/{id}/", get(products::show))
        .route(
            "/{id}/update/",
            get(products::update_form).post(products::update),
        )
        .route(
            "/{id}/archive/",
            get(products::archive_confirm).post(products::archive),
        )
        .route("/{id}/unarchive/", post(products::unarchive))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/create/", get(orders::create_form).post(orders::create))
        .route("/{id}/", get(orders::show))
        .route(
            "/{id}/update/",
            get(orders::update_form).post(orders::update),
        )
        .route("/{id}/delete/", post(orders::delete))
}

/// Create the product API router.
pub fn product_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::list).post(api::create))
        .route("/download_csv/", get(api::download_csv))
        .route("/upload_csv/", post(api::upload_csv))
        .route(
            "/{id}/",
            get(api::show).put(api::update).delete(api::archive),
        )
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/articles/", get(blog::index))
        .route("/articles/latest/feed/", get(blog::feed))
        .route("/articles/{id}/", get(blog::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login/", get(auth::login_page).post(auth::login))
        .route("/logout/", post(auth::logout))
        .route("/register/", get(auth::register_page).post(auth::register))
        .route("/users/", get(auth::users_list))
        .route("/users/{id}/", get(auth::user_detail))
        .route(
            "/users/{id}/update/",
            get(auth::profile_form).post(auth::profile_update),
        )
}

/// Create all routes for the application.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/shop/products", product_routes())
        .nest("/shop/orders", order_routes())
        .nest("/shop/api/products", product_api_routes())
        .route("/shop/users/{id}/orders/", get(orders::user_orders))
        .route(
            "/shop/users/{id}/orders/export/",
            get(exports::user_orders_export),
        )
        .nest("/blog", blog_routes())
        .nest("/auth", auth_routes())
}
