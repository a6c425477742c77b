//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Landing page with login/signup forms
//! GET  /health                  - Health check
//! GET  /feed                    - Member feed (requires session)
//!
//! # Auth
//! POST /auth/login              - Login action
//! POST /auth/signup             - Signup action (account + profile)
//! POST /auth/logout             - Logout action
//! GET  /auth/forgot-password    - Password reset request page
//! POST /auth/forgot-password    - Send reset email
//! GET  /auth/reset-password     - Reset confirmation page (?oobCode=...)
//! POST /auth/reset-password     - Apply reset code with new password
//!
//! # Members admin panel (requires EXPRESSLY_ADMIN_PANEL)
//! GET  /our-members             - Paginated member directory (?page=N)
//! POST /our-members/{id}/delete - Remove one member
//! POST /our-members/delete-all  - Remove every member
//! ```
//!
//! Form actions redirect back with the failure in an `error` query parameter
//! rather than rendering an error page, so a refresh never resubmits.

pub mod auth;
pub mod feed;
pub mod home;
pub mod members;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
}

/// Create the members admin panel router.
pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(members::index))
        .route("/{id}/delete", post(members::delete))
        .route("/delete-all", post(members::delete_all))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/feed", get(feed::feed))
        .nest("/auth", auth_routes())
        .nest("/our-members", member_routes())
        .fallback(home::not_found)
}
