//! Integration tests for Expressly.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server with test backends configured
//! cargo run -p expressly-web
//!
//! # Run integration tests
//! cargo test -p expressly-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Signup, login, logout, and password reset
//! - `members_panel` - Member directory admin panel
//!
//! The tests hit a running server over HTTP; `EXPRESSLY_BASE_URL` selects the
//! target (default `http://localhost:3000`).
