//! Authentication route handlers.
//!
//! Login, signup, logout, and the two-step password reset. Failures redirect
//! back to the originating form with the backend's message (verbatim) in the
//! `error` query parameter.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use expressly_core::{Handle, NewProfile};

use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(rename = "oobCode")]
    pub oob_code: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Query parameters for the reset confirmation page. The `oobCode` comes from
/// the link in the reset email.
#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    #[serde(rename = "oobCode")]
    pub oob_code: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    pub admin_panel_enabled: bool,
    pub logged_in: bool,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub oob_code: String,
    pub error: Option<String>,
    pub admin_panel_enabled: bool,
    pub logged_in: bool,
}

// =============================================================================
// Redirect Helpers
// =============================================================================

fn login_error(message: &str) -> Response {
    Redirect::to(&format!("/?mode=login&error={}", urlencoding::encode(message))).into_response()
}

fn signup_error(message: &str) -> Response {
    Redirect::to(&format!("/?mode=signup&error={}", urlencoding::encode(message))).into_response()
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Handle login form submission.
#[instrument(skip(state, form))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.sessions().log_in(&form.email, &form.password).await {
        Ok(_) => Redirect::to("/feed").into_response(),
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            login_error(e.message())
        }
    }
}

/// Handle logout form submission. Always succeeds, even when signed out.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.sessions().log_out().await;
    Redirect::to("/")
}

// =============================================================================
// Signup
// =============================================================================

/// Handle signup form submission.
///
/// The username is validated and checked for availability before the account
/// is created, so a taken username never leaves behind a profileless account.
/// A profile write failure after account creation leaves the user signed in;
/// the profile is recreated on their next signup-free path through support.
#[instrument(skip(state, form))]
pub async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return signup_error("Name cannot be empty");
    }
    if form.password != form.password_confirm {
        return signup_error("Passwords do not match");
    }

    let handle = match Handle::parse(&form.username) {
        Ok(handle) => handle,
        Err(e) => return signup_error(&e.to_string()),
    };

    match state.profiles().is_handle_available(&handle).await {
        Ok(true) => {}
        Ok(false) => return signup_error("Username is already taken"),
        Err(e) => {
            tracing::error!("Username availability check failed: {e}");
            return signup_error("Could not verify username availability, try again");
        }
    }

    let session = match state.sessions().sign_up(&form.email, &form.password).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Signup failed: {e}");
            return signup_error(e.message());
        }
    };

    let profile = NewProfile {
        name: name.to_string(),
        user_name: handle,
        email: session.email.clone(),
    };
    // Already logged inside the profile service; the user is signed in either
    // way, so proceed to the feed.
    let _ = state.profiles().create_profile(&session.user_id, profile).await;

    Redirect::to("/feed").into_response()
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the password reset request page.
pub async fn forgot_password_page(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ForgotPasswordTemplate {
        error: query.error,
        success: query.success,
        admin_panel_enabled: state.config().admin_panel_enabled,
        logged_in: state.sessions().current_session().is_some(),
    }
}

/// Handle the password reset request form.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Redirect {
    match state.sessions().request_password_reset(&form.email).await {
        Ok(()) => Redirect::to(&format!(
            "/auth/forgot-password?success={}",
            urlencoding::encode("Check your email for a reset link")
        )),
        Err(e) => {
            tracing::warn!("Password reset request failed: {e}");
            Redirect::to(&format!(
                "/auth/forgot-password?error={}",
                urlencoding::encode(e.message())
            ))
        }
    }
}

/// Display the reset confirmation page. Without a code there is nothing to
/// confirm, so the visitor is sent home.
pub async fn reset_password_page(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> Response {
    let Some(oob_code) = query.oob_code else {
        return Redirect::to("/").into_response();
    };

    ResetPasswordTemplate {
        oob_code,
        error: query.error,
        admin_panel_enabled: state.config().admin_panel_enabled,
        logged_in: state.sessions().current_session().is_some(),
    }
    .into_response()
}

/// Handle the reset confirmation form.
#[instrument(skip(state, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Redirect {
    let back = |message: &str| {
        Redirect::to(&format!(
            "/auth/reset-password?oobCode={}&error={}",
            urlencoding::encode(&form.oob_code),
            urlencoding::encode(message)
        ))
    };

    if form.password != form.password_confirm {
        return back("Passwords do not match");
    }

    match state
        .sessions()
        .confirm_password_reset(&form.oob_code, &form.password)
        .await
    {
        Ok(()) => Redirect::to(&format!(
            "/?mode=login&success={}",
            urlencoding::encode("Password updated, log in with your new password")
        )),
        Err(e) => {
            tracing::warn!("Password reset failed: {e}");
            back(e.message())
        }
    }
}
