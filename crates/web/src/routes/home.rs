//! Landing page and fallback route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::state::AppState;

/// Query parameters for the landing page.
#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    /// Which form to show: `login` (default) or `signup`.
    pub mode: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Show the signup form instead of login.
    pub signup: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub admin_panel_enabled: bool,
    pub logged_in: bool,
}

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub admin_panel_enabled: bool,
    pub logged_in: bool,
}

/// Display the landing page with the login or signup form.
///
/// An already signed-in visitor is sent straight to the feed.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>, Query(query): Query<HomeQuery>) -> Response {
    if state.sessions().current_session().is_some() {
        return Redirect::to("/feed").into_response();
    }

    HomeTemplate {
        signup: query.mode.as_deref() == Some("signup"),
        error: query.error,
        success: query.success,
        admin_panel_enabled: state.config().admin_panel_enabled,
        logged_in: false,
    }
    .into_response()
}

/// Fallback handler for unknown paths.
pub async fn not_found(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            admin_panel_enabled: state.config().admin_panel_enabled,
            logged_in: state.sessions().current_session().is_some(),
        },
    )
}
