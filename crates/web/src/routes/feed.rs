//! Member feed route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::state::AppState;

/// Feed page template.
#[derive(Template, WebTemplate)]
#[template(path = "feed.html")]
pub struct FeedTemplate {
    /// Display name, falling back to the email's local part when the profile
    /// document is missing.
    pub display_name: String,
    pub email: String,
    pub admin_panel_enabled: bool,
    pub logged_in: bool,
}

/// Display the member feed. Visitors without a session are sent to the
/// landing page.
#[instrument(skip(state))]
pub async fn feed(State(state): State<AppState>) -> Response {
    let Some(session) = state.sessions().current_session() else {
        return Redirect::to("/").into_response();
    };

    let display_name = match state.profiles().get_profile(&session.user_id).await {
        Ok(Some(profile)) => profile.name,
        Ok(None) => session.email.local_part().to_string(),
        Err(e) => {
            tracing::error!("Profile lookup failed: {e}");
            session.email.local_part().to_string()
        }
    };

    FeedTemplate {
        display_name,
        email: session.email.to_string(),
        admin_panel_enabled: state.config().admin_panel_enabled,
        logged_in: true,
    }
    .into_response()
}
