//! Members admin panel route handlers.
//!
//! Disabled unless `EXPRESSLY_ADMIN_PANEL` is set; every handler answers 404
//! when the panel is off so the routes are indistinguishable from absent.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use expressly_core::{Profile, UserId};

use crate::error::{AppError, Result};
use crate::services::DirectoryError;
use crate::state::AppState;

/// Query parameters for the member listing.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Hidden form field carrying the page to return to after an action.
#[derive(Debug, Deserialize)]
pub struct ReturnPage {
    pub page: Option<usize>,
}

/// Member display data for templates.
pub struct MemberView {
    pub id: String,
    pub name: String,
    pub user_name: String,
    pub email: String,
    pub joined: String,
}

impl From<Profile> for MemberView {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name,
            user_name: profile.user_name.to_string(),
            email: profile.email.to_string(),
            joined: profile
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Member directory page template.
#[derive(Template, WebTemplate)]
#[template(path = "members/index.html")]
pub struct MembersTemplate {
    pub members: Vec<MemberView>,
    pub page: usize,
    pub total_pages: usize,
    pub total_members: usize,
    pub error: Option<String>,
    pub success: Option<String>,
    pub admin_panel_enabled: bool,
    pub logged_in: bool,
}

fn ensure_enabled(state: &AppState) -> Result<()> {
    if state.config().admin_panel_enabled {
        Ok(())
    } else {
        Err(AppError::NotFound("page not found".to_string()))
    }
}

/// Display one page of the member directory.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    ensure_enabled(&state)?;

    let page = state.directory().list(query.page.unwrap_or(1)).await?;

    Ok(MembersTemplate {
        members: page.members.into_iter().map(MemberView::from).collect(),
        page: page.page,
        total_pages: page.total_pages,
        total_members: page.total_members,
        error: query.error,
        success: query.success,
        admin_panel_enabled: true,
        logged_in: state.sessions().current_session().is_some(),
    }
    .into_response())
}

/// Remove one member and return to the listing.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ReturnPage>,
) -> Result<Redirect> {
    ensure_enabled(&state)?;

    state.directory().remove(&UserId::new(id)).await?;
    Ok(Redirect::to(&format!(
        "/our-members?page={}",
        form.page.unwrap_or(1)
    )))
}

/// Remove every member. A partial failure reports how many were removed and
/// leaves the rest listed for another attempt.
#[instrument(skip(state))]
pub async fn delete_all(State(state): State<AppState>) -> Result<Redirect> {
    ensure_enabled(&state)?;

    match state.directory().remove_all().await {
        Ok(count) => Ok(Redirect::to(&format!(
            "/our-members?success={}",
            urlencoding::encode(&format!("Removed {count} members"))
        ))),
        Err(DirectoryError::Partial { deleted, failed }) => Ok(Redirect::to(&format!(
            "/our-members?error={}",
            urlencoding::encode(&format!(
                "Removed {deleted} members, {} could not be removed",
                failed.len()
            ))
        ))),
        Err(e) => Err(e.into()),
    }
}
