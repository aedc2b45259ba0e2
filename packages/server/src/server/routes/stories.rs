//! Story listing and owner-only mutations.
//!
//! Every handler here sits behind the login gate. Edit, update and delete
//! additionally load the story and check ownership before acting; a missing
//! story is 404, someone else's story is 403.

use axum::extract::{Extension, Form, Query};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::redirect_with_session;
use crate::common::pagination::parse_page;
use crate::common::{Actor, PageInfo, StoryCapability, STORIES_PER_PAGE};
use crate::domains::stories::{validate_story, Story, StoryDraft};
use crate::server::app::AppState;
use crate::server::auth::AuthUser;
use crate::server::error::AppError;
use crate::server::middleware::RequestContext;
use crate::server::render::render;

pub const STORY_CREATED: &str = "Story created successfully!";
pub const STORY_UPDATED: &str = "Story updated successfully!";
pub const STORY_DELETED: &str = "Story deleted successfully!";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoryIdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoryForm {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStoryForm {
    pub id: Option<String>,
    pub title: String,
    pub content: String,
}

/// Story id from a query or form field; missing, non-numeric or < 1 is a bad request
pub fn parse_story_id(raw: Option<&str>) -> Result<i64, AppError> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id >= 1)
        .ok_or(AppError::BadRequest)
}

/// Load a story and confirm `user` holds `capability` on it
async fn load_owned_story(
    app: &AppState,
    user: &AuthUser,
    id: i64,
    capability: StoryCapability,
) -> Result<Story, AppError> {
    let story = app.store.get_story(id).await?;
    Actor::new(user.id).can(capability).on(&story).check()?;
    Ok(story)
}

pub async fn view_stories_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let page = parse_page(query.page.as_deref());
    let stories = app.store.list_page(page, STORIES_PER_PAGE).await?;
    let total = app.store.count_all().await?;

    render(
        &app,
        &ctx,
        "view_stories.tmpl",
        json!({
            "stories": stories,
            "pagination": PageInfo::new(page, total, STORIES_PER_PAGE),
        }),
    )
}

pub async fn submit_story_form_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    render(&app, &ctx, "submit_story.tmpl", json!({}))
}

pub async fn create_story_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Form(form): Form<StoryForm>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;

    let v = validate_story(&form.title, &form.content);
    if !v.valid() {
        return render(
            &app,
            &ctx,
            "submit_story.tmpl",
            json!({
                "errors": v.errors(),
                "title": form.title,
                "content": form.content,
            }),
        );
    }

    let story = app
        .store
        .insert_story(
            user.id,
            StoryDraft {
                title: form.title,
                content: form.content,
            },
        )
        .await?;
    info!("User {} created story {}", user.id, story.id);

    let mut session = ctx.session_or_load(&app.sessions, &headers);
    session.add_flash(STORY_CREATED);
    redirect_with_session(&app, &session, "/stories")
}

pub async fn edit_story_form_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    Query(query): Query<StoryIdQuery>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;
    let id = parse_story_id(query.id.as_deref())?;
    let story = load_owned_story(&app, user, id, StoryCapability::Edit).await?;

    render(&app, &ctx, "edit_story.tmpl", json!({ "story": story }))
}

pub async fn update_story_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Form(form): Form<UpdateStoryForm>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;
    let id = parse_story_id(form.id.as_deref())?;
    let story = load_owned_story(&app, user, id, StoryCapability::Edit).await?;

    let v = validate_story(&form.title, &form.content);
    if !v.valid() {
        return render(
            &app,
            &ctx,
            "edit_story.tmpl",
            json!({ "story": story, "errors": v.errors() }),
        );
    }

    app.store
        .update_story(
            id,
            user.id,
            StoryDraft {
                title: form.title,
                content: form.content,
            },
        )
        .await?;
    info!("User {} updated story {}", user.id, id);

    let mut session = ctx.session_or_load(&app.sessions, &headers);
    session.add_flash(STORY_UPDATED);
    redirect_with_session(&app, &session, "/stories")
}

pub async fn delete_story_handler(
    Extension(app): Extension<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Query(query): Query<StoryIdQuery>,
) -> Result<Response, AppError> {
    let user = ctx.require_user()?;
    let id = parse_story_id(query.id.as_deref())?;
    load_owned_story(&app, user, id, StoryCapability::Delete).await?;

    app.store.delete_story(id, user.id).await?;
    info!("User {} deleted story {}", user.id, id);

    let mut session = ctx.session_or_load(&app.sessions, &headers);
    session.add_flash(STORY_DELETED);
    redirect_with_session(&app, &session, "/stories")
}
