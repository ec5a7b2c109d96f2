pub mod instructor;
pub mod public;
pub mod user;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore, cookie::time::Duration};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    course::catalog::Catalog,
    error::Result,
    session::{Role, SessionContext, authorize},
};

/// Load the caller's context from the session and check it against `allowed`.
pub async fn require_role(session: &Session, allowed: &[Role]) -> Result<SessionContext> {
    let context = SessionContext::load(session).await?;
    Ok(authorize(context, allowed)?)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        user::create_user,
        user::login,
        user::logout,
        user::user_info,
        user::get_navigation,
        user::toggle_module,
        user::select_lesson,
        user::complete_lesson,
        user::reset_lesson,
        user::get_course_progress,
        user::get_module_progress,
        instructor::create_course,
        instructor::list_courses,
        instructor::create_module,
        instructor::list_modules,
        instructor::get_module,
        instructor::update_module,
        instructor::delete_module,
        instructor::create_lesson,
        instructor::list_lessons,
        instructor::get_lesson,
        instructor::update_lesson,
        instructor::delete_lesson,
        public::list_public_courses,
    ),
    tags(
        (name = "navigation", description = "Per-course module/lesson tree"),
        (name = "progress", description = "Lesson completion and aggregates"),
        (name = "instructor", description = "Course content management"),
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> anyhow::Result<String> {
    Ok(ApiDoc::openapi().to_pretty_json()?)
}

/// The full HTTP application: `/api` routes behind the session layer, plus Swagger UI.
pub fn app<S>(catalog: Arc<Catalog>, store: S, session_days: i64) -> Router
where
    S: SessionStore + Clone,
{
    let sessions = SessionManagerLayer::new(store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::days(session_days)));
    let api = Router::new()
        .merge(user::get_user_scope())
        .merge(instructor::get_instructor_scope())
        .merge(public::get_public_scope())
        .layer(sessions)
        .with_state(catalog);
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}
