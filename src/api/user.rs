use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use utoipa::ToSchema;

use super::require_role;
use crate::{
    course::{Module, catalog::Catalog},
    error::{Error, Result},
    navigation::{CourseNavigationTree, NavigationState, NavigationView, course_progress},
    progress::{self, CompleteLessonRequest, CourseProgress, LessonProgress, ModuleProgress},
    session::{Role, SessionContext},
    user::{self, UserInfo},
};

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/user/create_user",
    tag = "user",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Student account created", body = i64),
        (status = 400, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(catalog): State<Arc<Catalog>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<i64>> {
    let CreateUserRequest {
        name,
        email,
        password,
    } = req;
    let id = user::create_user(&catalog.database, name, email, password, Role::Student).await?;
    Ok(Json(id))
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    tag = "user",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionContext),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionContext>> {
    let context = user::login(&catalog.database, &req.email, &req.password).await?;
    context.store(&session).await?;
    Ok(Json(context))
}

#[utoipa::path(
    post,
    path = "/api/user/logout",
    tag = "user",
    responses((status = 200, description = "Signed out"))
)]
pub async fn logout(session: Session) -> Result<&'static str> {
    session.flush().await?;
    Ok("Logout successful")
}

#[utoipa::path(
    get,
    path = "/api/user/user_info",
    tag = "user",
    responses(
        (status = 200, body = UserInfo),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn user_info(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
) -> Result<Json<UserInfo>> {
    let context = require_role(&session, Role::ALL).await?;
    Ok(Json(user::get_user_info(&catalog.database, context.user_id).await?))
}

/// Students only reach public courses; staff also reach drafts.
async fn visible_course(catalog: &Catalog, context: &SessionContext, course_id: i64) -> Result<()> {
    let course = catalog.get_course(course_id).await?;
    if !course.is_public && context.role == Role::Student {
        return Err(Error::not_found("course", course_id));
    }
    Ok(())
}

async fn visible_module(catalog: &Catalog, context: &SessionContext, module_id: i64) -> Result<()> {
    let module = catalog.get_module(module_id).await?;
    visible_course(catalog, context, module.course_id).await
}

async fn visible_lesson(catalog: &Catalog, context: &SessionContext, lesson_id: i64) -> Result<()> {
    let lesson = catalog.get_lesson(lesson_id).await?;
    visible_module(catalog, context, lesson.module_id).await
}

fn navigation_key(course_id: i64) -> String {
    format!("navigation:{course_id}")
}

/// The tree state kept for this course, or a fresh one at the resume point.
async fn navigation_state(
    session: &Session,
    course_id: i64,
    modules: &[Module],
) -> Result<NavigationState> {
    Ok(session
        .get::<NavigationState>(&navigation_key(course_id))
        .await?
        .unwrap_or_else(|| NavigationState::resume(modules)))
}

async fn render_navigation(
    session: &Session,
    course_id: i64,
    modules: Vec<Module>,
    state: NavigationState,
) -> Result<Json<NavigationView>> {
    let overall = course_progress(&modules);
    let tree = CourseNavigationTree::from_state(modules, state, |_, _| {})
        .with_course_progress(overall);
    let view = tree.render();
    session
        .insert(&navigation_key(course_id), tree.into_state())
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/user/courses/{course_id}/navigation",
    tag = "navigation",
    params(("course_id" = i64, Path, description = "Course to navigate")),
    responses(
        (status = 200, body = NavigationView),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Unknown course")
    )
)]
pub async fn get_navigation(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(course_id): Path<i64>,
) -> Result<Json<NavigationView>> {
    let context = require_role(&session, Role::ALL).await?;
    visible_course(&catalog, &context, course_id).await?;
    let modules = progress::load_modules(&catalog, context.user_id, course_id).await?;
    let state = navigation_state(&session, course_id, &modules).await?;
    render_navigation(&session, course_id, modules, state).await
}

#[utoipa::path(
    post,
    path = "/api/user/courses/{course_id}/navigation/toggle/{module_id}",
    tag = "navigation",
    params(
        ("course_id" = i64, Path),
        ("module_id" = i64, Path, description = "Module to expand or collapse; locked modules are left alone")
    ),
    responses(
        (status = 200, body = NavigationView),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn toggle_module(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path((course_id, module_id)): Path<(i64, i64)>,
) -> Result<Json<NavigationView>> {
    let context = require_role(&session, Role::ALL).await?;
    visible_course(&catalog, &context, course_id).await?;
    let modules = progress::load_modules(&catalog, context.user_id, course_id).await?;
    let state = navigation_state(&session, course_id, &modules).await?;
    let mut tree = CourseNavigationTree::from_state(modules.clone(), state, |_, _| {});
    tree.toggle_module(module_id);
    render_navigation(&session, course_id, modules, tree.into_state()).await
}

#[utoipa::path(
    post,
    path = "/api/user/courses/{course_id}/navigation/select/{module_id}/{lesson_id}",
    tag = "navigation",
    params(
        ("course_id" = i64, Path),
        ("module_id" = i64, Path),
        ("lesson_id" = i64, Path)
    ),
    responses(
        (status = 200, description = "Tree after the selection; unchanged for locked modules", body = NavigationView),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn select_lesson(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path((course_id, module_id, lesson_id)): Path<(i64, i64, i64)>,
) -> Result<Json<NavigationView>> {
    let context = require_role(&session, Role::ALL).await?;
    visible_course(&catalog, &context, course_id).await?;
    let modules = progress::load_modules(&catalog, context.user_id, course_id).await?;
    let state = navigation_state(&session, course_id, &modules).await?;
    let mut selected = None;
    let mut tree =
        CourseNavigationTree::from_state(modules.clone(), state, |m, l| selected = Some((m, l)));
    tree.select_lesson(module_id, lesson_id);
    let mut state = tree.into_state();
    if let Some((module_id, lesson_id)) = selected {
        progress::start_lesson(&catalog, context.user_id, lesson_id).await?;
        state.set_current(module_id, lesson_id);
    }
    render_navigation(&session, course_id, modules, state).await
}

#[utoipa::path(
    post,
    path = "/api/user/lessons/{lesson_id}/complete",
    tag = "progress",
    params(("lesson_id" = i64, Path)),
    request_body = CompleteLessonRequest,
    responses(
        (status = 200, body = LessonProgress),
        (status = 404, description = "Unknown lesson"),
        (status = 409, description = "The lesson's module is locked")
    )
)]
pub async fn complete_lesson(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(lesson_id): Path<i64>,
    Json(req): Json<CompleteLessonRequest>,
) -> Result<Json<LessonProgress>> {
    let context = require_role(&session, Role::ALL).await?;
    visible_lesson(&catalog, &context, lesson_id).await?;
    Ok(Json(
        progress::complete_lesson(&catalog, context.user_id, lesson_id, req).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/user/lessons/{lesson_id}/reset",
    tag = "progress",
    params(("lesson_id" = i64, Path)),
    responses(
        (status = 200, description = "Lesson progress reset"),
        (status = 404, description = "No progress recorded for the lesson")
    )
)]
pub async fn reset_lesson(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(lesson_id): Path<i64>,
) -> Result<&'static str> {
    let context = require_role(&session, Role::ALL).await?;
    visible_lesson(&catalog, &context, lesson_id).await?;
    progress::reset_lesson(&catalog.database, context.user_id, lesson_id).await?;
    Ok("Lesson progress reset")
}

#[utoipa::path(
    get,
    path = "/api/user/courses/{course_id}/progress",
    tag = "progress",
    params(("course_id" = i64, Path)),
    responses((status = 200, body = CourseProgress))
)]
pub async fn get_course_progress(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseProgress>> {
    let context = require_role(&session, Role::ALL).await?;
    visible_course(&catalog, &context, course_id).await?;
    Ok(Json(
        progress::course_progress(&catalog, context.user_id, course_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/user/modules/{module_id}/progress",
    tag = "progress",
    params(("module_id" = i64, Path)),
    responses((status = 200, body = ModuleProgress))
)]
pub async fn get_module_progress(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(module_id): Path<i64>,
) -> Result<Json<ModuleProgress>> {
    let context = require_role(&session, Role::ALL).await?;
    visible_module(&catalog, &context, module_id).await?;
    Ok(Json(
        progress::module_progress(&catalog, context.user_id, module_id).await?,
    ))
}

pub fn get_user_scope() -> Router<Arc<Catalog>> {
    Router::new().nest(
        "/user",
        Router::new()
            .route("/create_user", post(create_user))
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/user_info", get(user_info))
            .route("/courses/{course_id}/navigation", get(get_navigation))
            .route(
                "/courses/{course_id}/navigation/toggle/{module_id}",
                post(toggle_module),
            )
            .route(
                "/courses/{course_id}/navigation/select/{module_id}/{lesson_id}",
                post(select_lesson),
            )
            .route("/courses/{course_id}/progress", get(get_course_progress))
            .route("/modules/{module_id}/progress", get(get_module_progress))
            .route("/lessons/{lesson_id}/complete", post(complete_lesson))
            .route("/lessons/{lesson_id}/reset", delete(reset_lesson)),
    )
}
