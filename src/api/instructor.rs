use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use tower_sessions::Session;

use super::require_role;
use crate::{
    course::{
        CourseInfo,
        catalog::{Catalog, LessonRecord, LessonUpdate, ModuleRecord, NewCourse, NewLesson, NewModule},
    },
    error::Result,
    session::Role,
};

#[utoipa::path(
    post,
    path = "/api/instructor/courses",
    tag = "instructor",
    request_body = NewCourse,
    responses(
        (status = 200, body = CourseInfo),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn create_course(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Json(req): Json<NewCourse>,
) -> Result<Json<CourseInfo>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.create_course(req).await?))
}

#[utoipa::path(
    get,
    path = "/api/instructor/courses",
    tag = "instructor",
    responses((status = 200, description = "All courses, public or not", body = Vec<CourseInfo>))
)]
pub async fn list_courses(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
) -> Result<Json<Vec<CourseInfo>>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.list_courses(false).await?))
}

#[utoipa::path(
    post,
    path = "/api/instructor/modules",
    tag = "instructor",
    request_body = NewModule,
    responses(
        (status = 200, body = ModuleRecord),
        (status = 404, description = "Unknown course")
    )
)]
pub async fn create_module(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Json(req): Json<NewModule>,
) -> Result<Json<ModuleRecord>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.create_module(req).await?))
}

#[utoipa::path(
    get,
    path = "/api/instructor/courses/{course_id}/modules",
    tag = "instructor",
    params(("course_id" = i64, Path)),
    responses((status = 200, body = Vec<ModuleRecord>))
)]
pub async fn list_modules(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(course_id): Path<i64>,
) -> Result<Json<Vec<ModuleRecord>>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.list_modules(course_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/instructor/modules/{module_id}",
    tag = "instructor",
    params(("module_id" = i64, Path)),
    responses(
        (status = 200, body = ModuleRecord),
        (status = 404, description = "Module not found")
    )
)]
pub async fn get_module(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(module_id): Path<i64>,
) -> Result<Json<ModuleRecord>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.get_module(module_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/instructor/modules/{module_id}",
    tag = "instructor",
    params(("module_id" = i64, Path)),
    request_body = NewModule,
    responses(
        (status = 200, body = ModuleRecord),
        (status = 404, description = "Module not found")
    )
)]
pub async fn update_module(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(module_id): Path<i64>,
    Json(req): Json<NewModule>,
) -> Result<Json<ModuleRecord>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.update_module(module_id, req).await?))
}

#[utoipa::path(
    delete,
    path = "/api/instructor/modules/{module_id}",
    tag = "instructor",
    params(("module_id" = i64, Path)),
    responses(
        (status = 200, description = "Module and its lessons deleted"),
        (status = 404, description = "Module not found")
    )
)]
pub async fn delete_module(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(module_id): Path<i64>,
) -> Result<&'static str> {
    require_role(&session, Role::STAFF).await?;
    catalog.delete_module(module_id).await?;
    Ok("Module deleted")
}

#[utoipa::path(
    post,
    path = "/api/instructor/modules/{module_id}/lessons",
    tag = "instructor",
    params(("module_id" = i64, Path)),
    request_body = NewLesson,
    responses(
        (status = 200, body = LessonRecord),
        (status = 404, description = "Module not found")
    )
)]
pub async fn create_lesson(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(module_id): Path<i64>,
    Json(req): Json<NewLesson>,
) -> Result<Json<LessonRecord>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.create_lesson(module_id, req).await?))
}

#[utoipa::path(
    get,
    path = "/api/instructor/modules/{module_id}/lessons",
    tag = "instructor",
    params(("module_id" = i64, Path)),
    responses((status = 200, body = Vec<LessonRecord>))
)]
pub async fn list_lessons(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(module_id): Path<i64>,
) -> Result<Json<Vec<LessonRecord>>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.list_lessons(module_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/instructor/lessons/{lesson_id}",
    tag = "instructor",
    params(("lesson_id" = i64, Path)),
    responses(
        (status = 200, body = LessonRecord),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn get_lesson(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(lesson_id): Path<i64>,
) -> Result<Json<LessonRecord>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.get_lesson(lesson_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/instructor/lessons/{lesson_id}",
    tag = "instructor",
    params(("lesson_id" = i64, Path)),
    request_body = LessonUpdate,
    responses(
        (status = 200, body = LessonRecord),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn update_lesson(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(lesson_id): Path<i64>,
    Json(req): Json<LessonUpdate>,
) -> Result<Json<LessonRecord>> {
    require_role(&session, Role::STAFF).await?;
    Ok(Json(catalog.update_lesson(lesson_id, req).await?))
}

#[utoipa::path(
    delete,
    path = "/api/instructor/lessons/{lesson_id}",
    tag = "instructor",
    params(("lesson_id" = i64, Path)),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn delete_lesson(
    State(catalog): State<Arc<Catalog>>,
    session: Session,
    Path(lesson_id): Path<i64>,
) -> Result<&'static str> {
    require_role(&session, Role::STAFF).await?;
    catalog.delete_lesson(lesson_id).await?;
    Ok("Lesson deleted")
}

pub fn get_instructor_scope() -> Router<Arc<Catalog>> {
    Router::new().nest(
        "/instructor",
        Router::new()
            .route("/courses", post(create_course).get(list_courses))
            .route("/courses/{course_id}/modules", get(list_modules))
            .route("/modules", post(create_module))
            .route(
                "/modules/{module_id}",
                get(get_module).put(update_module).delete(delete_module),
            )
            .route(
                "/modules/{module_id}/lessons",
                post(create_lesson).get(list_lessons),
            )
            .route(
                "/lessons/{lesson_id}",
                get(get_lesson).put(update_lesson).delete(delete_lesson),
            ),
    )
}
