use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    course::{CourseInfo, catalog::Catalog},
    error::Result,
};

#[utoipa::path(
    get,
    path = "/api/public/courses",
    tag = "public",
    responses(
        (status = 200, description = "Publicly listed courses", body = Vec<CourseInfo>)
    )
)]
pub async fn list_public_courses(State(catalog): State<Arc<Catalog>>) -> Result<Json<Vec<CourseInfo>>> {
    Ok(Json(catalog.list_courses(true).await?))
}

pub fn get_public_scope() -> Router<Arc<Catalog>> {
    Router::new().nest(
        "/public",
        Router::new().route("/courses", get(list_public_courses)),
    )
}
