pub mod catalog;
pub mod lesson;
pub mod module;

pub use lesson::{Lesson, LessonType};
pub use module::Module;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CourseInfo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_public: bool,
}
