use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of content a lesson delivers.
///
/// Values the client does not know about deserialize to [`LessonType::Unspecified`]
/// instead of failing, so a newer course service never breaks navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Video,
    Reading,
    Quiz,
    Assignment,
    Lab,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl LessonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonType::Video => "video",
            LessonType::Reading => "reading",
            LessonType::Quiz => "quiz",
            LessonType::Assignment => "assignment",
            LessonType::Lab => "lab",
            LessonType::Unspecified => "unspecified",
        }
    }
}

impl From<&str> for LessonType {
    fn from(value: &str) -> Self {
        match value {
            "video" => LessonType::Video,
            "reading" => LessonType::Reading,
            "quiz" => LessonType::Quiz,
            "assignment" => LessonType::Assignment,
            "lab" => LessonType::Lab,
            _ => LessonType::Unspecified,
        }
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An individually completable unit of content inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Lesson {
    /// Unique only within the owning module
    pub id: i64,
    pub title: String,
    /// Display string such as "12 min", never parsed
    #[serde(default)]
    pub duration: String,
    #[serde(rename = "type", default)]
    pub lesson_type: LessonType,
    #[serde(default)]
    pub completed: bool,
}

impl Lesson {
    pub fn new(id: i64, title: impl Into<String>, lesson_type: LessonType) -> Self {
        Self {
            id,
            title: title.into(),
            duration: String::new(),
            lesson_type,
            completed: false,
        }
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}
