use serde::{Deserialize, Serialize, ser::SerializeStruct};

use super::lesson::Lesson;

/// A top-level grouping of ordered lessons within a course.
///
/// Completion is derived from the lessons and cannot be set directly: a
/// `completed` key in incoming JSON is ignored, and the derived value is
/// written back out on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Module {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub locked: bool,
}

impl Module {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            lessons: Vec::new(),
            locked: false,
        }
    }

    pub fn with_lessons(mut self, lessons: impl IntoIterator<Item = Lesson>) -> Self {
        self.lessons.extend(lessons);
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// True iff the module has lessons and every one of them is completed.
    pub fn completed(&self) -> bool {
        !self.lessons.is_empty() && self.lessons.iter().all(|l| l.completed)
    }

    pub fn completed_lessons(&self) -> usize {
        self.lessons.iter().filter(|l| l.completed).count()
    }

    /// First lesson with the given id; later duplicates are unreachable.
    pub fn lesson(&self, id: i64) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }
}

impl Serialize for Module {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Module", 5)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("lessons", &self.lessons)?;
        s.serialize_field("completed", &self.completed())?;
        s.serialize_field("locked", &self.locked)?;
        s.end()
    }
}
