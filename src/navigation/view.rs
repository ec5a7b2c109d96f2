use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use super::icon::{LessonIcon, ModuleMarker, Tone};

/// Render shape of the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavigationView {
    pub course_progress: u8,
    pub modules: Vec<ModuleRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ModuleRow {
    pub id: i64,
    /// Short tag such as "M3"
    pub label: String,
    pub title: String,
    pub marker: ModuleMarker,
    pub is_current: bool,
    pub expanded: bool,
    pub locked: bool,
    pub completed: bool,
    pub progress: u8,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    /// Empty while the module is collapsed
    pub lessons: Vec<LessonRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LessonRow {
    pub id: i64,
    pub title: String,
    pub duration: String,
    pub icon: LessonIcon,
    pub tone: Tone,
    pub highlighted: bool,
    pub disabled: bool,
}

impl NavigationView {
    pub fn module(&self, id: i64) -> Option<&ModuleRow> {
        self.modules.iter().find(|m| m.id == id)
    }
}

impl fmt::Display for NavigationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Course Progress {}%", self.course_progress)?;
        for module in &self.modules {
            write!(f, "{}", module)?;
        }
        Ok(())
    }
}

impl fmt::Display for ModuleRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = if self.is_current { "*" } else { " " };
        writeln!(
            f,
            "{current}{} {} {} [{}/{} {}%]",
            self.marker.glyph(),
            self.label,
            self.title,
            self.completed_lessons,
            self.total_lessons,
            self.progress
        )?;
        for lesson in &self.lessons {
            let pointer = if lesson.highlighted { ">" } else { " " };
            write!(f, "   {pointer} {} {}", lesson.icon.glyph(), lesson.title)?;
            if !lesson.duration.is_empty() {
                write!(f, " ({})", lesson.duration)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
