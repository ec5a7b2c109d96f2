//! The collapsible module/lesson tree shown beside a lesson.
//!
//! Everything here is synchronous and free of I/O. The tree owns only its
//! expansion state; module and lesson data are supplied by the caller on
//! every update and never modified.

pub mod icon;
pub mod progress;
pub mod state;
pub mod tree;
pub mod view;

pub use icon::{LessonIcon, ModuleMarker, Tone, resolve_lesson_icon, resolve_module_marker};
pub use progress::{course_progress, module_progress, percentage};
pub use state::NavigationState;
pub use tree::CourseNavigationTree;
pub use view::{LessonRow, ModuleRow, NavigationView};
