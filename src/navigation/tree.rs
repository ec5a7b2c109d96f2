use tracing::debug;

use super::{
    icon::{resolve_lesson_icon, resolve_module_marker},
    progress::module_progress,
    state::NavigationState,
    view::{LessonRow, ModuleRow, NavigationView},
};
use crate::course::Module;

/// Two-level collapsible hierarchy of modules and their lessons.
///
/// `on_select_lesson` is called with `(module_id, lesson_id)` once per
/// accepted lesson activation. Interactions with locked modules are dropped
/// without reaching the callback.
pub struct CourseNavigationTree<F>
where
    F: FnMut(i64, i64),
{
    modules: Vec<Module>,
    state: NavigationState,
    course_progress: u8,
    on_select_lesson: F,
}

impl<F> CourseNavigationTree<F>
where
    F: FnMut(i64, i64),
{
    pub fn new(
        modules: Vec<Module>,
        current_module_id: i64,
        current_lesson_id: i64,
        on_select_lesson: F,
    ) -> Self {
        Self::from_state(
            modules,
            NavigationState::new(current_module_id, current_lesson_id),
            on_select_lesson,
        )
    }

    /// Rebuild a tree around state kept from an earlier instance.
    pub fn from_state(modules: Vec<Module>, state: NavigationState, on_select_lesson: F) -> Self {
        Self {
            modules,
            state,
            course_progress: 0,
            on_select_lesson,
        }
    }

    /// Overall course percentage for the header, computed by the caller.
    pub fn with_course_progress(mut self, course_progress: u8) -> Self {
        self.course_progress = course_progress.min(100);
        self
    }

    /// Take fresh inputs from the caller. Expansion choices survive; the
    /// current module is forced open.
    pub fn update(
        &mut self,
        modules: Vec<Module>,
        current_module_id: i64,
        current_lesson_id: i64,
        course_progress: Option<u8>,
    ) {
        self.modules = modules;
        self.state.set_current(current_module_id, current_lesson_id);
        self.course_progress = course_progress.unwrap_or(0).min(100);
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn into_state(self) -> NavigationState {
        self.state
    }

    fn module(&self, module_id: i64) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    /// Expand or collapse one module. Returns false when nothing changed
    /// because the module is locked or unknown.
    pub fn toggle_module(&mut self, module_id: i64) -> bool {
        let Some(locked) = self.module(module_id).map(|m| m.locked) else {
            return false;
        };
        if locked {
            debug!("ignored toggle of locked module {}", module_id);
            return false;
        }
        let expanded = self.state.flip(module_id);
        debug!("module {} expanded: {}", module_id, expanded);
        true
    }

    /// Forward a lesson activation to the callback. Returns false, without
    /// calling it, for locked modules and for ids not in the tree.
    pub fn select_lesson(&mut self, module_id: i64, lesson_id: i64) -> bool {
        let Some(module) = self.module(module_id) else {
            return false;
        };
        if module.locked {
            debug!("ignored lesson {} in locked module {}", lesson_id, module_id);
            return false;
        }
        if module.lesson(lesson_id).is_none() {
            return false;
        }
        (self.on_select_lesson)(module_id, lesson_id);
        true
    }

    pub fn render(&self) -> NavigationView {
        let modules = self
            .modules
            .iter()
            .map(|module| {
                let expanded = self.state.is_expanded(module.id);
                let completed = module.completed();
                let lessons = if expanded {
                    // duplicate ids resolve to the first match, like `Module::lesson`
                    let highlighted = module.lessons.iter().position(|lesson| {
                        self.state.is_current_lesson(module.id, lesson.id)
                    });
                    module
                        .lessons
                        .iter()
                        .enumerate()
                        .map(|(index, lesson)| {
                            let icon = resolve_lesson_icon(lesson.lesson_type, lesson.completed);
                            LessonRow {
                                id: lesson.id,
                                title: lesson.title.clone(),
                                duration: lesson.duration.clone(),
                                icon,
                                tone: icon.tone(),
                                highlighted: highlighted == Some(index),
                                disabled: module.locked,
                            }
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                ModuleRow {
                    id: module.id,
                    label: format!("M{}", module.id),
                    title: module.title.clone(),
                    marker: resolve_module_marker(module.locked, completed, expanded),
                    is_current: module.id == self.state.current_module_id(),
                    expanded,
                    locked: module.locked,
                    completed,
                    progress: module_progress(module),
                    completed_lessons: module.completed_lessons(),
                    total_lessons: module.lessons.len(),
                    lessons,
                }
            })
            .collect();
        NavigationView {
            course_progress: self.course_progress,
            modules,
        }
    }
}
