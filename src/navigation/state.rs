use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::course::Module;

/// Expansion flags and the current position, owned by one tree instance.
///
/// Modules without an entry are collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    expanded: BTreeMap<i64, bool>,
    current_module_id: i64,
    current_lesson_id: i64,
}

impl NavigationState {
    /// Only the current module starts expanded.
    pub fn new(current_module_id: i64, current_lesson_id: i64) -> Self {
        Self {
            expanded: BTreeMap::from([(current_module_id, true)]),
            current_module_id,
            current_lesson_id,
        }
    }

    /// Start at the first unfinished lesson of the first unlocked module that
    /// has one, falling back to the first lesson of the first module.
    pub fn resume(modules: &[Module]) -> Self {
        let unfinished = modules
            .iter()
            .filter(|m| !m.locked)
            .find_map(|m| m.lessons.iter().find(|l| !l.completed).map(|l| (m.id, l.id)));
        let (module_id, lesson_id) = unfinished
            .or_else(|| {
                modules
                    .first()
                    .map(|m| (m.id, m.lessons.first().map_or(0, |l| l.id)))
            })
            .unwrap_or_default();
        Self::new(module_id, lesson_id)
    }

    pub fn current_module_id(&self) -> i64 {
        self.current_module_id
    }

    pub fn current_lesson_id(&self) -> i64 {
        self.current_lesson_id
    }

    pub fn is_expanded(&self, module_id: i64) -> bool {
        self.expanded.get(&module_id).copied().unwrap_or(false)
    }

    /// Both ids must match; a lesson sharing the id in another module is not current.
    pub fn is_current_lesson(&self, module_id: i64, lesson_id: i64) -> bool {
        module_id == self.current_module_id && lesson_id == self.current_lesson_id
    }

    /// Flip one module's flag and return the new value.
    pub(crate) fn flip(&mut self, module_id: i64) -> bool {
        let expanded = self.expanded.entry(module_id).or_insert(false);
        *expanded = !*expanded;
        *expanded
    }

    /// Move the current position and force its module open. Other flags are kept.
    pub fn set_current(&mut self, module_id: i64, lesson_id: i64) {
        self.current_module_id = module_id;
        self.current_lesson_id = lesson_id;
        self.expanded.insert(module_id, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Lesson, LessonType};

    #[test]
    fn only_current_module_starts_expanded() {
        let state = NavigationState::new(2, 5);
        assert!(state.is_expanded(2));
        assert!(!state.is_expanded(1));
        assert!(!state.is_expanded(3));
    }

    #[test]
    fn moving_current_keeps_other_choices() {
        let mut state = NavigationState::new(1, 1);
        state.flip(3);
        state.flip(1);
        state.set_current(2, 7);
        assert!(!state.is_expanded(1));
        assert!(state.is_expanded(2));
        assert!(state.is_expanded(3));
        assert!(state.is_current_lesson(2, 7));
        assert!(!state.is_current_lesson(1, 7));
    }

    #[test]
    fn resume_skips_locked_and_finished_work() {
        let modules = [
            Module::new(1, "done")
                .with_lessons([Lesson::new(1, "a", LessonType::Video).with_completed(true)]),
            Module::new(2, "locked")
                .with_locked(true)
                .with_lessons([Lesson::new(1, "b", LessonType::Video)]),
            Module::new(3, "open").with_lessons([
                Lesson::new(8, "c", LessonType::Quiz).with_completed(true),
                Lesson::new(9, "d", LessonType::Lab),
            ]),
        ];
        let state = NavigationState::resume(&modules);
        assert_eq!((state.current_module_id(), state.current_lesson_id()), (3, 9));
        assert!(state.is_expanded(3));
    }

    #[test]
    fn resume_with_everything_done_returns_to_start() {
        let modules = [Module::new(4, "done")
            .with_lessons([Lesson::new(6, "a", LessonType::Video).with_completed(true)])];
        let state = NavigationState::resume(&modules);
        assert_eq!((state.current_module_id(), state.current_lesson_id()), (4, 6));
        assert_eq!(NavigationState::resume(&[]), NavigationState::new(0, 0));
    }

    #[test]
    fn survives_a_session_round_trip() {
        let mut state = NavigationState::new(1, 2);
        state.flip(5);
        let json = serde_json::to_string(&state).unwrap();
        let back: NavigationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
