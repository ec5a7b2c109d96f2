use crate::course::Module;

/// `round(100 * completed / total)` with halves rounded up, or 0 for an empty total.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed * 200 + total) / (total * 2)) as u8
}

/// Share of a module's lessons that are completed. A module without lessons is at 0.
pub fn module_progress(module: &Module) -> u8 {
    percentage(module.completed_lessons(), module.lessons.len())
}

/// Share of all lessons across the given modules that are completed.
pub fn course_progress(modules: &[Module]) -> u8 {
    let (completed, total) = modules.iter().fold((0, 0), |(c, t), m| {
        (c + m.completed_lessons(), t + m.lessons.len())
    });
    percentage(completed, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Lesson, LessonType};

    fn module_with(completed: usize, total: usize) -> Module {
        Module::new(1, "m").with_lessons((0..total).map(|i| {
            Lesson::new(i as i64, format!("l{i}"), LessonType::Reading).with_completed(i < completed)
        }))
    }

    #[test]
    fn matches_rounded_ratio() {
        for total in 1..=12usize {
            for completed in 0..=total {
                let expected = (100.0 * completed as f64 / total as f64 + 0.5).floor() as u8;
                assert_eq!(
                    module_progress(&module_with(completed, total)),
                    expected,
                    "{completed}/{total}"
                );
            }
        }
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
    }

    #[test]
    fn empty_module_is_zero() {
        assert_eq!(module_progress(&Module::new(1, "empty")), 0);
        assert_eq!(course_progress(&[]), 0);
    }

    #[test]
    fn completing_more_never_lowers_progress() {
        let mut module = module_with(0, 7);
        let mut last = module_progress(&module);
        for i in 0..module.lessons.len() {
            module.lessons[i].completed = true;
            let now = module_progress(&module);
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn course_progress_counts_lessons_not_modules() {
        let modules = [module_with(1, 1), module_with(0, 3)];
        assert_eq!(course_progress(&modules), 25);
    }
}
