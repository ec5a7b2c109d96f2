use serde::Serialize;
use utoipa::ToSchema;

use crate::course::LessonType;

/// Colour family an icon is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Green,
    Blue,
    Amber,
    Purple,
    Orange,
    Cyan,
    Muted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LessonIcon {
    Completed,
    PlayCircle,
    BookOpen,
    ClipboardCheck,
    FileText,
    Beaker,
    Generic,
}

impl LessonIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            LessonIcon::Completed => "✓",
            LessonIcon::PlayCircle => "▶",
            LessonIcon::BookOpen => "≡",
            LessonIcon::ClipboardCheck => "?",
            LessonIcon::FileText => "✎",
            LessonIcon::Beaker => "⚗",
            LessonIcon::Generic => "·",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            LessonIcon::Completed => Tone::Green,
            LessonIcon::PlayCircle => Tone::Blue,
            LessonIcon::BookOpen => Tone::Amber,
            LessonIcon::ClipboardCheck => Tone::Purple,
            LessonIcon::FileText => Tone::Orange,
            LessonIcon::Beaker => Tone::Cyan,
            LessonIcon::Generic => Tone::Muted,
        }
    }
}

/// Completion wins over the lesson type.
pub fn resolve_lesson_icon(lesson_type: LessonType, completed: bool) -> LessonIcon {
    if completed {
        return LessonIcon::Completed;
    }
    match lesson_type {
        LessonType::Video => LessonIcon::PlayCircle,
        LessonType::Reading => LessonIcon::BookOpen,
        LessonType::Quiz => LessonIcon::ClipboardCheck,
        LessonType::Assignment => LessonIcon::FileText,
        LessonType::Lab => LessonIcon::Beaker,
        LessonType::Unspecified => LessonIcon::Generic,
    }
}

/// Leading marker of a module header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModuleMarker {
    Locked,
    Completed,
    Expanded,
    Collapsed,
}

impl ModuleMarker {
    pub fn glyph(self) -> &'static str {
        match self {
            ModuleMarker::Locked => "⊘",
            ModuleMarker::Completed => "✓",
            ModuleMarker::Expanded => "▾",
            ModuleMarker::Collapsed => "▸",
        }
    }
}

pub fn resolve_module_marker(locked: bool, completed: bool, expanded: bool) -> ModuleMarker {
    if locked {
        ModuleMarker::Locked
    } else if completed {
        ModuleMarker::Completed
    } else if expanded {
        ModuleMarker::Expanded
    } else {
        ModuleMarker::Collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [LessonType; 6] = [
        LessonType::Video,
        LessonType::Reading,
        LessonType::Quiz,
        LessonType::Assignment,
        LessonType::Lab,
        LessonType::Unspecified,
    ];

    #[test]
    fn completed_overrides_every_type() {
        for ty in ALL_TYPES {
            assert_eq!(resolve_lesson_icon(ty, true), LessonIcon::Completed);
        }
    }

    #[test]
    fn each_type_has_its_own_icon() {
        let icons: Vec<_> = ALL_TYPES
            .iter()
            .map(|ty| resolve_lesson_icon(*ty, false))
            .collect();
        assert_eq!(
            icons,
            [
                LessonIcon::PlayCircle,
                LessonIcon::BookOpen,
                LessonIcon::ClipboardCheck,
                LessonIcon::FileText,
                LessonIcon::Beaker,
                LessonIcon::Generic,
            ]
        );
        assert_eq!(LessonIcon::Generic.tone(), Tone::Muted);
    }

    #[test]
    fn lock_takes_priority_over_completion() {
        assert_eq!(resolve_module_marker(true, true, true), ModuleMarker::Locked);
        assert_eq!(resolve_module_marker(false, true, false), ModuleMarker::Completed);
        assert_eq!(resolve_module_marker(false, false, true), ModuleMarker::Expanded);
        assert_eq!(resolve_module_marker(false, false, false), ModuleMarker::Collapsed);
    }
}
