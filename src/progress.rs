use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    course::{
        Lesson, Module,
        catalog::{Catalog, LessonRecord},
    },
    error::{Error, Result},
    navigation::percentage,
    utils::utc_now,
};

/// One student's record for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct LessonProgress {
    pub lesson_id: i64,
    pub is_completed: bool,
    pub quiz_score: Option<i64>,
    pub time_spent_seconds: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CompleteLessonRequest {
    pub quiz_score: Option<i64>,
    pub time_spent_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ModuleProgress {
    pub module_id: i64,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub progress_percentage: u8,
    pub is_completed: bool,
}

impl From<&Module> for ModuleProgress {
    fn from(module: &Module) -> Self {
        let completed_lessons = module.completed_lessons();
        let total_lessons = module.lessons.len();
        Self {
            module_id: module.id,
            completed_lessons,
            total_lessons,
            progress_percentage: percentage(completed_lessons, total_lessons),
            is_completed: module.completed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CourseProgress {
    pub course_id: i64,
    pub completed_modules: usize,
    pub total_modules: usize,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub progress_percentage: u8,
    /// False for a course without lessons
    pub is_completed: bool,
}

impl CourseProgress {
    pub fn from_modules(course_id: i64, modules: &[Module]) -> Self {
        let completed_lessons: usize = modules.iter().map(Module::completed_lessons).sum();
        let total_lessons: usize = modules.iter().map(|m| m.lessons.len()).sum();
        Self {
            course_id,
            completed_modules: modules.iter().filter(|m| m.completed()).count(),
            total_modules: modules.len(),
            completed_lessons,
            total_lessons,
            progress_percentage: percentage(completed_lessons, total_lessons),
            is_completed: total_lessons > 0 && completed_lessons == total_lessons,
        }
    }
}

const PROGRESS_COLUMNS: &str =
    "lesson_id, is_completed, quiz_score, time_spent_seconds, started_at, completed_at";

/// The lesson, provided its module is open to students.
async fn open_lesson(catalog: &Catalog, lesson_id: i64) -> Result<LessonRecord> {
    let lesson = catalog.get_lesson(lesson_id).await?;
    let module = catalog.get_module(lesson.module_id).await?;
    if module.locked {
        return Err(Error::ModuleLocked {
            module_id: module.id,
        });
    }
    Ok(lesson)
}

/// Record that a student opened a lesson. Existing records are left as they are.
pub async fn start_lesson(
    catalog: &Catalog,
    student_id: i64,
    lesson_id: i64,
) -> Result<LessonProgress> {
    open_lesson(catalog, lesson_id).await?;
    let progress = sqlx::query_as::<_, LessonProgress>(&format!(
        "INSERT INTO lesson_progress (student_id, lesson_id, started_at) VALUES (?, ?, ?)
         ON CONFLICT (student_id, lesson_id) DO UPDATE SET student_id = excluded.student_id
         RETURNING {PROGRESS_COLUMNS}"
    ))
    .bind(student_id)
    .bind(lesson_id)
    .bind(utc_now())
    .fetch_one(&catalog.database)
    .await?;
    Ok(progress)
}

pub async fn complete_lesson(
    catalog: &Catalog,
    student_id: i64,
    lesson_id: i64,
    req: CompleteLessonRequest,
) -> Result<LessonProgress> {
    open_lesson(catalog, lesson_id).await?;
    let now = utc_now();
    let progress = sqlx::query_as::<_, LessonProgress>(&format!(
        "INSERT INTO lesson_progress
            (student_id, lesson_id, is_completed, quiz_score, time_spent_seconds, started_at, completed_at)
         VALUES (?, ?, 1, ?, ?, ?, ?)
         ON CONFLICT (student_id, lesson_id) DO UPDATE SET
            is_completed = 1,
            quiz_score = COALESCE(excluded.quiz_score, quiz_score),
            time_spent_seconds = COALESCE(excluded.time_spent_seconds, time_spent_seconds),
            completed_at = excluded.completed_at
         RETURNING {PROGRESS_COLUMNS}"
    ))
    .bind(student_id)
    .bind(lesson_id)
    .bind(req.quiz_score)
    .bind(req.time_spent_seconds)
    .bind(now)
    .bind(now)
    .fetch_one(&catalog.database)
    .await?;
    info!("student {} completed lesson {}", student_id, lesson_id);
    Ok(progress)
}

pub async fn reset_lesson(database: &SqlitePool, student_id: i64, lesson_id: i64) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM lesson_progress WHERE student_id = ? AND lesson_id = ?")
        .bind(student_id)
        .bind(lesson_id)
        .execute(database)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::not_found("lesson progress", lesson_id));
    }
    Ok(())
}

async fn completed_lesson_ids(
    database: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<HashSet<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT p.lesson_id FROM lesson_progress p
         INNER JOIN lesson l ON l.id = p.lesson_id
         INNER JOIN module m ON m.id = l.module_id
         WHERE p.student_id = ? AND m.course_id = ? AND p.is_completed = 1",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(database)
    .await?;
    Ok(ids.into_iter().collect())
}

/// The course as one student sees it: catalog structure with their completion merged in.
pub async fn load_modules(catalog: &Catalog, student_id: i64, course_id: i64) -> Result<Vec<Module>> {
    let outline = catalog.outline(course_id).await?;
    let completed = completed_lesson_ids(&catalog.database, student_id, course_id).await?;
    Ok(outline
        .iter()
        .map(|entry| Module {
            id: entry.module.id,
            title: entry.module.title.clone(),
            locked: entry.module.locked,
            lessons: entry
                .lessons
                .iter()
                .map(|lesson| Lesson {
                    id: lesson.id,
                    title: lesson.title.clone(),
                    duration: lesson.duration.clone(),
                    lesson_type: lesson.lesson_type,
                    completed: completed.contains(&lesson.id),
                })
                .collect(),
        })
        .collect())
}

pub async fn module_progress(
    catalog: &Catalog,
    student_id: i64,
    module_id: i64,
) -> Result<ModuleProgress> {
    let record = catalog.get_module(module_id).await?;
    let modules = load_modules(catalog, student_id, record.course_id).await?;
    modules
        .iter()
        .find(|m| m.id == module_id)
        .map(ModuleProgress::from)
        .ok_or(Error::not_found("module", module_id))
}

pub async fn course_progress(
    catalog: &Catalog,
    student_id: i64,
    course_id: i64,
) -> Result<CourseProgress> {
    let modules = load_modules(catalog, student_id, course_id).await?;
    Ok(CourseProgress::from_modules(course_id, &modules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        course::{
            LessonType,
            catalog::{NewCourse, NewLesson, NewModule},
        },
        database::connect_in_memory,
        session::Role,
        user::create_user,
    };

    struct Fixture {
        catalog: Catalog,
        student: i64,
        course: i64,
        modules: Vec<i64>,
        lessons: Vec<i64>,
    }

    /// One course: module A with two lessons, module B with one, module C empty.
    async fn fixture() -> Fixture {
        let catalog = Catalog::new(connect_in_memory().await.unwrap(), 8);
        let student = create_user(
            &catalog.database,
            "Sam".into(),
            "sam@example.com".into(),
            "pw".into(),
            Role::Student,
        )
        .await
        .unwrap();
        let course = catalog
            .create_course(NewCourse {
                title: "Rust".into(),
                description: String::new(),
                is_public: true,
            })
            .await
            .unwrap()
            .id;
        let mut modules = Vec::new();
        let mut lessons = Vec::new();
        for (position, (title, count)) in [("A", 2), ("B", 1), ("C", 0)].into_iter().enumerate() {
            let module = catalog
                .create_module(NewModule {
                    course_id: course,
                    title: title.into(),
                    description: String::new(),
                    position: position as i64,
                    locked: false,
                })
                .await
                .unwrap();
            for i in 0..count {
                let lesson = catalog
                    .create_lesson(
                        module.id,
                        NewLesson {
                            title: format!("{title}{i}"),
                            duration: "5 min".into(),
                            lesson_type: LessonType::Reading,
                            position: i,
                        },
                    )
                    .await
                    .unwrap();
                lessons.push(lesson.id);
            }
            modules.push(module.id);
        }
        Fixture {
            catalog,
            student,
            course,
            modules,
            lessons,
        }
    }

    #[tokio::test]
    async fn completing_lessons_moves_aggregates() {
        let f = fixture().await;
        let p = course_progress(&f.catalog, f.student, f.course).await.unwrap();
        assert_eq!((p.completed_lessons, p.total_lessons, p.progress_percentage), (0, 3, 0));

        complete_lesson(&f.catalog, f.student, f.lessons[0], CompleteLessonRequest::default())
            .await
            .unwrap();
        let m = module_progress(&f.catalog, f.student, f.modules[0]).await.unwrap();
        assert_eq!((m.completed_lessons, m.total_lessons, m.progress_percentage), (1, 2, 50));
        assert!(!m.is_completed);

        complete_lesson(&f.catalog, f.student, f.lessons[2], CompleteLessonRequest::default())
            .await
            .unwrap();
        let p = course_progress(&f.catalog, f.student, f.course).await.unwrap();
        assert_eq!(p.completed_modules, 1);
        assert_eq!(p.total_modules, 3);
        assert_eq!(p.progress_percentage, 67);
        assert!(!p.is_completed);

        let empty = module_progress(&f.catalog, f.student, f.modules[2]).await.unwrap();
        assert_eq!(empty.progress_percentage, 0);
        assert!(!empty.is_completed);
    }

    #[tokio::test]
    async fn start_then_complete_keeps_start_time_and_score() {
        let f = fixture().await;
        let started = start_lesson(&f.catalog, f.student, f.lessons[1]).await.unwrap();
        assert!(!started.is_completed);
        let again = start_lesson(&f.catalog, f.student, f.lessons[1]).await.unwrap();
        assert_eq!(again.started_at, started.started_at);

        let done = complete_lesson(
            &f.catalog,
            f.student,
            f.lessons[1],
            CompleteLessonRequest {
                quiz_score: Some(80),
                time_spent_seconds: Some(300),
            },
        )
        .await
        .unwrap();
        assert!(done.is_completed);
        assert_eq!(done.quiz_score, Some(80));
        assert_eq!(done.started_at, started.started_at);
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn reset_clears_completion() {
        let f = fixture().await;
        complete_lesson(&f.catalog, f.student, f.lessons[0], CompleteLessonRequest::default())
            .await
            .unwrap();
        reset_lesson(&f.catalog.database, f.student, f.lessons[0]).await.unwrap();
        let modules = load_modules(&f.catalog, f.student, f.course).await.unwrap();
        assert!(modules.iter().flat_map(|m| &m.lessons).all(|l| !l.completed));
        assert!(matches!(
            reset_lesson(&f.catalog.database, f.student, f.lessons[0]).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn locked_module_refuses_progress() {
        let f = fixture().await;
        let module = f.catalog.get_module(f.modules[0]).await.unwrap();
        f.catalog
            .update_module(
                module.id,
                NewModule {
                    course_id: module.course_id,
                    title: module.title,
                    description: module.description,
                    position: module.position,
                    locked: true,
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            complete_lesson(&f.catalog, f.student, f.lessons[0], CompleteLessonRequest::default()).await,
            Err(Error::ModuleLocked { module_id }) if module_id == f.modules[0]
        ));
        assert!(matches!(
            start_lesson(&f.catalog, f.student, f.lessons[1]).await,
            Err(Error::ModuleLocked { .. })
        ));
        let m = module_progress(&f.catalog, f.student, f.modules[0]).await.unwrap();
        assert_eq!(m.completed_lessons, 0);

        // other modules are unaffected
        complete_lesson(&f.catalog, f.student, f.lessons[2], CompleteLessonRequest::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_lesson_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            start_lesson(&f.catalog, f.student, 9999).await,
            Err(Error::NotFound { kind: "lesson", .. })
        ));
    }
}
