use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use super::{CourseInfo, LessonType};
use crate::error::{Error, Result};

const MODULE_COLUMNS: &str = "id, course_id, title, description, position, locked";
const LESSON_COLUMNS: &str = "id, module_id, title, duration, lesson_type, position";

fn first_position() -> i64 {
    1
}

fn public_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "public_by_default")]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ModuleRecord {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub position: i64,
    pub locked: bool,
}

/// Body for creating a module, and for replacing one wholesale.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewModule {
    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "first_position")]
    pub position: i64,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LessonRecord {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub duration: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub position: i64,
}

#[derive(sqlx::FromRow)]
struct LessonRow {
    id: i64,
    module_id: i64,
    title: String,
    duration: String,
    lesson_type: String,
    position: i64,
}

impl From<LessonRow> for LessonRecord {
    fn from(row: LessonRow) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            title: row.title,
            duration: row.duration,
            lesson_type: LessonType::from(row.lesson_type.as_str()),
            position: row.position,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewLesson {
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(rename = "type", default)]
    pub lesson_type: LessonType,
    #[serde(default = "first_position")]
    pub position: i64,
}

/// Partial lesson update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub duration: Option<String>,
    #[serde(rename = "type")]
    pub lesson_type: Option<LessonType>,
    pub position: Option<i64>,
}

/// A module with its lessons, both in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineModule {
    pub module: ModuleRecord,
    pub lessons: Vec<LessonRecord>,
}

const OUTLINE_TTL: Duration = Duration::from_secs(10 * 60);

/// Persistent store of courses, modules and lessons.
///
/// Course outlines are cached. Every write bumps `generation` and drops the
/// whole cache; an outline read under an older generation is not kept.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub database: SqlitePool,
    outlines: Cache<i64, Arc<Vec<OutlineModule>>>,
    generation: Arc<AtomicU64>,
}

impl Catalog {
    pub fn new(database: SqlitePool, outline_capacity: u64) -> Self {
        Self {
            database,
            outlines: Cache::builder()
                .max_capacity(outline_capacity)
                .time_to_live(OUTLINE_TTL)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn outlines_changed(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.outlines.invalidate_all();
    }

    pub async fn create_course(&self, course: NewCourse) -> Result<CourseInfo> {
        let course = sqlx::query_as::<_, CourseInfo>(
            "INSERT INTO course (title, description, is_public) VALUES (?, ?, ?)
             RETURNING id, title, description, is_public",
        )
        .bind(course.title)
        .bind(course.description)
        .bind(course.is_public)
        .fetch_one(&self.database)
        .await?;
        info!("created course {}-{}", course.id, course.title);
        Ok(course)
    }

    pub async fn get_course(&self, id: i64) -> Result<CourseInfo> {
        sqlx::query_as::<_, CourseInfo>(
            "SELECT id, title, description, is_public FROM course WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.database)
        .await?
        .ok_or(Error::not_found("course", id))
    }

    pub async fn list_courses(&self, public_only: bool) -> Result<Vec<CourseInfo>> {
        let courses = sqlx::query_as::<_, CourseInfo>(
            "SELECT id, title, description, is_public FROM course
             WHERE is_public = 1 OR ? = 0 ORDER BY id",
        )
        .bind(public_only)
        .fetch_all(&self.database)
        .await?;
        Ok(courses)
    }

    pub async fn create_module(&self, module: NewModule) -> Result<ModuleRecord> {
        self.get_course(module.course_id).await?;
        let record = sqlx::query_as::<_, ModuleRecord>(&format!(
            "INSERT INTO module (course_id, title, description, position, locked)
             VALUES (?, ?, ?, ?, ?) RETURNING {MODULE_COLUMNS}"
        ))
        .bind(module.course_id)
        .bind(module.title)
        .bind(module.description)
        .bind(module.position)
        .bind(module.locked)
        .fetch_one(&self.database)
        .await?;
        self.outlines_changed();
        info!("created module {} in course {}", record.id, record.course_id);
        Ok(record)
    }

    pub async fn list_modules(&self, course_id: i64) -> Result<Vec<ModuleRecord>> {
        let modules = sqlx::query_as::<_, ModuleRecord>(&format!(
            "SELECT {MODULE_COLUMNS} FROM module WHERE course_id = ? ORDER BY position, id"
        ))
        .bind(course_id)
        .fetch_all(&self.database)
        .await?;
        Ok(modules)
    }

    pub async fn get_module(&self, id: i64) -> Result<ModuleRecord> {
        sqlx::query_as::<_, ModuleRecord>(&format!(
            "SELECT {MODULE_COLUMNS} FROM module WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.database)
        .await?
        .ok_or(Error::not_found("module", id))
    }

    pub async fn update_module(&self, id: i64, module: NewModule) -> Result<ModuleRecord> {
        self.get_course(module.course_id).await?;
        let record = sqlx::query_as::<_, ModuleRecord>(&format!(
            "UPDATE module SET course_id = ?, title = ?, description = ?, position = ?, locked = ?
             WHERE id = ? RETURNING {MODULE_COLUMNS}"
        ))
        .bind(module.course_id)
        .bind(module.title)
        .bind(module.description)
        .bind(module.position)
        .bind(module.locked)
        .bind(id)
        .fetch_optional(&self.database)
        .await?
        .ok_or(Error::not_found("module", id))?;
        self.outlines_changed();
        Ok(record)
    }

    /// Delete a module together with its lessons and their progress records.
    pub async fn delete_module(&self, id: i64) -> Result<()> {
        let mut tx = self.database.begin().await?;
        sqlx::query(
            "DELETE FROM lesson_progress WHERE lesson_id IN (SELECT id FROM lesson WHERE module_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM lesson WHERE module_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM module WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(Error::not_found("module", id));
        }
        tx.commit().await?;
        self.outlines_changed();
        info!("deleted module {}", id);
        Ok(())
    }

    pub async fn create_lesson(&self, module_id: i64, lesson: NewLesson) -> Result<LessonRecord> {
        self.get_module(module_id).await?;
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            "INSERT INTO lesson (module_id, title, duration, lesson_type, position)
             VALUES (?, ?, ?, ?, ?) RETURNING {LESSON_COLUMNS}"
        ))
        .bind(module_id)
        .bind(lesson.title)
        .bind(lesson.duration)
        .bind(lesson.lesson_type.as_str())
        .bind(lesson.position)
        .fetch_one(&self.database)
        .await?;
        self.outlines_changed();
        Ok(row.into())
    }

    pub async fn list_lessons(&self, module_id: i64) -> Result<Vec<LessonRecord>> {
        let rows = sqlx::query_as::<_, LessonRow>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lesson WHERE module_id = ? ORDER BY position, id"
        ))
        .bind(module_id)
        .fetch_all(&self.database)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_lesson(&self, id: i64) -> Result<LessonRecord> {
        sqlx::query_as::<_, LessonRow>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lesson WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.database)
        .await?
        .map(Into::into)
        .ok_or(Error::not_found("lesson", id))
    }

    pub async fn update_lesson(&self, id: i64, update: LessonUpdate) -> Result<LessonRecord> {
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            "UPDATE lesson SET
                title = COALESCE(?, title),
                duration = COALESCE(?, duration),
                lesson_type = COALESCE(?, lesson_type),
                position = COALESCE(?, position)
             WHERE id = ? RETURNING {LESSON_COLUMNS}"
        ))
        .bind(update.title)
        .bind(update.duration)
        .bind(update.lesson_type.map(|t| t.as_str()))
        .bind(update.position)
        .bind(id)
        .fetch_optional(&self.database)
        .await?
        .ok_or(Error::not_found("lesson", id))?;
        self.outlines_changed();
        Ok(row.into())
    }

    pub async fn delete_lesson(&self, id: i64) -> Result<()> {
        let mut tx = self.database.begin().await?;
        sqlx::query("DELETE FROM lesson_progress WHERE lesson_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM lesson WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(Error::not_found("lesson", id));
        }
        tx.commit().await?;
        self.outlines_changed();
        Ok(())
    }

    /// Modules of a course with their lessons, in display order.
    pub async fn outline(&self, course_id: i64) -> Result<Arc<Vec<OutlineModule>>> {
        if let Some(outline) = self.outlines.get(&course_id).await {
            return Ok(outline);
        }
        let generation = self.generation();
        let outline = Arc::new(self.load_outline(course_id).await?);
        self.cache_outline(course_id, generation, outline.clone()).await;
        Ok(outline)
    }

    /// Keep `outline` unless a write landed after it was read at `generation`.
    ///
    /// A write between the check and the insert still clears it, because
    /// writers bump the counter before invalidating.
    async fn cache_outline(&self, course_id: i64, generation: u64, outline: Arc<Vec<OutlineModule>>) {
        if self.generation() != generation {
            return;
        }
        self.outlines.insert(course_id, outline).await;
        if self.generation() != generation {
            self.outlines.invalidate(&course_id).await;
        }
    }

    async fn load_outline(&self, course_id: i64) -> Result<Vec<OutlineModule>> {
        self.get_course(course_id).await?;
        let modules = self.list_modules(course_id).await?;
        let rows = sqlx::query_as::<_, LessonRow>(
            "SELECT l.id, l.module_id, l.title, l.duration, l.lesson_type, l.position
             FROM lesson l INNER JOIN module m ON m.id = l.module_id
             WHERE m.course_id = ? ORDER BY l.position, l.id",
        )
        .bind(course_id)
        .fetch_all(&self.database)
        .await?;
        let mut lessons: HashMap<i64, Vec<LessonRecord>> = HashMap::new();
        for row in rows {
            lessons.entry(row.module_id).or_default().push(row.into());
        }
        Ok(modules
            .into_iter()
            .map(|module| OutlineModule {
                lessons: lessons.remove(&module.id).unwrap_or_default(),
                module,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_in_memory;

    async fn catalog() -> Catalog {
        Catalog::new(connect_in_memory().await.unwrap(), 16)
    }

    async fn course(catalog: &Catalog) -> CourseInfo {
        catalog
            .create_course(NewCourse {
                title: "Databases".into(),
                description: String::new(),
                is_public: true,
            })
            .await
            .unwrap()
    }

    fn module(course_id: i64, title: &str, position: i64) -> NewModule {
        NewModule {
            course_id,
            title: title.into(),
            description: String::new(),
            position,
            locked: false,
        }
    }

    fn lesson(title: &str, lesson_type: LessonType, position: i64) -> NewLesson {
        NewLesson {
            title: title.into(),
            duration: "10 min".into(),
            lesson_type,
            position,
        }
    }

    #[tokio::test]
    async fn modules_are_listed_by_position() {
        let catalog = catalog().await;
        let course = course(&catalog).await;
        catalog.create_module(module(course.id, "Second", 2)).await.unwrap();
        catalog.create_module(module(course.id, "First", 1)).await.unwrap();
        let titles: Vec<_> = catalog
            .list_modules(course.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, ["First", "Second"]);
    }

    #[tokio::test]
    async fn module_requires_existing_course() {
        let catalog = catalog().await;
        let err = catalog.create_module(module(42, "Orphan", 1)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "course", id: 42 }));
    }

    #[tokio::test]
    async fn partial_lesson_update_keeps_other_fields() {
        let catalog = catalog().await;
        let course = course(&catalog).await;
        let m = catalog.create_module(module(course.id, "Intro", 1)).await.unwrap();
        let l = catalog
            .create_lesson(m.id, lesson("Welcome", LessonType::Video, 1))
            .await
            .unwrap();
        let updated = catalog
            .update_lesson(
                l.id,
                LessonUpdate {
                    lesson_type: Some(LessonType::Quiz),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Welcome");
        assert_eq!(updated.duration, "10 min");
        assert_eq!(updated.lesson_type, LessonType::Quiz);

        let err = catalog
            .update_lesson(999, LessonUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "lesson", .. }));
    }

    #[tokio::test]
    async fn deleting_module_removes_its_lessons() {
        let catalog = catalog().await;
        let course = course(&catalog).await;
        let m = catalog.create_module(module(course.id, "Intro", 1)).await.unwrap();
        let l = catalog
            .create_lesson(m.id, lesson("Welcome", LessonType::Video, 1))
            .await
            .unwrap();
        catalog.delete_module(m.id).await.unwrap();
        assert!(catalog.get_lesson(l.id).await.is_err());
        assert!(matches!(
            catalog.delete_module(m.id).await,
            Err(Error::NotFound { kind: "module", .. })
        ));
    }

    #[tokio::test]
    async fn outline_reflects_writes() {
        let catalog = catalog().await;
        let course = course(&catalog).await;
        let m = catalog.create_module(module(course.id, "Intro", 1)).await.unwrap();
        catalog
            .create_lesson(m.id, lesson("B", LessonType::Reading, 2))
            .await
            .unwrap();
        let outline = catalog.outline(course.id).await.unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].lessons.len(), 1);

        catalog
            .create_lesson(m.id, lesson("A", LessonType::Lab, 1))
            .await
            .unwrap();
        let outline = catalog.outline(course.id).await.unwrap();
        let titles: Vec<_> = outline[0].lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[tokio::test]
    async fn outline_read_before_a_write_is_not_cached() {
        let catalog = catalog().await;
        let course = course(&catalog).await;
        let m = catalog.create_module(module(course.id, "Intro", 1)).await.unwrap();

        // a reader loads the outline, then a write commits before it caches
        let generation = catalog.generation();
        let stale = Arc::new(catalog.load_outline(course.id).await.unwrap());
        catalog
            .create_lesson(m.id, lesson("Late", LessonType::Video, 1))
            .await
            .unwrap();
        catalog.cache_outline(course.id, generation, stale).await;

        let outline = catalog.outline(course.id).await.unwrap();
        assert_eq!(outline[0].lessons.len(), 1);
        assert_eq!(outline[0].lessons[0].title, "Late");
    }

    #[tokio::test]
    async fn private_courses_are_hidden_from_public_listing() {
        let catalog = catalog().await;
        course(&catalog).await;
        catalog
            .create_course(NewCourse {
                title: "Draft".into(),
                description: String::new(),
                is_public: false,
            })
            .await
            .unwrap();
        assert_eq!(catalog.list_courses(true).await.unwrap().len(), 1);
        assert_eq!(catalog.list_courses(false).await.unwrap().len(), 2);
    }
}
