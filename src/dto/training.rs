use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    enrollments, module_progress, training_categories, training_courses, training_modules,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub course_count: i64,
}

impl TrainingCategory {
    pub fn new(model: training_categories::Model, course_count: i64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            course_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub level: String,
    pub duration_hours: i32,
    pub price: i64,
    pub enrollment_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(model: training_courses::Model, enrollment_count: i64) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            level: model.level,
            duration_hours: model.duration_hours,
            price: model.price,
            enrollment_count,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseModule {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub video_url: String,
    pub duration_minutes: i32,
    pub position: i32,
}

impl From<training_modules::Model> for CourseModule {
    fn from(model: training_modules::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            content: model.content,
            video_url: model.video_url,
            duration_minutes: model.duration_minutes,
            position: model.position,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<CourseModule>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: String,
    pub progress_percentage: f64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<enrollments::Model> for Enrollment {
    fn from(model: enrollments::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            course_id: model.course_id,
            status: model.status,
            progress_percentage: model.progress_percentage,
            enrolled_at: model.enrolled_at.with_timezone(&Utc),
            completed_at: model.completed_at.map(|at| at.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModuleProgress {
    pub module_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<module_progress::Model> for ModuleProgress {
    fn from(model: module_progress::Model) -> Self {
        Self {
            module_id: model.module_id,
            completed: model.completed,
            completed_at: model.completed_at.map(|at| at.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseProgress {
    pub enrollment: Enrollment,
    pub completed_modules: i64,
    pub total_modules: i64,
    pub modules: Vec<ModuleProgress>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingCategoryList {
    pub items: Vec<TrainingCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseList {
    pub items: Vec<Course>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentList {
    pub items: Vec<Enrollment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PopularCourse {
    pub id: Uuid,
    pub title: String,
    pub enrollment_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingSummary {
    pub total_courses: i64,
    pub total_categories: i64,
    pub total_enrollments: i64,
    pub popular_courses: Vec<PopularCourse>,
}
