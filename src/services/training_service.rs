use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    domain::{status::EnrollmentStatus, training},
    dto::training::{
        Course, CourseDetail, CourseList, CourseModule, CourseProgress, Enrollment,
        EnrollmentList, ModuleProgress, PopularCourse, TrainingCategory, TrainingCategoryList,
        TrainingSummary,
    },
    entity::{
        enrollments::{self, Column as EnrCol, Entity as Enrollments, Model as EnrollmentModel},
        module_progress::{self, Column as ProgCol, Entity as ModuleProgressRows},
        training_categories::{Column as CatCol, Entity as TrainingCategories},
        training_courses::{Column, Entity as TrainingCourses},
        training_modules::{Column as ModCol, Entity as TrainingModules},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::{CourseQuery, Pagination},
    state::AppState,
};

const POPULAR_LIMIT: i64 = 5;

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<TrainingCategoryList>> {
    let categories = TrainingCategories::find()
        .filter(CatCol::IsActive.eq(true))
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?;

    let counts: HashMap<Uuid, i64> = sqlx::query_as(
        r#"
        SELECT category_id, COUNT(*)::BIGINT
        FROM training_courses
        WHERE is_active
        GROUP BY category_id
        "#,
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    let items = categories
        .into_iter()
        .map(|category| {
            let count = counts.get(&category.id).copied().unwrap_or(0);
            TrainingCategory::new(category, count)
        })
        .collect();

    Ok(ApiResponse::success(
        "Training categories",
        TrainingCategoryList { items },
        None,
    ))
}

pub async fn list_courses(
    state: &AppState,
    pagination: Pagination,
    query: CourseQuery,
) -> AppResult<ApiResponse<CourseList>> {
    let (page, limit, offset) = pagination.normalize();
    let mut finder = TrainingCourses::find()
        .inner_join(TrainingCategories)
        .filter(Column::IsActive.eq(true))
        .filter(CatCol::IsActive.eq(true));

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        finder = finder.filter(CatCol::Slug.eq(slug.as_str()));
    }
    if let Some(level) = query.level {
        finder = finder.filter(Column::Level.eq(level.as_str()));
    }
    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        finder = finder.filter(Expr::col((TrainingCourses, Column::Title)).ilike(pattern));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let courses = finder
        .order_by_desc(Column::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    let counts = enrollment_counts(&state.pool, &ids).await?;
    let items = courses
        .into_iter()
        .map(|course| {
            let count = counts.get(&course.id).copied().unwrap_or(0);
            Course::new(course, count)
        })
        .collect();

    Ok(ApiResponse::paginated(
        "Courses",
        CourseList { items },
        page,
        limit,
        total,
    ))
}

pub async fn get_course(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CourseDetail>> {
    let course = TrainingCourses::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Course"))?;

    let modules = TrainingModules::find()
        .filter(ModCol::CourseId.eq(course.id))
        .order_by_asc(ModCol::Position)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CourseModule::from)
        .collect();

    let counts = enrollment_counts(&state.pool, &[course.id]).await?;
    let count = counts.get(&course.id).copied().unwrap_or(0);

    Ok(ApiResponse::success(
        "Course",
        CourseDetail {
            course: Course::new(course, count),
            modules,
        },
        None,
    ))
}

// Unique (user_id, course_id): losing the insert race is a conflict too.
pub async fn enroll(
    state: &AppState,
    user: &AuthUser,
    course_id: Uuid,
) -> AppResult<ApiResponse<Enrollment>> {
    TrainingCourses::find_by_id(course_id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Course"))?;

    let inserted = Enrollments::insert(enrollments::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        course_id: Set(course_id),
        status: Set(EnrollmentStatus::Active.to_string()),
        progress_percentage: Set(0.0),
        enrolled_at: NotSet,
        completed_at: Set(None),
    })
    .on_conflict(
        OnConflict::columns([EnrCol::UserId, EnrCol::CourseId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    if inserted == 0 {
        return Err(AppError::Conflict(
            "Already enrolled in this course".into(),
        ));
    }

    let enrollment = Enrollments::find()
        .filter(EnrCol::UserId.eq(user.user_id))
        .filter(EnrCol::CourseId.eq(course_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Enrollment"))?;

    audit::record(
        &state.orm,
        user.user_id,
        "course_enroll",
        "enrollments",
        serde_json::json!({ "enrollment_id": enrollment.id, "course_id": course_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Enrolled",
        Enrollment::from(enrollment),
        Some(Meta::empty()),
    ))
}

pub async fn list_enrollments(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<EnrollmentList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Enrollments::find()
        .filter(EnrCol::UserId.eq(user.user_id))
        .order_by_desc(EnrCol::EnrolledAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Enrollment::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Enrollments",
        EnrollmentList { items },
        page,
        limit,
        total,
    ))
}

pub async fn get_enrollment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Enrollment>> {
    let enrollment = Enrollments::find_by_id(id)
        .filter(EnrCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Enrollment"))?;
    Ok(ApiResponse::success(
        "Enrollment",
        Enrollment::from(enrollment),
        None,
    ))
}

pub async fn course_progress(
    state: &AppState,
    user: &AuthUser,
    course_id: Uuid,
) -> AppResult<ApiResponse<CourseProgress>> {
    let enrollment = Enrollments::find()
        .filter(EnrCol::UserId.eq(user.user_id))
        .filter(EnrCol::CourseId.eq(course_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Enrollment"))?;

    let progress = build_progress(state, enrollment).await?;
    Ok(ApiResponse::success("Course progress", progress, None))
}

// Concurrent completions serialise on the enrollment row lock.
pub async fn complete_module(
    state: &AppState,
    user: &AuthUser,
    module_id: Uuid,
) -> AppResult<ApiResponse<CourseProgress>> {
    let module = TrainingModules::find_by_id(module_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Module"))?;

    let txn = state.orm.begin().await?;
    let enrollment = Enrollments::find()
        .filter(EnrCol::UserId.eq(user.user_id))
        .filter(EnrCol::CourseId.eq(module.course_id))
        .filter(EnrCol::Status.ne(EnrollmentStatus::Cancelled.as_str()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::InvalidArgument("Not enrolled in this course".into()))?;

    let now = Utc::now();
    ModuleProgressRows::insert(module_progress::ActiveModel {
        id: Set(Uuid::new_v4()),
        enrollment_id: Set(enrollment.id),
        module_id: Set(module.id),
        completed: Set(true),
        completed_at: Set(Some(now.into())),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([ProgCol::EnrollmentId, ProgCol::ModuleId])
            .update_columns([ProgCol::Completed, ProgCol::CompletedAt])
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    let completed = ModuleProgressRows::find()
        .filter(ProgCol::EnrollmentId.eq(enrollment.id))
        .filter(ProgCol::Completed.eq(true))
        .count(&txn)
        .await?;
    let total = TrainingModules::find()
        .filter(ModCol::CourseId.eq(module.course_id))
        .count(&txn)
        .await?;

    let already_completed = enrollment.completed_at.is_some();
    let mut active: enrollments::ActiveModel = enrollment.into();
    active.progress_percentage = Set(training::progress_percentage(completed, total));
    if training::is_complete(completed, total) && !already_completed {
        active.status = Set(EnrollmentStatus::Completed.to_string());
        active.completed_at = Set(Some(now.into()));
    }
    let enrollment = active.update(&txn).await?;
    txn.commit().await?;

    if !already_completed && enrollment.completed_at.is_some() {
        tracing::info!(enrollment_id = %enrollment.id, course_id = %enrollment.course_id, "course completed");
    }

    let progress = build_progress(state, enrollment).await?;
    Ok(ApiResponse::success(
        "Module completed",
        progress,
        Some(Meta::empty()),
    ))
}

pub async fn training_summary(state: &AppState) -> AppResult<ApiResponse<TrainingSummary>> {
    let total_courses = TrainingCourses::find()
        .filter(Column::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    let total_categories = TrainingCategories::find()
        .filter(CatCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    let total_enrollments = Enrollments::find().count(&state.orm).await? as i64;

    let popular: Vec<(Uuid, String, i64)> = sqlx::query_as(
        r#"
        SELECT c.id, c.title, COUNT(e.id)::BIGINT AS enrollment_count
        FROM training_courses c
        LEFT JOIN enrollments e ON e.course_id = c.id
        WHERE c.is_active
        GROUP BY c.id, c.title
        ORDER BY enrollment_count DESC, c.title
        LIMIT $1
        "#,
    )
    .bind(POPULAR_LIMIT)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Training summary",
        TrainingSummary {
            total_courses,
            total_categories,
            total_enrollments,
            popular_courses: popular
                .into_iter()
                .map(|(id, title, enrollment_count)| PopularCourse {
                    id,
                    title,
                    enrollment_count,
                })
                .collect(),
        },
        None,
    ))
}

async fn build_progress(
    state: &AppState,
    enrollment: EnrollmentModel,
) -> AppResult<CourseProgress> {
    let modules: Vec<ModuleProgress> = ModuleProgressRows::find()
        .filter(ProgCol::EnrollmentId.eq(enrollment.id))
        .order_by_asc(ProgCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ModuleProgress::from)
        .collect();
    let total_modules = TrainingModules::find()
        .filter(ModCol::CourseId.eq(enrollment.course_id))
        .count(&state.orm)
        .await? as i64;
    let completed_modules = modules.iter().filter(|m| m.completed).count() as i64;

    Ok(CourseProgress {
        enrollment: Enrollment::from(enrollment),
        completed_modules,
        total_modules,
        modules,
    })
}

async fn enrollment_counts(pool: &DbPool, course_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>> {
    if course_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64)> = sqlx::query_as(
        r#"
        SELECT course_id, COUNT(*)::BIGINT
        FROM enrollments
        WHERE course_id = ANY($1)
        GROUP BY course_id
        "#,
    )
    .bind(course_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}
