use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::training::{
        CourseDetail, CourseList, CourseProgress, Enrollment, EnrollmentList,
        TrainingCategoryList, TrainingSummary,
    },
    error::{AppResult, ErrorBody},
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{CourseQuery, Pagination},
    services::training_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/enroll", post(enroll))
        .route("/courses/{id}/progress", get(course_progress))
        .route("/enrollments", get(list_enrollments))
        .route("/enrollments/{id}", get(get_enrollment))
        .route("/modules/{id}/complete", post(complete_module))
        .route("/summary", get(training_summary))
}

#[utoipa::path(
    get,
    path = "/api/training/categories",
    responses(
        (status = 200, description = "Active training categories with course counts", body = ApiResponse<TrainingCategoryList>)
    ),
    tag = "Training"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<TrainingCategoryList>>> {
    Ok(Json(training_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/training/courses",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Training category slug"),
        ("level" = Option<String>, Query, description = "beginner, intermediate, advanced"),
        ("search" = Option<String>, Query, description = "Match within the title")
    ),
    responses(
        (status = 200, description = "Active courses, newest first", body = ApiResponse<CourseList>)
    ),
    tag = "Training"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(query): Query<CourseQuery>,
) -> AppResult<Json<ApiResponse<CourseList>>> {
    Ok(Json(
        training_service::list_courses(&state, pagination, query).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/training/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course with its modules in order", body = ApiResponse<CourseDetail>),
        (status = 404, description = "Course not found", body = ErrorBody),
    ),
    tag = "Training"
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CourseDetail>>> {
    Ok(Json(training_service::get_course(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/training/courses/{id}/enroll",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 201, description = "Enrolled", body = ApiResponse<Enrollment>),
        (status = 404, description = "Course not found", body = ErrorBody),
        (status = 409, description = "Already enrolled", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<Enrollment>>)> {
    let resp = training_service::enroll(&state, &user, id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/training/courses/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Enrollment with per-module progress", body = ApiResponse<CourseProgress>),
        (status = 404, description = "Not enrolled", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn course_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CourseProgress>>> {
    Ok(Json(
        training_service::course_progress(&state, &user, id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/training/enrollments",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Enrollments of the current user", body = ApiResponse<EnrollmentList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<EnrollmentList>>> {
    Ok(Json(
        training_service::list_enrollments(&state, &user, pagination).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/training/enrollments/{id}",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 200, description = "Enrollment", body = ApiResponse<Enrollment>),
        (status = 404, description = "Enrollment not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn get_enrollment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Enrollment>>> {
    Ok(Json(
        training_service::get_enrollment(&state, &user, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/training/modules/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Module ID")
    ),
    responses(
        (status = 200, description = "Module marked complete", body = ApiResponse<CourseProgress>),
        (status = 400, description = "Not enrolled in this course", body = ErrorBody),
        (status = 404, description = "Module not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Training"
)]
pub async fn complete_module(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CourseProgress>>> {
    Ok(Json(
        training_service::complete_module(&state, &user, id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/training/summary",
    responses(
        (status = 200, description = "Course and enrollment counts", body = ApiResponse<TrainingSummary>)
    ),
    tag = "Training"
)]
pub async fn training_summary(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<TrainingSummary>>> {
    Ok(Json(training_service::training_summary(&state).await?))
}
