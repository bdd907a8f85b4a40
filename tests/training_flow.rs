mod common;

use componentpulse_api::{
    domain::status::CourseLevel,
    error::AppError,
    middleware::auth::ROLE_CUSTOMER,
    routes::params::{CourseQuery, Pagination},
    services::training_service,
};

#[tokio::test]
async fn completing_every_module_completes_the_course() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let (course, modules) = common::create_course(&state, 3).await?;

    let enrollment = training_service::enroll(&state, &user, course.id)
        .await?
        .data
        .unwrap();
    assert_eq!(enrollment.status, "active");
    assert_eq!(enrollment.progress_percentage, 0.0);

    let progress = training_service::complete_module(&state, &user, modules[0].id)
        .await?
        .data
        .unwrap();
    assert_eq!(progress.completed_modules, 1);
    assert_eq!(progress.total_modules, 3);
    assert_eq!(progress.enrollment.progress_percentage, 33.33);
    assert_eq!(progress.enrollment.status, "active");

    // Completing the same module twice does not count it twice.
    let progress = training_service::complete_module(&state, &user, modules[0].id)
        .await?
        .data
        .unwrap();
    assert_eq!(progress.completed_modules, 1);

    training_service::complete_module(&state, &user, modules[1].id).await?;
    let progress = training_service::complete_module(&state, &user, modules[2].id)
        .await?
        .data
        .unwrap();
    assert_eq!(progress.enrollment.progress_percentage, 100.0);
    assert_eq!(progress.enrollment.status, "completed");
    assert!(progress.enrollment.completed_at.is_some());

    let fetched = training_service::course_progress(&state, &user, course.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.modules.len(), 3);
    Ok(())
}

#[tokio::test]
async fn course_without_modules_stays_at_zero() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let (course, _) = common::create_course(&state, 0).await?;

    training_service::enroll(&state, &user, course.id).await?;
    let progress = training_service::course_progress(&state, &user, course.id)
        .await?
        .data
        .unwrap();
    assert_eq!(progress.total_modules, 0);
    assert_eq!(progress.enrollment.progress_percentage, 0.0);
    assert_eq!(progress.enrollment.status, "active");
    Ok(())
}

#[tokio::test]
async fn enrolling_twice_is_a_conflict() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let (course, _) = common::create_course(&state, 1).await?;

    training_service::enroll(&state, &user, course.id).await?;
    let err = training_service::enroll(&state, &user, course.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let listed = training_service::list_enrollments(&state, &user, Pagination::default())
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn modules_need_an_enrollment() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let (course, modules) = common::create_course(&state, 2).await?;

    let err = training_service::complete_module(&state, &user, modules[0].id)
        .await
        .unwrap_err();
    match err {
        AppError::InvalidArgument(msg) => assert_eq!(msg, "Not enrolled in this course"),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = training_service::course_progress(&state, &user, course.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Enrollment")));
    Ok(())
}

#[tokio::test]
async fn course_detail_lists_modules_in_order() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let (course, _) = common::create_course(&state, 3).await?;
    training_service::enroll(&state, &user, course.id).await?;

    let detail = training_service::get_course(&state, course.id)
        .await?
        .data
        .unwrap();
    let positions: Vec<i32> = detail.modules.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert_eq!(detail.course.enrollment_count, 1);

    let listed = training_service::list_courses(
        &state,
        Pagination::default(),
        CourseQuery {
            category: None,
            level: Some(CourseLevel::Beginner),
            search: Some(course.title.clone()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, course.id);
    Ok(())
}
