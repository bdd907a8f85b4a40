#![allow(dead_code)]

use componentpulse_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    entity::{products, support_categories, training_categories, training_courses, training_modules, users},
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-test-secret".into(),
        jwt_ttl_hours: 1,
        db_max_connections: 10,
        cors_origins: Vec::new(),
    }
}

/// Migrated state, or `None` when no database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 10).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool, test_config(&database_url))))
}

/// Tests share one database and run in parallel, so every row gets a unique
/// email or slug instead of truncating tables.
pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let user = users::ActiveModel {
        id: Set(id),
        email: Set(format!("{}@test.local", id.simple())),
        password_hash: Set("unused".into()),
        first_name: Set("Test".into()),
        last_name: Set(role.into()),
        phone: Set(String::new()),
        role: Set(role.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_product(
    state: &AppState,
    price: i64,
    stock: i32,
    is_active: bool,
) -> anyhow::Result<products::Model> {
    let id = Uuid::new_v4();
    let product = products::ActiveModel {
        id: Set(id),
        category_id: Set(None),
        name: Set(format!("Test part {}", &id.simple().to_string()[..6])),
        slug: Set(format!("test-part-{}", id.simple())),
        sku: Set(None),
        description: Set(None),
        price: Set(price),
        compare_at_price: Set(None),
        stock_quantity: Set(stock),
        low_stock_threshold: Set(Some(5)),
        is_featured: Set(false),
        is_active: Set(is_active),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn create_support_category(
    state: &AppState,
    is_active: bool,
) -> anyhow::Result<support_categories::Model> {
    let id = Uuid::new_v4();
    let category = support_categories::ActiveModel {
        id: Set(id),
        name: Set(format!("Help {}", &id.simple().to_string()[..6])),
        slug: Set(format!("help-{}", id.simple())),
        description: Set(String::new()),
        icon: Set(String::new()),
        is_active: Set(is_active),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category)
}

/// An active course with `modules` modules at positions `0..modules`.
pub async fn create_course(
    state: &AppState,
    modules: usize,
) -> anyhow::Result<(training_courses::Model, Vec<training_modules::Model>)> {
    let id = Uuid::new_v4();
    let category = training_categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Track {}", &id.simple().to_string()[..6])),
        slug: Set(format!("track-{}", id.simple())),
        description: Set(String::new()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let course = training_courses::ActiveModel {
        id: Set(id),
        category_id: Set(category.id),
        title: Set(format!("Course {}", &id.simple().to_string()[..6])),
        slug: Set(format!("course-{}", id.simple())),
        description: Set(String::new()),
        level: Set("beginner".into()),
        duration_hours: Set(2),
        price: Set(0),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let mut created = Vec::with_capacity(modules);
    for position in 0..modules {
        let module = training_modules::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course.id),
            title: Set(format!("Module {position}")),
            description: Set(String::new()),
            content: Set(String::new()),
            video_url: Set(String::new()),
            duration_minutes: Set(15),
            position: Set(position as i32),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
        created.push(module);
    }
    Ok((course, created))
}
