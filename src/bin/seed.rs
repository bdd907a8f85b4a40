use chrono::{Duration, Utc};
use componentpulse_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    domain::slug::slugify,
    middleware::auth::{ROLE_ADMIN, ROLE_CUSTOMER},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", "Store", "Admin", ROLE_ADMIN).await?;
    let user_id = ensure_user(&pool, "user@example.com", "user12345", "Demo", "Customer", ROLE_CUSTOMER).await?;
    seed_catalog(&pool).await?;
    seed_support(&pool).await?;
    seed_training(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn ensure_category(pool: &DbPool, name: &str, description: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slugify(name))
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_catalog(pool: &DbPool) -> anyhow::Result<()> {
    let microcontrollers =
        ensure_category(pool, "Microcontrollers", "Boards and chips for embedded projects").await?;
    let sensors = ensure_category(pool, "Sensors", "Temperature, motion and distance sensors").await?;
    let passives = ensure_category(pool, "Passive Components", "Resistors, capacitors, inductors").await?;

    // (category, name, sku, price, compare_at, stock, featured)
    let products = [
        (microcontrollers, "Arduino Uno R3", "MCU-UNO-R3", 85_000_i64, Some(95_000_i64), 40, true),
        (microcontrollers, "ESP32 DevKit V1", "MCU-ESP32", 45_000, None, 60, true),
        (microcontrollers, "Raspberry Pi Pico", "MCU-PICO", 30_000, None, 3, false),
        (sensors, "DHT22 Humidity Sensor", "SEN-DHT22", 25_000, Some(30_000), 120, false),
        (sensors, "HC-SR04 Ultrasonic Sensor", "SEN-HCSR04", 12_000, None, 0, false),
        (passives, "Resistor Kit 600pcs", "PAS-RES-600", 35_000, None, 25, true),
    ];

    let mut first_product = None;
    for (category_id, name, sku, price, compare_at, stock, featured) in products {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products
                (id, category_id, name, slug, sku, price, compare_at_price, stock_quantity, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (slug) DO UPDATE SET stock_quantity = EXCLUDED.stock_quantity
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(name)
        .bind(slugify(name))
        .bind(sku)
        .bind(price)
        .bind(compare_at)
        .bind(stock)
        .bind(featured)
        .fetch_one(pool)
        .await?;
        first_product.get_or_insert(id);
    }
    println!("Seeded products");

    if let Some(product_id) = first_product {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO deals (id, product_id, title, discount_percentage, starts_at, ends_at)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (SELECT 1 FROM deals WHERE product_id = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind("Maker week")
        .bind(1_500_i32)
        .bind(now)
        .bind(now + Duration::days(7))
        .execute(pool)
        .await?;
        println!("Seeded deal");
    }

    Ok(())
}

async fn seed_support(pool: &DbPool) -> anyhow::Result<()> {
    let categories = [
        ("Orders & Delivery", "truck", "Tracking, delivery times and shipping costs"),
        ("Payments", "wallet", "Mobile money and cash on delivery"),
        ("Technical Help", "cpu", "Wiring, firmware and component questions"),
    ];

    for (name, icon, description) in categories {
        let (category_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO support_categories (id, name, slug, description, icon)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(description)
        .bind(icon)
        .fetch_one(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO faqs (id, category_id, question, answer, position)
            SELECT $1, $2, $3, $4, 0
            WHERE NOT EXISTS (SELECT 1 FROM faqs WHERE category_id = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(format!("Who can help with {}?", name.to_lowercase()))
        .bind("Open a ticket under this category and the team answers within 24 hours.")
        .execute(pool)
        .await?;
    }
    println!("Seeded support categories and FAQs");
    Ok(())
}

async fn seed_training(pool: &DbPool) -> anyhow::Result<()> {
    let name = "Embedded Basics";
    let (category_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO training_categories (id, name, slug, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slugify(name))
    .bind("Getting started with microcontrollers")
    .fetch_one(pool)
    .await?;

    let title = "Arduino from Zero";
    let (course_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO training_courses
            (id, category_id, title, slug, description, level, duration_hours, price)
        VALUES ($1, $2, $3, $4, $5, 'beginner', 6, 0)
        ON CONFLICT (slug) DO UPDATE SET title = EXCLUDED.title
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(category_id)
    .bind(title)
    .bind(slugify(title))
    .bind("Blink an LED, read a sensor, drive a motor")
    .fetch_one(pool)
    .await?;

    let modules = ["Setting up the IDE", "Digital outputs", "Reading sensors"];
    for (position, module) in modules.into_iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO training_modules (id, course_id, title, duration_minutes, position)
            VALUES ($1, $2, $3, 30, $4)
            ON CONFLICT (course_id, position) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(module)
        .bind(position as i32)
        .execute(pool)
        .await?;
    }
    println!("Seeded training course");
    Ok(())
}
