use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    domain::status::OrderStatus,
    dto::reviews::{
        CreateReviewRequest, ProductReviews, ReviewList, ReviewStatistics, ReviewSummary,
        TopRatedProduct, UpdateReviewRequest,
    },
    entity::{
        products::{Column as ProdCol, Entity as Products},
        reviews::{ActiveModel, Column, Entity as Reviews, Model as ReviewModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

const TOP_RATED_LIMIT: i64 = 5;

pub async fn product_reviews(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<ProductReviews>> {
    ensure_active_product(state, product_id).await?;

    let reviews = Reviews::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    let counts: Vec<(i16, i64)> = sqlx::query_as(
        r#"
        SELECT rating, COUNT(*)::BIGINT
        FROM reviews
        WHERE product_id = $1
        GROUP BY rating
        "#,
    )
    .bind(product_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Reviews",
        ProductReviews {
            reviews,
            statistics: statistics(&counts),
        },
        None,
    ))
}

pub async fn my_reviews(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Reviews::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Reviews",
        ReviewList { items },
        page,
        limit,
        total,
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    validate_rating(payload.rating)?;
    ensure_active_product(state, payload.product_id).await?;

    let existing = Reviews::find()
        .filter(Column::ProductId.eq(payload.product_id))
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already reviewed this product".into(),
        ));
    }

    let verified = has_delivered_purchase(&state.pool, user.user_id, payload.product_id).await?;

    let review = ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(payload.product_id),
        user_id: Set(user.user_id),
        rating: Set(payload.rating),
        title: Set(payload.title.trim().to_string()),
        comment: Set(payload.comment.trim().to_string()),
        is_verified_purchase: Set(verified),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "product_id": review.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review created",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

pub async fn get_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Review>> {
    let review = find_owned(state, user, id).await?;
    Ok(ApiResponse::success("Review", Review::from(review), None))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }
    let review = find_owned(state, user, id).await?;

    let mut active: ActiveModel = review.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment.trim().to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Review updated",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Reviews::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Review"));
    }

    audit::record(
        &state.orm,
        user.user_id,
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id }),
    )
    .await;

    Ok(ApiResponse::message("Review deleted"))
}

pub async fn review_summary(state: &AppState) -> AppResult<ApiResponse<ReviewSummary>> {
    let (total_reviews, average): (i64, f64) = sqlx::query_as(
        r#"
        SELECT COUNT(*)::BIGINT, COALESCE(AVG(rating), 0)::FLOAT8
        FROM reviews
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let top: Vec<(Uuid, String, f64, i64)> = sqlx::query_as(
        r#"
        SELECT p.id, p.name, AVG(r.rating)::FLOAT8 AS average_rating, COUNT(r.id)::BIGINT AS review_count
        FROM reviews r
        JOIN products p ON p.id = r.product_id
        WHERE p.is_active
        GROUP BY p.id, p.name
        ORDER BY average_rating DESC, review_count DESC
        LIMIT $1
        "#,
    )
    .bind(TOP_RATED_LIMIT)
    .fetch_all(&state.pool)
    .await?;

    let top_rated_products = top
        .into_iter()
        .map(|(id, name, average_rating, review_count)| TopRatedProduct {
            id,
            name,
            average_rating: round_one_decimal(average_rating),
            review_count,
        })
        .collect();

    Ok(ApiResponse::success(
        "Review summary",
        ReviewSummary {
            total_reviews,
            average_rating: round_one_decimal(average),
            top_rated_products,
        },
        None,
    ))
}

/// Per-star counts to the public statistics block.
fn statistics(counts: &[(i16, i64)]) -> ReviewStatistics {
    let mut rating_distribution: BTreeMap<String, i64> =
        (1..=5).map(|star| (format!("{star}_star"), 0)).collect();

    let mut total_reviews = 0;
    let mut sum = 0;
    for &(rating, count) in counts {
        if let Some(slot) = rating_distribution.get_mut(&format!("{rating}_star")) {
            *slot += count;
            total_reviews += count;
            sum += i64::from(rating) * count;
        }
    }

    let average_rating = if total_reviews == 0 {
        0.0
    } else {
        round_one_decimal(sum as f64 / total_reviews as f64)
    };

    ReviewStatistics {
        average_rating,
        total_reviews,
        rating_distribution,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn validate_rating(rating: i16) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::InvalidArgument(
            "rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

async fn has_delivered_purchase(pool: &DbPool, user_id: Uuid, product_id: Uuid) -> AppResult<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = $3
        )
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(OrderStatus::Delivered.as_str())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

async fn ensure_active_product(state: &AppState, product_id: Uuid) -> AppResult<()> {
    Products::find_by_id(product_id)
        .filter(ProdCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Product"))
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ReviewModel> {
    Reviews::find_by_id(id)
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Review"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_with_no_reviews() {
        let stats = statistics(&[]);
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.rating_distribution.len(), 5);
        assert!(stats.rating_distribution.values().all(|&c| c == 0));
    }

    #[test]
    fn statistics_average_and_distribution() {
        // 5,5,4 -> 4.666.. -> 4.7
        let stats = statistics(&[(5, 2), (4, 1)]);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_rating, 4.7);
        assert_eq!(stats.rating_distribution["5_star"], 2);
        assert_eq!(stats.rating_distribution["4_star"], 1);
        assert_eq!(stats.rating_distribution["1_star"], 0);
    }

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
