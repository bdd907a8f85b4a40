use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Review;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub rating: i16,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i16>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct ReviewStatistics {
    pub average_rating: f64,
    pub total_reviews: i64,
    /// Keys `1_star` .. `5_star`.
    pub rating_distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductReviews {
    pub reviews: Vec<Review>,
    pub statistics: ReviewStatistics,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopRatedProduct {
    pub id: Uuid,
    pub name: String,
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewSummary {
    pub total_reviews: i64,
    pub average_rating: f64,
    pub top_rated_products: Vec<TopRatedProduct>,
}
