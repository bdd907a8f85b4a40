use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Deal, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub stock_quantity: i32,
    pub low_stock_threshold: Option<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<i64>,
    pub compare_at_price: Option<i64>,
    pub stock_quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDealRequest {
    pub product_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Basis points: 1050 is 10.50 %.
    pub discount_percentage: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct DealList {
    #[schema(value_type = Vec<Deal>)]
    pub items: Vec<Deal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogStats {
    pub total_products: i64,
    pub categories_count: i64,
    pub featured_count: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    /// Signed change applied to `stock_quantity`.
    pub delta: i32,
}
