use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        pricing::{self, DealWindow},
        stock,
    },
    entity::{categories, deals, order_items, orders, payments, products, reviews, users},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let full_name = format!("{} {}", model.first_name, model.last_name)
            .trim()
            .to_string();
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            full_name,
            phone: model.phone,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    /// Percent, two decimals.
    pub discount_percentage: f64,
    pub is_on_sale: bool,
    pub is_featured: bool,
    pub is_active: bool,
    pub is_in_stock: bool,
    pub is_low_stock: bool,
    pub stock_quantity: i32,
    pub low_stock_threshold: Option<i32>,
    pub category: Option<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn build(
        model: products::Model,
        category: Option<Category>,
        deals: &[DealWindow],
        now: DateTime<Utc>,
    ) -> Self {
        let bps = pricing::discount_bps(model.price, model.compare_at_price, deals, now);
        Self {
            id: model.id,
            discount_percentage: pricing::bps_to_percent(bps),
            is_on_sale: pricing::is_on_sale(model.price, model.compare_at_price, deals, now),
            is_in_stock: model.stock_quantity > 0,
            is_low_stock: stock::is_low_stock(model.stock_quantity, model.low_stock_threshold),
            name: model.name,
            slug: model.slug,
            sku: model.sku,
            description: model.description,
            price: model.price,
            compare_at_price: model.compare_at_price,
            is_featured: model.is_featured,
            is_active: model.is_active,
            stock_quantity: model.stock_quantity,
            low_stock_threshold: model.low_stock_threshold,
            category,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<&deals::Model> for DealWindow {
    fn from(model: &deals::Model) -> Self {
        Self {
            discount_bps: model.discount_percentage,
            starts_at: model.starts_at.with_timezone(&Utc),
            ends_at: model.ends_at.with_timezone(&Utc),
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Deal {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub discount_percentage: f64,
    pub discounted_price: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}

impl Deal {
    pub fn build(model: deals::Model, product: Product) -> Self {
        Self {
            id: model.id,
            discount_percentage: pricing::bps_to_percent(model.discount_percentage),
            discounted_price: pricing::discounted_price(product.price, model.discount_percentage),
            title: model.title,
            description: model.description,
            starts_at: model.starts_at.with_timezone(&Utc),
            ends_at: model.ends_at.with_timezone(&Utc),
            is_active: model.is_active,
            product,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Product fields a cart line needs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartProduct {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: i64,
    pub stock_quantity: i32,
    pub is_active: bool,
}

impl From<&products::Model> for CartProduct {
    fn from(model: &products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            slug: model.slug.clone(),
            price: model.price,
            stock_quantity: model.stock_quantity,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product: CartProduct,
    pub quantity: i32,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub items: Vec<CartItem>,
    pub total_items: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub shipping_method: String,
    pub shipping_address: String,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            order_number: model.order_number,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            shipping_method: model.shipping_method,
            shipping_address: model.shipping_address,
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            total_amount: model.total_amount,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            total_price: pricing::line_total(model.quantity, model.price),
            product_name: model.product_name,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_method: String,
    pub amount: i64,
    pub status: String,
    pub transaction_id: String,
    pub phone_number: Option<String>,
    pub reference_code: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            payment_method: model.payment_method,
            amount: model.amount,
            status: model.status,
            transaction_id: model.transaction_id,
            phone_number: model.phone_number,
            reference_code: model.reference_code,
            gateway_response: model.gateway_response,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub is_verified_purchase: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            rating: model.rating,
            title: model.title,
            comment: model.comment,
            is_verified_purchase: model.is_verified_purchase,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
