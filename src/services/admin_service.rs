use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::status::OrderStatus,
    dto::{
        orders::{OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{CreateDealRequest, InventoryAdjustRequest, ProductList},
    },
    entity::{
        deals::ActiveModel as DealActive,
        orders::{ActiveModel as OrderActive, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Deal, Order, Product},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, Pagination},
    services::{order_service, product_service},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    order_service::list_matching(state, None, pagination, query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let data = order_service::with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let current: OrderStatus = existing
        .status
        .parse()
        .map_err(|e| AppError::Internal(anyhow::Error::from(e)))?;
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidArgument(format!(
            "Cannot change order from {current} to {next}"
        )));
    }

    let order = if next == OrderStatus::Cancelled {
        order_service::cancel_locked(&txn, existing).await?
    } else {
        let mut active: OrderActive = existing.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    };
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": current.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Products at or under their own threshold, or under `threshold` when given.
pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let condition = match query.threshold {
        Some(threshold) => Condition::all().add(ProdCol::StockQuantity.lte(threshold)),
        None => Condition::all().add(
            Expr::col(ProdCol::StockQuantity).lte(Expr::col(ProdCol::LowStockThreshold)),
        ),
    };

    let finder = Products::find()
        .filter(condition)
        .order_by_asc(ProdCol::StockQuantity)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = product_service::hydrate(&state.orm, models, Utc::now()).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::InvalidArgument("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let new_stock = product
        .stock_quantity
        .checked_add(payload.delta)
        .filter(|s| *s >= 0)
        .ok_or_else(|| AppError::InvalidArgument("stock cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.stock_quantity = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta, "stock": new_stock }),
    )
    .await;

    let product = product_service::hydrate_one(&state.orm, updated, Utc::now()).await?;
    Ok(ApiResponse::success(
        "Inventory updated",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn create_deal(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDealRequest,
) -> AppResult<ApiResponse<Deal>> {
    ensure_admin(user)?;
    validate_deal(&payload)?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let deal = DealActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        discount_percentage: Set(payload.discount_percentage),
        starts_at: Set(payload.starts_at.into()),
        ends_at: Set(payload.ends_at.into()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "deal_create",
        "deals",
        serde_json::json!({ "deal_id": deal.id, "product_id": product.id }),
    )
    .await;

    let product = product_service::hydrate_one(&state.orm, product, Utc::now()).await?;
    Ok(ApiResponse::success(
        "Deal created",
        Deal::build(deal, product),
        Some(Meta::empty()),
    ))
}

fn validate_deal(payload: &CreateDealRequest) -> AppResult<()> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidArgument("title must not be empty".into()));
    }
    if !(0..=10_000).contains(&payload.discount_percentage) {
        return Err(AppError::InvalidArgument(
            "discount_percentage must be between 0 and 10000 basis points".into(),
        ));
    }
    if payload.ends_at <= payload.starts_at {
        return Err(AppError::InvalidArgument(
            "ends_at must be after starts_at".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn deal(discount: i32, hours: i64) -> CreateDealRequest {
        let starts_at = Utc::now();
        CreateDealRequest {
            product_id: Uuid::new_v4(),
            title: "Weekend sale".into(),
            description: None,
            discount_percentage: discount,
            starts_at,
            ends_at: starts_at + Duration::hours(hours),
        }
    }

    #[test]
    fn deal_validation() {
        assert!(validate_deal(&deal(1_500, 48)).is_ok());
        assert!(validate_deal(&deal(10_000, 1)).is_ok());
        assert!(validate_deal(&deal(10_001, 1)).is_err());
        assert!(validate_deal(&deal(-1, 1)).is_err());
        assert!(validate_deal(&deal(500, 0)).is_err());
    }
}
