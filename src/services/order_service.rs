use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        pricing,
        status::{OrderPaymentStatus, OrderStatus, PaymentStatus},
        stock::StockShortfall,
    },
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        cart_items::{Column as ItemCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{Column as PaymentCol, Entity as Payments},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::cart_service,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    list_matching(state, Some(user.user_id), pagination, query).await
}

pub(crate) async fn list_matching(
    state: &AppState,
    owner: Option<Uuid>,
    pagination: Pagination,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let mut condition = Condition::all();
    if let Some(user_id) = owner {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

// Products (in id order) before cart lines, as in the cart mutations.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let shipping_address = payload.shipping_address.trim().to_string();
    if shipping_address.is_empty() {
        return Err(AppError::InvalidArgument(
            "shipping_address must not be empty".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let cart = cart_service::find_cart(&txn, user.user_id)
        .await?
        .ok_or_else(|| AppError::InvalidArgument("Cart is empty".into()))?;

    let product_ids: Vec<Uuid> = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| item.product_id)
        .collect();
    if product_ids.is_empty() {
        return Err(AppError::InvalidArgument("Cart is empty".into()));
    }

    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let items = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .order_by_asc(ItemCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let product = products.get(&item.product_id).ok_or_else(|| {
            AppError::Conflict("Cart changed during checkout, please retry".into())
        })?;
        if !product.is_active {
            return Err(AppError::InvalidArgument(format!(
                "{} is no longer available",
                product.name
            )));
        }
        if item.quantity > product.stock_quantity {
            tracing::debug!(product_id = %product.id, requested = item.quantity, stock = product.stock_quantity, "checkout stock shortfall");
            return Err(StockShortfall::Total {
                available: product.stock_quantity,
            }
            .into());
        }
        lines.push((item, product));
    }
    if lines.is_empty() {
        return Err(AppError::InvalidArgument("Cart is empty".into()));
    }

    let subtotal = pricing::cart_totals(lines.iter().map(|(i, p)| (i.quantity, p.price))).total_price;
    let shipping_cost = payload.shipping_method.cost();

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        order_number: Set(build_order_number(order_id)),
        status: Set(OrderStatus::Pending.to_string()),
        payment_status: Set(OrderPaymentStatus::Unpaid.to_string()),
        payment_method: Set(payload.payment_method.to_string()),
        shipping_method: Set(payload.shipping_method.to_string()),
        shipping_address: Set(shipping_address),
        subtotal: Set(subtotal),
        shipping_cost: Set(shipping_cost),
        total_amount: Set(subtotal + shipping_cost),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(lines.len());
    for (item, product) in &lines {
        let created = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            product_name: Set(product.name.clone()),
            quantity: Set(item.quantity),
            price: Set(product.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(created));

        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(item.quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(ItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, total = order.total_amount, "order placed");
    audit::record(
        &state.orm,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let cancellable = order.status == OrderStatus::Pending.as_str()
        && order.payment_status != OrderPaymentStatus::Paid.as_str();
    if !cancellable {
        return Err(AppError::InvalidArgument(
            "Only pending orders that are not paid can be cancelled".into(),
        ));
    }

    let order = cancel_locked(&txn, order).await?;
    let data = with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", data, Some(Meta::empty())))
}

/// Caller holds the order lock and owns the transaction.
pub(crate) async fn cancel_locked(
    txn: &DatabaseTransaction,
    order: OrderModel,
) -> Result<OrderModel, DbErr> {
    restock(txn, order.id).await?;

    Payments::update_many()
        .col_expr(
            PaymentCol::Status,
            Expr::value(PaymentStatus::Cancelled.as_str()),
        )
        .col_expr(PaymentCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(PaymentCol::OrderId.eq(order.id))
        .filter(PaymentCol::Status.eq(PaymentStatus::Pending.as_str()))
        .exec(txn)
        .await?;

    let was_pending_payment = order.payment_status == OrderPaymentStatus::Pending.as_str();
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.to_string());
    if was_pending_payment {
        active.payment_status = Set(OrderPaymentStatus::Unpaid.to_string());
    }
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await
}

async fn restock(txn: &DatabaseTransaction, order_id: Uuid) -> Result<(), DbErr> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;

    let mut quantities: HashMap<Uuid, i32> = HashMap::new();
    for item in &items {
        if let Some(product_id) = item.product_id {
            *quantities.entry(product_id).or_default() += item.quantity;
        }
    }
    if quantities.is_empty() {
        return Ok(());
    }

    // Lock in id order before writing.
    Products::find()
        .filter(ProdCol::Id.is_in(quantities.keys().copied()))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(txn)
        .await?;

    for (product_id, quantity) in quantities {
        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).add(quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(product_id))
            .exec(txn)
            .await?;
    }
    Ok(())
}

pub(crate) async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> Result<OrderWithItems, DbErr> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string();
    format!("ORD-{}-{}", date, &suffix[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_shape() {
        let number = build_order_number(Uuid::new_v4());
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }
}
