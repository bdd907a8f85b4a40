use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        pricing,
        stock::{self, LineChange},
    },
    dto::cart::{AddToCartRequest, CartItemChange, CartSummary, UpdateCartItemRequest},
    entity::{
        cart_items::{self, Column as ItemCol, Entity as CartItems},
        carts::{self, Column as CartCol, Entity as Carts},
        products::{self, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, CartProduct},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let lines = load_lines(&state.orm, cart.id).await?;
    Ok(ApiResponse::success(
        "OK",
        build_cart(cart, lines),
        Some(Meta::empty()),
    ))
}

// Product row, then cart line; both held until commit.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItemChange>> {
    let quantity = stock::positive_quantity(payload.quantity).ok_or_else(|| {
        AppError::InvalidArgument("Quantity must be a positive integer".to_string())
    })?;

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id)
        .filter(ProdCol::IsActive.eq(true))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let cart = get_or_create_cart(&txn, user.user_id).await?;

    let existing = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .filter(ItemCol::ProductId.eq(product.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let new_quantity = stock::quantity_after_add(
        existing.as_ref().map(|item| item.quantity),
        quantity,
        product.stock_quantity,
    )
    .inspect_err(|shortfall| {
        tracing::debug!(
            user_id = %user.user_id,
            product_id = %product.id,
            requested = quantity,
            available = shortfall.available(),
            "add to cart rejected by stock ceiling"
        );
    })?;

    let item = match existing {
        Some(item) => {
            let mut active: cart_items::ActiveModel = item.into();
            active.quantity = Set(new_quantity);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        None => {
            cart_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(new_quantity),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?
        }
    };
    touch_cart(&txn, cart).await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product added to cart successfully",
        CartItemChange {
            remaining_stock: product.stock_quantity,
            cart_item: cart_item_view(item, &product),
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Option<CartItemChange>>> {
    let txn = state.orm.begin().await?;

    let cart = find_cart(&txn, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;
    let item = find_owned_item(&txn, cart.id, item_id, false)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    // Product first, then the line: same lock order as add_to_cart.
    let product = Products::find_by_id(item.product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;
    let item = find_owned_item(&txn, cart.id, item_id, true)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    match stock::quantity_for_update(payload.quantity, product.stock_quantity)? {
        LineChange::Remove => {
            CartItems::delete_by_id(item.id).exec(&txn).await?;
            touch_cart(&txn, cart).await?;
            txn.commit().await?;

            audit::record(
                &state.orm,
                user.user_id,
                "cart_remove",
                "cart_items",
                serde_json::json!({ "cart_item_id": item_id, "product_id": product.id }),
            )
            .await;

            Ok(ApiResponse::success(
                "Item removed from cart",
                None,
                Some(Meta::empty()),
            ))
        }
        LineChange::Set(quantity) => {
            let mut active: cart_items::ActiveModel = item.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(Utc::now().into());
            let item = active.update(&txn).await?;
            touch_cart(&txn, cart).await?;
            txn.commit().await?;

            audit::record(
                &state.orm,
                user.user_id,
                "cart_update",
                "cart_items",
                serde_json::json!({ "cart_item_id": item_id, "quantity": quantity }),
            )
            .await;

            Ok(ApiResponse::success(
                "Cart item updated successfully",
                Some(CartItemChange {
                    remaining_stock: product.stock_quantity,
                    cart_item: cart_item_view(item, &product),
                }),
                Some(Meta::empty()),
            ))
        }
    }
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = find_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    let result = CartItems::delete_many()
        .filter(ItemCol::Id.eq(item_id))
        .filter(ItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Cart item"));
    }

    audit::record(
        &state.orm,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": item_id }),
    )
    .await;

    Ok(ApiResponse::message("Item removed from cart successfully"))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let Some(cart) = find_cart(&txn, user.user_id).await? else {
        return Ok(ApiResponse::message("Cart is already empty"));
    };

    let result = CartItems::delete_many()
        .filter(ItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;
    touch_cart(&txn, cart).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::message("Cart cleared successfully"))
}

pub async fn cart_summary(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CartSummary>> {
    let (total_items, total_price, items_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(ci.quantity), 0)::BIGINT,
               COALESCE(SUM(ci.quantity::BIGINT * p.price), 0)::BIGINT,
               COUNT(ci.id)
        FROM carts c
        JOIN cart_items ci ON ci.cart_id = c.id
        JOIN products p ON p.id = ci.product_id
        WHERE c.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        CartSummary {
            total_items,
            total_price,
            items_count,
        },
        Some(Meta::empty()),
    ))
}

pub(crate) async fn find_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Option<carts::Model>, DbErr> {
    Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await
}

pub(crate) async fn get_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<carts::Model, DbErr> {
    Carts::insert(carts::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    find_cart(conn, user_id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("cart for user {user_id}")))
}

pub(crate) async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> Result<Vec<(cart_items::Model, products::Model)>, DbErr> {
    let rows = CartItems::find()
        .filter(ItemCol::CartId.eq(cart_id))
        .find_also_related(Products)
        .order_by_asc(ItemCol::CreatedAt)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|product| (item, product)))
        .collect())
}

async fn find_owned_item<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
    item_id: Uuid,
    lock: bool,
) -> Result<Option<cart_items::Model>, DbErr> {
    let mut query = CartItems::find()
        .filter(ItemCol::Id.eq(item_id))
        .filter(ItemCol::CartId.eq(cart_id));
    if lock {
        query = query.lock(LockType::Update);
    }
    query.one(conn).await
}

async fn touch_cart<C: ConnectionTrait>(conn: &C, cart: carts::Model) -> Result<(), DbErr> {
    let mut active: carts::ActiveModel = cart.into();
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;
    Ok(())
}

fn cart_item_view(item: cart_items::Model, product: &products::Model) -> CartItem {
    CartItem {
        id: item.id,
        product: CartProduct::from(product),
        quantity: item.quantity,
        total_price: pricing::line_total(item.quantity, product.price),
        created_at: item.created_at.with_timezone(&Utc),
        updated_at: item.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn build_cart(cart: carts::Model, lines: Vec<(cart_items::Model, products::Model)>) -> Cart {
    let totals = pricing::cart_totals(
        lines
            .iter()
            .map(|(item, product)| (item.quantity, product.price)),
    );
    let items = lines
        .into_iter()
        .map(|(item, product)| cart_item_view(item, &product))
        .collect();

    Cart {
        id: cart.id,
        items,
        total_items: totals.total_items,
        total_price: totals.total_price,
        created_at: cart.created_at.with_timezone(&Utc),
        updated_at: cart.updated_at.with_timezone(&Utc),
    }
}
