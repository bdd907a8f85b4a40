use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{pricing::DealWindow, slug::slugify},
    dto::products::{
        CatalogStats, CategoryList, CreateProductRequest, DealList, ProductList,
        UpdateProductRequest,
    },
    entity::{
        categories::{Column as CatCol, Entity as Categories},
        deals::{Column as DealCol, Entity as Deals, Model as DealModel},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Deal, Product},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSortBy, SearchQuery, SortOrder},
    state::AppState,
};

const FEATURED_LIMIT: u64 = 8;
const SEARCH_LIMIT: u64 = 20;
const RECOMMENDATION_LIMIT: u64 = 4;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        let category = Categories::find()
            .filter(CatCol::Slug.eq(slug.as_str()))
            .filter(CatCol::IsActive.eq(true))
            .one(&state.orm)
            .await?;
        match category {
            Some(category) => condition = condition.add(Column::CategoryId.eq(category.id)),
            None => {
                let meta = Meta::new(page, limit, 0);
                return Ok(ApiResponse::success(
                    "Products",
                    ProductList { items: Vec::new() },
                    Some(meta),
                ));
            }
        }
    }

    if query.featured == Some(true) {
        condition = condition.add(Column::IsFeatured.eq(true));
    }

    if query.in_stock == Some(true) {
        condition = condition.add(Column::StockQuantity.gt(0));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, models, Utc::now()).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn featured_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let models = Products::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::IsFeatured.eq(true))
        .order_by_desc(Column::CreatedAt)
        .limit(FEATURED_LIMIT)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, models, Utc::now()).await?;
    Ok(ApiResponse::success("Featured products", ProductList { items }, None))
}

/// Name, description or category name match. An empty query finds nothing.
pub async fn search_products(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let Some(term) = query.q.as_ref().map(|q| q.trim()).filter(|q| !q.is_empty()) else {
        return Ok(ApiResponse::success("Search", ProductList { items: Vec::new() }, None));
    };

    let pattern = format!("%{}%", term);
    let models = Products::find()
        .left_join(Categories)
        .filter(Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(Expr::col((Products, Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((Products, Column::Description)).ilike(pattern.clone()))
                .add(Expr::col((Categories, CatCol::Name)).ilike(pattern)),
        )
        .order_by_desc(Column::CreatedAt)
        .limit(SEARCH_LIMIT)
        .all(&state.orm)
        .await?;

    let items = hydrate(&state.orm, models, Utc::now()).await?;
    Ok(ApiResponse::success("Search", ProductList { items }, None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .filter(CatCol::IsActive.eq(true))
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn list_live_deals(state: &AppState) -> AppResult<ApiResponse<DealList>> {
    let now = Utc::now();
    let rows = Deals::find()
        .find_also_related(Products)
        .filter(DealCol::IsActive.eq(true))
        .filter(DealCol::StartsAt.lte(now))
        .filter(DealCol::EndsAt.gte(now))
        .filter(Column::IsActive.eq(true))
        .order_by_desc(DealCol::DiscountPercentage)
        .all(&state.orm)
        .await?;

    let (deals, products): (Vec<DealModel>, Vec<ProductModel>) = rows
        .into_iter()
        .filter_map(|(deal, product)| product.map(|product| (deal, product)))
        .unzip();

    let products = hydrate(&state.orm, products, now).await?;
    let items = deals
        .into_iter()
        .zip(products)
        .map(|(deal, product)| Deal::build(deal, product))
        .collect();

    Ok(ApiResponse::success("Deals", DealList { items }, None))
}

pub async fn catalog_stats(state: &AppState) -> AppResult<ApiResponse<CatalogStats>> {
    let total_products = Products::find()
        .filter(Column::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    let categories_count = Categories::find()
        .filter(CatCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;
    let featured_count = Products::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::IsFeatured.eq(true))
        .count(&state.orm)
        .await? as i64;

    Ok(ApiResponse::success(
        "Stats",
        CatalogStats {
            total_products,
            categories_count,
            featured_count,
        },
        None,
    ))
}

pub async fn get_product(state: &AppState, slug: &str) -> AppResult<ApiResponse<Product>> {
    let model = find_active_by_slug(state, slug).await?;
    let product = hydrate_one(&state.orm, model, Utc::now()).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn recommendations(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<ProductList>> {
    let product = find_active_by_slug(state, slug).await?;
    let Some(category_id) = product.category_id else {
        return Ok(ApiResponse::success("Recommendations", ProductList { items: Vec::new() }, None));
    };

    let models = Products::find()
        .filter(Column::CategoryId.eq(category_id))
        .filter(Column::IsActive.eq(true))
        .filter(Column::Id.ne(product.id))
        .order_by_desc(Column::CreatedAt)
        .limit(RECOMMENDATION_LIMIT)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, models, Utc::now()).await?;
    Ok(ApiResponse::success("Recommendations", ProductList { items }, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidArgument("name must not be empty".into()));
    }
    validate_amounts(Some(payload.price), payload.compare_at_price, Some(payload.stock_quantity))?;

    let slug = slugify(payload.slug.as_deref().unwrap_or(&name));
    if slug.is_empty() {
        return Err(AppError::InvalidArgument("slug must contain letters or digits".into()));
    }
    let taken = Products::find()
        .filter(Column::Slug.eq(slug.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(format!("slug '{slug}' is already in use")));
    }
    if let Some(sku) = payload.sku.as_deref() {
        let sku_taken = Products::find()
            .filter(Column::Sku.eq(sku))
            .one(&state.orm)
            .await?;
        if sku_taken.is_some() {
            return Err(AppError::Conflict(format!("sku '{sku}' is already in use")));
        }
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
    }

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(name),
        slug: Set(slug),
        sku: Set(payload.sku),
        description: Set(payload.description),
        price: Set(payload.price),
        compare_at_price: Set(payload.compare_at_price),
        stock_quantity: Set(payload.stock_quantity),
        low_stock_threshold: Set(payload.low_stock_threshold),
        is_featured: Set(payload.is_featured),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = hydrate_one(&state.orm, product, Utc::now()).await?;
    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_amounts(payload.price, payload.compare_at_price, payload.stock_quantity)?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidArgument("name must not be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(Some(category_id));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(compare_at_price) = payload.compare_at_price {
        active.compare_at_price = Set(Some(compare_at_price));
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(threshold) = payload.low_stock_threshold {
        active.low_stock_threshold = Set(Some(threshold));
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = hydrate_one(&state.orm, product, Utc::now()).await?;
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product"));
    }

    audit::record(
        &state.orm,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::message("Deleted"))
}

pub(crate) async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
    now: DateTime<Utc>,
) -> Result<Vec<Product>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let category_ids: Vec<Uuid> = models.iter().filter_map(|p| p.category_id).collect();

    let mut deals_by_product: HashMap<Uuid, Vec<DealWindow>> = HashMap::new();
    for deal in Deals::find()
        .filter(DealCol::ProductId.is_in(product_ids))
        .all(conn)
        .await?
    {
        deals_by_product
            .entry(deal.product_id)
            .or_default()
            .push(DealWindow::from(&deal));
    }

    let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        Categories::find()
            .filter(CatCol::Id.is_in(category_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, Category::from(c)))
            .collect()
    };

    Ok(models
        .into_iter()
        .map(|model| {
            let category = model.category_id.and_then(|id| categories.get(&id).cloned());
            let deals = deals_by_product
                .get(&model.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            Product::build(model, category, deals, now)
        })
        .collect())
}

pub(crate) async fn hydrate_one<C: ConnectionTrait>(
    conn: &C,
    model: ProductModel,
    now: DateTime<Utc>,
) -> Result<Product, DbErr> {
    hydrate(conn, vec![model], now)
        .await?
        .pop()
        .ok_or_else(|| DbErr::Custom("product vanished during hydration".into()))
}

async fn find_active_by_slug(state: &AppState, slug: &str) -> AppResult<ProductModel> {
    Products::find()
        .filter(Column::Slug.eq(slug))
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

async fn ensure_category(state: &AppState, id: Uuid) -> AppResult<()> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Category"))
}

fn validate_amounts(
    price: Option<i64>,
    compare_at_price: Option<i64>,
    stock_quantity: Option<i32>,
) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) || compare_at_price.is_some_and(|p| p < 0) {
        return Err(AppError::InvalidArgument("prices must not be negative".into()));
    }
    if stock_quantity.is_some_and(|s| s < 0) {
        return Err(AppError::InvalidArgument(
            "stock_quantity must not be negative".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_amounts(Some(100), Some(200), Some(3)).is_ok());
        assert!(validate_amounts(None, None, None).is_ok());
        assert!(matches!(
            validate_amounts(Some(-1), None, None),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_amounts(None, None, Some(-5)),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
