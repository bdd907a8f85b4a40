use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::products::{CatalogStats, CategoryList, DealList, ProductList},
    error::{AppResult, ErrorBody},
    models::Product,
    response::ApiResponse,
    routes::params::{Pagination, ProductQuery, SearchQuery},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/featured", get(featured_products))
        .route("/search", get(search_products))
        .route("/categories", get(list_categories))
        .route("/deals", get(list_deals))
        .route("/stats", get(catalog_stats))
        .route("/{slug}", get(get_product))
        .route("/{slug}/recommendations", get(recommendations))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("featured" = Option<bool>, Query, description = "Only featured products"),
        ("in_stock" = Option<bool>, Query, description = "Only products with stock"),
        ("q" = Option<String>, Query, description = "Match on name or description"),
        ("min_price" = Option<i64>, Query, description = "Lower price bound, minor units"),
        ("max_price" = Option<i64>, Query, description = "Upper price bound, minor units"),
        ("sort_by" = Option<String>, Query, description = "created_at, price, name"),
        ("sort_order" = Option<String>, Query, description = "asc, desc")
    ),
    responses(
        (status = 200, description = "List active products", body = ApiResponse<ProductList>),
        (status = 400, description = "Bad query", body = ErrorBody),
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    responses(
        (status = 200, description = "Up to eight featured products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn featured_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::featured_products(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/search",
    params(
        ("q" = Option<String>, Query, description = "Search term")
    ),
    responses(
        (status = 200, description = "Up to twenty matches", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::search_products(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/categories",
    responses(
        (status = 200, description = "Active categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Products"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(product_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/deals",
    responses(
        (status = 200, description = "Deals running now", body = ApiResponse<DealList>)
    ),
    tag = "Products"
)]
pub async fn list_deals(State(state): State<AppState>) -> AppResult<Json<ApiResponse<DealList>>> {
    Ok(Json(product_service::list_live_deals(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/stats",
    responses(
        (status = 200, description = "Catalogue counts", body = ApiResponse<CatalogStats>)
    ),
    tag = "Products"
)]
pub async fn catalog_stats(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CatalogStats>>> {
    Ok(Json(product_service::catalog_stats(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(product_service::get_product(&state, &slug).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{slug}/recommendations",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Products from the same category", body = ApiResponse<ProductList>),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    tag = "Products"
)]
pub async fn recommendations(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::recommendations(&state, &slug).await?))
}
