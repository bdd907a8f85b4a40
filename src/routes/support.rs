use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::support::{
        ContactInfo, CreateTicketRequest, FaqList, SupportCategoryList, SupportSummary, Ticket,
        TicketList, TicketMessage, TicketMessageRequest, TicketWithMessages,
        UpdateTicketStatusRequest,
    },
    error::{AppResult, ErrorBody},
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    routes::params::{FaqQuery, Pagination, TicketListQuery},
    services::support_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/faqs", get(list_faqs))
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/messages", post(add_message))
        .route("/tickets/{id}/status", patch(update_ticket_status))
        .route("/summary", get(support_summary))
        .route("/contact", get(contact_info))
}

#[utoipa::path(
    get,
    path = "/api/support/categories",
    responses(
        (status = 200, description = "Active support categories with ticket counts", body = ApiResponse<SupportCategoryList>)
    ),
    tag = "Support"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SupportCategoryList>>> {
    Ok(Json(support_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/support/faqs",
    params(
        ("category" = Option<String>, Query, description = "Support category slug"),
        ("search" = Option<String>, Query, description = "Match within the question")
    ),
    responses(
        (status = 200, description = "Active FAQs", body = ApiResponse<FaqList>)
    ),
    tag = "Support"
)]
pub async fn list_faqs(
    State(state): State<AppState>,
    Query(query): Query<FaqQuery>,
) -> AppResult<Json<ApiResponse<FaqList>>> {
    Ok(Json(support_service::list_faqs(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/support/tickets",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "open, pending, resolved, closed")
    ),
    responses(
        (status = 200, description = "Tickets opened by the current user", body = ApiResponse<TicketList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = support_service::list_tickets(&state, &user, pagination, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/support/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = ApiResponse<TicketWithMessages>),
        (status = 400, description = "Missing subject", body = ErrorBody),
        (status = 404, description = "Support category not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateTicketRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TicketWithMessages>>)> {
    let resp = support_service::create_ticket(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/support/tickets/{id}",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Ticket with its conversation", body = ApiResponse<TicketWithMessages>),
        (status = 404, description = "Ticket not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TicketWithMessages>>> {
    Ok(Json(support_service::get_ticket(&state, &user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/support/tickets/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = TicketMessageRequest,
    responses(
        (status = 201, description = "Message added", body = ApiResponse<TicketMessage>),
        (status = 400, description = "Ticket is closed", body = ErrorBody),
        (status = 404, description = "Ticket not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn add_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<TicketMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TicketMessage>>)> {
    let resp = support_service::add_message(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/support/tickets/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = UpdateTicketStatusRequest,
    responses(
        (status = 200, description = "Ticket closed", body = ApiResponse<Ticket>),
        (status = 400, description = "Customers may only close a ticket", body = ErrorBody),
        (status = 404, description = "Ticket not found", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn update_ticket_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateTicketStatusRequest>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    Ok(Json(
        support_service::update_ticket_status(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/support/summary",
    responses(
        (status = 200, description = "Ticket and FAQ counts", body = ApiResponse<SupportSummary>)
    ),
    tag = "Support"
)]
pub async fn support_summary(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SupportSummary>>> {
    Ok(Json(support_service::support_summary(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/support/contact",
    responses(
        (status = 200, description = "Store contact details", body = ApiResponse<ContactInfo>)
    ),
    tag = "Support"
)]
pub async fn contact_info() -> Json<ApiResponse<ContactInfo>> {
    Json(support_service::contact_info())
}
