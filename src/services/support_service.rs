use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::status::TicketStatus,
    dto::support::{
        CategoryTicketCount, ContactInfo, CreateTicketRequest, Faq, FaqList, SupportCategory,
        SupportCategoryList, SupportSummary, Ticket, TicketList, TicketMessage,
        TicketMessageRequest, TicketWithMessages, UpdateTicketStatusRequest,
    },
    entity::{
        faqs::{self, Column as FaqCol, Entity as Faqs},
        support_categories::{Column as CatCol, Entity as SupportCategories},
        support_tickets::{self, Column, Entity as SupportTickets, Model as TicketModel},
        ticket_messages::{self, Column as MsgCol, Entity as TicketMessages},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::{FaqQuery, Pagination, TicketListQuery},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<SupportCategoryList>> {
    let categories = SupportCategories::find()
        .filter(CatCol::IsActive.eq(true))
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?;

    let counts: HashMap<Uuid, i64> = sqlx::query_as(
        r#"
        SELECT category_id, COUNT(*)::BIGINT
        FROM support_tickets
        GROUP BY category_id
        "#,
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    let items = categories
        .into_iter()
        .map(|category| {
            let count = counts.get(&category.id).copied().unwrap_or(0);
            SupportCategory::new(category, count)
        })
        .collect();

    Ok(ApiResponse::success(
        "Support categories",
        SupportCategoryList { items },
        None,
    ))
}

pub async fn list_faqs(state: &AppState, query: FaqQuery) -> AppResult<ApiResponse<FaqList>> {
    let mut finder = Faqs::find()
        .inner_join(SupportCategories)
        .filter(FaqCol::IsActive.eq(true))
        .filter(CatCol::IsActive.eq(true));

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        finder = finder.filter(CatCol::Slug.eq(slug.as_str()));
    }
    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        finder = finder.filter(Expr::col((faqs::Entity, FaqCol::Question)).ilike(pattern));
    }

    let items = finder
        .order_by_asc(FaqCol::CategoryId)
        .order_by_asc(FaqCol::Position)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Faq::from)
        .collect();

    Ok(ApiResponse::success("FAQs", FaqList { items }, None))
}

pub async fn list_tickets(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    let (page, limit, offset) = pagination.normalize();
    let mut finder = SupportTickets::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(Column::Status.eq(status.as_str()));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Ticket::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Tickets",
        TicketList { items },
        page,
        limit,
        total,
    ))
}

pub async fn create_ticket(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTicketRequest,
) -> AppResult<ApiResponse<TicketWithMessages>> {
    let subject = payload.subject.trim();
    if subject.is_empty() {
        return Err(AppError::InvalidArgument("subject is required".into()));
    }
    let first_message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    SupportCategories::find_by_id(payload.category_id)
        .filter(CatCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Support category"))?;

    let ticket_id = Uuid::new_v4();
    let txn = state.orm.begin().await?;
    let ticket = support_tickets::ActiveModel {
        id: Set(ticket_id),
        ticket_number: Set(build_ticket_number(ticket_id)),
        user_id: Set(user.user_id),
        category_id: Set(payload.category_id),
        subject: Set(subject.to_string()),
        priority: Set(payload.priority.to_string()),
        status: Set(TicketStatus::Open.to_string()),
        assigned_to: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
        resolved_at: Set(None),
    }
    .insert(&txn)
    .await?;

    let mut messages = Vec::new();
    if let Some(text) = first_message {
        let message = insert_message(&txn, ticket.id, user.user_id, text, true).await?;
        messages.push(TicketMessage::from(message));
    }
    txn.commit().await?;

    tracing::info!(ticket_id = %ticket.id, ticket_number = %ticket.ticket_number, "support ticket opened");
    audit::record(
        &state.orm,
        user.user_id,
        "ticket_create",
        "support_tickets",
        serde_json::json!({ "ticket_id": ticket.id, "priority": ticket.priority }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket created",
        TicketWithMessages {
            ticket: Ticket::from(ticket),
            messages,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_ticket(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<TicketWithMessages>> {
    let ticket = SupportTickets::find_by_id(id)
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Ticket"))?;

    let messages = TicketMessages::find()
        .filter(MsgCol::TicketId.eq(ticket.id))
        .order_by_asc(MsgCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(TicketMessage::from)
        .collect();

    Ok(ApiResponse::success(
        "Ticket",
        TicketWithMessages {
            ticket: Ticket::from(ticket),
            messages,
        },
        None,
    ))
}

/// A customer reply on a pending or resolved ticket reopens it.
pub async fn add_message(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: TicketMessageRequest,
) -> AppResult<ApiResponse<TicketMessage>> {
    let text = validate_message(&payload.message)?;

    let txn = state.orm.begin().await?;
    let ticket = SupportTickets::find_by_id(id)
        .filter(Column::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Ticket"))?;

    let current = parse_status(&ticket)?;
    if !current.accepts_messages() {
        return Err(AppError::InvalidArgument(
            "Cannot add message to closed ticket".into(),
        ));
    }

    let message = insert_message(&txn, ticket.id, user.user_id, text, true).await?;
    let next = match current {
        TicketStatus::Pending | TicketStatus::Resolved => TicketStatus::Open,
        other => other,
    };
    set_status(&txn, ticket, next).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Message added",
        TicketMessage::from(message),
        Some(Meta::empty()),
    ))
}

pub async fn update_ticket_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTicketStatusRequest,
) -> AppResult<ApiResponse<Ticket>> {
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let ticket = SupportTickets::find_by_id(id)
        .filter(Column::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Ticket"))?;

    let current = parse_status(&ticket)?;
    if !current.customer_can_transition_to(next) {
        return Err(AppError::InvalidArgument(format!(
            "Cannot change ticket from {current} to {next}"
        )));
    }
    let ticket = set_status(&txn, ticket, next).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "ticket_status_update",
        "support_tickets",
        serde_json::json!({ "ticket_id": ticket.id, "from": current.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket status updated",
        Ticket::from(ticket),
        Some(Meta::empty()),
    ))
}

pub async fn admin_list_tickets(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let mut finder = SupportTickets::find().order_by_desc(Column::CreatedAt);
    if let Some(status) = query.status {
        finder = finder.filter(Column::Status.eq(status.as_str()));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Ticket::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Tickets",
        TicketList { items },
        page,
        limit,
        total,
    ))
}

/// An open ticket moves to pending.
pub async fn admin_reply(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: TicketMessageRequest,
) -> AppResult<ApiResponse<TicketMessage>> {
    ensure_admin(user)?;
    let text = validate_message(&payload.message)?;

    let txn = state.orm.begin().await?;
    let ticket = SupportTickets::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Ticket"))?;

    let current = parse_status(&ticket)?;
    if !current.accepts_messages() {
        return Err(AppError::InvalidArgument(
            "Cannot add message to closed ticket".into(),
        ));
    }

    let message = insert_message(&txn, ticket.id, user.user_id, text, false).await?;
    let next = if current == TicketStatus::Open {
        TicketStatus::Pending
    } else {
        current
    };
    let mut active: support_tickets::ActiveModel = set_status(&txn, ticket, next).await?.into();
    active.assigned_to = Set(Some(user.user_id));
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Reply added",
        TicketMessage::from(message),
        Some(Meta::empty()),
    ))
}

pub async fn admin_update_ticket_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTicketStatusRequest,
) -> AppResult<ApiResponse<Ticket>> {
    ensure_admin(user)?;
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let ticket = SupportTickets::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Ticket"))?;

    let current = parse_status(&ticket)?;
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidArgument(format!(
            "Cannot change ticket from {current} to {next}"
        )));
    }
    let ticket = set_status(&txn, ticket, next).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "ticket_status_update",
        "support_tickets",
        serde_json::json!({ "ticket_id": ticket.id, "from": current.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket status updated",
        Ticket::from(ticket),
        Some(Meta::empty()),
    ))
}

pub async fn support_summary(state: &AppState) -> AppResult<ApiResponse<SupportSummary>> {
    let (total_tickets, open_tickets, closed_tickets): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*)::BIGINT,
            COUNT(*) FILTER (WHERE status = $1)::BIGINT,
            COUNT(*) FILTER (WHERE status = $2)::BIGINT
        FROM support_tickets
        "#,
    )
    .bind(TicketStatus::Open.as_str())
    .bind(TicketStatus::Closed.as_str())
    .fetch_one(&state.pool)
    .await?;

    let total_faqs = Faqs::find()
        .filter(FaqCol::IsActive.eq(true))
        .count(&state.orm)
        .await? as i64;

    let categories: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT c.name, COUNT(t.id)::BIGINT
        FROM support_categories c
        LEFT JOIN support_tickets t ON t.category_id = c.id
        WHERE c.is_active
        GROUP BY c.id, c.name
        ORDER BY c.name
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Support summary",
        SupportSummary {
            total_tickets,
            open_tickets,
            closed_tickets,
            total_faqs,
            categories: categories
                .into_iter()
                .map(|(name, ticket_count)| CategoryTicketCount { name, ticket_count })
                .collect(),
        },
        None,
    ))
}

pub fn contact_info() -> ApiResponse<ContactInfo> {
    ApiResponse::success("Contact information", contact_details(), None)
}

fn contact_details() -> ContactInfo {
    ContactInfo {
        email: "support@electronicsshop.ug".into(),
        phone: "+256 700 123 456".into(),
        whatsapp: "+256 700 123 456".into(),
        address: "Kampala, Uganda".into(),
        business_hours: "Monday - Friday: 8:00 AM - 6:00 PM".into(),
        response_time: "24 hours for general inquiries, 4 hours for urgent issues".into(),
    }
}

async fn insert_message<C: ConnectionTrait>(
    conn: &C,
    ticket_id: Uuid,
    sender_id: Uuid,
    text: &str,
    is_from_customer: bool,
) -> AppResult<ticket_messages::Model> {
    let message = ticket_messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        ticket_id: Set(ticket_id),
        sender_id: Set(sender_id),
        message: Set(text.to_string()),
        is_from_customer: Set(is_from_customer),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(message)
}

/// Writes `next` and keeps `resolved_at` in step: stamped on resolve,
/// cleared when the ticket reopens.
async fn set_status<C: ConnectionTrait>(
    conn: &C,
    ticket: TicketModel,
    next: TicketStatus,
) -> AppResult<TicketModel> {
    let resolved_at = match next {
        TicketStatus::Resolved => Some(Utc::now().into()),
        TicketStatus::Open | TicketStatus::Pending => None,
        TicketStatus::Closed => ticket.resolved_at,
    };
    let mut active: support_tickets::ActiveModel = ticket.into();
    active.status = Set(next.to_string());
    active.resolved_at = Set(resolved_at);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

fn parse_status(ticket: &TicketModel) -> AppResult<TicketStatus> {
    ticket
        .status
        .parse()
        .map_err(|e| AppError::Internal(anyhow::Error::from(e)))
}

fn validate_message(message: &str) -> AppResult<&str> {
    let text = message.trim();
    if text.is_empty() {
        return Err(AppError::InvalidArgument("message is required".into()));
    }
    Ok(text)
}

fn build_ticket_number(ticket_id: Uuid) -> String {
    let suffix = ticket_id.simple().to_string();
    format!("TKT-{}", suffix[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_number_shape() {
        let number = build_ticket_number(Uuid::new_v4());
        assert_eq!(number.len(), 12);
        assert!(number.starts_with("TKT-"));
        assert!(
            number[4..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn blank_messages_are_rejected() {
        assert!(validate_message("   ").is_err());
        assert_eq!(validate_message("  still broken \n").unwrap(), "still broken");
    }

    #[test]
    fn contact_details_point_at_kampala() {
        let info = contact_details();
        assert_eq!(info.email, "support@electronicsshop.ug");
        assert_eq!(info.address, "Kampala, Uganda");
        assert_eq!(info.phone, info.whatsapp);
    }
}
