mod common;

use componentpulse_api::{
    domain::status::{TicketPriority, TicketStatus},
    dto::support::{CreateTicketRequest, TicketMessageRequest, UpdateTicketStatusRequest},
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER},
    routes::params::{Pagination, TicketListQuery},
    services::support_service,
    state::AppState,
};
use uuid::Uuid;

async fn open_ticket(
    state: &AppState,
    user: &AuthUser,
    category_id: Uuid,
    message: Option<&str>,
) -> anyhow::Result<Uuid> {
    let created = support_service::create_ticket(
        state,
        user,
        CreateTicketRequest {
            category_id,
            subject: "ESP32 will not flash".into(),
            priority: TicketPriority::High,
            message: message.map(str::to_string),
        },
    )
    .await?
    .data
    .unwrap();
    Ok(created.ticket.id)
}

fn text(message: &str) -> TicketMessageRequest {
    TicketMessageRequest {
        message: message.into(),
    }
}

fn status(status: TicketStatus) -> UpdateTicketStatusRequest {
    UpdateTicketStatusRequest { status }
}

#[tokio::test]
async fn new_ticket_is_open_with_first_message() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let category = common::create_support_category(&state, true).await?;

    let created = support_service::create_ticket(
        &state,
        &user,
        CreateTicketRequest {
            category_id: category.id,
            subject: "  Missing resistor kit  ".into(),
            priority: TicketPriority::Urgent,
            message: Some("Order arrived without the kit".into()),
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(created.ticket.status, "open");
    assert_eq!(created.ticket.priority, "urgent");
    assert_eq!(created.ticket.subject, "Missing resistor kit");
    assert!(created.ticket.ticket_number.starts_with("TKT-"));
    assert_eq!(created.messages.len(), 1);
    assert!(created.messages[0].is_from_customer);

    let listed = support_service::list_tickets(
        &state,
        &user,
        Pagination::default(),
        TicketListQuery {
            status: Some(TicketStatus::Open),
        },
    )
    .await?;
    assert_eq!(listed.meta.unwrap().total, Some(1));
    Ok(())
}

#[tokio::test]
async fn inactive_category_rejects_tickets() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let category = common::create_support_category(&state, false).await?;

    let err = open_ticket(&state, &user, category.id, None).await.unwrap_err();
    let err = err.downcast::<AppError>()?;
    assert!(matches!(err, AppError::NotFound("Support category")));
    Ok(())
}

#[tokio::test]
async fn customer_can_close_but_not_resolve() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let category = common::create_support_category(&state, true).await?;
    let ticket_id = open_ticket(&state, &user, category.id, None).await?;

    let err = support_service::update_ticket_status(
        &state,
        &user,
        ticket_id,
        status(TicketStatus::Resolved),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let closed = support_service::update_ticket_status(
        &state,
        &user,
        ticket_id,
        status(TicketStatus::Closed),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(closed.status, "closed");

    let err = support_service::add_message(&state, &user, ticket_id, text("one more thing"))
        .await
        .unwrap_err();
    match err {
        AppError::InvalidArgument(msg) => assert_eq!(msg, "Cannot add message to closed ticket"),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn staff_reply_and_customer_answer_move_the_ticket() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, ROLE_CUSTOMER).await?;
    let admin = common::create_user(&state, ROLE_ADMIN).await?;
    let category = common::create_support_category(&state, true).await?;
    let ticket_id = open_ticket(&state, &customer, category.id, Some("Board is dead")).await?;

    let reply = support_service::admin_reply(&state, &admin, ticket_id, text("Try another cable"))
        .await?
        .data
        .unwrap();
    assert!(!reply.is_from_customer);

    let ticket = support_service::get_ticket(&state, &customer, ticket_id)
        .await?
        .data
        .unwrap();
    assert_eq!(ticket.ticket.status, "pending");
    assert_eq!(ticket.messages.len(), 2);

    support_service::add_message(&state, &customer, ticket_id, text("Still dead")).await?;
    let ticket = support_service::get_ticket(&state, &customer, ticket_id)
        .await?
        .data
        .unwrap();
    assert_eq!(ticket.ticket.status, "open");

    let resolved = support_service::admin_update_ticket_status(
        &state,
        &admin,
        ticket_id,
        status(TicketStatus::Resolved),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(resolved.status, "resolved");
    assert!(resolved.resolved_at.is_some());

    let reopened = support_service::admin_update_ticket_status(
        &state,
        &admin,
        ticket_id,
        status(TicketStatus::Open),
    )
    .await?
    .data
    .unwrap();
    assert!(reopened.resolved_at.is_none());

    support_service::admin_update_ticket_status(&state, &admin, ticket_id, status(TicketStatus::Closed))
        .await?;
    let err = support_service::admin_update_ticket_status(
        &state,
        &admin,
        ticket_id,
        status(TicketStatus::Open),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    Ok(())
}

#[tokio::test]
async fn tickets_are_private_and_admin_routes_are_guarded() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let owner = common::create_user(&state, ROLE_CUSTOMER).await?;
    let other = common::create_user(&state, ROLE_CUSTOMER).await?;
    let category = common::create_support_category(&state, true).await?;
    let ticket_id = open_ticket(&state, &owner, category.id, None).await?;

    let err = support_service::get_ticket(&state, &other, ticket_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Ticket")));

    let err = support_service::admin_reply(&state, &other, ticket_id, text("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn summary_counts_active_categories() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let category = common::create_support_category(&state, true).await?;
    open_ticket(&state, &user, category.id, None).await?;
    open_ticket(&state, &user, category.id, None).await?;

    let summary = support_service::support_summary(&state).await?.data.unwrap();
    assert!(summary.total_tickets >= 2);
    assert!(summary.open_tickets >= 2);
    let row = summary
        .categories
        .iter()
        .find(|c| c.name == category.name)
        .expect("category listed");
    assert_eq!(row.ticket_count, 2);
    Ok(())
}
