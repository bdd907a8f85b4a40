use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::status::{TicketPriority, TicketStatus},
    entity::{faqs, support_categories, support_tickets, ticket_messages},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub category_id: Uuid,
    pub subject: String,
    #[serde(default = "default_priority")]
    pub priority: TicketPriority,
    /// First message of the conversation.
    pub message: Option<String>,
}

fn default_priority() -> TicketPriority {
    TicketPriority::Medium
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TicketMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SupportCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub ticket_count: i64,
}

impl SupportCategory {
    pub fn new(model: support_categories::Model, ticket_count: i64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            icon: model.icon,
            ticket_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Faq {
    pub id: Uuid,
    pub category_id: Uuid,
    pub question: String,
    pub answer: String,
    pub position: i32,
}

impl From<faqs::Model> for Faq {
    fn from(model: faqs::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            question: model.question,
            answer: model.answer,
            position: model.position,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub message: String,
    pub is_from_customer: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ticket_messages::Model> for TicketMessage {
    fn from(model: ticket_messages::Model) -> Self {
        Self {
            id: model.id,
            sender_id: model.sender_id,
            message: model.message,
            is_from_customer: model.is_from_customer,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Ticket {
    pub id: Uuid,
    pub ticket_number: String,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub subject: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<support_tickets::Model> for Ticket {
    fn from(model: support_tickets::Model) -> Self {
        Self {
            id: model.id,
            ticket_number: model.ticket_number,
            user_id: model.user_id,
            category_id: model.category_id,
            subject: model.subject,
            priority: model.priority,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            resolved_at: model.resolved_at.map(|at| at.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketWithMessages {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SupportCategoryList {
    pub items: Vec<SupportCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FaqList {
    pub items: Vec<Faq>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketList {
    pub items: Vec<Ticket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryTicketCount {
    pub name: String,
    pub ticket_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SupportSummary {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub closed_tickets: i64,
    pub total_faqs: i64,
    pub categories: Vec<CategoryTicketCount>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub whatsapp: String,
    pub address: String,
    pub business_hours: String,
    pub response_time: String,
}
