use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    domain::status::{OrderPaymentStatus, OrderStatus, PaymentMethod, PaymentStatus},
    dto::payments::{
        CreatePaymentRequest, PaymentList, PaymentMethodInfo, UpdatePaymentStatusRequest,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        payments::{ActiveModel, Column, Entity as Payments, Model as PaymentModel},
    },
    error::{AppError, AppResult},
    gateway::{ChargeRequest, GatewayOutcome, is_valid_phone},
    middleware::auth::{AuthUser, ensure_admin},
    models::Payment,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub fn payment_methods() -> ApiResponse<Vec<PaymentMethodInfo>> {
    let methods = PaymentMethod::ALL
        .iter()
        .map(|method| PaymentMethodInfo {
            code: *method,
            name: method.display_name().to_string(),
            description: method.description().to_string(),
            requires_phone: method.requires_phone(),
        })
        .collect();
    ApiResponse::success("Payment methods", methods, None)
}

// The gateway is called after the pending row commits, with no lock held.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    let method = payload.payment_method;
    let phone_number = match (method.requires_phone(), payload.phone_number) {
        (true, Some(phone)) if is_valid_phone(phone.trim()) => Some(phone.trim().to_string()),
        (true, Some(_)) => {
            return Err(AppError::InvalidArgument("phone_number is not valid".into()));
        }
        (true, None) => {
            return Err(AppError::InvalidArgument(format!(
                "phone_number is required for {}",
                method.display_name()
            )));
        }
        (false, _) => None,
    };

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if order.status == OrderStatus::Cancelled.as_str() {
        return Err(AppError::InvalidArgument("Order is cancelled".into()));
    }
    if order.payment_status == OrderPaymentStatus::Paid.as_str() {
        return Err(AppError::InvalidArgument("Order is already paid".into()));
    }

    let open = Payments::find()
        .filter(Column::OrderId.eq(order.id))
        .filter(Column::Status.is_in(
            PaymentStatus::ALL
                .iter()
                .filter(|s| s.is_open())
                .map(|s| s.as_str()),
        ))
        .count(&txn)
        .await?;
    if open > 0 {
        return Err(AppError::Conflict(
            "Order already has an active payment".into(),
        ));
    }

    let reference_code = method.requires_phone().then(build_reference_code);
    let payment = ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        payment_method: Set(method.to_string()),
        amount: Set(order.total_amount),
        status: Set(PaymentStatus::Pending.to_string()),
        transaction_id: Set(build_transaction_id()),
        phone_number: Set(phone_number),
        reference_code: Set(reference_code),
        gateway_response: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_active: OrderActive = order.into();
    order_active.payment_method = Set(method.to_string());
    order_active.payment_status = Set(OrderPaymentStatus::Pending.to_string());
    order_active.updated_at = Set(Utc::now().into());
    order_active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "payment_create",
        "payments",
        serde_json::json!({ "payment_id": payment.id, "method": method.as_str() }),
    )
    .await;

    if !method.requires_phone() {
        return Ok(ApiResponse::success(
            "Payment recorded, pay on delivery",
            Payment::from(payment),
            Some(Meta::empty()),
        ));
    }

    let request = charge_request(&payment)?;
    let payment = match state.payments.charge(&request).await {
        Ok(outcome) => settle(state, payment.id, outcome).await?,
        Err(err) => {
            tracing::warn!(error = %err, payment_id = %payment.id, "gateway charge failed, payment left pending");
            payment
        }
    };

    let message = match payment.status.parse::<PaymentStatus>() {
        Ok(PaymentStatus::Completed) => "Payment completed",
        Ok(PaymentStatus::Failed) => "Payment failed",
        _ => "Payment pending",
    };
    Ok(ApiResponse::success(
        message,
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

pub async fn list_payments(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PaymentList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Payments::find()
        .inner_join(Orders)
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Payment::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Payments",
        PaymentList { items },
        page,
        limit,
        total,
    ))
}

pub async fn get_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let payment = find_owned(state, user, id).await?;
    Ok(ApiResponse::success(
        "Payment",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

pub async fn verify_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let payment = find_owned(state, user, id).await?;

    if payment.payment_method == PaymentMethod::CashOnDelivery.as_str() {
        return Err(AppError::InvalidArgument(
            "Cash on delivery payments cannot be verified".into(),
        ));
    }
    if payment.status != PaymentStatus::Pending.as_str() {
        let message = format!("Payment already {}", payment.status);
        return Ok(ApiResponse::success(
            message,
            Payment::from(payment),
            Some(Meta::empty()),
        ));
    }

    let request = charge_request(&payment)?;
    let outcome = state.payments.check(&request).await?;
    let payment = settle(state, payment.id, outcome).await?;

    Ok(ApiResponse::success(
        "Payment verified",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Payment>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let payment = transition(&txn, id, payload.status, None).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "payment_status_update",
        "payments",
        serde_json::json!({ "payment_id": payment.id, "status": payment.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment updated",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

async fn settle(
    state: &AppState,
    payment_id: Uuid,
    outcome: GatewayOutcome,
) -> AppResult<PaymentModel> {
    let next = match outcome {
        GatewayOutcome::Approved { .. } => PaymentStatus::Completed,
        GatewayOutcome::Declined { .. } => PaymentStatus::Failed,
        GatewayOutcome::Pending => PaymentStatus::Pending,
    };
    let response = serde_json::to_value(&outcome).map_err(anyhow::Error::from)?;

    let txn = state.orm.begin().await?;
    let payment = if next == PaymentStatus::Pending {
        let payment = Payments::find_by_id(payment_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound("Payment"))?;
        let mut active: ActiveModel = payment.into();
        active.gateway_response = Set(Some(response));
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    } else {
        transition(&txn, payment_id, next, Some(response)).await?
    };
    txn.commit().await?;

    tracing::info!(payment_id = %payment.id, status = %payment.status, "gateway outcome applied");
    Ok(payment)
}

// Order row before payment row.
async fn transition(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
    next: PaymentStatus,
    gateway_response: Option<Value>,
) -> AppResult<PaymentModel> {
    let order_id = Payments::find_by_id(payment_id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound("Payment"))?
        .order_id;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    let payment = Payments::find_by_id(payment_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound("Payment"))?;

    let current: PaymentStatus = payment
        .status
        .parse()
        .map_err(|e| AppError::Internal(anyhow::Error::from(e)))?;
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidArgument(format!(
            "Cannot change payment from {current} to {next}"
        )));
    }

    let mut active: ActiveModel = payment.into();
    active.status = Set(next.to_string());
    if let Some(response) = gateway_response {
        active.gateway_response = Set(Some(response));
    }
    active.updated_at = Set(Utc::now().into());
    let payment = active.update(txn).await?;

    let confirm = next == PaymentStatus::Completed && order.status == OrderStatus::Pending.as_str();
    let mut order_active: OrderActive = order.into();
    order_active.payment_status = Set(next.order_payment_status().to_string());
    if confirm {
        order_active.status = Set(OrderStatus::Confirmed.to_string());
    }
    order_active.updated_at = Set(Utc::now().into());
    order_active.update(txn).await?;

    Ok(payment)
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<PaymentModel> {
    Payments::find_by_id(id)
        .inner_join(Orders)
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Payment"))
}

fn charge_request(payment: &PaymentModel) -> AppResult<ChargeRequest> {
    let provider: PaymentMethod = payment
        .payment_method
        .parse()
        .map_err(|e| AppError::Internal(anyhow::Error::from(e)))?;
    Ok(ChargeRequest {
        provider,
        phone_number: payment.phone_number.clone().unwrap_or_default(),
        amount: payment.amount,
        reference_code: payment.reference_code.clone().unwrap_or_default(),
    })
}

fn build_transaction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("TXN-{}", hex[..12].to_uppercase())
}

fn build_reference_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_ids_are_prefixed_upper_hex() {
        let id = build_transaction_id();
        let hex = id.strip_prefix("TXN-").unwrap();
        assert_eq!(hex.len(), 12);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(id, build_transaction_id());
    }

    #[test]
    fn reference_codes_are_eight_upper_alphanumerics() {
        let code = build_reference_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn methods_list_every_provider() {
        let response = payment_methods();
        let methods = response.data.unwrap();
        assert_eq!(methods.len(), 3);
        let cod = methods
            .iter()
            .find(|m| m.code == PaymentMethod::CashOnDelivery)
            .unwrap();
        assert!(!cod.requires_phone);
        assert!(methods.iter().filter(|m| m.requires_phone).count() == 2);
    }
}
