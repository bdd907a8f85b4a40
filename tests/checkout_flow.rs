mod common;

use componentpulse_api::{
    domain::status::{OrderStatus, PaymentMethod, PaymentStatus, ShippingMethod},
    dto::{
        cart::AddToCartRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        payments::{CreatePaymentRequest, UpdatePaymentStatusRequest},
        products::InventoryAdjustRequest,
        reviews::CreateReviewRequest,
    },
    entity::products::Entity as Products,
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER},
    routes::params::{LowStockQuery, Pagination},
    services::{admin_service, cart_service, order_service, payment_service, review_service},
    state::AppState,
};
use sea_orm::EntityTrait;
use uuid::Uuid;

fn checkout_request(payment_method: PaymentMethod) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "Plot 12, Kampala Road".into(),
        shipping_method: ShippingMethod::Standard,
        payment_method,
    }
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} vanished"))?;
    Ok(product.stock_quantity)
}

async fn fill_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i64,
) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn checkout_prices_order_and_empties_cart() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let product = common::create_product(&state, 12_000, 10, true).await?;

    fill_cart(&state, &user, product.id, 3).await?;
    let placed = order_service::checkout(&state, &user, checkout_request(PaymentMethod::CashOnDelivery))
        .await?
        .data
        .unwrap();

    assert_eq!(placed.order.subtotal, 36_000);
    assert_eq!(placed.order.shipping_cost, 5_000);
    assert_eq!(placed.order.total_amount, 41_000);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.payment_status, "unpaid");
    assert!(placed.order.order_number.starts_with("ORD-"));
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].price, 12_000);
    assert_eq!(placed.items[0].total_price, 36_000);

    assert_eq!(stock_of(&state, product.id).await?, 7);

    let summary = cart_service::cart_summary(&state, &user).await?.data.unwrap();
    assert_eq!(summary.total_items, 0);
    assert_eq!(summary.items_count, 0);

    let fetched = order_service::get_order(&state, &user, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.order.order_number, placed.order.order_number);
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_check_out() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;

    let err = order_service::checkout(&state, &user, checkout_request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    // A cart that exists but holds nothing is just as empty.
    cart_service::get_cart(&state, &user).await?;
    let err = order_service::checkout(&state, &user, checkout_request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_lines_over_current_stock() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let admin = common::create_user(&state, ROLE_ADMIN).await?;
    let product = common::create_product(&state, 5_000, 4, true).await?;

    fill_cart(&state, &user, product.id, 4).await?;
    admin_service::adjust_inventory(&state, &admin, product.id, InventoryAdjustRequest { delta: -2 })
        .await?;

    let err = order_service::checkout(&state, &user, checkout_request(PaymentMethod::CashOnDelivery))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StockExceeded(_)));
    assert_eq!(stock_of(&state, product.id).await?, 2);

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn cash_on_delivery_lifecycle_ends_in_verified_review() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let admin = common::create_user(&state, ROLE_ADMIN).await?;
    let product = common::create_product(&state, 8_000, 10, true).await?;

    fill_cart(&state, &user, product.id, 2).await?;
    let order = order_service::checkout(&state, &user, checkout_request(PaymentMethod::CashOnDelivery))
        .await?
        .data
        .unwrap()
        .order;

    let payment = payment_service::create_payment(
        &state,
        &user,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: PaymentMethod::CashOnDelivery,
            phone_number: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(payment.status, "pending");
    assert_eq!(payment.amount, order.total_amount);
    assert!(payment.transaction_id.starts_with("TXN-"));
    assert!(payment.reference_code.is_none());

    let err = payment_service::create_payment(
        &state,
        &user,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: PaymentMethod::CashOnDelivery,
            phone_number: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = payment_service::verify_payment(&state, &user, payment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let err = payment_service::update_payment_status(
        &state,
        &user,
        payment.id,
        UpdatePaymentStatusRequest {
            status: PaymentStatus::Completed,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    payment_service::update_payment_status(
        &state,
        &admin,
        payment.id,
        UpdatePaymentStatusRequest {
            status: PaymentStatus::Completed,
        },
    )
    .await?;

    let paid = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(paid.payment_status, "paid");
    assert_eq!(paid.status, "confirmed");

    let err = order_service::cancel_order(&state, &user, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    for status in [OrderStatus::Shipped, OrderStatus::Delivered] {
        admin_service::update_order_status(&state, &admin, order.id, UpdateOrderStatusRequest { status })
            .await?;
    }
    let err = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let review = review_service::create_review(
        &state,
        &user,
        CreateReviewRequest {
            product_id: product.id,
            rating: 5,
            title: "Works first time".into(),
            comment: "Flashed it straight away.".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(review.is_verified_purchase);

    let stranger = common::create_user(&state, ROLE_CUSTOMER).await?;
    let unverified = review_service::create_review(
        &state,
        &stranger,
        CreateReviewRequest {
            product_id: product.id,
            rating: 3,
            title: String::new(),
            comment: String::new(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!unverified.is_verified_purchase);

    let reviews = review_service::product_reviews(&state, product.id)
        .await?
        .data
        .unwrap();
    assert_eq!(reviews.statistics.total_reviews, 2);
    assert_eq!(reviews.statistics.average_rating, 4.0);
    assert_eq!(reviews.statistics.rating_distribution["5_star"], 1);
    assert_eq!(reviews.statistics.rating_distribution["3_star"], 1);
    Ok(())
}

#[tokio::test]
async fn cancelling_restores_stock() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let product = common::create_product(&state, 3_000, 6, true).await?;

    fill_cart(&state, &user, product.id, 4).await?;
    let order = order_service::checkout(&state, &user, checkout_request(PaymentMethod::CashOnDelivery))
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(stock_of(&state, product.id).await?, 2);

    let cancelled = order_service::cancel_order(&state, &user, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.order.status, "cancelled");
    assert_eq!(stock_of(&state, product.id).await?, 6);

    let err = order_service::cancel_order(&state, &user, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    Ok(())
}

#[tokio::test]
async fn orders_are_private_to_their_owner() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let owner = common::create_user(&state, ROLE_CUSTOMER).await?;
    let other = common::create_user(&state, ROLE_CUSTOMER).await?;
    let admin = common::create_user(&state, ROLE_ADMIN).await?;
    let product = common::create_product(&state, 2_000, 5, true).await?;

    fill_cart(&state, &owner, product.id, 1).await?;
    let order = order_service::checkout(&state, &owner, checkout_request(PaymentMethod::CashOnDelivery))
        .await?
        .data
        .unwrap()
        .order;

    let err = order_service::get_order(&state, &other, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Order")));

    let err = admin_service::get_order_admin(&state, &other, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let seen = admin_service::get_order_admin(&state, &admin, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(seen.order.user_id, owner.user_id);
    Ok(())
}

#[tokio::test]
async fn mobile_money_with_valid_phone_completes() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, ROLE_CUSTOMER).await?;
    let product = common::create_product(&state, 45_000, 5, true).await?;

    fill_cart(&state, &user, product.id, 1).await?;
    let order = order_service::checkout(&state, &user, checkout_request(PaymentMethod::MtnMoney))
        .await?
        .data
        .unwrap()
        .order;

    let err = payment_service::create_payment(
        &state,
        &user,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: PaymentMethod::MtnMoney,
            phone_number: Some("0772-12".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let payment = payment_service::create_payment(
        &state,
        &user,
        CreatePaymentRequest {
            order_id: order.id,
            payment_method: PaymentMethod::MtnMoney,
            phone_number: Some("+256772123456".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(payment.status, "completed");
    assert_eq!(payment.reference_code.as_deref().map(str::len), Some(8));
    assert!(payment.gateway_response.is_some());

    let verified = payment_service::verify_payment(&state, &user, payment.id)
        .await?
        .data
        .unwrap();
    assert_eq!(verified.status, "completed");

    let order = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(order.payment_status, "paid");
    assert_eq!(order.status, "confirmed");
    Ok(())
}

#[tokio::test]
async fn low_stock_report_honours_threshold_override() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, ROLE_ADMIN).await?;
    let customer = common::create_user(&state, ROLE_CUSTOMER).await?;
    common::create_product(&state, 1_000, 8, true).await?;

    let report = admin_service::list_low_stock(
        &state,
        &admin,
        Pagination {
            page: Some(1),
            per_page: Some(100),
        },
        LowStockQuery { threshold: Some(10) },
    )
    .await?;
    let meta = report.meta.unwrap();
    assert!(meta.total.unwrap_or_default() >= 1);
    let items = report.data.unwrap().items;
    assert!(!items.is_empty());
    assert!(items.iter().all(|p| p.stock_quantity <= 10));

    let err = admin_service::list_low_stock(
        &state,
        &customer,
        Pagination::default(),
        LowStockQuery::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}
