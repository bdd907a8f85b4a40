use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::status::{
        CourseLevel, EnrollmentStatus, OrderStatus, PaymentMethod, PaymentStatus, ShippingMethod,
        TicketPriority, TicketStatus,
    },
    dto::{
        auth::{
            AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        cart::{AddToCartRequest, CartItemChange, CartSummary, UpdateCartItemRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        payments::{CreatePaymentRequest, PaymentList, PaymentMethodInfo, UpdatePaymentStatusRequest},
        products::{
            CatalogStats, CategoryList, CreateDealRequest, CreateProductRequest, DealList,
            InventoryAdjustRequest, ProductList, UpdateProductRequest,
        },
        reviews::{
            CreateReviewRequest, ProductReviews, ReviewList, ReviewStatistics, ReviewSummary,
            TopRatedProduct, UpdateReviewRequest,
        },
        support::{
            CategoryTicketCount, ContactInfo, CreateTicketRequest, Faq, FaqList, SupportCategory,
            SupportCategoryList, SupportSummary, Ticket, TicketList, TicketMessage,
            TicketMessageRequest, TicketWithMessages, UpdateTicketStatusRequest,
        },
        training::{
            Course, CourseDetail, CourseList, CourseModule, CourseProgress, Enrollment,
            EnrollmentList, ModuleProgress, PopularCourse, TrainingCategory, TrainingCategoryList,
            TrainingSummary,
        },
    },
    error::ErrorBody,
    models::{
        Cart, CartItem, CartProduct, Category, Deal, Order, OrderItem, Payment, Product, Review,
        User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, health, orders, params, payments, products, reviews, support, training,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::profile,
        auth::update_profile,
        auth::change_password,
        products::list_products,
        products::featured_products,
        products::search_products,
        products::list_categories,
        products::list_deals,
        products::catalog_stats,
        products::get_product,
        products::recommendations,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        cart::cart_summary,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        payments::payment_methods,
        payments::create_payment,
        payments::list_payments,
        payments::get_payment,
        payments::verify_payment,
        reviews::product_reviews,
        reviews::my_reviews,
        reviews::create_review,
        reviews::get_review,
        reviews::update_review,
        reviews::delete_review,
        reviews::review_summary,
        support::list_categories,
        support::list_faqs,
        support::list_tickets,
        support::create_ticket,
        support::get_ticket,
        support::add_message,
        support::update_ticket_status,
        support::support_summary,
        support::contact_info,
        training::list_categories,
        training::list_courses,
        training::get_course,
        training::enroll,
        training::course_progress,
        training::list_enrollments,
        training::get_enrollment,
        training::complete_module,
        training::training_summary,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::create_deal,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::update_payment_status,
        admin::list_tickets,
        admin::reply_to_ticket,
        admin::update_ticket_status
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            Deal,
            Cart,
            CartItem,
            CartProduct,
            Order,
            OrderItem,
            Payment,
            Review,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            ShippingMethod,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemChange,
            CartSummary,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            CreatePaymentRequest,
            UpdatePaymentStatusRequest,
            PaymentMethodInfo,
            PaymentList,
            CreateProductRequest,
            UpdateProductRequest,
            CreateDealRequest,
            InventoryAdjustRequest,
            ProductList,
            CategoryList,
            DealList,
            CatalogStats,
            CreateReviewRequest,
            UpdateReviewRequest,
            ReviewStatistics,
            ProductReviews,
            ReviewList,
            TopRatedProduct,
            ReviewSummary,
            TicketStatus,
            TicketPriority,
            SupportCategory,
            SupportCategoryList,
            Faq,
            FaqList,
            CreateTicketRequest,
            TicketMessageRequest,
            UpdateTicketStatusRequest,
            Ticket,
            TicketList,
            TicketMessage,
            TicketWithMessages,
            CategoryTicketCount,
            SupportSummary,
            ContactInfo,
            CourseLevel,
            EnrollmentStatus,
            TrainingCategory,
            TrainingCategoryList,
            Course,
            CourseList,
            CourseModule,
            CourseDetail,
            Enrollment,
            EnrollmentList,
            ModuleProgress,
            CourseProgress,
            PopularCourse,
            TrainingSummary,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            params::FaqQuery,
            params::TicketListQuery,
            params::CourseQuery,
            ErrorBody,
            Meta,
            ApiResponse<Cart>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Products", description = "Catalogue browsing"),
        (name = "Cart", description = "Per-user shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Payments", description = "Mobile money and cash on delivery"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Support", description = "FAQs and support tickets"),
        (name = "Training", description = "Courses, enrollments and progress"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_cart_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/cart",
            "/api/cart/add",
            "/api/cart/items/{id}",
            "/api/cart/clear",
            "/api/cart/summary",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn document_lists_support_and_training_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/support/tickets",
            "/api/support/tickets/{id}/messages",
            "/api/admin/support/tickets/{id}/status",
            "/api/training/courses/{id}/enroll",
            "/api/training/modules/{id}/complete",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
