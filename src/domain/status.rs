//! Order and payment vocabularies and their allowed transitions.
//!
//! Rows store these as text; every write goes through the typed enums here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

text_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

text_enum!(OrderPaymentStatus {
    Unpaid => "unpaid",
    Pending => "pending",
    Paid => "paid",
    Refunded => "refunded",
});

text_enum!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

text_enum!(PaymentMethod {
    MtnMoney => "mtn_money",
    AirtelMoney => "airtel_money",
    CashOnDelivery => "cash_on_delivery",
});

text_enum!(ShippingMethod {
    Standard => "standard",
    Express => "express",
});

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Pending, Cancelled) | (Completed, Refunded)
        )
    }

    /// Payments in these states block a new payment for the same order.
    pub fn is_open(self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Completed)
    }

    /// Order payment status implied by a payment reaching this state.
    pub fn order_payment_status(self) -> OrderPaymentStatus {
        match self {
            PaymentStatus::Pending => OrderPaymentStatus::Pending,
            PaymentStatus::Completed => OrderPaymentStatus::Paid,
            PaymentStatus::Refunded => OrderPaymentStatus::Refunded,
            PaymentStatus::Failed | PaymentStatus::Cancelled => OrderPaymentStatus::Unpaid,
        }
    }
}

impl PaymentMethod {
    pub fn display_name(self) -> &'static str {
        match self {
            PaymentMethod::MtnMoney => "MTN Money",
            PaymentMethod::AirtelMoney => "Airtel Money",
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PaymentMethod::MtnMoney => "Pay using MTN Mobile Money",
            PaymentMethod::AirtelMoney => "Pay using Airtel Money",
            PaymentMethod::CashOnDelivery => "Pay when your order is delivered",
        }
    }

    pub fn requires_phone(self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl ShippingMethod {
    pub fn cost(self) -> i64 {
        match self {
            ShippingMethod::Standard => 5_000,
            ShippingMethod::Express => 15_000,
        }
    }
}

text_enum!(TicketStatus {
    Open => "open",
    Pending => "pending",
    Resolved => "resolved",
    Closed => "closed",
});

text_enum!(TicketPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

text_enum!(CourseLevel {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

text_enum!(EnrollmentStatus {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl TicketStatus {
    /// Staff moves. Closed is terminal.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Open, Pending)
                | (Open, Resolved)
                | (Open, Closed)
                | (Pending, Open)
                | (Pending, Resolved)
                | (Pending, Closed)
                | (Resolved, Open)
                | (Resolved, Closed)
        )
    }

    /// Customers may only close their own tickets.
    pub fn customer_can_transition_to(self, next: TicketStatus) -> bool {
        next == TicketStatus::Closed && self.can_transition_to(next)
    }

    pub fn accepts_messages(self) -> bool {
        self != TicketStatus::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips_for_every_variant() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(*status));
        }
        assert!("shipped".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn payment_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Refunded));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn order_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn shipping_costs() {
        assert_eq!(ShippingMethod::Standard.cost(), 5_000);
        assert_eq!(ShippingMethod::Express.cost(), 15_000);
    }

    #[test]
    fn unknown_value_names_kind() {
        let err = "bitcoin".parse::<PaymentMethod>().unwrap_err();
        assert_eq!(err.to_string(), "unknown PaymentMethod 'bitcoin'");
    }

    #[test]
    fn ticket_transitions() {
        use TicketStatus::*;
        assert!(Open.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Open));
        assert!(Resolved.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
        assert!(!Closed.accepts_messages());
        assert!(Resolved.accepts_messages());
    }

    #[test]
    fn customers_can_only_close() {
        use TicketStatus::*;
        assert!(Open.customer_can_transition_to(Closed));
        assert!(Resolved.customer_can_transition_to(Closed));
        assert!(!Open.customer_can_transition_to(Resolved));
        assert!(!Pending.customer_can_transition_to(Open));
        assert!(!Closed.customer_can_transition_to(Closed));
    }
}
