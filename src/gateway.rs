//! Mobile money provider boundary.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::status::PaymentMethod;

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub provider: PaymentMethod,
    pub phone_number: String,
    pub amount: i64,
    pub reference_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GatewayOutcome {
    Approved { provider_reference: String },
    Declined { reason: String },
    /// Provider accepted the request but has not settled it yet.
    Pending,
}

#[async_trait]
pub trait MobileMoneyGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> anyhow::Result<GatewayOutcome>;

    /// Ask the provider again about an earlier charge.
    async fn check(&self, request: &ChargeRequest) -> anyhow::Result<GatewayOutcome>;
}

/// Offline provider: approves any well-formed phone number and declines the rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    fn decide(request: &ChargeRequest) -> GatewayOutcome {
        if !is_valid_phone(&request.phone_number) {
            return GatewayOutcome::Declined {
                reason: "invalid phone number".to_string(),
            };
        }
        if request.amount <= 0 {
            return GatewayOutcome::Declined {
                reason: "amount must be positive".to_string(),
            };
        }
        GatewayOutcome::Approved {
            provider_reference: format!("{}-{}", request.provider, request.reference_code),
        }
    }
}

#[async_trait]
impl MobileMoneyGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> anyhow::Result<GatewayOutcome> {
        tracing::debug!(provider = %request.provider, reference = %request.reference_code, "simulated charge");
        Ok(Self::decide(request))
    }

    async fn check(&self, request: &ChargeRequest) -> anyhow::Result<GatewayOutcome> {
        Ok(Self::decide(request))
    }
}

/// 10 to 15 digits with an optional leading `+`.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(phone: &str) -> ChargeRequest {
        ChargeRequest {
            provider: PaymentMethod::MtnMoney,
            phone_number: phone.to_string(),
            amount: 25_000,
            reference_code: "AB12CD34".to_string(),
        }
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("0772123456"));
        assert!(is_valid_phone("+256772123456"));
        assert!(!is_valid_phone("07721"));
        assert!(!is_valid_phone("0772-123-456"));
        assert!(!is_valid_phone("+"));
    }

    #[tokio::test]
    async fn simulated_gateway_approves_valid_numbers() {
        let outcome = SimulatedGateway.charge(&request("+256772123456")).await.unwrap();
        assert_eq!(
            outcome,
            GatewayOutcome::Approved {
                provider_reference: "mtn_money-AB12CD34".to_string()
            }
        );
    }

    #[tokio::test]
    async fn simulated_gateway_declines_bad_numbers() {
        let outcome = SimulatedGateway.charge(&request("12")).await.unwrap();
        assert!(matches!(outcome, GatewayOutcome::Declined { .. }));
    }
}
