// service/payment_gateway.rs
use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use crate::models::paymentmodel::PaymentMethod;
use crate::service::error::ServiceError;

/// External payment-gateway collaborator. The escrow engine only sees this
/// trait, so a real provider can be swapped in at AppState construction.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        method: PaymentMethod,
        account_details: &str,
        amount: f64,
    ) -> Result<bool, ServiceError>;
}

/// Simulated gateway: approves every charge after a bounded delay.
/// Cancelling a pending charge has no side effect.
#[derive(Debug, Clone)]
pub struct MockGateway {
    latency: Duration,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(1000),
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(
        &self,
        method: PaymentMethod,
        _account_details: &str,
        amount: f64,
    ) -> Result<bool, ServiceError> {
        sleep(self.latency).await;
        tracing::debug!("Mock gateway approved {} charge of {}", method.to_str(), amount);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_always_approves() {
        let gateway = MockGateway::with_latency(Duration::from_millis(1));
        let approved = gateway
            .charge(PaymentMethod::Gcash, "0917-000-0000", 500.0)
            .await
            .unwrap();
        assert!(approved);
    }
}
