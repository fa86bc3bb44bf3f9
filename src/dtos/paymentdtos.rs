use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateEscrowDto {
    pub job_id: Uuid,

    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    // Tolerant-parsed against the payment method enum
    pub method: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProcessMockPaymentDto {
    pub method: String,

    #[validate(length(min = 1, message = "Account details are required"))]
    pub account_details: String,

    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MockPaymentResultDto {
    pub success: bool,
}
