use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::types::BigDecimal;

use super::jobmodel::normalize_enum_input;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Paypal,
    Gcash,
    Paymaya,
}

impl PaymentMethod {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Paymaya => "paymaya",
        }
    }

    pub fn all() -> &'static [PaymentMethod] {
        &[
            PaymentMethod::CreditCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::Paypal,
            PaymentMethod::Gcash,
            PaymentMethod::Paymaya,
        ]
    }

    /// Tolerant parse over the canonical method names. "G-Cash", "gcash" and
    /// "GCASH" all resolve to Gcash; unknown input always fails with the
    /// supported list in the message.
    pub fn parse(s: &str) -> Result<PaymentMethod, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Payment method must be provided".to_string());
        }

        let normalized = normalize_enum_input(trimmed);
        // "g_cash" and "pay_pal"-style spellings collapse onto the canonical
        // name once separators are stripped.
        let collapsed = normalized.replace('_', "");
        for method in PaymentMethod::all() {
            if method.to_str() == normalized || method.to_str().replace('_', "") == collapsed {
                return Ok(*method);
            }
        }

        Err(format!(
            "Unknown payment method: '{}'. Supported values: {}",
            s,
            PaymentMethod::supported()
        ))
    }

    pub fn supported() -> String {
        PaymentMethod::all()
            .iter()
            .map(|m| m.to_str().to_uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    HeldInEscrow,
    Released,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::HeldInEscrow => "held_in_escrow",
            PaymentStatus::Released => "released",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Released, refunded and failed payments never move again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Released | PaymentStatus::Refunded | PaymentStatus::Failed
        )
    }

    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        matches!(
            (self, to),
            (PaymentStatus::Pending, PaymentStatus::HeldInEscrow)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::HeldInEscrow, PaymentStatus::Released)
                | (PaymentStatus::HeldInEscrow, PaymentStatus::Refunded)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub job_id: Uuid,
    pub amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub escrow_account: String,
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW(), can be NULL
    pub released_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}
