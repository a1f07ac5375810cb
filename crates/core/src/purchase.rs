use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::quote::QuoteSummary;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub reference: Uuid,
    pub premium: Decimal,
    pub currency_code: String,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("purchase declined: {reason}")]
    Declined { reason: String },
    #[error("purchase service unavailable: {0}")]
    Unavailable(String),
}

/// Where a confirmed quote is sent when the user buys it.
pub trait PurchaseGateway: Send + Sync {
    fn purchase(&self, quote: &QuoteSummary) -> Result<PurchaseReceipt, PurchaseError>;
}

/// Confirms every purchase locally without contacting any backend.
#[derive(Clone, Debug, Default)]
pub struct StubPurchaseGateway;

impl PurchaseGateway for StubPurchaseGateway {
    fn purchase(&self, quote: &QuoteSummary) -> Result<PurchaseReceipt, PurchaseError> {
        Ok(PurchaseReceipt {
            reference: Uuid::new_v4(),
            premium: quote.premium,
            currency_code: quote.country.currency_code.clone(),
            purchased_at: Utc::now(),
        })
    }
}
