use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A computed-on-demand occurrence of a recurring subscription.
///
/// Virtual occurrences are transaction-shaped records produced for calendar
/// reporting and summary composition. They are never persisted and never
/// payable; the synthetic id keeps them distinguishable from real
/// transactions on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VirtualOccurrence {
    /// Synthetic identifier: `virtual-{subscription_id}-{date}`.
    pub id: String,
    pub subscription_id: i32,
    pub description: String,
    pub amount: Decimal,
    /// Kind of the generating subscription, `"Income"` or `"Expense"`.
    pub kind: String,
    pub date: NaiveDate,
    /// Always true; kept on the wire so clients can filter projections out.
    pub is_virtual: bool,
}

impl VirtualOccurrence {
    pub fn new(
        subscription_id: i32,
        description: impl Into<String>,
        amount: Decimal,
        kind: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: format!("virtual-{subscription_id}-{date}"),
            subscription_id,
            description: description.into(),
            amount,
            kind: kind.into(),
            date,
            is_virtual: true,
        }
    }
}

/// Outcome of one run of the materializing subscription processor.
///
/// The batch is best effort: a failure on one subscription is recorded here
/// and does not abort the rest of the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProcessingReport {
    pub processed_count: u64,
    pub errors: Vec<ProcessingError>,
}

/// A single failed subscription within a processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProcessingError {
    pub subscription_id: i32,
    pub subscription_name: String,
    pub message: String,
}
