use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The window a financial summary covers: a single calendar month or the
/// user's whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryPeriod {
    AllTime,
    Month { year: i32, month: u32 },
}

impl SummaryPeriod {
    /// Builds a month period. Returns `None` for an invalid month number.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self::Month { year, month })
    }

    /// Inclusive `[start, end]` date bounds of the period, or `None` for
    /// all-time.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            Self::AllTime => None,
            Self::Month { year, month } => {
                let start = NaiveDate::from_ymd_opt(year, month, 1)?;
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)?
                };
                Some((start, next.pred_opt()?))
            }
        }
    }

    /// Whether the given date falls inside the period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.bounds() {
            None => true,
            Some((start, end)) => date >= start && date <= end,
        }
    }
}

/// Income/expense/balance totals for one user over a [`SummaryPeriod`].
///
/// Installment-plan transactions contribute through their installment slices,
/// never through the parent amount; transactions whose kind is the terminal
/// `Paid` state contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinancialSummary {
    pub period: SummaryPeriod,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`; negative balances are valid.
    pub balance: Decimal,
    /// Number of records that contributed to the totals.
    pub transaction_count: u64,
}

impl FinancialSummary {
    pub fn new(
        period: SummaryPeriod,
        total_income: Decimal,
        total_expenses: Decimal,
        transaction_count: u64,
    ) -> Self {
        Self {
            period,
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            transaction_count,
        }
    }
}
