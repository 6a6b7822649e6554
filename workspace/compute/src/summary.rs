//! Financial summary aggregation.
//!
//! Combines three sources into income/expense/balance totals: real
//! non-plan transactions, installment slices (attributed to their parent's
//! kind, so a plan contributes through its slices and never double-counts
//! the parent amount), and — for month-bounded periods — virtual recurring
//! occurrences. Transactions in the terminal `Paid` kind are excluded
//! entirely.

use std::collections::HashMap;

use common::{FinancialSummary, SummaryPeriod};
use model::entities::{
    prelude::{Subscription, Transaction, TransactionInstallment},
    subscription,
    transaction::{self, TransactionKind},
    transaction_installment,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::error::Result;
use crate::recurring;

#[derive(Default)]
struct Totals {
    income: Decimal,
    expenses: Decimal,
    count: u64,
}

impl Totals {
    fn add(&mut self, kind: TransactionKind, amount: Decimal) {
        match kind {
            TransactionKind::Income => self.income += amount,
            TransactionKind::Expense => self.expenses += amount,
            TransactionKind::Paid => return,
        }
        self.count += 1;
    }
}

/// Computes the financial summary for one user over the given period.
pub async fn summarize<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    period: SummaryPeriod,
) -> Result<FinancialSummary> {
    let transactions = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .filter(transaction::Column::Kind.ne(TransactionKind::Paid))
        .all(conn)
        .await?;
    let (plans, singles): (Vec<_>, Vec<_>) = transactions
        .into_iter()
        .partition(|t| t.is_installment_plan);
    let plan_kinds: HashMap<i32, TransactionKind> =
        plans.iter().map(|t| (t.id, t.kind)).collect();

    let mut totals = Totals::default();

    match period.bounds() {
        None => {
            for tx in &singles {
                totals.add(tx.kind, tx.amount);
            }
            if !plans.is_empty() {
                let installments = TransactionInstallment::find()
                    .filter(
                        transaction_installment::Column::TransactionId
                            .is_in(plan_kinds.keys().copied()),
                    )
                    .all(conn)
                    .await?;
                for slice in installments {
                    if let Some(&kind) = plan_kinds.get(&slice.transaction_id) {
                        totals.add(kind, slice.amount);
                    }
                }
            }
        }
        Some((start, end)) => {
            for tx in singles.iter().filter(|t| t.date >= start && t.date <= end) {
                totals.add(tx.kind, tx.amount);
            }
            if !plans.is_empty() {
                let installments = TransactionInstallment::find()
                    .filter(
                        transaction_installment::Column::TransactionId
                            .is_in(plan_kinds.keys().copied()),
                    )
                    .filter(transaction_installment::Column::DueDate.between(start, end))
                    .all(conn)
                    .await?;
                for slice in installments {
                    if let Some(&kind) = plan_kinds.get(&slice.transaction_id) {
                        totals.add(kind, slice.amount);
                    }
                }
            }

            let subscriptions = Subscription::find()
                .filter(subscription::Column::OwnerId.eq(owner_id))
                .filter(subscription::Column::IsActive.eq(true))
                .all(conn)
                .await?;
            let sub_kinds: HashMap<i32, TransactionKind> =
                subscriptions.iter().map(|s| (s.id, s.kind)).collect();
            for occurrence in recurring::project_virtual(&subscriptions, start, end) {
                if let Some(&kind) = sub_kinds.get(&occurrence.subscription_id) {
                    totals.add(kind, occurrence.amount);
                }
            }
        }
    }

    debug!(
        owner_id,
        income = %totals.income,
        expenses = %totals.expenses,
        count = totals.count,
        "summary computed"
    );
    Ok(FinancialSummary::new(
        period,
        totals.income,
        totals.expenses,
        totals.count,
    ))
}
