//! Installment plan generation and payment tracking.
//!
//! A plan splits a transaction's amount into N equal slices with due dates
//! advanced cumulatively from the first installment date. Slices are atomic:
//! they are paid whole or not at all, so a partial payment walks the pending
//! slices in order and hands any leftover back to the caller.

use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use model::entities::{
    prelude::TransactionInstallment,
    transaction::{self, InstallmentPeriod, TransactionKind},
    transaction_installment::{self, InstallmentStatus},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{debug, info};

use crate::error::{ComputeError, Result};

pub const MIN_INSTALLMENTS: i32 = 2;
pub const MAX_INSTALLMENTS: i32 = 48;

/// One computed slice of a plan before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInstallment {
    pub number: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

/// The even per-slice amount for a plan.
///
/// Plain division rounded to the column scale; the last installment is not
/// adjusted, so the slice sum may differ from the total by a fraction of a
/// cent.
pub fn split_amount(amount: Decimal, count: i32) -> Result<Decimal> {
    if !(MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&count) {
        return Err(ComputeError::InvalidInstallmentCount {
            got: count,
            min: MIN_INSTALLMENTS,
            max: MAX_INSTALLMENTS,
        });
    }
    Ok((amount / Decimal::from(count)).round_dp(4))
}

/// Advances a due date by one period, from the previous installment's date.
///
/// Cumulative advancement avoids the drift a fixed offset from the anchor
/// would accumulate across months of different lengths.
pub fn next_due(date: NaiveDate, period: InstallmentPeriod) -> Result<NaiveDate> {
    let next = match period {
        InstallmentPeriod::Monthly => date.checked_add_months(Months::new(1)),
        InstallmentPeriod::Weekly => date.checked_add_days(Days::new(7)),
    };
    next.ok_or_else(|| ComputeError::Date(format!("due date out of range after {date}")))
}

/// Produces the full schedule for a plan: `count` slices of
/// `amount / count`, all Pending, due dates strictly increasing.
pub fn build_schedule(
    amount: Decimal,
    count: i32,
    period: InstallmentPeriod,
    first_date: NaiveDate,
) -> Result<Vec<ScheduledInstallment>> {
    let slice = split_amount(amount, count)?;

    let mut schedule = Vec::with_capacity(count as usize);
    let mut due = first_date;
    for number in 1..=count {
        schedule.push(ScheduledInstallment {
            number,
            amount: slice,
            due_date: due,
        });
        if number < count {
            due = next_due(due, period)?;
        }
    }
    Ok(schedule)
}

/// Inserts the installment rows for a freshly created plan transaction.
pub async fn materialize_plan<C: ConnectionTrait>(
    conn: &C,
    plan: &transaction::Model,
) -> Result<Vec<transaction_installment::Model>> {
    let (count, period, first_date) = match (
        plan.is_installment_plan,
        plan.installment_count,
        plan.installment_period,
        plan.first_installment_date,
    ) {
        (true, Some(count), Some(period), Some(first_date)) => (count, period, first_date),
        _ => return Err(ComputeError::NotInstallmentPlan),
    };

    let schedule = build_schedule(plan.amount, count, period, first_date)?;
    debug!(
        transaction_id = plan.id,
        count,
        "materializing installment schedule"
    );

    let mut rows = Vec::with_capacity(schedule.len());
    for slice in schedule {
        let row = transaction_installment::ActiveModel {
            transaction_id: Set(plan.id),
            installment_number: Set(slice.number),
            amount: Set(slice.amount),
            due_date: Set(slice.due_date),
            status: Set(InstallmentStatus::Pending),
            paid_date: Set(None),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

/// Marks one installment as paid.
///
/// Fails with [`ComputeError::AlreadyPaid`] when the slice is already paid.
pub async fn pay_installment<C: ConnectionTrait>(
    conn: &C,
    installment: &transaction_installment::Model,
    now: NaiveDateTime,
) -> Result<transaction_installment::Model> {
    if installment.status == InstallmentStatus::Paid {
        return Err(ComputeError::AlreadyPaid);
    }

    let mut active: transaction_installment::ActiveModel = installment.clone().into();
    active.status = Set(InstallmentStatus::Paid);
    active.paid_date = Set(Some(now));
    let paid = active.update(conn).await?;

    info!(
        installment_id = paid.id,
        transaction_id = paid.transaction_id,
        "installment paid"
    );
    Ok(paid)
}

/// Marks a whole transaction as paid.
///
/// For an installment plan, every Pending slice becomes Paid in one batch.
/// An Expense parent then transitions to the terminal `Paid` kind, which
/// removes it from future expense totals.
pub async fn mark_transaction_paid<C: ConnectionTrait>(
    conn: &C,
    tx: &transaction::Model,
    now: NaiveDateTime,
) -> Result<transaction::Model> {
    if tx.is_installment_plan {
        let res = TransactionInstallment::update_many()
            .col_expr(
                transaction_installment::Column::Status,
                Expr::value(InstallmentStatus::Paid),
            )
            .col_expr(transaction_installment::Column::PaidDate, Expr::value(now))
            .filter(transaction_installment::Column::TransactionId.eq(tx.id))
            .filter(transaction_installment::Column::Status.eq(InstallmentStatus::Pending))
            .exec(conn)
            .await?;
        debug!(
            transaction_id = tx.id,
            paid = res.rows_affected,
            "batch-paid pending installments"
        );
    }

    if tx.kind == TransactionKind::Expense {
        let mut active: transaction::ActiveModel = tx.clone().into();
        active.kind = Set(TransactionKind::Paid);
        let updated = active.update(conn).await?;
        info!(transaction_id = updated.id, "expense marked paid");
        return Ok(updated);
    }

    Ok(tx.clone())
}

/// Result of applying a partial payment to a plan.
#[derive(Debug)]
pub struct PartialPaymentOutcome {
    /// Installments paid in full by this payment, ascending number order.
    pub paid: Vec<transaction_installment::Model>,
    /// Portion of the payment that was applied.
    pub applied_amount: Decimal,
    /// Leftover that did not cover the next installment in full; returned to
    /// the caller, never applied partially to a slice.
    pub remaining_amount: Decimal,
}

/// Greedily applies `amount` to the earliest Pending installments.
///
/// Walks slices in ascending installment number, paying each in full while
/// the leftover covers it, and stops at the first slice it cannot cover.
pub async fn apply_partial_payment<C: ConnectionTrait>(
    conn: &C,
    tx: &transaction::Model,
    amount: Decimal,
    now: NaiveDateTime,
) -> Result<PartialPaymentOutcome> {
    if amount <= Decimal::ZERO {
        return Err(ComputeError::NonPositiveAmount);
    }
    if !tx.is_installment_plan {
        return Err(ComputeError::NotInstallmentPlan);
    }

    let pending = TransactionInstallment::find()
        .filter(transaction_installment::Column::TransactionId.eq(tx.id))
        .filter(transaction_installment::Column::Status.eq(InstallmentStatus::Pending))
        .order_by_asc(transaction_installment::Column::InstallmentNumber)
        .all(conn)
        .await?;
    if pending.is_empty() {
        return Err(ComputeError::NoPendingInstallments);
    }

    let mut remaining = amount;
    let mut paid = Vec::new();
    for installment in pending {
        if remaining < installment.amount {
            break;
        }
        remaining -= installment.amount;
        paid.push(pay_installment(conn, &installment, now).await?);
    }

    info!(
        transaction_id = tx.id,
        paid_count = paid.len(),
        remaining = %remaining,
        "partial payment applied"
    );
    Ok(PartialPaymentOutcome {
        paid,
        applied_amount: amount - remaining,
        remaining_amount: remaining,
    })
}
