//! Debt reconciliation: derives a debt's paid/remaining amounts and status
//! from its payments, and owns the settlement side effects.
//!
//! The stored status is a one-way latch. `reconcile` never downgrades a
//! `Paid` debt back to `Pending`, no matter what the payment rows say; the
//! only transitions are Pending -> Paid, either by payments covering the
//! total or by an explicit manual settle. Both settlement paths emit exactly
//! one auto-generated income transaction recording the collected receivable.

use chrono::{NaiveDate, NaiveDateTime};
use model::entities::{
    debt::{self, DebtStatus},
    debtor, payment,
    prelude::Payment,
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info};

use crate::error::{ComputeError, Result};

/// Derived monetary state of a debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtFigures {
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: DebtStatus,
}

/// Computes `{paid, remaining, status}` for a debt from its payment rows.
///
/// Pure: calling it twice on the same input yields the same output. A stored
/// `Paid` status is sticky; otherwise the debt is `Paid` exactly when the
/// remaining amount is zero or negative (a zero-total debt is trivially
/// paid).
pub fn reconcile(
    total_amount: Decimal,
    stored_status: DebtStatus,
    payments: &[payment::Model],
) -> DebtFigures {
    let paid_amount: Decimal = payments.iter().map(|p| p.amount).sum();
    let remaining_amount = total_amount - paid_amount;

    let calculated = if remaining_amount <= Decimal::ZERO {
        DebtStatus::Paid
    } else {
        DebtStatus::Pending
    };
    let status = match stored_status {
        DebtStatus::Paid => DebtStatus::Paid,
        DebtStatus::Pending => calculated,
    };

    DebtFigures {
        paid_amount,
        remaining_amount,
        status,
    }
}

/// Outcome of recording a payment against a debt.
#[derive(Debug)]
pub struct PaymentOutcome {
    pub payment: payment::Model,
    pub debt: debt::Model,
    pub figures: DebtFigures,
    /// The auto-generated income transaction, present only when this payment
    /// settled the debt.
    pub collected: Option<transaction::Model>,
}

/// Records a payment and settles the debt when the payments now cover the
/// total.
///
/// Runs against whatever connection the caller provides; handlers pass an
/// open store transaction so the payment insert, the status flip and the
/// income transaction land atomically. The income transaction is emitted at
/// most once per debt: only on the Pending -> Paid transition.
pub async fn record_payment<C: ConnectionTrait>(
    conn: &C,
    debt: &debt::Model,
    debtor: &debtor::Model,
    amount: Decimal,
    payment_date: NaiveDateTime,
    notes: Option<String>,
    today: NaiveDate,
) -> Result<PaymentOutcome> {
    if amount <= Decimal::ZERO {
        return Err(ComputeError::NonPositiveAmount);
    }

    let inserted = payment::ActiveModel {
        debt_id: Set(debt.id),
        amount: Set(amount),
        payment_date: Set(payment_date),
        notes: Set(notes),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let payments = Payment::find()
        .filter(payment::Column::DebtId.eq(debt.id))
        .order_by_asc(payment::Column::Id)
        .all(conn)
        .await?;
    let figures = reconcile(debt.total_amount, debt.status, &payments);

    debug!(
        debt_id = debt.id,
        paid = %figures.paid_amount,
        remaining = %figures.remaining_amount,
        "payment recorded"
    );

    // The latch only transitions one way; a debt that was already Paid never
    // re-emits the income transaction.
    if figures.status == DebtStatus::Paid && debt.status == DebtStatus::Pending {
        let (settled, collected) = transition_to_paid(conn, debt, debtor, today).await?;
        info!(
            debt_id = settled.id,
            debtor = %debtor.name,
            "debt settled by payment"
        );
        return Ok(PaymentOutcome {
            payment: inserted,
            debt: settled,
            figures,
            collected: Some(collected),
        });
    }

    Ok(PaymentOutcome {
        payment: inserted,
        debt: debt.clone(),
        figures,
        collected: None,
    })
}

/// Manually marks a debt as paid, regardless of its remaining amount.
///
/// Fails with [`ComputeError::AlreadySettled`] when the debt is already paid;
/// otherwise flips the status and emits the same auto-generated income
/// transaction the payment path produces.
pub async fn settle<C: ConnectionTrait>(
    conn: &C,
    debt: &debt::Model,
    debtor: &debtor::Model,
    today: NaiveDate,
) -> Result<(debt::Model, transaction::Model)> {
    if debt.status == DebtStatus::Paid {
        return Err(ComputeError::AlreadySettled);
    }

    let (settled, collected) = transition_to_paid(conn, debt, debtor, today).await?;
    info!(debt_id = settled.id, debtor = %debtor.name, "debt manually settled");
    Ok((settled, collected))
}

/// Flips the stored status to Paid and inserts the receivable-collected
/// income transaction. The transaction is intentionally unlinked: it carries
/// the debtor's name in the description but no debt or category reference.
async fn transition_to_paid<C: ConnectionTrait>(
    conn: &C,
    debt: &debt::Model,
    debtor: &debtor::Model,
    today: NaiveDate,
) -> Result<(debt::Model, transaction::Model)> {
    let mut active: debt::ActiveModel = debt.clone().into();
    active.status = Set(DebtStatus::Paid);
    let settled = active.update(conn).await?;

    let collected = transaction::ActiveModel {
        description: Set(format!("Debt collected: {}", debtor.name)),
        amount: Set(debt.total_amount),
        date: Set(today),
        kind: Set(TransactionKind::Income),
        is_recurring: Set(false),
        subscription_id: Set(None),
        is_installment_plan: Set(false),
        installment_count: Set(None),
        installment_period: Set(None),
        installment_amount: Set(None),
        first_installment_date: Set(None),
        owner_id: Set(debtor.owner_id),
        category_id: Set(None),
        account_id: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok((settled, collected))
}
