//! Recurring subscription projection.
//!
//! Two faces: the materializing processor, which turns due subscriptions
//! into real transactions and advances their next-payment pointer, and the
//! virtual projector, which computes non-persisted occurrences for a bounded
//! window so summaries and calendars can show the future without writing it.

use chrono::{Days, Months, NaiveDate};
use common::{ProcessingError, ProcessingReport, VirtualOccurrence};
use model::entities::{
    prelude::Subscription,
    subscription::{self, BillingPeriod},
    transaction,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::error::{ComputeError, Result};

/// Advances a date by one billing period.
///
/// Monthly and yearly steps use calendar arithmetic (end-of-month clamped),
/// so Jan 31 -> Feb 29 -> Mar 29 rather than skipping short months.
pub fn next_occurrence(base: NaiveDate, period: BillingPeriod) -> Result<NaiveDate> {
    let next = match period {
        BillingPeriod::Daily => base.checked_add_days(Days::new(1)),
        BillingPeriod::Weekly => base.checked_add_days(Days::new(7)),
        BillingPeriod::Monthly => base.checked_add_months(Months::new(1)),
        BillingPeriod::Yearly => base.checked_add_months(Months::new(12)),
    };
    next.ok_or_else(|| ComputeError::Date(format!("occurrence out of range after {base}")))
}

/// Materializes every due subscription once.
///
/// Selects active subscriptions with `next_payment_date <= today` that have
/// not ended, and fires each one exactly once per call — an overdue
/// subscription catches up one occurrence per run, never all at once. Each
/// subscription runs in its own store transaction; a failure is logged and
/// reported without aborting the rest of the batch.
pub async fn process_due<C>(
    db: &C,
    today: NaiveDate,
    owner_id: Option<i32>,
) -> Result<ProcessingReport>
where
    C: ConnectionTrait + TransactionTrait,
{
    let mut query = Subscription::find()
        .filter(subscription::Column::IsActive.eq(true))
        .filter(subscription::Column::NextPaymentDate.lte(today))
        .filter(
            Condition::any()
                .add(subscription::Column::EndDate.is_null())
                .add(subscription::Column::EndDate.gte(today)),
        );
    if let Some(owner_id) = owner_id {
        query = query.filter(subscription::Column::OwnerId.eq(owner_id));
    }
    let due = query
        .order_by_asc(subscription::Column::Id)
        .all(db)
        .await?;

    debug!(count = due.len(), "subscriptions due for processing");

    let mut report = ProcessingReport::default();
    for sub in due {
        match process_one(db, &sub).await {
            Ok(Some(tx)) => {
                info!(
                    subscription_id = sub.id,
                    transaction_id = tx.id,
                    fired_on = %tx.date,
                    "subscription processed"
                );
                report.processed_count += 1;
            }
            Ok(None) => {
                // Another processor advanced this row first; nothing to do.
                debug!(subscription_id = sub.id, "subscription already advanced, skipping");
            }
            Err(err) => {
                warn!(subscription_id = sub.id, error = %err, "failed to process subscription");
                report.errors.push(ProcessingError {
                    subscription_id: sub.id,
                    subscription_name: sub.name.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Fires one subscription occurrence inside a store transaction.
///
/// The advance is conditional on the `next_payment_date` we read: if a
/// concurrent run already moved the pointer, zero rows match and this run
/// backs off without creating a transaction, so a due date can never fire
/// twice.
async fn process_one<C>(db: &C, sub: &subscription::Model) -> Result<Option<transaction::Model>>
where
    C: ConnectionTrait + TransactionTrait,
{
    let fired_on = sub.next_payment_date;
    let next = next_occurrence(fired_on, sub.period)?;

    let txn = db.begin().await?;

    let advanced = Subscription::update_many()
        .col_expr(subscription::Column::NextPaymentDate, Expr::value(next))
        .col_expr(subscription::Column::LastProcessedAt, Expr::value(fired_on))
        .filter(subscription::Column::Id.eq(sub.id))
        .filter(subscription::Column::NextPaymentDate.eq(fired_on))
        .exec(&txn)
        .await?;
    if advanced.rows_affected == 0 {
        txn.rollback().await?;
        return Ok(None);
    }

    let tx = transaction::ActiveModel {
        description: Set(format!("{} - automatic charge", sub.name)),
        amount: Set(sub.amount),
        date: Set(fired_on),
        kind: Set(sub.kind),
        is_recurring: Set(true),
        subscription_id: Set(Some(sub.id)),
        is_installment_plan: Set(false),
        installment_count: Set(None),
        installment_period: Set(None),
        installment_amount: Set(None),
        first_installment_date: Set(None),
        owner_id: Set(sub.owner_id),
        category_id: Set(sub.category_id),
        account_id: Set(sub.account_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(Some(tx))
}

/// Computes the virtual occurrences of the given subscriptions inside
/// `[start, end]`.
///
/// Read-only and pure over the models: nothing is persisted and the
/// subscriptions' pointers are left untouched. Occurrences before `start`
/// are skipped, the walk stops past `end` or past the subscription's own
/// `end_date`.
pub fn project_virtual(
    subscriptions: &[subscription::Model],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<VirtualOccurrence> {
    let mut occurrences = Vec::new();
    for sub in subscriptions {
        if !sub.is_active || sub.start_date > end {
            continue;
        }

        let mut date = sub.next_payment_date;
        loop {
            if date > end {
                break;
            }
            if let Some(end_date) = sub.end_date {
                if date > end_date {
                    break;
                }
            }
            if date >= start {
                occurrences.push(VirtualOccurrence::new(
                    sub.id,
                    sub.name.clone(),
                    sub.amount,
                    format!("{:?}", sub.kind),
                    date,
                ));
            }
            date = match next_occurrence(date, sub.period) {
                Ok(next) => next,
                Err(_) => break,
            };
        }
    }
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_subscription, create_user, setup_db, SubscriptionSeed};
    use model::entities::{prelude::Transaction, transaction::TransactionKind};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_occurrence_steps_by_period() {
        let base = date(2024, 1, 31);
        assert_eq!(
            next_occurrence(base, BillingPeriod::Daily).unwrap(),
            date(2024, 2, 1)
        );
        assert_eq!(
            next_occurrence(base, BillingPeriod::Weekly).unwrap(),
            date(2024, 2, 7)
        );
        // Calendar month arithmetic clamps to the end of February.
        assert_eq!(
            next_occurrence(base, BillingPeriod::Monthly).unwrap(),
            date(2024, 2, 29)
        );
        assert_eq!(
            next_occurrence(base, BillingPeriod::Yearly).unwrap(),
            date(2025, 1, 31)
        );
    }

    #[tokio::test]
    async fn overdue_subscription_fires_once_per_call() {
        let db = setup_db().await;
        let user = create_user(&db, "erin").await;
        let sub = create_subscription(
            &db,
            user.id,
            SubscriptionSeed {
                name: "Gym",
                amount: Decimal::new(4990, 2),
                kind: TransactionKind::Expense,
                period: BillingPeriod::Monthly,
                start_date: date(2023, 12, 1),
                next_payment_date: date(2024, 1, 1),
                end_date: None,
                is_active: true,
            },
        )
        .await;

        // Three months overdue: a single run materializes only the oldest
        // occurrence.
        let today = date(2024, 3, 15);
        let report = process_due(&db, today, None).await.unwrap();
        assert_eq!(report.processed_count, 1);
        assert!(report.errors.is_empty());

        let created = Transaction::find().all(&db).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].date, date(2024, 1, 1));
        assert!(created[0].is_recurring);
        assert_eq!(created[0].subscription_id, Some(sub.id));
        assert_eq!(created[0].kind, TransactionKind::Expense);

        let advanced = Subscription::find_by_id(sub.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(advanced.next_payment_date, date(2024, 2, 1));
        assert_eq!(advanced.last_processed_at, Some(date(2024, 1, 1)));

        // A second run fires the next missed month, nothing more.
        let report = process_due(&db, today, None).await.unwrap();
        assert_eq!(report.processed_count, 1);
        let created = Transaction::find().all(&db).await.unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().any(|t| t.date == date(2024, 2, 1)));
    }

    #[tokio::test]
    async fn inactive_future_and_ended_subscriptions_are_skipped() {
        let db = setup_db().await;
        let user = create_user(&db, "erin").await;
        create_subscription(
            &db,
            user.id,
            SubscriptionSeed {
                name: "Paused",
                amount: Decimal::new(1000, 2),
                kind: TransactionKind::Expense,
                period: BillingPeriod::Monthly,
                start_date: date(2024, 1, 1),
                next_payment_date: date(2024, 1, 1),
                end_date: None,
                is_active: false,
            },
        )
        .await;
        create_subscription(
            &db,
            user.id,
            SubscriptionSeed {
                name: "Not due yet",
                amount: Decimal::new(1000, 2),
                kind: TransactionKind::Expense,
                period: BillingPeriod::Monthly,
                start_date: date(2024, 1, 1),
                next_payment_date: date(2024, 6, 1),
                end_date: None,
                is_active: true,
            },
        )
        .await;
        create_subscription(
            &db,
            user.id,
            SubscriptionSeed {
                name: "Ended",
                amount: Decimal::new(1000, 2),
                kind: TransactionKind::Expense,
                period: BillingPeriod::Monthly,
                start_date: date(2023, 1, 1),
                next_payment_date: date(2024, 1, 1),
                end_date: Some(date(2024, 2, 1)),
                is_active: true,
            },
        )
        .await;

        let report = process_due(&db, date(2024, 3, 15), None).await.unwrap();
        assert_eq!(report.processed_count, 0);
        assert!(Transaction::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_filter_limits_the_batch() {
        let db = setup_db().await;
        let erin = create_user(&db, "erin").await;
        let frank = create_user(&db, "frank").await;
        for (user, name) in [(&erin, "Erin sub"), (&frank, "Frank sub")] {
            create_subscription(
                &db,
                user.id,
                SubscriptionSeed {
                    name,
                    amount: Decimal::new(1000, 2),
                    kind: TransactionKind::Expense,
                    period: BillingPeriod::Monthly,
                    start_date: date(2024, 1, 1),
                    next_payment_date: date(2024, 2, 1),
                    end_date: None,
                    is_active: true,
                },
            )
            .await;
        }

        let report = process_due(&db, date(2024, 2, 15), Some(erin.id))
            .await
            .unwrap();
        assert_eq!(report.processed_count, 1);

        let created = Transaction::find().all(&db).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].owner_id, erin.id);
    }

    #[tokio::test]
    async fn virtual_projection_emits_in_window_occurrences_only() {
        let db = setup_db().await;
        let user = create_user(&db, "erin").await;
        let sub = create_subscription(
            &db,
            user.id,
            SubscriptionSeed {
                name: "Streaming",
                amount: Decimal::new(1999, 2),
                kind: TransactionKind::Expense,
                period: BillingPeriod::Monthly,
                start_date: date(2023, 12, 1),
                next_payment_date: date(2024, 1, 1),
                end_date: None,
                is_active: true,
            },
        )
        .await;

        let occurrences =
            project_virtual(std::slice::from_ref(&sub), date(2024, 1, 1), date(2024, 3, 31));
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[0].date, date(2024, 1, 1));
        assert_eq!(occurrences[1].date, date(2024, 2, 1));
        assert_eq!(occurrences[2].date, date(2024, 3, 1));
        assert!(occurrences.iter().all(|o| o.is_virtual));
        assert_eq!(occurrences[0].id, format!("virtual-{}-2024-01-01", sub.id));

        // Nothing was persisted and the pointer did not move.
        assert!(Transaction::find().all(&db).await.unwrap().is_empty());
        let unchanged = Subscription::find_by_id(sub.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.next_payment_date, date(2024, 1, 1));
    }

    #[tokio::test]
    async fn virtual_projection_skips_occurrences_before_window() {
        let db = setup_db().await;
        let user = create_user(&db, "erin").await;
        let sub = create_subscription(
            &db,
            user.id,
            SubscriptionSeed {
                name: "Weekly box",
                amount: Decimal::new(2500, 2),
                kind: TransactionKind::Expense,
                period: BillingPeriod::Weekly,
                start_date: date(2024, 1, 1),
                next_payment_date: date(2024, 1, 1),
                end_date: None,
                is_active: true,
            },
        )
        .await;

        let occurrences =
            project_virtual(std::slice::from_ref(&sub), date(2024, 1, 20), date(2024, 1, 31));
        // Jan 1/8/15 fall before the window; Jan 22 and 29 are inside.
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].date, date(2024, 1, 22));
        assert_eq!(occurrences[1].date, date(2024, 1, 29));
    }

    #[tokio::test]
    async fn virtual_projection_respects_subscription_end_date() {
        let db = setup_db().await;
        let user = create_user(&db, "erin").await;
        let sub = create_subscription(
            &db,
            user.id,
            SubscriptionSeed {
                name: "Ending",
                amount: Decimal::new(1000, 2),
                kind: TransactionKind::Income,
                period: BillingPeriod::Monthly,
                start_date: date(2024, 1, 1),
                next_payment_date: date(2024, 1, 1),
                end_date: Some(date(2024, 2, 15)),
                is_active: true,
            },
        )
        .await;

        let occurrences =
            project_virtual(std::slice::from_ref(&sub), date(2024, 1, 1), date(2024, 6, 30));
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences.last().unwrap().date, date(2024, 2, 1));
    }
}
