//! Shared fixtures for the engine tests: an in-memory SQLite store plus
//! builders for the entities the scenarios need.

use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use model::entities::{
    debt::{self, DebtStatus},
    debtor,
    subscription::{self, BillingPeriod},
    transaction::{self, InstallmentPeriod, TransactionKind},
    user,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

use crate::installment::split_amount;

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None).await.expect("Migrations failed");
    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        api_token: Set(format!("token-{username}")),
        password_reset_token: Set(None),
        password_reset_expires_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

pub async fn create_debtor(db: &DatabaseConnection, owner_id: i32, name: &str) -> debtor::Model {
    debtor::ActiveModel {
        name: Set(name.to_string()),
        email: Set(None),
        phone: Set(None),
        owner_id: Set(owner_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create debtor")
}

pub async fn create_debt(
    db: &DatabaseConnection,
    debtor_id: i32,
    total_amount: Decimal,
) -> debt::Model {
    debt::ActiveModel {
        description: Set("Test debt".to_string()),
        total_amount: Set(total_amount),
        due_date: Set(None),
        status: Set(DebtStatus::Pending),
        debtor_id: Set(debtor_id),
        category_id: Set(None),
        account_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create debt")
}

pub async fn create_transaction(
    db: &DatabaseConnection,
    owner_id: i32,
    description: &str,
    amount: Decimal,
    date: NaiveDate,
    kind: TransactionKind,
) -> transaction::Model {
    transaction::ActiveModel {
        description: Set(description.to_string()),
        amount: Set(amount),
        date: Set(date),
        kind: Set(kind),
        is_recurring: Set(false),
        subscription_id: Set(None),
        is_installment_plan: Set(false),
        installment_count: Set(None),
        installment_period: Set(None),
        installment_amount: Set(None),
        first_installment_date: Set(None),
        owner_id: Set(owner_id),
        category_id: Set(None),
        account_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create transaction")
}

/// An expense transaction carrying an installment plan. The installment rows
/// themselves are created by `installment::materialize_plan`.
pub async fn create_plan(
    db: &DatabaseConnection,
    owner_id: i32,
    amount: Decimal,
    count: i32,
    period: InstallmentPeriod,
    first_date: NaiveDate,
) -> transaction::Model {
    transaction::ActiveModel {
        description: Set("Test plan".to_string()),
        amount: Set(amount),
        date: Set(first_date),
        kind: Set(TransactionKind::Expense),
        is_recurring: Set(false),
        subscription_id: Set(None),
        is_installment_plan: Set(true),
        installment_count: Set(Some(count)),
        installment_period: Set(Some(period)),
        installment_amount: Set(Some(
            split_amount(amount, count).expect("Invalid plan in fixture"),
        )),
        first_installment_date: Set(Some(first_date)),
        owner_id: Set(owner_id),
        category_id: Set(None),
        account_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create plan transaction")
}

pub struct SubscriptionSeed<'a> {
    pub name: &'a str,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub period: BillingPeriod,
    pub start_date: NaiveDate,
    pub next_payment_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

pub async fn create_subscription(
    db: &DatabaseConnection,
    owner_id: i32,
    seed: SubscriptionSeed<'_>,
) -> subscription::Model {
    subscription::ActiveModel {
        name: Set(seed.name.to_string()),
        description: Set(None),
        amount: Set(seed.amount),
        kind: Set(seed.kind),
        period: Set(seed.period),
        start_date: Set(seed.start_date),
        end_date: Set(seed.end_date),
        is_active: Set(seed.is_active),
        next_payment_date: Set(seed.next_payment_date),
        last_processed_at: Set(None),
        owner_id: Set(owner_id),
        category_id: Set(None),
        account_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create subscription")
}
