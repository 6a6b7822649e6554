//! Root for all SeaORM entity modules of the bookkeeping ledger: users and
//! the entities they own (accounts, categories, debtors with their debts and
//! payments, subscriptions, transactions and installment slices).

pub mod account;
pub mod category;
pub mod debt;
pub mod debtor;
pub mod payment;
pub mod subscription;
pub mod transaction;
pub mod transaction_installment;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::category::Entity as Category;
    pub use super::debt::Entity as Debt;
    pub use super::debtor::Entity as Debtor;
    pub use super::payment::Entity as Payment;
    pub use super::subscription::Entity as Subscription;
    pub use super::transaction::Entity as Transaction;
    pub use super::transaction_installment::Entity as TransactionInstallment;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn create_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            username: Set(username.to_string()),
            api_token: Set(format!("token-{username}")),
            password_reset_token: Set(None),
            password_reset_expires_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let user1 = create_user(&db, "user1").await?;
        let user2 = create_user(&db, "user2").await?;

        let account = account::ActiveModel {
            name: Set("Checking".to_string()),
            kind: Set(account::AccountKind::Checking),
            balance: Set(Decimal::new(150000, 2)),
            owner_id: Set(user1.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let groceries = category::ActiveModel {
            name: Set("Groceries".to_string()),
            color: Set("#4caf50".to_string()),
            owner_id: Set(user1.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let debtor = debtor::ActiveModel {
            name: Set("Alex".to_string()),
            email: Set(Some("alex@example.com".to_string())),
            phone: Set(None),
            owner_id: Set(user1.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let debt = debt::ActiveModel {
            description: Set("Lent for concert tickets".to_string()),
            total_amount: Set(Decimal::new(10000, 2)),
            due_date: Set(None),
            status: Set(debt::DebtStatus::Pending),
            debtor_id: Set(debtor.id),
            category_id: Set(None),
            account_id: Set(Some(account.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        payment::ActiveModel {
            debt_id: Set(debt.id),
            amount: Set(Decimal::new(4000, 2)),
            payment_date: Set(Utc::now().naive_utc()),
            notes: Set(Some("first half".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let subscription = subscription::ActiveModel {
            name: Set("Streaming".to_string()),
            description: Set(None),
            amount: Set(Decimal::new(1999, 2)),
            kind: Set(transaction::TransactionKind::Expense),
            period: Set(subscription::BillingPeriod::Monthly),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end_date: Set(None),
            is_active: Set(true),
            next_payment_date: Set(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            last_processed_at: Set(None),
            owner_id: Set(user1.id),
            category_id: Set(Some(groceries.id)),
            account_id: Set(Some(account.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let plan = transaction::ActiveModel {
            description: Set("New laptop".to_string()),
            amount: Set(Decimal::new(120000, 2)),
            date: Set(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            kind: Set(transaction::TransactionKind::Expense),
            is_recurring: Set(false),
            subscription_id: Set(None),
            is_installment_plan: Set(true),
            installment_count: Set(Some(3)),
            installment_period: Set(Some(transaction::InstallmentPeriod::Monthly)),
            installment_amount: Set(Some(Decimal::new(40000, 2))),
            first_installment_date: Set(Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())),
            owner_id: Set(user1.id),
            category_id: Set(Some(groceries.id)),
            account_id: Set(Some(account.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        transaction_installment::ActiveModel {
            transaction_id: Set(plan.id),
            installment_number: Set(1),
            amount: Set(Decimal::new(40000, 2)),
            due_date: Set(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            status: Set(transaction_installment::InstallmentStatus::Pending),
            paid_date: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // A recurring transaction generated from the subscription.
        transaction::ActiveModel {
            description: Set("Streaming - automatic charge".to_string()),
            amount: Set(Decimal::new(1999, 2)),
            date: Set(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            kind: Set(transaction::TransactionKind::Expense),
            is_recurring: Set(true),
            subscription_id: Set(Some(subscription.id)),
            is_installment_plan: Set(false),
            installment_count: Set(None),
            installment_period: Set(None),
            installment_amount: Set(None),
            first_installment_date: Set(None),
            owner_id: Set(user1.id),
            category_id: Set(Some(groceries.id)),
            account_id: Set(Some(account.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify ownership scoping works through filters.
        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 2);
        assert!(users.iter().any(|u| u.username == "user1"));
        assert!(users.iter().any(|u| u.username == "user2"));

        let user1_debtors = Debtor::find()
            .filter(debtor::Column::OwnerId.eq(user1.id))
            .all(&db)
            .await?;
        assert_eq!(user1_debtors.len(), 1);

        let user2_debtors = Debtor::find()
            .filter(debtor::Column::OwnerId.eq(user2.id))
            .all(&db)
            .await?;
        assert!(user2_debtors.is_empty());

        let debt_payments = debt.find_related(Payment).all(&db).await?;
        assert_eq!(debt_payments.len(), 1);
        assert_eq!(debt_payments[0].amount, Decimal::new(4000, 2));

        let plan_installments = plan.find_related(TransactionInstallment).all(&db).await?;
        assert_eq!(plan_installments.len(), 1);

        let generated = Transaction::find()
            .filter(transaction::Column::SubscriptionId.eq(subscription.id))
            .all(&db)
            .await?;
        assert_eq!(generated.len(), 1);
        assert!(generated[0].is_recurring);

        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_account_nulls_transaction_reference() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let user = create_user(&db, "user1").await?;

        let account = account::ActiveModel {
            name: Set("Cash".to_string()),
            kind: Set(account::AccountKind::Cash),
            balance: Set(Decimal::ZERO),
            owner_id: Set(user.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let tx = transaction::ActiveModel {
            description: Set("Coffee".to_string()),
            amount: Set(Decimal::new(450, 2)),
            date: Set(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            kind: Set(transaction::TransactionKind::Expense),
            is_recurring: Set(false),
            subscription_id: Set(None),
            is_installment_plan: Set(false),
            installment_count: Set(None),
            installment_period: Set(None),
            installment_amount: Set(None),
            first_installment_date: Set(None),
            owner_id: Set(user.id),
            category_id: Set(None),
            account_id: Set(Some(account.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        Account::delete_by_id(account.id).exec(&db).await?;

        let survivor = Transaction::find_by_id(tx.id).one(&db).await?.unwrap();
        assert_eq!(survivor.account_id, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_debtor_cascades_to_debts_and_payments() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let user = create_user(&db, "user1").await?;

        let debtor = debtor::ActiveModel {
            name: Set("Sam".to_string()),
            email: Set(None),
            phone: Set(None),
            owner_id: Set(user.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let debt = debt::ActiveModel {
            description: Set("Dinner".to_string()),
            total_amount: Set(Decimal::new(5000, 2)),
            due_date: Set(None),
            status: Set(debt::DebtStatus::Pending),
            debtor_id: Set(debtor.id),
            category_id: Set(None),
            account_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        payment::ActiveModel {
            debt_id: Set(debt.id),
            amount: Set(Decimal::new(2500, 2)),
            payment_date: Set(Utc::now().naive_utc()),
            notes: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        Debtor::delete_by_id(debtor.id).exec(&db).await?;

        assert!(Debt::find_by_id(debt.id).one(&db).await?.is_none());
        assert!(Payment::find().all(&db).await?.is_empty());

        Ok(())
    }
}
