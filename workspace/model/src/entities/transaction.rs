use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{account, category, subscription, user};

/// Direction of a money movement.
///
/// `Paid` is a terminal state for expenses: an expense whose installment plan
/// has been fully settled transitions to `Paid` and stops contributing to
/// expense totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum TransactionKind {
    #[sea_orm(string_value = "Income")]
    Income,
    #[sea_orm(string_value = "Expense")]
    Expense,
    #[sea_orm(string_value = "Paid")]
    Paid,
}

/// Frequency of an installment plan's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum InstallmentPeriod {
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    #[sea_orm(string_value = "Weekly")]
    Weekly,
}

/// A dated money movement owned by one user.
///
/// A transaction can additionally be: auto-generated from a subscription
/// (`is_recurring` + `subscription_id`), or the parent of an installment
/// plan (`is_installment_plan` + the `installment_*` fields, with one
/// `transaction_installment` row per scheduled slice).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    #[sea_orm(default_value = "false")]
    pub is_recurring: bool,
    /// Set when this transaction was materialized from a subscription.
    pub subscription_id: Option<i32>,
    #[sea_orm(default_value = "false")]
    pub is_installment_plan: bool,
    pub installment_count: Option<i32>,
    pub installment_period: Option<InstallmentPeriod>,
    /// Per-slice amount: `amount / installment_count`, no remainder
    /// redistribution.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub installment_amount: Option<Decimal>,
    pub first_installment_date: Option<NaiveDate>,
    pub owner_id: i32,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "SetNull"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id",
        on_delete = "SetNull"
    )]
    Subscription,
    #[sea_orm(has_many = "super::transaction_installment::Entity")]
    Installment,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl Related<super::transaction_installment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
