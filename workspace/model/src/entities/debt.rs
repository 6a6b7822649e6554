use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{account, category, debtor};

/// Settlement state of a debt.
///
/// The stored status is a one-way latch: once `Paid` — whether by payments
/// covering the total or by an explicit manual settle — reconciliation never
/// reverts it to `Pending`, even if payments are later deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum DebtStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Paid")]
    Paid,
}

/// An amount a debtor owes the user, reconciled against its payments.
///
/// `paid_amount` and `remaining_amount` are not stored; they are derived from
/// the payment rows by the reconciliation engine on every read.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub status: DebtStatus,
    pub debtor_id: i32,
    pub category_id: Option<i32>,
    pub account_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::debtor::Entity",
        from = "Column::DebtorId",
        to = "super::debtor::Column::Id",
        on_delete = "Cascade"
    )]
    Debtor,
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
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<debtor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debtor.def()
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

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
