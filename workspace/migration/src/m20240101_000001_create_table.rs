use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::ApiToken).unique_key())
                    .col(string_null(Users::PasswordResetToken))
                    .col(date_time_null(Users::PasswordResetExpiresAt))
                    .to_owned(),
            )
            .await?;

        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(string(Accounts::Name))
                    .col(string(Accounts::Kind).string_len(20))
                    .col(decimal(Accounts::Balance).decimal_len(16, 4))
                    .col(integer(Accounts::OwnerId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_owner")
                            .from(Accounts::Table, Accounts::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_owner_name")
                    .table(Accounts::Table)
                    .col(Accounts::OwnerId)
                    .col(Accounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(string(Categories::Name))
                    .col(string(Categories::Color))
                    .col(integer(Categories::OwnerId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_owner")
                            .from(Categories::Table, Categories::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_categories_owner_name")
                    .table(Categories::Table)
                    .col(Categories::OwnerId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create debtors table
        manager
            .create_table(
                Table::create()
                    .table(Debtors::Table)
                    .if_not_exists()
                    .col(pk_auto(Debtors::Id))
                    .col(string(Debtors::Name))
                    .col(string_null(Debtors::Email))
                    .col(string_null(Debtors::Phone))
                    .col(integer(Debtors::OwnerId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debtors_owner")
                            .from(Debtors::Table, Debtors::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create subscriptions table
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(pk_auto(Subscriptions::Id))
                    .col(string(Subscriptions::Name))
                    .col(string_null(Subscriptions::Description))
                    .col(decimal(Subscriptions::Amount).decimal_len(16, 4))
                    .col(string(Subscriptions::Kind).string_len(10))
                    .col(string(Subscriptions::Period).string_len(10))
                    .col(date(Subscriptions::StartDate))
                    .col(date_null(Subscriptions::EndDate))
                    .col(boolean(Subscriptions::IsActive).default(true))
                    .col(date(Subscriptions::NextPaymentDate))
                    .col(date_null(Subscriptions::LastProcessedAt))
                    .col(integer(Subscriptions::OwnerId))
                    .col(integer_null(Subscriptions::CategoryId))
                    .col(integer_null(Subscriptions::AccountId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriptions_owner")
                            .from(Subscriptions::Table, Subscriptions::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriptions_category")
                            .from(Subscriptions::Table, Subscriptions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriptions_account")
                            .from(Subscriptions::Table, Subscriptions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_owner_name")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::OwnerId)
                    .col(Subscriptions::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create transactions table
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(string(Transactions::Description))
                    .col(decimal(Transactions::Amount).decimal_len(16, 4))
                    .col(date(Transactions::Date))
                    .col(string(Transactions::Kind).string_len(10))
                    .col(boolean(Transactions::IsRecurring).default(false))
                    .col(integer_null(Transactions::SubscriptionId))
                    .col(boolean(Transactions::IsInstallmentPlan).default(false))
                    .col(integer_null(Transactions::InstallmentCount))
                    .col(string_null(Transactions::InstallmentPeriod).string_len(10))
                    .col(decimal_null(Transactions::InstallmentAmount).decimal_len(16, 4))
                    .col(date_null(Transactions::FirstInstallmentDate))
                    .col(integer(Transactions::OwnerId))
                    .col(integer_null(Transactions::CategoryId))
                    .col(integer_null(Transactions::AccountId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_owner")
                            .from(Transactions::Table, Transactions::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_subscription")
                            .from(Transactions::Table, Transactions::SubscriptionId)
                            .to(Subscriptions::Table, Subscriptions::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_category")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_account")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create debts table
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(pk_auto(Debts::Id))
                    .col(string(Debts::Description))
                    .col(decimal(Debts::TotalAmount).decimal_len(16, 4))
                    .col(date_null(Debts::DueDate))
                    .col(string(Debts::Status).string_len(10))
                    .col(integer(Debts::DebtorId))
                    .col(integer_null(Debts::CategoryId))
                    .col(integer_null(Debts::AccountId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_debtor")
                            .from(Debts::Table, Debts::DebtorId)
                            .to(Debtors::Table, Debtors::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_category")
                            .from(Debts::Table, Debts::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_account")
                            .from(Debts::Table, Debts::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::DebtId))
                    .col(decimal(Payments::Amount).decimal_len(16, 4))
                    .col(date_time(Payments::PaymentDate))
                    .col(string_null(Payments::Notes))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_debt")
                            .from(Payments::Table, Payments::DebtId)
                            .to(Debts::Table, Debts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create transaction_installments table
        manager
            .create_table(
                Table::create()
                    .table(TransactionInstallments::Table)
                    .if_not_exists()
                    .col(pk_auto(TransactionInstallments::Id))
                    .col(integer(TransactionInstallments::TransactionId))
                    .col(integer(TransactionInstallments::InstallmentNumber))
                    .col(decimal(TransactionInstallments::Amount).decimal_len(16, 4))
                    .col(date(TransactionInstallments::DueDate))
                    .col(string(TransactionInstallments::Status).string_len(10))
                    .col(date_time_null(TransactionInstallments::PaidDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_installments_transaction")
                            .from(
                                TransactionInstallments::Table,
                                TransactionInstallments::TransactionId,
                            )
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_installments_plan_number")
                    .table(TransactionInstallments::Table)
                    .col(TransactionInstallments::TransactionId)
                    .col(TransactionInstallments::InstallmentNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(TransactionInstallments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Debtors::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Define identifiers for all tables

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    ApiToken,
    PasswordResetToken,
    PasswordResetExpiresAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Name,
    Kind,
    Balance,
    OwnerId,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Color,
    OwnerId,
}

#[derive(DeriveIden)]
enum Debtors {
    Table,
    Id,
    Name,
    Email,
    Phone,
    OwnerId,
}

#[derive(DeriveIden)]
enum Debts {
    Table,
    Id,
    Description,
    TotalAmount,
    DueDate,
    Status,
    DebtorId,
    CategoryId,
    AccountId,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    DebtId,
    Amount,
    PaymentDate,
    Notes,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    Name,
    Description,
    Amount,
    Kind,
    Period,
    StartDate,
    EndDate,
    IsActive,
    NextPaymentDate,
    LastProcessedAt,
    OwnerId,
    CategoryId,
    AccountId,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    Description,
    Amount,
    Date,
    Kind,
    IsRecurring,
    SubscriptionId,
    IsInstallmentPlan,
    InstallmentCount,
    InstallmentPeriod,
    InstallmentAmount,
    FirstInstallmentDate,
    OwnerId,
    CategoryId,
    AccountId,
}

#[derive(DeriveIden)]
enum TransactionInstallments {
    Table,
    Id,
    TransactionId,
    InstallmentNumber,
    Amount,
    DueDate,
    Status,
    PaidDate,
}
