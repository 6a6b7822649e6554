use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::login,
        crate::handlers::users::me,
        crate::handlers::accounts::create_account,
        crate::handlers::accounts::get_accounts,
        crate::handlers::accounts::get_account,
        crate::handlers::accounts::update_account,
        crate::handlers::accounts::delete_account,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::debtors::create_debtor,
        crate::handlers::debtors::get_debtors,
        crate::handlers::debtors::get_debtor,
        crate::handlers::debtors::get_debtor_debts,
        crate::handlers::debtors::update_debtor,
        crate::handlers::debtors::delete_debtor,
        crate::handlers::debts::create_debt,
        crate::handlers::debts::get_debts,
        crate::handlers::debts::get_debt,
        crate::handlers::debts::get_debts_by_status,
        crate::handlers::debts::update_debt,
        crate::handlers::debts::delete_debt,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::get_debt_payments,
        crate::handlers::payments::delete_payment,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::update_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::transactions::get_summary,
        crate::handlers::transactions::pay_transaction,
        crate::handlers::transactions::pay_transaction_installment,
        crate::handlers::transactions::create_partial_payment,
        crate::handlers::subscriptions::create_subscription,
        crate::handlers::subscriptions::get_subscriptions,
        crate::handlers::subscriptions::get_subscription,
        crate::handlers::subscriptions::update_subscription,
        crate::handlers::subscriptions::delete_subscription,
        crate::handlers::subscriptions::toggle_subscription,
        crate::handlers::subscriptions::process_subscriptions,
        crate::handlers::subscriptions::get_upcoming_subscriptions,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            common::FinancialSummary,
            common::SummaryPeriod,
            common::VirtualOccurrence,
            common::ProcessingReport,
            common::ProcessingError,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::LoginRequest,
            crate::handlers::users::AuthTokenResponse,
            crate::handlers::users::UserResponse,
            crate::handlers::accounts::CreateAccountRequest,
            crate::handlers::accounts::UpdateAccountRequest,
            crate::handlers::accounts::AccountResponse,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::debtors::CreateDebtorRequest,
            crate::handlers::debtors::UpdateDebtorRequest,
            crate::handlers::debtors::DebtorResponse,
            crate::handlers::debts::CreateDebtRequest,
            crate::handlers::debts::UpdateDebtRequest,
            crate::handlers::debts::DebtResponse,
            crate::handlers::payments::CreatePaymentRequest,
            crate::handlers::payments::PaymentResponse,
            crate::handlers::payments::PaymentCreatedResponse,
            crate::handlers::transactions::CreateTransactionRequest,
            crate::handlers::transactions::UpdateTransactionRequest,
            crate::handlers::transactions::TransactionResponse,
            crate::handlers::transactions::InstallmentResponse,
            crate::handlers::transactions::TransactionListResponse,
            crate::handlers::transactions::PartialPaymentRequest,
            crate::handlers::transactions::PartialPaymentResponse,
            crate::handlers::subscriptions::CreateSubscriptionRequest,
            crate::handlers::subscriptions::UpdateSubscriptionRequest,
            crate::handlers::subscriptions::SubscriptionResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Identity endpoints"),
        (name = "accounts", description = "Account CRUD"),
        (name = "categories", description = "Category CRUD"),
        (name = "debtors", description = "Debtor CRUD"),
        (name = "debts", description = "Debt CRUD and reconciliation"),
        (name = "payments", description = "Payments against debts"),
        (name = "transactions", description = "Transactions, installment plans and summaries"),
        (name = "subscriptions", description = "Recurring subscriptions"),
    ),
    info(
        title = "Finbook API",
        description = "Personal finance bookkeeping API - accounts, transactions, debts and recurring subscriptions",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
