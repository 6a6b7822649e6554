use crate::auth::require_auth;
use crate::handlers::{
    accounts::{create_account, delete_account, get_account, get_accounts, update_account},
    categories::{
        create_category, delete_category, get_categories, get_category, update_category,
    },
    debtors::{
        create_debtor, delete_debtor, get_debtor, get_debtor_debts, get_debtors, update_debtor,
    },
    debts::{
        create_debt, delete_debt, get_debt, get_debts, get_debts_by_status, update_debt,
    },
    health::health_check,
    payments::{create_payment, delete_payment, get_debt_payments},
    subscriptions::{
        create_subscription, delete_subscription, get_subscription, get_subscriptions,
        get_upcoming_subscriptions, process_subscriptions, toggle_subscription,
        update_subscription,
    },
    transactions::{
        create_partial_payment, create_transaction, delete_transaction, get_summary,
        get_transaction, get_transactions, pay_transaction, pay_transaction_installment,
        update_transaction,
    },
    users::{create_user, login, me},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Everything except health, signup and login sits behind the bearer-token
    // middleware.
    let protected = Router::new()
        .route("/api/v1/users/me", get(me))
        // Account CRUD routes
        .route("/api/v1/accounts", post(create_account))
        .route("/api/v1/accounts", get(get_accounts))
        .route("/api/v1/accounts/:account_id", get(get_account))
        .route("/api/v1/accounts/:account_id", put(update_account))
        .route("/api/v1/accounts/:account_id", delete(delete_account))
        // Category CRUD routes
        .route("/api/v1/categories", post(create_category))
        .route("/api/v1/categories", get(get_categories))
        .route("/api/v1/categories/:category_id", get(get_category))
        .route("/api/v1/categories/:category_id", put(update_category))
        .route("/api/v1/categories/:category_id", delete(delete_category))
        // Debtor CRUD routes
        .route("/api/v1/debtors", post(create_debtor))
        .route("/api/v1/debtors", get(get_debtors))
        .route("/api/v1/debtors/:debtor_id", get(get_debtor))
        .route("/api/v1/debtors/:debtor_id", put(update_debtor))
        .route("/api/v1/debtors/:debtor_id", delete(delete_debtor))
        .route("/api/v1/debtors/:debtor_id/debts", get(get_debtor_debts))
        // Debt CRUD and reconciliation routes
        .route("/api/v1/debts", post(create_debt))
        .route("/api/v1/debts", get(get_debts))
        .route("/api/v1/debts/status/:status", get(get_debts_by_status))
        .route("/api/v1/debts/:debt_id", get(get_debt))
        .route("/api/v1/debts/:debt_id", put(update_debt))
        .route("/api/v1/debts/:debt_id", delete(delete_debt))
        .route("/api/v1/debts/:debt_id/payments", post(create_payment))
        .route("/api/v1/debts/:debt_id/payments", get(get_debt_payments))
        .route("/api/v1/payments/:payment_id", delete(delete_payment))
        // Transaction routes
        .route("/api/v1/transactions", post(create_transaction))
        .route("/api/v1/transactions", get(get_transactions))
        .route("/api/v1/transactions/summary", get(get_summary))
        .route("/api/v1/transactions/:transaction_id", get(get_transaction))
        .route("/api/v1/transactions/:transaction_id", put(update_transaction))
        .route(
            "/api/v1/transactions/:transaction_id",
            delete(delete_transaction),
        )
        .route("/api/v1/transactions/:transaction_id/pay", put(pay_transaction))
        .route(
            "/api/v1/transactions/:transaction_id/installments/:installment_id/pay",
            put(pay_transaction_installment),
        )
        .route(
            "/api/v1/transactions/:transaction_id/partial-payment",
            post(create_partial_payment),
        )
        // Subscription routes
        .route("/api/v1/subscriptions", post(create_subscription))
        .route("/api/v1/subscriptions", get(get_subscriptions))
        .route("/api/v1/subscriptions/process", post(process_subscriptions))
        .route(
            "/api/v1/subscriptions/upcoming",
            get(get_upcoming_subscriptions),
        )
        .route("/api/v1/subscriptions/:subscription_id", get(get_subscription))
        .route("/api/v1/subscriptions/:subscription_id", put(update_subscription))
        .route(
            "/api/v1/subscriptions/:subscription_id",
            delete(delete_subscription),
        )
        .route(
            "/api/v1/subscriptions/:subscription_id/toggle",
            patch(toggle_subscription),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Identity routes issuing tokens
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/login", post(login))
        .merge(protected)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
