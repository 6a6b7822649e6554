mod integration_tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::setup_test_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Datelike, Utc};
    use serde_json::{json, Value};

    async fn server() -> TestServer {
        TestServer::new(setup_test_app().await).unwrap()
    }

    /// Signs up a user and returns their bearer token.
    async fn signup(server: &TestServer, username: &str) -> String {
        let response = server
            .post("/api/v1/users")
            .json(&json!({ "username": username }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["token"].as_str().unwrap().to_string()
    }

    async fn create_debtor(server: &TestServer, token: &str, name: &str) -> i64 {
        let response = server
            .post("/api/v1/debtors")
            .authorization_bearer(token)
            .json(&json!({ "name": name }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    async fn create_debt(server: &TestServer, token: &str, debtor_id: i64, total: &str) -> i64 {
        let response = server
            .post("/api/v1/debts")
            .authorization_bearer(token)
            .json(&json!({
                "description": "Borrowed cash",
                "total_amount": total,
                "debtor_id": debtor_id
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    /// Creates a 120.00 expense split into 3 monthly installments from
    /// 2024-01-15 and returns (transaction id, response body).
    async fn create_plan(server: &TestServer, token: &str) -> (i64, Value) {
        let response = server
            .post("/api/v1/transactions")
            .authorization_bearer(token)
            .json(&json!({
                "description": "New laptop",
                "amount": "120.00",
                "date": "2024-01-15",
                "kind": "Expense",
                "is_installment_plan": true,
                "installment_count": 3,
                "installment_period": "Monthly",
                "first_installment_date": "2024-01-15"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        (body.data["id"].as_i64().unwrap(), body.data)
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = server().await;
        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let server = server().await;

        let token = signup(&server, "alice").await;
        assert!(!token.is_empty());

        let response = server
            .post("/api/v1/users/login")
            .json(&json!({ "username": "alice" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["token"].as_str().unwrap(), token);

        let me = server
            .get("/api/v1/users/me")
            .authorization_bearer(&token)
            .await;
        me.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = me.json();
        assert_eq!(body.data["username"], "alice");
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let server = server().await;
        signup(&server, "alice").await;

        let response = server
            .post("/api/v1/users")
            .json(&json!({ "username": "alice" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let server = server().await;
        let response = server.get("/api/v1/accounts").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/accounts")
            .authorization_bearer("not-a-real-token")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_account_crud() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        let response = server
            .post("/api/v1/accounts")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Checking", "kind": "Checking", "balance": "150.00" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let account_id = body.data["id"].as_i64().unwrap();

        // Case-insensitive duplicate is rejected.
        let response = server
            .post("/api/v1/accounts")
            .authorization_bearer(&token)
            .json(&json!({ "name": "checking", "kind": "Cash" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server
            .put(&format!("/api/v1/accounts/{account_id}"))
            .authorization_bearer(&token)
            .json(&json!({ "name": "Main checking" }))
            .await;
        response.assert_status(StatusCode::OK);

        let response = server
            .delete(&format!("/api/v1/accounts/{account_id}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);

        let response = server
            .get(&format!("/api/v1/accounts/{account_id}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cross_user_access_is_not_found() {
        let server = server().await;
        let alice = signup(&server, "alice").await;
        let bob = signup(&server, "bob").await;

        let response = server
            .post("/api/v1/accounts")
            .authorization_bearer(&alice)
            .json(&json!({ "name": "Alice savings", "kind": "Savings" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let account_id = body.data["id"].as_i64().unwrap();

        // Bob sees a 404, not a 403: the API does not reveal the account
        // exists.
        let response = server
            .get(&format!("/api/v1/accounts/{account_id}"))
            .authorization_bearer(&bob)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server
            .delete(&format!("/api/v1/accounts/{account_id}"))
            .authorization_bearer(&bob)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_zero_total_debt_reconciles_to_paid() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        let debt_id = create_debt(&server, &token, debtor_id, "0").await;

        let response = server
            .get(&format!("/api/v1/debts/{debt_id}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["status"], "Paid");
        assert_eq!(body.data["remaining_amount"], "0");
    }

    #[tokio::test]
    async fn test_payments_settle_debt_and_emit_one_income() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        let debt_id = create_debt(&server, &token, debtor_id, "100.00").await;

        let response = server
            .post(&format!("/api/v1/debts/{debt_id}/payments"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "60.00" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["debt"]["status"], "Pending");
        assert_eq!(body.data["debt"]["remaining_amount"], "40.00");

        let response = server
            .post(&format!("/api/v1/debts/{debt_id}/payments"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "40.00" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["debt"]["status"], "Paid");
        assert_eq!(body.data["debt"]["paid_amount"], "100.00");
        assert_eq!(body.data["debt"]["remaining_amount"], "0.00");

        // Exactly one auto-generated income transaction, amount = total.
        let response = server
            .get("/api/v1/transactions")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let transactions = body.data["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["kind"], "Income");
        assert_eq!(transactions[0]["amount"], "100.00");
        assert!(transactions[0]["description"]
            .as_str()
            .unwrap()
            .contains("Alex"));
    }

    #[tokio::test]
    async fn test_invalid_payment_amount_is_rejected() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        let debt_id = create_debt(&server, &token, debtor_id, "100.00").await;

        let response = server
            .post(&format!("/api/v1/debts/{debt_id}/payments"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "0" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_manual_settle_is_one_way() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        let debt_id = create_debt(&server, &token, debtor_id, "80.00").await;

        let response = server
            .put(&format!("/api/v1/debts/{debt_id}"))
            .authorization_bearer(&token)
            .json(&json!({ "status": "PAID" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["status"], "Paid");

        // Settling again conflicts.
        let response = server
            .put(&format!("/api/v1/debts/{debt_id}"))
            .authorization_bearer(&token)
            .json(&json!({ "status": "PAID" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        // And so does downgrading back to pending.
        let response = server
            .put(&format!("/api/v1/debts/{debt_id}"))
            .authorization_bearer(&token)
            .json(&json!({ "status": "PENDING" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        // The settle emitted its income transaction exactly once.
        let response = server
            .get("/api/v1/transactions")
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["transactions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_a_payment_keeps_debt_settled() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        let debt_id = create_debt(&server, &token, debtor_id, "50.00").await;

        let response = server
            .post(&format!("/api/v1/debts/{debt_id}/payments"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "50.00" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let payment_id = body.data["payment"]["id"].as_i64().unwrap();

        let response = server
            .delete(&format!("/api/v1/payments/{payment_id}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        // Figures change, status stays latched.
        assert_eq!(body.data["paid_amount"], "0");
        assert_eq!(body.data["remaining_amount"], "50.00");
        assert_eq!(body.data["status"], "Paid");
    }

    #[tokio::test]
    async fn test_debts_by_status_uses_derived_status() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        create_debt(&server, &token, debtor_id, "100.00").await;
        let paid_id = create_debt(&server, &token, debtor_id, "0").await;

        let response = server
            .get("/api/v1/debts/status/paid")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let paid = body.data.as_array().unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0]["id"].as_i64().unwrap(), paid_id);

        let response = server
            .get("/api/v1/debts/status/bogus")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_installment_plan_schedule() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let (_id, data) = create_plan(&server, &token).await;

        let installments = data["installments"].as_array().unwrap();
        assert_eq!(installments.len(), 3);
        for (index, expected_due) in ["2024-01-15", "2024-02-15", "2024-03-15"]
            .iter()
            .enumerate()
        {
            assert_eq!(installments[index]["amount"], "40.00");
            assert_eq!(installments[index]["due_date"], *expected_due);
            assert_eq!(installments[index]["status"], "Pending");
        }
    }

    #[tokio::test]
    async fn test_installment_count_bounds() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        for count in [1, 49] {
            let response = server
                .post("/api/v1/transactions")
                .authorization_bearer(&token)
                .json(&json!({
                    "description": "Bad plan",
                    "amount": "100.00",
                    "date": "2024-01-15",
                    "kind": "Expense",
                    "is_installment_plan": true,
                    "installment_count": count,
                    "installment_period": "Monthly"
                }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }

        let response = server
            .post("/api/v1/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "description": "Bad plan",
                "amount": "100.00",
                "date": "2024-01-15",
                "kind": "Expense",
                "is_installment_plan": true,
                "installment_count": 3,
                "installment_period": "Quarterly"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pay_single_installment_only_once() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let (plan_id, data) = create_plan(&server, &token).await;
        let installment_id = data["installments"][0]["id"].as_i64().unwrap();

        let path = format!("/api/v1/transactions/{plan_id}/installments/{installment_id}/pay");
        let response = server.put(&path).authorization_bearer(&token).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["status"], "Paid");
        assert!(!body.data["paid_date"].is_null());

        let response = server.put(&path).authorization_bearer(&token).await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_partial_payment_returns_leftover() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let (plan_id, _) = create_plan(&server, &token).await;

        let response = server
            .post(&format!("/api/v1/transactions/{plan_id}/partial-payment"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "50.00" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let paid = body.data["paid_installments"].as_array().unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0]["installment_number"], 1);
        assert_eq!(body.data["applied_amount"], "40.00");
        assert_eq!(body.data["remaining_amount"], "10.00");

        // The other two slices are untouched.
        let response = server
            .get(&format!("/api/v1/transactions/{plan_id}"))
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        let pending: Vec<_> = body.data["installments"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|i| i["status"] == "Pending")
            .collect();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_payment_on_plain_transaction_is_rejected() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        let response = server
            .post("/api/v1/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "description": "Groceries",
                "amount": "20.00",
                "date": "2024-01-15",
                "kind": "Expense"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let tx_id = body.data["id"].as_i64().unwrap();

        let response = server
            .post(&format!("/api/v1/transactions/{tx_id}/partial-payment"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "10.00" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_paying_whole_plan_parks_expense_in_paid_state() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let (plan_id, _) = create_plan(&server, &token).await;

        let response = server
            .put(&format!("/api/v1/transactions/{plan_id}/pay"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["kind"], "Paid");
        assert!(body.data["installments"]
            .as_array()
            .unwrap()
            .iter()
            .all(|i| i["status"] == "Paid"));

        // A paid expense no longer counts in the summary.
        let response = server
            .get("/api/v1/transactions/summary")
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["total_expenses"], "0");
        assert_eq!(body.data["transaction_count"], 0);
    }

    #[tokio::test]
    async fn test_summary_all_time_and_month() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        for (description, amount, date, kind) in [
            ("Salary", "500.00", "2024-01-10", "Income"),
            ("Groceries", "200.00", "2024-01-20", "Expense"),
        ] {
            let response = server
                .post("/api/v1/transactions")
                .authorization_bearer(&token)
                .json(&json!({
                    "description": description,
                    "amount": amount,
                    "date": date,
                    "kind": kind
                }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }
        create_plan(&server, &token).await;

        // All-time: the plan counts through its slices (3 x 40), not its
        // parent amount.
        let response = server
            .get("/api/v1/transactions/summary")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["total_income"], "500.00");
        assert_eq!(body.data["total_expenses"], "320.00");
        assert_eq!(body.data["balance"], "180.00");
        assert_eq!(body.data["transaction_count"], 5);

        // January: only the January slice of the plan counts.
        let response = server
            .get("/api/v1/transactions/summary?month=1&year=2024")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["total_income"], "500.00");
        assert_eq!(body.data["total_expenses"], "240.00");
        assert_eq!(body.data["balance"], "260.00");
        assert_eq!(body.data["transaction_count"], 3);

        let response = server
            .get("/api/v1/transactions/summary?month=13&year=2024")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_subscription_lifecycle() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        let response = server
            .post("/api/v1/subscriptions")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Streaming",
                "amount": "19.99",
                "kind": "Expense",
                "period": "Monthly",
                "start_date": "2024-01-01"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let sub_id = body.data["id"].as_i64().unwrap();
        // First charge one period after the start date.
        assert_eq!(body.data["next_payment_date"], "2024-02-01");
        assert_eq!(body.data["is_active"], true);

        // Duplicate name conflicts.
        let response = server
            .post("/api/v1/subscriptions")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Streaming",
                "amount": "9.99",
                "kind": "Expense",
                "period": "Monthly",
                "start_date": "2024-01-01"
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server
            .patch(&format!("/api/v1/subscriptions/{sub_id}/toggle"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["is_active"], false);

        let response = server
            .delete(&format!("/api/v1/subscriptions/{sub_id}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_processing_materializes_one_occurrence_per_run() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        // Started long ago, so the subscription is months overdue.
        let response = server
            .post("/api/v1/subscriptions")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Gym",
                "amount": "49.90",
                "kind": "Expense",
                "period": "Monthly",
                "start_date": "2024-01-01"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/v1/subscriptions/process")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["processed_count"], 1);
        assert!(body.data["errors"].as_array().unwrap().is_empty());

        // The generated transaction is dated at the fired occurrence, not
        // today.
        let response = server
            .get("/api/v1/transactions")
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        let transactions = body.data["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["date"], "2024-02-01");
        assert_eq!(transactions[0]["is_recurring"], true);

        // Single fire per call: a second run materializes the next month.
        let response = server
            .post("/api/v1/subscriptions/process")
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["processed_count"], 1);
    }

    #[tokio::test]
    async fn test_month_listing_carries_virtual_occurrences() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        // next_payment_date lands one month after today's date.
        let today = Utc::now().date_naive();
        let response = server
            .post("/api/v1/subscriptions")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Cloud storage",
                "amount": "4.99",
                "kind": "Expense",
                "period": "Monthly",
                "start_date": today.to_string()
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let next: chrono::NaiveDate = body.data["next_payment_date"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let response = server
            .get(&format!(
                "/api/v1/transactions?month={}&year={}",
                next.month(),
                next.year()
            ))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let virtuals = body.data["virtual_occurrences"].as_array().unwrap();
        assert_eq!(virtuals.len(), 1);
        assert_eq!(virtuals[0]["is_virtual"], true);
        assert_eq!(virtuals[0]["date"], next.to_string());
        assert!(virtuals[0]["id"].as_str().unwrap().starts_with("virtual-"));

        // Nothing was persisted by the projection.
        assert!(body.data["transactions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upcoming_subscriptions_window() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        let today = Utc::now().date_naive();
        // Due in 3 days (weekly period, started 4 days ago).
        let start = today - chrono::Duration::days(4);
        let response = server
            .post("/api/v1/subscriptions")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Veggie box",
                "amount": "25.00",
                "kind": "Expense",
                "period": "Weekly",
                "start_date": start.to_string()
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .get("/api/v1/subscriptions/upcoming?days=7")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data.as_array().unwrap().len(), 1);

        let response = server
            .get("/api/v1/subscriptions/upcoming?days=2")
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert!(body.data.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recurring_transaction_creates_subscription() {
        let server = server().await;
        let token = signup(&server, "alice").await;

        let response = server
            .post("/api/v1/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "description": "Rent",
                "amount": "1200.00",
                "date": "2024-01-01",
                "kind": "Expense",
                "is_recurring": true,
                "subscription_period": "Monthly"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert!(body.data["subscription_id"].is_i64());

        let response = server
            .get("/api/v1/subscriptions")
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        let subs = body.data.as_array().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0]["name"], "Rent");
    }

    #[tokio::test]
    async fn test_income_transaction_can_settle_a_debt() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        let debt_id = create_debt(&server, &token, debtor_id, "100.00").await;

        let response = server
            .post("/api/v1/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "description": "Alex paid me back",
                "amount": "100.00",
                "date": "2024-03-01",
                "kind": "Income",
                "debt_id": debt_id
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("/api/v1/debts/{debt_id}"))
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["status"], "Paid");
        assert_eq!(body.data["paid_amount"], "100.00");

        // Expense transactions cannot reference a debt.
        let response = server
            .post("/api/v1/transactions")
            .authorization_bearer(&token)
            .json(&json!({
                "description": "Nope",
                "amount": "10.00",
                "date": "2024-03-01",
                "kind": "Expense",
                "debt_id": debt_id
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_debtor_debts_listing_is_reconciled() {
        let server = server().await;
        let token = signup(&server, "alice").await;
        let debtor_id = create_debtor(&server, &token, "Alex").await;
        let debt_id = create_debt(&server, &token, debtor_id, "100.00").await;

        let response = server
            .post(&format!("/api/v1/debts/{debt_id}/payments"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": "25.00" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("/api/v1/debtors/{debtor_id}/debts"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let debts = body.data.as_array().unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0]["paid_amount"], "25.00");
        assert_eq!(debts[0]["remaining_amount"], "75.00");
        assert_eq!(debts[0]["status"], "Pending");
    }
}
