use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::Row;

mod support;

#[actix_web::test]
async fn flight_search_caps_free_results_and_records_analytics() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = test_db.pool.clone();

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/flights/search")
        .set_json(json!({
            "from": "Geneva",
            "to": "Tokyo",
            "departureDate": "2025-02-15",
            "premium": false
        }))
        .to_request();

    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let flights = body["flights"].as_array().expect("flights array");
    assert!(flights.len() <= 3);
    assert_eq!(body["total_results"].as_u64().unwrap() as usize, flights.len());
    assert_eq!(body["premium_features_used"], json!(false));
    assert_eq!(body["search_params"]["from"], json!("Geneva"));
    for flight in flights {
        assert_eq!(flight["departure"]["airport"], json!("GEN"));
        assert_eq!(flight["arrival"]["airport"], json!("TOK"));
    }

    let row = sqlx::query(
        "SELECT results_count, premium FROM flight_searches WHERE from_city = 'Geneva'",
    )
    .fetch_one(&pool)
    .await
    .expect("search record persisted");
    assert_eq!(row.get::<i32, _>("results_count") as usize, flights.len());
    assert!(!row.get::<bool, _>("premium"));
}

#[actix_web::test]
async fn flight_search_rejects_malformed_date() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };

    let state = web::Data::new(support::build_state(test_db.pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/flights/search")
        .set_json(json!({
            "from": "Geneva",
            "to": "Tokyo",
            "departureDate": "15-02-2025"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn check_premium_unknown_email_is_404() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };

    let state = web::Data::new(support::build_state(test_db.pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::get()
        .uri("/api/check-premium?email=nobody@example.com")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn google_auth_requires_token_and_creates_user() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = test_db.pool.clone();

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/auth/google")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = TestRequest::post()
        .uri("/api/auth/google")
        .set_json(json!({"id_token": "mock-token"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["email"], json!("user@example.com"));
    assert_eq!(body["name"], json!("Mock User"));

    let row = sqlx::query("SELECT is_premium FROM users WHERE email = 'user@example.com'")
        .fetch_one(&pool)
        .await
        .expect("user created");
    assert!(!row.get::<bool, _>("is_premium"));

    // Second login finds the same account instead of inserting a duplicate.
    let req = TestRequest::post()
        .uri("/api/auth/google")
        .set_json(json!({"id_token": "mock-token"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE email = 'user@example.com'")
        .fetch_one(&pool)
        .await
        .expect("count users")
        .get("n");
    assert_eq!(count, 1);
}

#[actix_web::test]
async fn create_checkout_session_persists_pending_transaction() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = test_db.pool.clone();

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/create-checkout-session")
        .set_json(json!({"package_id": "monthly", "email": "buyer@example.com"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let session_id = body["session_id"].as_str().expect("session id");
    let url = body["url"].as_str().expect("redirect url");
    assert!(url.contains(session_id));

    let row = sqlx::query(
        r#"SELECT email, package_id, amount::text AS amount, currency, payment_status
           FROM payment_transactions WHERE session_id = $1"#,
    )
    .bind(session_id)
    .fetch_one(&pool)
    .await
    .expect("transaction persisted");
    assert_eq!(row.get::<String, _>("email"), "buyer@example.com");
    assert_eq!(row.get::<String, _>("package_id"), "monthly");
    assert_eq!(row.get::<String, _>("amount"), "9.99");
    assert_eq!(row.get::<String, _>("currency"), "usd");
    assert_eq!(row.get::<String, _>("payment_status"), "pending");
}

#[actix_web::test]
async fn create_checkout_session_rejects_unknown_package() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = test_db.pool.clone();

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/create-checkout-session")
        .set_json(json!({"package_id": "platinum"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Rejected before any store write.
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM payment_transactions")
        .fetch_one(&pool)
        .await
        .expect("count transactions")
        .get("n");
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn checkout_status_upgrade_is_idempotent() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = test_db.pool.clone();

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/create-checkout-session")
        .set_json(json!({"package_id": "yearly", "email": "upgrade@example.com"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let session_id = body["session_id"].as_str().expect("session id").to_string();

    // First poll: the mock provider reports paid, completing the transaction
    // and upgrading the buyer.
    let req = TestRequest::get()
        .uri(&format!("/api/payments/checkout/status/{session_id}"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["payment_status"], json!("paid"));
    assert_eq!(body["session_id"], json!(session_id.clone()));

    let row = sqlx::query(
        r#"SELECT is_premium, premium_activated_at, subscription_type
           FROM users WHERE email = 'upgrade@example.com'"#,
    )
    .fetch_one(&pool)
    .await
    .expect("user upserted");
    assert!(row.get::<bool, _>("is_premium"));
    assert_eq!(row.get::<String, _>("subscription_type"), "yearly");
    let first_activation: DateTime<Utc> = row.get("premium_activated_at");

    let tx_status: String =
        sqlx::query("SELECT payment_status FROM payment_transactions WHERE session_id = $1")
            .bind(&session_id)
            .fetch_one(&pool)
            .await
            .expect("transaction")
            .get("payment_status");
    assert_eq!(tx_status, "completed");

    // Second poll: still queries the provider but must not rewrite the user.
    let req = TestRequest::get()
        .uri(&format!("/api/payments/checkout/status/{session_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let second_activation: DateTime<Utc> =
        sqlx::query("SELECT premium_activated_at FROM users WHERE email = 'upgrade@example.com'")
            .fetch_one(&pool)
            .await
            .expect("user still there")
            .get("premium_activated_at");
    assert_eq!(first_activation, second_activation);
}

#[actix_web::test]
async fn webhook_requires_signature_header() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };

    let state = web::Data::new(support::build_state(test_db.pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/webhook/stripe")
        .set_payload(
            serde_json::to_vec(&json!({
                "type": "checkout.session.completed",
                "data": {"object": {"id": "cs_mock_x"}}
            }))
            .unwrap(),
        )
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn webhook_completes_session_and_ignores_unknown_events() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = test_db.pool.clone();

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/create-checkout-session")
        .set_json(json!({"package_id": "monthly", "email": "hook@example.com"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let session_id = body["session_id"].as_str().expect("session id").to_string();

    // Unknown event type: acknowledged, no state change.
    let req = TestRequest::post()
        .uri("/api/webhook/stripe")
        .insert_header(("stripe-signature", "t=1,v1=mock"))
        .set_payload(
            serde_json::to_vec(&json!({
                "type": "invoice.paid",
                "data": {"object": {"id": session_id.clone()}}
            }))
            .unwrap(),
        )
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["event_type"], json!("invoice.paid"));

    let status: String =
        sqlx::query("SELECT payment_status FROM payment_transactions WHERE session_id = $1")
            .bind(&session_id)
            .fetch_one(&pool)
            .await
            .expect("transaction")
            .get("payment_status");
    assert_eq!(status, "pending");

    // Completion event: transaction completes, buyer becomes premium.
    let req = TestRequest::post()
        .uri("/api/webhook/stripe")
        .insert_header(("stripe-signature", "t=1,v1=mock"))
        .set_payload(
            serde_json::to_vec(&json!({
                "type": "checkout.session.completed",
                "data": {"object": {"id": session_id.clone()}}
            }))
            .unwrap(),
        )
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["event_type"], json!("checkout.session.completed"));

    let status: String =
        sqlx::query("SELECT payment_status FROM payment_transactions WHERE session_id = $1")
            .bind(&session_id)
            .fetch_one(&pool)
            .await
            .expect("transaction")
            .get("payment_status");
    assert_eq!(status, "completed");

    let premium: bool = sqlx::query("SELECT is_premium FROM users WHERE email = 'hook@example.com'")
        .fetch_one(&pool)
        .await
        .expect("user upserted")
        .get("is_premium");
    assert!(premium);
}

#[actix_web::test]
async fn verify_session_legacy_path() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = test_db.pool.clone();

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::get()
        .uri("/api/verify-session?session_id=cs_mock_never_issued")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = TestRequest::post()
        .uri("/api/create-checkout-session")
        .set_json(json!({"package_id": "monthly", "email": "legacy@example.com"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let session_id = body["session_id"].as_str().expect("session id").to_string();

    let req = TestRequest::get()
        .uri(&format!("/api/verify-session?session_id={session_id}"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["email"], json!("legacy@example.com"));

    let req = TestRequest::get()
        .uri(&format!("/api/verify-session?session_id={session_id}"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("already_processed"));
}

#[actix_web::test]
async fn status_check_roundtrip() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };

    let state = web::Data::new(support::build_state(test_db.pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(support::api_scope())).await;

    let req = TestRequest::post()
        .uri("/api/status")
        .set_json(json!({"client_name": "integration-test"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["client_name"], json!("integration-test"));
    assert!(body["id"].as_str().is_some());

    let req = TestRequest::get().uri("/api/status").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let checks = body.as_array().expect("status check list");
    assert!(checks
        .iter()
        .any(|c| c["client_name"] == json!("integration-test")));
}
