use actix_web::{http::StatusCode, test::TestRequest};
use payment_providers::{
    PaymentSession,
    Provider,
    ProviderApiError,
    ProviderPaymentStatus,
    VerifiedPayment,
    WebhookEvent,
};
use serde_json::json;
use shop_payment_engine::{db_types::TransactionStatus, SettlementStatus};
use spg_common::Cents;

use crate::endpoint_tests::{
    helpers::{cart, cart_items, recorded, send_request, shopper, transaction, TX_REF},
    mocks::{MockGateways, MockLedger},
};

fn verified(amount: i64, status: ProviderPaymentStatus) -> VerifiedPayment {
    VerifiedPayment { tx_ref: TX_REF.to_string(), amount: Cents::from(amount), currency: "USD".to_string(), status }
}

#[actix_web::test]
async fn health_is_ok() {
    let (status, body) = send_request(MockLedger::new(), MockGateways::new(), TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("👍️"));
}

//----------------------------------------------  Initiate  ----------------------------------------------------

#[actix_web::test]
async fn initiate_opens_a_session_and_records_a_pending_row() {
    let mut db = MockLedger::new();
    db.expect_fetch_user_by_id().returning(|_| Ok(Some(shopper())));
    db.expect_fetch_cart_by_code().withf(|code, user| code == "cart-001" && *user == 7).returning(|_, _| Ok(Some(cart(false))));
    db.expect_fetch_cart_items().returning(|_| Ok(cart_items()));
    db.expect_insert_transaction()
        .withf(|tx| tx.amount == Cents::from(5000) && tx.currency == "USD" && tx.cart_id == 10)
        .returning(|tx| Ok(recorded(tx)));
    let mut gateways = MockGateways::new();
    gateways
        .expect_initiate_session()
        .withf(|provider, req| {
            *provider == Provider::Flutterwave && req.amount == Cents::from(5000) && req.cart_code == "cart-001"
        })
        .returning(|_, req| {
            Ok(PaymentSession {
                reference: req.tx_ref.clone(),
                redirect_url: "https://pay.example.com/hosted/abc".to_string(),
            })
        });
    let req = TestRequest::post()
        .uri("/payments/initiate")
        .insert_header(("x-user-id", "7"))
        .set_json(json!({ "cart_code": "cart-001" }));
    let (status, body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("session_reference"));
    assert!(body.contains("https://pay.example.com/hosted/abc"));
}

#[actix_web::test]
async fn initiate_without_identity_is_unauthorized() {
    // No expectations: the extractor must reject the request before any handler code runs.
    let req = TestRequest::post().uri("/payments/initiate").set_json(json!({ "cart_code": "cart-001" }));
    let (status, body) = send_request(MockLedger::new(), MockGateways::new(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Authentication required"));
}

#[actix_web::test]
async fn initiate_for_an_unknown_cart_is_not_found() {
    let mut db = MockLedger::new();
    db.expect_fetch_user_by_id().returning(|_| Ok(Some(shopper())));
    db.expect_fetch_cart_by_code().returning(|_, _| Ok(None));
    let req = TestRequest::post()
        .uri("/payments/initiate")
        .insert_header(("x-user-id", "7"))
        .set_json(json!({ "cart_code": "no-such-cart" }));
    let (status, body) = send_request(db, MockGateways::new(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("does not exist"));
}

#[actix_web::test]
async fn initiate_refuses_a_paid_cart() {
    let mut db = MockLedger::new();
    db.expect_fetch_user_by_id().returning(|_| Ok(Some(shopper())));
    db.expect_fetch_cart_by_code().returning(|_, _| Ok(Some(cart(true))));
    let req = TestRequest::post()
        .uri("/payments/initiate")
        .insert_header(("x-user-id", "7"))
        .set_json(json!({ "cart_code": "cart-001" }));
    let (status, body) = send_request(db, MockGateways::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already been paid"));
}

#[actix_web::test]
async fn a_provider_outage_leaves_no_ledger_row() {
    let mut db = MockLedger::new();
    db.expect_fetch_user_by_id().returning(|_| Ok(Some(shopper())));
    db.expect_fetch_cart_by_code().returning(|_, _| Ok(Some(cart(false))));
    db.expect_fetch_cart_items().returning(|_| Ok(cart_items()));
    db.expect_insert_transaction().never();
    let mut gateways = MockGateways::new();
    gateways.expect_initiate_session().returning(|_, _| {
        Err(ProviderApiError::QueryError { status: 503, message: "Down for maintenance".to_string() })
    });
    let req = TestRequest::post()
        .uri("/payments/initiate")
        .insert_header(("x-user-id", "7"))
        .set_json(json!({ "cart_code": "cart-001" }));
    let (status, _body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn initiate_can_pick_the_hosted_checkout_provider() {
    let mut db = MockLedger::new();
    db.expect_fetch_user_by_id().returning(|_| Ok(Some(shopper())));
    db.expect_fetch_cart_by_code().returning(|_, _| Ok(Some(cart(false))));
    db.expect_fetch_cart_items().returning(|_| Ok(cart_items()));
    db.expect_insert_transaction().returning(|tx| Ok(recorded(tx)));
    let mut gateways = MockGateways::new();
    gateways.expect_initiate_session().withf(|provider, _| *provider == Provider::Stripe).returning(|_, _| {
        Ok(PaymentSession {
            reference: "cs_test_123".to_string(),
            redirect_url: "https://checkout.example.com/cs_test_123".to_string(),
        })
    });
    let req = TestRequest::post()
        .uri("/payments/initiate")
        .insert_header(("x-user-id", "7"))
        .set_json(json!({ "cart_code": "cart-001", "provider": "stripe" }));
    let (status, body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("cs_test_123"));
}

//----------------------------------------------  Callback  ----------------------------------------------------

#[actix_web::test]
async fn a_verified_callback_settles_the_transaction() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref()
        .withf(|r| r.as_str() == TX_REF)
        .returning(|_| Ok(Some(transaction(TransactionStatus::Pending))));
    db.expect_settle_transaction()
        .returning(|_| Ok(SettlementStatus::Settled(transaction(TransactionStatus::Completed))));
    let mut gateways = MockGateways::new();
    gateways
        .expect_verify_flutterwave_transaction()
        .withf(|id| id == "991200")
        .returning(|_| Ok(verified(5000, ProviderPaymentStatus::Successful)));
    let uri = format!("/payments/callback?status=successful&tx_ref={TX_REF}&transaction_id=991200");
    let (status, body) = send_request(db, gateways, TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment successful!"));
}

#[actix_web::test]
async fn a_failed_callback_status_mutates_nothing() {
    // No mock expectations: a reported failure must trigger neither a verify call nor a ledger lookup.
    let uri = format!("/payments/callback?status=failed&tx_ref={TX_REF}&transaction_id=991200");
    let (status, body) = send_request(MockLedger::new(), MockGateways::new(), TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Payment was not successful."));
}

#[actix_web::test]
async fn a_tampered_amount_never_pays_the_cart() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(Some(transaction(TransactionStatus::Pending))));
    db.expect_settle_transaction().never();
    db.expect_fail_transaction().returning(|_, _| Ok(transaction(TransactionStatus::Failed)));
    let mut gateways = MockGateways::new();
    gateways
        .expect_verify_flutterwave_transaction()
        .returning(|_| Ok(verified(4900, ProviderPaymentStatus::Successful)));
    let uri = format!("/payments/callback?status=successful&tx_ref={TX_REF}&transaction_id=991200");
    let (status, body) = send_request(db, gateways, TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment verification failed."));
}

#[actix_web::test]
async fn a_callback_for_an_unknown_transaction_is_not_found() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(None));
    let mut gateways = MockGateways::new();
    gateways
        .expect_verify_flutterwave_transaction()
        .returning(|_| Ok(verified(5000, ProviderPaymentStatus::Successful)));
    let uri = format!("/payments/callback?status=successful&tx_ref={TX_REF}&transaction_id=991200");
    let (status, body) = send_request(db, gateways, TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Transaction not found"));
}

#[actix_web::test]
async fn the_callback_also_accepts_post() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(Some(transaction(TransactionStatus::Pending))));
    db.expect_settle_transaction()
        .returning(|_| Ok(SettlementStatus::Settled(transaction(TransactionStatus::Completed))));
    let mut gateways = MockGateways::new();
    gateways
        .expect_verify_flutterwave_transaction()
        .returning(|_| Ok(verified(5000, ProviderPaymentStatus::Successful)));
    let uri = format!("/payments/callback?status=successful&tx_ref={TX_REF}&transaction_id=991200");
    let (status, body) = send_request(db, gateways, TestRequest::post().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment successful!"));
}

//----------------------------------------------   Success  ----------------------------------------------------

#[actix_web::test]
async fn the_success_page_settles_a_paid_session() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(Some(transaction(TransactionStatus::Pending))));
    db.expect_settle_transaction()
        .returning(|_| Ok(SettlementStatus::Settled(transaction(TransactionStatus::Completed))));
    let mut gateways = MockGateways::new();
    gateways
        .expect_retrieve_stripe_session()
        .withf(|id| id == "cs_test_123")
        .returning(|_| Ok(verified(5000, ProviderPaymentStatus::Successful)));
    let req = TestRequest::get().uri("/payments/success?session_id=cs_test_123");
    let (status, body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment successful!"));
}

#[actix_web::test]
async fn an_unpaid_session_reports_not_completed() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(Some(transaction(TransactionStatus::Pending))));
    db.expect_settle_transaction().never();
    let mut gateways = MockGateways::new();
    gateways
        .expect_retrieve_stripe_session()
        .returning(|_| Ok(verified(5000, ProviderPaymentStatus::Incomplete)));
    let req = TestRequest::get().uri("/payments/success?session_id=cs_test_123");
    let (status, body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Payment not completed"));
}

#[actix_web::test]
async fn canceled_returns_the_fixed_message() {
    let req = TestRequest::get().uri("/payments/canceled");
    let (status, body) = send_request(MockLedger::new(), MockGateways::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Payment was canceled"));
}

//----------------------------------------------   Webhook  ----------------------------------------------------

#[actix_web::test]
async fn an_unsigned_webhook_is_rejected_before_any_ledger_lookup() {
    // The ledger mock has no expectations, so any lookup would fail the test.
    let mut gateways = MockGateways::new();
    gateways
        .expect_stripe_webhook_event()
        .returning(|_, _| Err(ProviderApiError::SignatureInvalid("The signature does not match".to_string())));
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("stripe-signature", "t=1,v1=deadbeef"))
        .set_payload("{}");
    let (status, body) = send_request(MockLedger::new(), gateways, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("signature"));
}

#[actix_web::test]
async fn a_webhook_without_a_signature_header_is_rejected() {
    let req = TestRequest::post().uri("/payments/webhook").set_payload("{}");
    let (status, _body) = send_request(MockLedger::new(), MockGateways::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn a_verified_webhook_settles_the_transaction() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(Some(transaction(TransactionStatus::Pending))));
    db.expect_settle_transaction()
        .returning(|_| Ok(SettlementStatus::Settled(transaction(TransactionStatus::Completed))));
    let mut gateways = MockGateways::new();
    gateways
        .expect_stripe_webhook_event()
        .returning(|_, _| Ok(WebhookEvent::CheckoutCompleted(verified(5000, ProviderPaymentStatus::Successful))));
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("stripe-signature", "t=1,v1=deadbeef"))
        .set_payload("{}");
    let (status, body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("success"));
}

#[actix_web::test]
async fn a_redelivered_webhook_settles_nothing_but_is_acknowledged() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(Some(transaction(TransactionStatus::Completed))));
    db.expect_settle_transaction().never();
    let mut gateways = MockGateways::new();
    gateways
        .expect_stripe_webhook_event()
        .returning(|_, _| Ok(WebhookEvent::CheckoutCompleted(verified(5000, ProviderPaymentStatus::Successful))));
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("stripe-signature", "t=1,v1=deadbeef"))
        .set_payload("{}");
    let (status, body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("success"));
}

#[actix_web::test]
async fn a_webhook_for_an_unknown_transaction_is_acknowledged() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref().returning(|_| Ok(None));
    let mut gateways = MockGateways::new();
    gateways
        .expect_stripe_webhook_event()
        .returning(|_, _| Ok(WebhookEvent::CheckoutCompleted(verified(5000, ProviderPaymentStatus::Successful))));
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("stripe-signature", "t=1,v1=deadbeef"))
        .set_payload("{}");
    let (status, body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("success"));
}

#[actix_web::test]
async fn an_ignored_event_type_is_acknowledged() {
    let mut gateways = MockGateways::new();
    gateways
        .expect_stripe_webhook_event()
        .returning(|_, _| Ok(WebhookEvent::Ignored("invoice.paid".to_string())));
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("stripe-signature", "t=1,v1=deadbeef"))
        .set_payload("{}");
    let (status, body) = send_request(MockLedger::new(), gateways, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("success"));
}

#[actix_web::test]
async fn a_database_failure_during_webhook_reconciliation_requests_redelivery() {
    let mut db = MockLedger::new();
    db.expect_fetch_transaction_by_ref()
        .returning(|_| Err(shop_payment_engine::PaymentLedgerError::DatabaseError("disk I/O error".to_string())));
    let mut gateways = MockGateways::new();
    gateways
        .expect_stripe_webhook_event()
        .returning(|_, _| Ok(WebhookEvent::CheckoutCompleted(verified(5000, ProviderPaymentStatus::Successful))));
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header(("stripe-signature", "t=1,v1=deadbeef"))
        .set_payload("{}");
    let (status, _body) = send_request(db, gateways, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
