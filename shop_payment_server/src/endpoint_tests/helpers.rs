use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use chrono::Utc;
use payment_providers::Provider;
use shop_payment_engine::{
    db_types::{Cart, CartItem, NewTransaction, PaymentTransaction, TransactionStatus, TxRef, UserProfile},
    PaymentFlowApi,
};
use spg_common::Cents;

use crate::{
    config::ServerOptions,
    endpoint_tests::mocks::{MockGateways, MockLedger},
    routes::{canceled, health, CallbackNotifyRoute, CallbackRoute, InitiateRoute, SuccessRoute, WebhookRoute},
};

/// The ledger reference every fixture uses.
pub const TX_REF: &str = "f00dcafef00dcafef00dcafef00dcafe";

/// Builds the same app the production server runs, with the mocks standing in for the database and the remote
/// providers, and sends one request through it.
pub async fn send_request(db: MockLedger, gateways: MockGateways, req: TestRequest) -> (StatusCode, String) {
    let api = PaymentFlowApi::new(db);
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateways))
        .app_data(web::Data::new(ServerOptions { default_provider: Provider::Flutterwave }))
        .service(health)
        .service(
            web::scope("/payments")
                .service(InitiateRoute::<MockLedger, MockGateways>::new())
                .service(CallbackRoute::<MockLedger, MockGateways>::new())
                .service(CallbackNotifyRoute::<MockLedger, MockGateways>::new())
                .service(SuccessRoute::<MockLedger, MockGateways>::new())
                .service(canceled)
                .service(WebhookRoute::<MockLedger, MockGateways>::new()),
        );
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

//--------------------------------------       Fixtures        -------------------------------------------------------

pub fn shopper() -> UserProfile {
    UserProfile {
        id: 7,
        username: "jo".to_string(),
        email: "jo@example.com".to_string(),
        phone: "0123456789".to_string(),
    }
}

pub fn cart(paid: bool) -> Cart {
    Cart { id: 10, cart_code: "cart-001".to_string(), user_id: 7, paid, created_at: Utc::now() }
}

/// $25.00 + 2 × $10.00 = $45.00; with the $5.00 surcharge the checkout total is $50.00.
pub fn cart_items() -> Vec<CartItem> {
    vec![
        CartItem { id: 1, cart_id: 10, product_name: "Keyboard".to_string(), quantity: 1, unit_price: Cents::from(2500) },
        CartItem { id: 2, cart_id: 10, product_name: "Mouse".to_string(), quantity: 2, unit_price: Cents::from(1000) },
    ]
}

pub fn transaction(status: TransactionStatus) -> PaymentTransaction {
    PaymentTransaction {
        id: 1,
        tx_ref: TxRef::from(TX_REF),
        cart_id: 10,
        amount: Cents::from(5000),
        currency: "USD".to_string(),
        status,
        user_id: 7,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn recorded(new: NewTransaction) -> PaymentTransaction {
    PaymentTransaction {
        id: 1,
        tx_ref: new.tx_ref,
        cart_id: new.cart_id,
        amount: new.amount,
        currency: new.currency,
        status: TransactionStatus::Pending,
        user_id: new.user_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
