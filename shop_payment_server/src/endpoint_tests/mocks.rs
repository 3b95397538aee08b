use mockall::mock;
use payment_providers::{
    PaymentGateways,
    PaymentSession,
    Provider,
    ProviderApiError,
    SessionRequest,
    VerifiedPayment,
    WebhookEvent,
};
use shop_payment_engine::{
    db_types::{Cart, CartItem, NewTransaction, PaymentTransaction, TxRef, UserProfile},
    PaymentLedgerDatabase,
    PaymentLedgerError,
    SettlementStatus,
    StorefrontAccess,
};

mock! {
    pub Ledger {}

    impl Clone for Ledger {
        fn clone(&self) -> Self;
    }

    impl StorefrontAccess for Ledger {
        async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<UserProfile>, PaymentLedgerError>;
        async fn fetch_cart_by_code(&self, cart_code: &str, user_id: i64) -> Result<Option<Cart>, PaymentLedgerError>;
        async fn fetch_cart_items(&self, cart_id: i64) -> Result<Vec<CartItem>, PaymentLedgerError>;
    }

    impl PaymentLedgerDatabase for Ledger {
        fn url(&self) -> &str;
        async fn insert_transaction(&self, transaction: NewTransaction) -> Result<PaymentTransaction, PaymentLedgerError>;
        async fn fetch_transaction_by_ref(&self, tx_ref: &TxRef) -> Result<Option<PaymentTransaction>, PaymentLedgerError>;
        async fn settle_transaction(&self, tx_ref: &TxRef) -> Result<SettlementStatus, PaymentLedgerError>;
        async fn fail_transaction(&self, tx_ref: &TxRef, reason: &str) -> Result<PaymentTransaction, PaymentLedgerError>;
        async fn close(&mut self) -> Result<(), PaymentLedgerError>;
    }
}

mock! {
    pub Gateways {}

    impl PaymentGateways for Gateways {
        async fn initiate_session(
            &self,
            provider: Provider,
            request: &SessionRequest,
        ) -> Result<PaymentSession, ProviderApiError>;
        async fn verify_flutterwave_transaction(&self, provider_tx_id: &str)
            -> Result<VerifiedPayment, ProviderApiError>;
        async fn retrieve_stripe_session(&self, session_id: &str) -> Result<VerifiedPayment, ProviderApiError>;
        fn stripe_webhook_event(&self, payload: &[u8], signature_header: &str)
            -> Result<WebhookEvent, ProviderApiError>;
    }
}
