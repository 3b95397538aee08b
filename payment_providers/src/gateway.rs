use crate::{
    config::{FlutterwaveConfig, StripeConfig},
    data_objects::{PaymentSession, Provider, SessionRequest, VerifiedPayment, WebhookEvent},
    FlutterwaveApi,
    ProviderApiError,
    StripeApi,
};

/// The uniform surface the payment server talks to. Handlers are generic over this trait so endpoint tests can swap
/// in mocks, and so neither flow leaks provider specifics into the reconciliation layer.
#[allow(async_fn_in_trait)]
pub trait PaymentGateways {
    /// Opens a remote payment session with the given provider for one checkout attempt.
    async fn initiate_session(
        &self,
        provider: Provider,
        request: &SessionRequest,
    ) -> Result<PaymentSession, ProviderApiError>;

    /// Fetches the authoritative record behind a redirect callback's provider transaction id.
    async fn verify_flutterwave_transaction(&self, provider_tx_id: &str)
        -> Result<VerifiedPayment, ProviderApiError>;

    /// Fetches the authoritative state of a hosted checkout session.
    async fn retrieve_stripe_session(&self, session_id: &str) -> Result<VerifiedPayment, ProviderApiError>;

    /// Authenticates a webhook delivery and decodes it. Must fail with [`ProviderApiError::SignatureInvalid`]
    /// before interpreting the payload when the signature does not check out.
    fn stripe_webhook_event(&self, payload: &[u8], signature_header: &str)
        -> Result<WebhookEvent, ProviderApiError>;
}

/// Production implementation of [`PaymentGateways`], dispatching to the real provider clients.
#[derive(Clone)]
pub struct GatewayAdapter {
    flutterwave: FlutterwaveApi,
    stripe: StripeApi,
}

impl GatewayAdapter {
    pub fn new(flutterwave: FlutterwaveConfig, stripe: StripeConfig) -> Result<Self, ProviderApiError> {
        Ok(Self { flutterwave: FlutterwaveApi::new(flutterwave)?, stripe: StripeApi::new(stripe)? })
    }

    pub fn from_env_or_default() -> Result<Self, ProviderApiError> {
        Self::new(FlutterwaveConfig::new_from_env_or_default(), StripeConfig::new_from_env_or_default())
    }
}

impl PaymentGateways for GatewayAdapter {
    async fn initiate_session(
        &self,
        provider: Provider,
        request: &SessionRequest,
    ) -> Result<PaymentSession, ProviderApiError> {
        match provider {
            Provider::Flutterwave => self.flutterwave.initiate_session(request).await,
            Provider::Stripe => self.stripe.initiate_session(request).await,
        }
    }

    async fn verify_flutterwave_transaction(
        &self,
        provider_tx_id: &str,
    ) -> Result<VerifiedPayment, ProviderApiError> {
        self.flutterwave.verify_transaction(provider_tx_id).await
    }

    async fn retrieve_stripe_session(&self, session_id: &str) -> Result<VerifiedPayment, ProviderApiError> {
        self.stripe.retrieve_session(session_id).await
    }

    fn stripe_webhook_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, ProviderApiError> {
        self.stripe.webhook_event(payload, signature_header)
    }
}
