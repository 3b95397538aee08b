use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use sha2::Sha256;
use spg_common::Cents;

use crate::{
    config::StripeConfig,
    data_objects::{PaymentSession, ProviderPaymentStatus, SessionRequest, VerifiedPayment, WebhookEvent},
    ProviderApiError,
};

type HmacSha256 = Hmac<Sha256>;

/// The line item name shown on the hosted checkout page. The whole cart is charged as a single synthetic item.
const ORDER_DESCRIPTION: &str = "Shop Order";

const CHECKOUT_COMPLETED_EVENT: &str = "checkout.session.completed";

/// Client for the hosted-checkout provider. A checkout session is created up front, keyed by the ledger reference,
/// and its authoritative state is either retrieved when the shopper lands on the success page or pushed through a
/// signed webhook.
#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, ProviderApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// The checkout API takes form-encoded requests and answers in JSON.
    pub async fn form_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Option<&[(String, String)]>,
    ) -> Result<T, ProviderApiError> {
        let url = self.url(path);
        trace!("💳️ Sending checkout query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(params) = params {
            req = req.form(params);
        }
        let response = req.send().await.map_err(|e| ProviderApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ Checkout query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ProviderApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ProviderApiError::RestResponseError(e.to_string()))?;
            Err(ProviderApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    fn session_params(&self, request: &SessionRequest) -> Vec<(String, String)> {
        vec![
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][price_data][currency]".to_string(), request.currency.to_lowercase()),
            ("line_items[0][price_data][product_data][name]".to_string(), ORDER_DESCRIPTION.to_string()),
            ("line_items[0][price_data][unit_amount]".to_string(), request.amount.value().to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.config.success_url.clone()),
            ("cancel_url".to_string(), self.config.cancel_url.clone()),
            ("client_reference_id".to_string(), request.tx_ref.clone()),
            ("customer_email".to_string(), request.customer.email.clone()),
            ("metadata[cart_code]".to_string(), request.cart_code.clone()),
            ("metadata[user_id]".to_string(), request.customer.id.to_string()),
        ]
    }

    /// Creates a checkout session carrying the cart total as one line item. The session id doubles as the reference
    /// the success page reports back.
    pub async fn initiate_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderApiError> {
        let params = self.session_params(request);
        debug!("💳️ Creating a checkout session for {}", request.tx_ref);
        let session =
            self.form_query::<CheckoutSession>(Method::POST, "/checkout/sessions", Some(&params)).await?;
        let redirect_url = session
            .url
            .ok_or_else(|| ProviderApiError::JsonError("The new checkout session has no url".to_string()))?;
        info!("💳️ Checkout session {} is open for {}", session.id, request.tx_ref);
        Ok(PaymentSession { reference: session.id, redirect_url })
    }

    /// Fetches the authoritative state of a checkout session. Success-page query parameters are untrusted; only
    /// this lookup decides whether the payment went through.
    pub async fn retrieve_session(&self, session_id: &str) -> Result<VerifiedPayment, ProviderApiError> {
        let path = format!("/checkout/sessions/{session_id}");
        debug!("💳️ Retrieving checkout session {session_id}");
        let session = self.form_query::<CheckoutSession>(Method::GET, &path, None).await?;
        let payment = session.into_verified_payment()?;
        info!("💳️ Retrieved checkout session {session_id} ({})", payment.tx_ref);
        Ok(payment)
    }

    /// Authenticates and decodes a webhook delivery. The signature is checked before a single payload byte is
    /// interpreted; stale timestamps are rejected to stop replays.
    pub fn webhook_event(&self, payload: &[u8], signature_header: &str) -> Result<WebhookEvent, ProviderApiError> {
        self.verify_signature(payload, signature_header)?;
        let event: Value =
            serde_json::from_slice(payload).map_err(|e| ProviderApiError::MalformedEvent(e.to_string()))?;
        let event_type = event["type"]
            .as_str()
            .ok_or_else(|| ProviderApiError::MalformedEvent("The event has no 'type' field".to_string()))?;
        if event_type != CHECKOUT_COMPLETED_EVENT {
            trace!("💳️ Ignoring webhook event of type {event_type}");
            return Ok(WebhookEvent::Ignored(event_type.to_string()));
        }
        let session: CheckoutSession = serde_json::from_value(event["data"]["object"].clone())
            .map_err(|e| ProviderApiError::MalformedEvent(e.to_string()))?;
        let payment = session.into_verified_payment()?;
        Ok(WebhookEvent::CheckoutCompleted(payment))
    }

    /// Checks the `t=<unix>,v1=<hex>` signature header: an HMAC-SHA256 over `"{t}.{payload}"` with the webhook
    /// secret, compared in constant time.
    pub fn verify_signature(&self, payload: &[u8], signature_header: &str) -> Result<(), ProviderApiError> {
        let (timestamp, signature) = parse_signature_header(signature_header)?;
        let age = Utc::now().timestamp() - timestamp;
        if age.abs() > self.config.signature_tolerance {
            return Err(ProviderApiError::SignatureInvalid(format!(
                "Event timestamp is {age}s old, outside the {}s replay tolerance",
                self.config.signature_tolerance
            )));
        }
        let expected = hex::decode(signature)
            .map_err(|_| ProviderApiError::SignatureInvalid("The v1 signature is not valid hex".to_string()))?;
        let mut mac = HmacSha256::new_from_slice(self.config.webhook_secret.reveal().as_bytes())
            .map_err(|e| ProviderApiError::SignatureInvalid(e.to_string()))?;
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        mac.verify_slice(&expected)
            .map_err(|_| ProviderApiError::SignatureInvalid("The signature does not match the payload".to_string()))
    }
}

/// Pulls the timestamp and the first v1 signature out of the signature header.
fn parse_signature_header(header: &str) -> Result<(i64, &str), ProviderApiError> {
    let mut timestamp = None;
    let mut signature = None;
    for element in header.split(',') {
        match element.trim().split_once('=') {
            Some(("t", t)) if timestamp.is_none() => {
                let t = t
                    .parse::<i64>()
                    .map_err(|_| ProviderApiError::SignatureInvalid("Invalid timestamp in header".to_string()))?;
                timestamp = Some(t);
            },
            Some(("v1", sig)) if signature.is_none() => signature = Some(sig),
            _ => continue,
        }
    }
    match (timestamp, signature) {
        (Some(t), Some(s)) => Ok((t, s)),
        (None, _) => Err(ProviderApiError::SignatureInvalid("The header carries no timestamp".to_string())),
        (_, None) => Err(ProviderApiError::SignatureInvalid("The header carries no v1 signature".to_string())),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
    client_reference_id: Option<String>,
    payment_status: String,
    amount_total: Option<i64>,
    currency: Option<String>,
}

impl CheckoutSession {
    fn into_verified_payment(self) -> Result<VerifiedPayment, ProviderApiError> {
        let tx_ref = self.client_reference_id.ok_or_else(|| {
            ProviderApiError::MalformedEvent(format!("Checkout session {} has no client_reference_id", self.id))
        })?;
        let amount_total = self.amount_total.ok_or_else(|| {
            ProviderApiError::MalformedEvent(format!("Checkout session {} has no amount_total", self.id))
        })?;
        let currency = self
            .currency
            .ok_or_else(|| ProviderApiError::MalformedEvent(format!("Checkout session {} has no currency", self.id)))?;
        let status = if self.payment_status == "paid" {
            ProviderPaymentStatus::Successful
        } else {
            // "unpaid" and "no_payment_required" both mean there is nothing to settle yet.
            ProviderPaymentStatus::Incomplete
        };
        Ok(VerifiedPayment { tx_ref, amount: Cents::from(amount_total), currency, status })
    }
}
