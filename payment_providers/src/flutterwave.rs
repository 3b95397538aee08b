use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use spg_common::Cents;

use crate::{
    config::FlutterwaveConfig,
    data_objects::{PaymentSession, ProviderPaymentStatus, SessionRequest, VerifiedPayment},
    ProviderApiError,
};

/// The title displayed on the hosted payment page.
const PAYMENT_PAGE_TITLE: &str = "Shop Payment";

/// Client for the redirect-style provider. Shoppers are sent to a hosted payment link; the provider calls back with
/// a transaction id, which must be verified server-to-server before anything is trusted.
#[derive(Clone)]
pub struct FlutterwaveApi {
    config: FlutterwaveConfig,
    client: Arc<Client>,
}

impl FlutterwaveApi {
    pub fn new(config: FlutterwaveConfig) -> Result<Self, ProviderApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, ProviderApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| ProviderApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
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

    fn session_payload(&self, request: &SessionRequest) -> Value {
        serde_json::json!({
            "tx_ref": request.tx_ref,
            "amount": request.amount.to_string(),
            "currency": request.currency,
            "redirect_url": self.config.redirect_url,
            "customer": {
                "email": request.customer.email,
                "name": request.customer.name,
                "phonenumber": request.customer.phone,
            },
            "customizations": {
                "title": PAYMENT_PAGE_TITLE,
            },
        })
    }

    /// Opens a hosted payment session for one checkout attempt. The provider echoes `tx_ref` back in the callback,
    /// so the session reference is the ledger reference itself.
    pub async fn initiate_session(&self, request: &SessionRequest) -> Result<PaymentSession, ProviderApiError> {
        #[derive(Deserialize)]
        struct HostedLink {
            link: String,
        }
        #[derive(Deserialize)]
        struct PaymentsResponse {
            status: String,
            message: String,
            data: Option<HostedLink>,
        }
        let payload = self.session_payload(request);
        debug!("💳️ Opening a hosted payment session for {}", request.tx_ref);
        let result = self.rest_query::<PaymentsResponse, Value>(Method::POST, "/payments", Some(payload)).await?;
        if result.status != "success" {
            return Err(ProviderApiError::Rejected(result.message));
        }
        let link = result
            .data
            .ok_or_else(|| ProviderApiError::JsonError("Missing 'data' in the payments response".to_string()))?
            .link;
        info!("💳️ Hosted payment session is open for {}", request.tx_ref);
        Ok(PaymentSession { reference: request.tx_ref.clone(), redirect_url: link })
    }

    /// Fetches the authoritative record for a provider transaction id, as reported in a callback. The amounts and
    /// status in the callback query string itself are never used.
    pub async fn verify_transaction(&self, provider_tx_id: &str) -> Result<VerifiedPayment, ProviderApiError> {
        let path = format!("/transactions/{provider_tx_id}/verify");
        debug!("💳️ Verifying transaction #{provider_tx_id}");
        let result = self.rest_query::<VerifyResponse, ()>(Method::GET, &path, None).await?;
        let payment = result.into_verified_payment()?;
        info!("💳️ Verified transaction #{provider_tx_id} ({})", payment.tx_ref);
        Ok(payment)
    }
}

#[derive(Deserialize)]
struct TransactionData {
    tx_ref: String,
    amount: f64,
    currency: String,
    status: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    status: String,
    message: String,
    data: Option<TransactionData>,
}

impl VerifyResponse {
    fn into_verified_payment(self) -> Result<VerifiedPayment, ProviderApiError> {
        if self.status != "success" {
            return Err(ProviderApiError::Rejected(self.message));
        }
        let data =
            self.data.ok_or_else(|| ProviderApiError::JsonError("Missing 'data' in the verify response".to_string()))?;
        let amount =
            Cents::try_from(data.amount).map_err(|e| ProviderApiError::InvalidCurrencyAmount(e.to_string()))?;
        let status = match data.status.as_str() {
            "successful" => ProviderPaymentStatus::Successful,
            "pending" => ProviderPaymentStatus::Incomplete,
            _ => ProviderPaymentStatus::Declined,
        };
        Ok(VerifiedPayment { tx_ref: data.tx_ref, amount, currency: data.currency, status })
    }
}
