//! REST API seam.
//!
//! [`StorefrontApi`] is what the views call; [`HttpStorefrontApi`] implements it
//! over HTTP with `reqwest`. Every response carries `success`; a `false` or a
//! non-2xx status becomes [`ApiError::Rejected`] with the server's message.

use std::future::Future;

use greencart_core::{Address, AddressId, LineItem, Order, Product, UserId};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Header carrying the signed-in user's ID.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Errors talking to the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never got a response.
    #[error("{0}")]
    Request(String),

    /// Response body was not what the endpoint promises.
    #[error("unexpected response: {0}")]
    Response(String),

    /// Server refused the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl ApiError {
    /// Text to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Body of a COD order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub address: AddressId,
}

/// Body of an online payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayment {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub address: AddressId,
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A provider order to pay against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
}

/// Provider order plus the public key to open the widget with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderCheckout {
    pub order: ProviderOrder,
    pub key: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    data: Option<T>,
}

#[derive(Deserialize)]
struct ProductsData {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct AddressesData {
    addresses: Vec<Address>,
}

#[derive(Deserialize)]
struct OrdersData {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
struct Empty {}

// =============================================================================
// Trait
// =============================================================================

/// Storefront REST operations used by the client views.
pub trait StorefrontApi {
    /// `GET /api/product/list`
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// `GET /api/address/get`
    fn fetch_addresses(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Address>, ApiError>> + Send;

    /// `POST /api/order/cod`, returning the server's message.
    fn place_cod_order(
        &self,
        order: &PlaceOrder,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// `POST /api/order/razorpay-order` for `amount` in standard units.
    fn create_provider_order(
        &self,
        amount: Decimal,
    ) -> impl Future<Output = Result<ProviderCheckout, ApiError>> + Send;

    /// `POST /api/order/razorpay-place`, returning the server's message.
    fn record_payment(
        &self,
        payment: &RecordPayment,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// `GET /api/order/user`
    fn fetch_orders(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`StorefrontApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStorefrontApi {
    client: Client,
    base_url: Url,
}

impl HttpStorefrontApi {
    /// Create a client for the API at `base_url`.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(T, Option<String>), ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Response(e.to_string()))?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ApiError::Rejected {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string(),
                });
            }
            Err(e) => return Err(ApiError::Response(e.to_string())),
        };

        if !status.is_success() || !envelope.success {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| ApiError::Response("missing response data".to_string()))?;
        Ok((data, envelope.message))
    }
}

impl StorefrontApi for HttpStorefrontApi {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        let request = self.client.get(self.url("api/product/list")?);
        let (data, _) = self.send::<ProductsData>(request).await?;
        debug!(count = data.products.len(), "Fetched products");
        Ok(data.products)
    }

    #[instrument(skip(self))]
    async fn fetch_addresses(&self, user_id: UserId) -> Result<Vec<Address>, ApiError> {
        let request = self
            .client
            .get(self.url("api/address/get")?)
            .header(USER_ID_HEADER, user_id.to_string());
        let (data, _) = self.send::<AddressesData>(request).await?;
        Ok(data.addresses)
    }

    #[instrument(skip(self, order), fields(items = order.items.len()))]
    async fn place_cod_order(&self, order: &PlaceOrder) -> Result<String, ApiError> {
        let request = self.client.post(self.url("api/order/cod")?).json(order);
        let (_, message) = self.send::<Empty>(request).await?;
        Ok(message.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn create_provider_order(&self, amount: Decimal) -> Result<ProviderCheckout, ApiError> {
        #[derive(Serialize)]
        struct Body {
            amount: Decimal,
        }

        let request = self
            .client
            .post(self.url("api/order/razorpay-order")?)
            .json(&Body { amount });
        let (checkout, _) = self.send::<ProviderCheckout>(request).await?;
        Ok(checkout)
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.payment_id))]
    async fn record_payment(&self, payment: &RecordPayment) -> Result<String, ApiError> {
        let request = self
            .client
            .post(self.url("api/order/razorpay-place")?)
            .json(payment);
        let (_, message) = self.send::<Empty>(request).await?;
        Ok(message.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn fetch_orders(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        let request = self
            .client
            .get(self.url("api/order/user")?)
            .header(USER_ID_HEADER, user_id.to_string());
        let (data, _) = self.send::<OrdersData>(request).await?;
        Ok(data.orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use greencart_core::ProductId;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = HttpStorefrontApi::new(Url::parse("http://localhost:4000/v2").unwrap());
        assert_eq!(api.base_url().as_str(), "http://localhost:4000/v2/");
        assert_eq!(
            api.url("api/order/cod").unwrap().as_str(),
            "http://localhost:4000/v2/api/order/cod"
        );
    }

    #[test]
    fn test_place_order_wire_shape() {
        let body = serde_json::to_value(PlaceOrder {
            user_id: UserId::new(1),
            items: vec![LineItem::new(ProductId::new(5), 2)],
            address: AddressId::new(3),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "userId": 1,
                "items": [{"product": 5, "quantity": 2}],
                "address": 3
            })
        );
    }

    #[test]
    fn test_record_payment_omits_absent_fields() {
        let body = serde_json::to_value(RecordPayment {
            user_id: UserId::new(1),
            items: vec![],
            address: AddressId::new(3),
            payment_id: "pay_1".to_string(),
            order_id: None,
            signature: None,
        })
        .unwrap();
        assert!(body.get("orderId").is_none());
        assert_eq!(body["paymentId"], "pay_1");
    }

    #[test]
    fn test_envelope_flattens_data() {
        let envelope: Envelope<ProviderCheckout> = serde_json::from_str(
            r#"{"success":true,"order":{"id":"order_1","amount":2550,"currency":"INR"},"key":"rzp_test"}"#,
        )
        .unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.order.amount, 2550);
        assert_eq!(data.key, "rzp_test");
    }
}
