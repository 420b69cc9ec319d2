//! REST client for the Campick backend.
//!
//! Public reads (shops, menus, payment details) need no token. Everything
//! touching orders or a shop's menu needs the bearer token issued at sign
//! in; calling those without one fails before any request is sent.
//!
//! Shop listings and menus are cached with `moka` for the configured TTL.
//! Menu mutations invalidate the affected shop's menu; status toggles and
//! shop edits invalidate the shop list.

mod cache;
mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use campick_core::{MenuItemId, OrderId, OrderStatus, PaymentId, PaymentStatus, ShopId};
use moka::future::Cache;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::auth;
use crate::config::ClientConfig;

use cache::CacheValue;

/// Upper bound on cached shop lists and menus.
const CACHE_CAPACITY: u64 = 1000;

/// Fallback wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const SHOPS_CACHE_KEY: &str = "shops";

fn menu_cache_key(shop_id: &ShopId) -> String {
    format!("menu:{shop_id}")
}

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing, expired or rejected bearer token.
    #[error("Unauthorized: sign in again")]
    Unauthorized,

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Client for the Campick REST backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create an unauthenticated client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                token: None,
                cache,
            }),
        })
    }

    /// A client sharing this one's connection pool and cache, authorised
    /// with `token`.
    #[must_use]
    pub fn with_token(&self, token: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(BackendClientInner {
                client: self.inner.client.clone(),
                base_url: self.inner.base_url.clone(),
                token,
                cache: self.inner.cache.clone(),
            }),
        }
    }

    /// Whether a bearer token is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.token.is_some()
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let url = self.endpoint(&["api", "profile"])?;
        let request = self.authorized(self.inner.client.get(url))?;
        let response: ProfileResponse = self.send(request).await?;
        Ok(response.user)
    }

    /// Edit the signed-in user's name, email or avatar.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "updateProfile"])?;
        let request = self.authorized(self.inner.client.put(url))?.json(update);
        self.send_empty(request).await
    }

    /// Order totals and most-visited shops of the signed-in shopper.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self))]
    pub async fn order_stats(&self) -> Result<UserOrderStats, ApiError> {
        let url = self.endpoint(&["api", "user", "order-stats"])?;
        let request = self.authorized(self.inner.client.get(url))?;
        let response: OrderStatsResponse = self.send(request).await?;
        Ok(response.data)
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// List every shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_shops(&self) -> Result<Vec<Shop>, ApiError> {
        if let Some(CacheValue::Shops(shops)) = self.inner.cache.get(SHOPS_CACHE_KEY).await {
            debug!("Cache hit for shops");
            return Ok(shops);
        }

        let url = self.endpoint(&["api", "getAllShops"])?;
        let shops: Vec<Shop> = self.send(self.inner.client.get(url)).await?;

        self.inner
            .cache
            .insert(SHOPS_CACHE_KEY.to_string(), CacheValue::Shops(shops.clone()))
            .await;

        Ok(shops)
    }

    /// Get one shop, including its open flag.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown shop.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn get_shop(&self, shop_id: &ShopId) -> Result<Shop, ApiError> {
        let url = self.endpoint(&["api", "shop", shop_id.as_str()])?;
        self.send(self.inner.client.get(url)).await
    }

    /// Payment methods the shop accepts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn shop_payment_details(
        &self,
        shop_id: &ShopId,
    ) -> Result<Vec<PaymentMethod>, ApiError> {
        let url = self.endpoint(&["api", "shop", shop_id.as_str(), "payment-details"])?;
        let response: PaymentMethodsResponse = self.send(self.inner.client.get(url)).await?;
        Ok(response.methods)
    }

    /// Open or close a shop for ordering.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn toggle_shop_status(&self, shop_id: &ShopId, is_open: bool) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "shop", shop_id.as_str(), "toggle-status"])?;
        let request = self
            .authorized(self.inner.client.put(url))?
            .json(&ToggleStatusRequest { is_open });
        self.send_empty(request).await?;

        self.inner.cache.invalidate(SHOPS_CACHE_KEY).await;
        Ok(())
    }

    /// Shops managed by the signed-in owner.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self))]
    pub async fn owner_shops(&self) -> Result<Vec<Shop>, ApiError> {
        let url = self.endpoint(&["api", "ownerShops"])?;
        let request = self.authorized(self.inner.client.get(url))?;
        let response: OwnerShopsResponse = self.send(request).await?;
        Ok(response.shops)
    }

    /// Edit a shop's profile and payout details.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self, update), fields(shop_id = %shop_id))]
    pub async fn update_shop(&self, shop_id: &ShopId, update: &ShopUpdate) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "updateshop", shop_id.as_str()])?;
        let request = self.authorized(self.inner.client.put(url))?.json(update);
        self.send_empty(request).await?;

        self.inner.cache.invalidate(SHOPS_CACHE_KEY).await;
        Ok(())
    }

    /// Revenue, best sellers and recent orders of a shop.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn shop_dashboard(&self, shop_id: &ShopId) -> Result<ShopDashboard, ApiError> {
        let url = self.endpoint(&["api", "shopDashboard", shop_id.as_str()])?;
        let request = self.authorized(self.inner.client.get(url))?;
        self.send(request).await
    }

    // =========================================================================
    // Menu
    // =========================================================================

    /// List a shop's menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn list_menu_items(&self, shop_id: &ShopId) -> Result<Vec<MenuItem>, ApiError> {
        let cache_key = menu_cache_key(shop_id);
        if let Some(CacheValue::Menu(items)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for menu");
            return Ok(items);
        }

        let url = self.endpoint(&["api", "shop", shop_id.as_str(), "getAllMenuItems"])?;
        let response: MenuItemsResponse = self.send(self.inner.client.get(url)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Menu(response.items.clone()))
            .await;

        Ok(response.items)
    }

    /// Get one menu item.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the item no longer exists.
    #[instrument(skip(self), fields(shop_id = %shop_id, item_id = %item_id))]
    pub async fn get_menu_item(
        &self,
        shop_id: &ShopId,
        item_id: &MenuItemId,
    ) -> Result<MenuItem, ApiError> {
        let url = self.endpoint(&[
            "api",
            "shop",
            shop_id.as_str(),
            "getMenuItem",
            item_id.as_str(),
        ])?;
        let request = self.maybe_authorized(self.inner.client.get(url));
        self.send(request).await
    }

    /// Add an item to a shop's menu.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self, item), fields(shop_id = %shop_id))]
    pub async fn add_menu_item(&self, shop_id: &ShopId, item: &MenuItemInput) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "shop", shop_id.as_str(), "addMenuItem"])?;
        let request = self.authorized(self.inner.client.post(url))?.json(item);
        self.send_empty(request).await?;
        self.invalidate_menu(shop_id).await;
        Ok(())
    }

    /// Replace a menu item's fields.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self, item), fields(shop_id = %shop_id, item_id = %item_id))]
    pub async fn update_menu_item(
        &self,
        shop_id: &ShopId,
        item_id: &MenuItemId,
        item: &MenuItemInput,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&[
            "api",
            "shop",
            shop_id.as_str(),
            "updateMenuItem",
            item_id.as_str(),
        ])?;
        let request = self.authorized(self.inner.client.put(url))?.json(item);
        self.send_empty(request).await?;
        self.invalidate_menu(shop_id).await;
        Ok(())
    }

    /// Remove an item from a shop's menu.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self), fields(shop_id = %shop_id, item_id = %item_id))]
    pub async fn delete_menu_item(
        &self,
        shop_id: &ShopId,
        item_id: &MenuItemId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&[
            "api",
            "shop",
            shop_id.as_str(),
            "deleteMenuItem",
            item_id.as_str(),
        ])?;
        let request = self.authorized(self.inner.client.delete(url))?;
        self.send_empty(request).await?;
        self.invalidate_menu(shop_id).await;
        Ok(())
    }

    /// Drop a shop's cached menu.
    pub async fn invalidate_menu(&self, shop_id: &ShopId) {
        self.inner.cache.invalidate(&menu_cache_key(shop_id)).await;
    }

    /// Drop every cached read.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submit a payment screenshot and create the order.
    ///
    /// A 2xx response may still carry a non-success verdict; inspect
    /// [`VerifyResponse::is_success`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self, payment), fields(shop_id = %payment.shop_id))]
    pub async fn verify_payment_and_create_order(
        &self,
        payment: &PaymentRequest,
    ) -> Result<VerifyResponse, ApiError> {
        let url = self.endpoint(&["api", "verifyPaymentAndCreateOrder"])?;
        let request = self.authorized(self.inner.client.post(url))?.json(payment);
        self.send(request).await
    }

    /// Upload an image (payment screenshot or menu photo).
    ///
    /// The token is attached when present; the endpoint accepts anonymous
    /// uploads.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    #[instrument(skip(self, bytes), fields(filename = %filename, size = bytes.len()))]
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadedImage, ApiError> {
        let url = self.endpoint(&["api", "imageupload"])?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);

        let request = self.maybe_authorized(self.inner.client.post(url)).multipart(form);
        let response: UploadResponse = self.send(request).await?;
        Ok(response.data)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Orders placed by the signed-in shopper.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self))]
    pub async fn list_user_orders(&self) -> Result<Vec<OrderDetails>, ApiError> {
        let mut url = self.endpoint(&["api", "listUserOrders"])?;
        let token = self.token()?;
        if let Ok(claims) = auth::decode_claims(token.expose_secret())
            && let Some(id) = claims.id
        {
            url.query_pairs_mut().append_pair("id", id.as_str());
        }

        let request = self.authorized(self.inner.client.get(url))?;
        let response: OrdersResponse = self.send(request).await?;
        Ok(response.orders)
    }

    /// Orders received by the signed-in owner's shop.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self))]
    pub async fn list_shop_orders(&self) -> Result<Vec<OrderDetails>, ApiError> {
        let url = self.endpoint(&["api", "listShopOrders"])?;
        let request = self.authorized(self.inner.client.get(url))?;
        let response: OrdersResponse = self.send(request).await?;
        Ok(response.orders)
    }

    /// Full details of one order, including its line items.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order_details(&self, order_id: &OrderId) -> Result<OrderDetails, ApiError> {
        let url = self.endpoint(&["api", "orderDetails", order_id.as_str()])?;
        let request = self.authorized(self.inner.client.get(url))?;
        self.send(request).await
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "updateOrderStatus", order_id.as_str()])?;
        let request = self
            .authorized(self.inner.client.put(url))?
            .json(&OrderStatusRequest { status });
        self.send_empty(request).await
    }

    /// Set a payment's verification status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token.
    #[instrument(skip(self), fields(payment_id = %payment_id, status = %status))]
    pub async fn update_payment_status(
        &self,
        payment_id: &PaymentId,
        status: PaymentStatus,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "updatePaymentStatus", payment_id.as_str()])?;
        let request = self
            .authorized(self.inner.client.put(url))?
            .json(&PaymentStatusRequest { payment_id, status });
        self.send_empty(request).await
    }

    /// Payment id recorded for an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order has no payment.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn payment_id(&self, order_id: &OrderId) -> Result<PaymentId, ApiError> {
        let url = self.endpoint(&["api", "getPaymentId", order_id.as_str()])?;
        let request = self.authorized(self.inner.client.get(url))?;
        let response: PaymentIdResponse = self.send(request).await?;
        Ok(response.payment_info.payment_id)
    }

    /// Who paid and the screenshot they submitted.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown payment.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn payment_details(&self, payment_id: &PaymentId) -> Result<PaymentDetails, ApiError> {
        let url = self.endpoint(&["api", "paymentDetails", payment_id.as_str()])?;
        let request = self.authorized(self.inner.client.get(url))?;
        let response: PaymentDetailsResponse = self.send(request).await?;
        Ok(response.data)
    }

    /// Resolve an order's payment and fetch its proof.
    ///
    /// # Errors
    ///
    /// Returns an error if either lookup fails.
    pub async fn payment_proof(&self, order_id: &OrderId) -> Result<PaymentProof, ApiError> {
        let payment_id = self.payment_id(order_id).await?;
        let details = self.payment_details(&payment_id).await?;
        Ok(PaymentProof {
            payment_id,
            customer_name: details.customer_name,
            role: details.role,
            screenshot_url: details.payment.screenshot_url,
            method: details.payment.method,
        })
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Build an endpoint URL from path segments, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn token(&self) -> Result<&SecretString, ApiError> {
        self.inner.token.as_ref().ok_or(ApiError::Unauthorized)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        Ok(request.bearer_auth(self.token()?.expose_secret()))
    }

    fn maybe_authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.inner.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(parse_error(response).await)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(parse_error(response).await)
    }
}

/// Map a non-success response to an `ApiError`.
async fn parse_error(response: Response) -> ApiError {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return ApiError::RateLimited(retry_after);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ApiError::Unauthorized;
    }

    let path = response.url().path().to_string();
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound(path);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    ApiError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    }
}

/// Prefer the backend's `{"message": ...}` field over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

impl ApiError {
    /// Suggested wait before retrying, for rate-limited calls.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited(secs) => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&ClientConfig::for_api(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("http://localhost:4000/v1");
        let url = client
            .endpoint(&["api", "shop", "s 1", "getAllMenuItems"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4000/v1/api/shop/s%201/getAllMenuItems"
        );
    }

    #[test]
    fn test_endpoint_escapes_slashes_in_ids() {
        let client = client("http://localhost:4000");
        let url = client.endpoint(&["api", "orderDetails", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/orderDetails/a%2Fb");
    }

    #[tokio::test]
    async fn test_authenticated_call_without_token_fails_fast() {
        // Port 9 (discard) is never contacted: the token check runs first.
        let client = client("http://127.0.0.1:9");
        let err = client.list_shop_orders().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        let err = client
            .update_order_status(&OrderId::new("o1"), OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_with_token_shares_cache() {
        let anonymous = client("http://localhost:4000");
        let signed_in = anonymous.with_token(Some(SecretString::from("t".to_string())));
        assert!(!anonymous.is_authenticated());
        assert!(signed_in.is_authenticated());
        assert_eq!(signed_in.base_url(), anonymous.base_url());
    }

    #[test]
    fn test_error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"message":"Shop is closed"}"#), "Shop is closed");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(
            ApiError::RateLimited(5).retry_after(),
            Some(Duration::from_secs(5))
        );
        assert!(ApiError::Unauthorized.retry_after().is_none());
    }
}
