//! HTTP implementation of the backend collaborators.

use async_trait::async_trait;
use common::{OrderNumber, ProductId};
use domain::{AuthSession, DeliveryAddress, Product};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{GatewayError, Result};
use crate::services::{
    AddressBook, CatalogService, OrderConfirmation, OrderDetail, OrderRequest, OrderService,
    OrderSummary, PostalCodeLookup,
};

use super::wire::ProductPayload;

/// Backend API client.
///
/// One client serves the catalog, address book and order endpoints.
/// Authenticated calls carry the session's bearer token; the backend
/// answering 401 or 403 means the token is no longer valid.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpApiClient {
    /// Creates a client for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Service {
                operation: "client setup",
                status: None,
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Returns the configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds `{base}/{path}/{segment}` with `segment` percent-encoded as a
    /// single path segment.
    fn resource_url(&self, operation: &'static str, path: &str, segment: &str) -> Result<Url> {
        let invalid = |message: String| GatewayError::Service {
            operation,
            status: None,
            message,
        };

        let mut url = Url::parse(&self.config.endpoint(path))
            .map_err(|e| invalid(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| invalid("API base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(operation, %status, "backend rejected the session token");
            return Err(GatewayError::SessionExpired);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Service {
                operation,
                status: Some(status.as_u16()),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        serde_json::from_str(&body).map_err(|e| GatewayError::MalformedResponse {
            operation,
            reason: e.to_string(),
        })
    }

    fn transport_error(&self, operation: &'static str, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout {
                operation,
                after: self.config.request_timeout,
            }
        } else {
            GatewayError::Service {
                operation,
                status: error.status().map(|s| s.as_u16()),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl CatalogService for HttpApiClient {
    #[tracing::instrument(skip(self))]
    async fn product(&self, id: &ProductId) -> Result<Product> {
        let url = self.resource_url("product lookup", "/produtos", id.as_str())?;
        let payload: ProductPayload = self.send("product lookup", self.client.get(url)).await?;
        payload.into_product()
    }
}

#[async_trait]
impl AddressBook for HttpApiClient {
    #[tracing::instrument(skip(self, auth))]
    async fn saved_addresses(&self, auth: &AuthSession) -> Result<Vec<DeliveryAddress>> {
        let url = self.config.endpoint("/checkout");
        self.send("address listing", self.client.get(url).bearer_auth(&auth.token))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn lookup_postal_code(&self, postal_code: &str) -> Result<PostalCodeLookup> {
        let digits = crate::services::addresses::normalize_postal_code(postal_code);
        let url = self.resource_url("postal code lookup", "/viacep", &digits)?;
        self.send("postal code lookup", self.client.get(url)).await
    }
}

#[async_trait]
impl OrderService for HttpApiClient {
    #[tracing::instrument(skip(self, auth, request), fields(lines = request.items.len()))]
    async fn create_order(
        &self,
        auth: &AuthSession,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation> {
        let url = self.config.endpoint("/pedidos");
        self.send(
            "order creation",
            self.client.post(url).bearer_auth(&auth.token).json(request),
        )
        .await
    }

    #[tracing::instrument(skip(self, auth))]
    async fn my_orders(&self, auth: &AuthSession) -> Result<Vec<OrderSummary>> {
        let url = self.config.endpoint("/pedidos/meus-pedidos");
        self.send("order history", self.client.get(url).bearer_auth(&auth.token))
            .await
    }

    #[tracing::instrument(skip(self, auth))]
    async fn order_detail(&self, auth: &AuthSession, number: &OrderNumber) -> Result<OrderDetail> {
        let url = self.resource_url("order detail", "/pedidos", number.as_str())?;
        self.send("order detail", self.client.get(url).bearer_auth(&auth.token))
            .await
    }
}
