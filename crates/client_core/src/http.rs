//! reqwest-backed [`InventoryApi`] implementation.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Product, ProductId},
    error::ApiErrorBody,
    protocol::{Forecast, ForecastQuery, HealthStatus, MovementReceipt, NewMovement, NewProduct},
};
use tracing::debug;
use url::Url;

use crate::{error::ClientError, InventoryApi};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    http: Client,
    base_url: String,
}

impl HttpInventoryClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Validates an absolute http(s) base address and strips trailing slashes so
/// endpoint paths can be appended verbatim.
pub fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        base_url: trimmed.to_string(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            detail: ApiErrorBody::detail_from_body(&body),
        });
    }
    serde_json::from_str(&body).map_err(|source| ClientError::Decode { endpoint, source })
}

#[async_trait]
impl InventoryApi for HttpInventoryClient {
    async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        debug!(base_url = %self.base_url, "GET /products/");
        let res = self.http.get(self.endpoint("/products/")).send().await?;
        decode("GET /products/", res).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, ClientError> {
        debug!(sku = %product.sku, "POST /products/");
        let res = self
            .http
            .post(self.endpoint("/products/"))
            .json(product)
            .send()
            .await?;
        decode("POST /products/", res).await
    }

    async fn create_movement(&self, movement: NewMovement) -> Result<MovementReceipt, ClientError> {
        debug!(
            product_id = movement.product_id.0,
            kind = %movement.kind,
            quantity = movement.quantity,
            "POST /movements/"
        );
        let res = self
            .http
            .post(self.endpoint("/movements/"))
            .query(&movement)
            .send()
            .await?;
        decode("POST /movements/", res).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, ClientError> {
        debug!(product_id = id.0, "GET /products/{{id}}");
        let res = self
            .http
            .get(self.endpoint(&format!("/products/{}", id.0)))
            .send()
            .await?;
        decode("GET /products/{id}", res).await
    }

    async fn forecast(&self, query: ForecastQuery) -> Result<Forecast, ClientError> {
        debug!(
            product_id = query.product_id.0,
            horizon = query.horizon,
            "GET /ml/forecast"
        );
        let res = self
            .http
            .get(self.endpoint("/ml/forecast"))
            .query(&query)
            .send()
            .await?;
        decode("GET /ml/forecast", res).await
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        let res = self.http.get(self.endpoint("/health")).send().await?;
        decode("GET /health", res).await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
