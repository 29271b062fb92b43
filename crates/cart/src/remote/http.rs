//! HTTP implementation of the cart gateway.
//!
//! Talks to the cart REST API:
//!
//! - `GET /cart` - full snapshot
//! - `POST /cart/add` - body `{product_id, quantity}`
//! - `POST /cart/update` - body `[{product_id, quantity}, ...]`
//! - `DELETE /cart/delete/{product_id}`
//!
//! Every call carries the bearer credential and is bounded by the configured
//! timeout; an expired timeout is reported as [`GatewayError::Unavailable`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};
use url::Url;

use opaline_core::{CartLineItem, DisplaySnapshot, Price, ProductId, Quantity};

use super::{CartGateway, GatewayError, LineChange};

/// Gateway over the cart REST API.
///
/// Cheap to clone; the HTTP client and credential live behind an `Arc`.
#[derive(Clone)]
pub struct HttpCartGateway {
    inner: Arc<HttpCartGatewayInner>,
}

struct HttpCartGatewayInner {
    client: reqwest::Client,
    base_url: Url,
    bearer_token: SecretString,
}

impl HttpCartGateway {
    /// Create a gateway from the API configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] if the HTTP client cannot be
    /// constructed (e.g., no TLS backend).
    pub fn new(config: &crate::config::CartApiConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                error!(error = %err, "failed to build HTTP client");
                GatewayError::Unavailable
            })?;

        Ok(Self {
            inner: Arc::new(HttpCartGatewayInner {
                client,
                base_url: config.base_url.clone(),
                bearer_token: config.bearer_token.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.inner.base_url.join(path).map_err(|err| {
            error!(error = %err, path, "invalid gateway endpoint");
            GatewayError::Unavailable
        })
    }

    /// Send a request with the bearer credential and map the outcome.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .bearer_auth(self.inner.bearer_token.expose_secret())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(map_status(status))
        }
    }
}

/// Map an HTTP status to a gateway error.
fn map_status(status: StatusCode) -> GatewayError {
    match status.as_u16() {
        401 => GatewayError::Unauthorized,
        404 => GatewayError::NotFound,
        other => GatewayError::Server { status: other },
    }
}

/// Map a transport-level failure; timeouts and connection errors are the
/// same outcome for the engine.
fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        warn!(error = %err, "gateway request timed out");
    } else {
        warn!(error = %err, "gateway request failed");
    }
    GatewayError::Unavailable
}

// =============================================================================
// Wire Types
// =============================================================================

/// A cart line as the server sends it.
#[derive(Debug, Deserialize)]
struct WireCartLine {
    #[serde(rename = "productId")]
    product_id: i64,
    name: String,
    description: String,
    #[serde(rename = "urlImg")]
    url_img: String,
    quantity: i64,
    price: i64,
}

impl WireCartLine {
    /// Convert to a domain line, sanitizing values the server should never
    /// send. Out-of-range quantities are clamped (the server already
    /// accepted them, refusing here would wedge the cart); non-positive
    /// quantities drop the line.
    fn into_line(self) -> Option<CartLineItem> {
        let quantity = match self.quantity {
            q if q < i64::from(Quantity::MIN.get()) => {
                warn!(product_id = self.product_id, quantity = q, "dropping remote line with non-positive quantity");
                return None;
            }
            q if q > i64::from(Quantity::MAX.get()) => {
                warn!(product_id = self.product_id, quantity = q, "clamping remote quantity to bound");
                Quantity::MAX
            }
            q => {
                // In range per the arms above.
                let value = u32::try_from(q).ok()?;
                Quantity::new(value)?
            }
        };

        let unit_price = Price::from_minor_units(self.price).unwrap_or_else(|_| {
            warn!(product_id = self.product_id, price = self.price, "clamping negative remote price to zero");
            Price::ZERO
        });

        Some(CartLineItem {
            product_id: ProductId::new(self.product_id),
            display: DisplaySnapshot {
                name: self.name,
                description: self.description,
                image_url: self.url_img,
            },
            quantity,
            unit_price,
        })
    }
}

#[derive(Debug, Serialize)]
struct AddBody {
    product_id: i64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct UpdateBody {
    product_id: i64,
    quantity: u32,
}

#[async_trait]
impl CartGateway for HttpCartGateway {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<CartLineItem>, GatewayError> {
        let url = self.endpoint("cart")?;
        let response = self.send(self.inner.client.get(url)).await?;

        let lines: Vec<WireCartLine> = response.json().await.map_err(|err| {
            error!(error = %err, "failed to parse cart snapshot");
            GatewayError::Unavailable
        })?;

        Ok(lines.into_iter().filter_map(WireCartLine::into_line).collect())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add(&self, product_id: ProductId, quantity: Quantity) -> Result<(), GatewayError> {
        let url = self.endpoint("cart/add")?;
        let body = AddBody {
            product_id: product_id.as_i64(),
            quantity: quantity.get(),
        };
        self.send(self.inner.client.post(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self, changes))]
    async fn update_many(&self, changes: &[LineChange]) -> Result<(), GatewayError> {
        let url = self.endpoint("cart/update")?;
        let body: Vec<UpdateBody> = changes
            .iter()
            .map(|change| UpdateBody {
                product_id: change.product_id.as_i64(),
                quantity: change.quantity.get(),
            })
            .collect();
        self.send(self.inner.client.post(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove(&self, product_id: ProductId) -> Result<(), GatewayError> {
        let url = self.endpoint(&format!("cart/delete/{product_id}"))?;
        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }
}
