//! Set-order-status step client.

use std::time::Duration;

use async_trait::async_trait;
use common::{Actor, OrderId};
use orders::{OrderError, OrderLedger, OrderStatus};
use serde::Serialize;
use stock::StockError;

use crate::error::{Result, SagaError};

/// Internal-token header shared by collaborator services.
pub(crate) const INTERNAL_TOKEN_HEADER: &str = "X-Internal-Token";

/// Trait for the saga's set-order-status downstream call.
#[async_trait]
pub trait OrderStatusClient: Send + Sync {
    /// Sets the order's status on the order ledger.
    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()>;
}

/// Client calling the in-process order ledger with the internal actor.
#[derive(Clone)]
pub struct LocalOrderStatusClient {
    ledger: OrderLedger,
}

impl LocalOrderStatusClient {
    /// Creates a client over the given ledger.
    pub fn new(ledger: OrderLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl OrderStatusClient for LocalOrderStatusClient {
    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        self.ledger
            .set_status(&Actor::Internal, order_id, status)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                OrderError::Stock(StockError::Database(_)) => SagaError::Downstream(e.to_string()),
                other => SagaError::Rejected(other.to_string()),
            })
    }
}

#[derive(Serialize)]
struct SetStatusBody {
    status: OrderStatus,
}

/// HTTP client for a remotely deployed order service.
#[derive(Clone)]
pub struct HttpOrderStatusClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpOrderStatusClient {
    /// Creates a client against `base_url` with the shared internal token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl OrderStatusClient for HttpOrderStatusClient {
    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let url = format!("{}/orders/{}/status", self.base_url, order_id);
        let response = self
            .client
            .put(&url)
            .header(INTERNAL_TOKEN_HEADER, &self.token)
            .json(&SetStatusBody { status })
            .send()
            .await
            .map_err(|e| SagaError::Downstream(e.to_string()))?;

        let code = response.status();
        if code.is_success() {
            Ok(())
        } else if code.is_client_error() {
            Err(SagaError::Rejected(format!("order service returned {code}")))
        } else {
            Err(SagaError::Downstream(format!("order service returned {code}")))
        }
    }
}
