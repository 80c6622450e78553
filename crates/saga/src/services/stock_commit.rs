//! Stock-commit step client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use serde::Serialize;
use stock::StockStore;

use crate::error::{Result, SagaError};
use crate::services::order_status::INTERNAL_TOKEN_HEADER;

/// Trait for the saga's stock-commit downstream call.
#[async_trait]
pub trait StockCommitClient: Send + Sync {
    /// Finalizes the stock debit for an order. Idempotent on the far side.
    async fn commit(&self, order_id: OrderId) -> Result<()>;
}

/// Client calling the in-process stock ledger.
#[derive(Clone)]
pub struct LocalStockCommitClient {
    stock: Arc<dyn StockStore>,
}

impl LocalStockCommitClient {
    /// Creates a client over the given stock store.
    pub fn new(stock: Arc<dyn StockStore>) -> Self {
        Self { stock }
    }
}

#[async_trait]
impl StockCommitClient for LocalStockCommitClient {
    async fn commit(&self, order_id: OrderId) -> Result<()> {
        // A replayed commit returns false; that is still success.
        self.stock
            .commit_order(order_id)
            .await
            .map(|_| ())
            .map_err(|e| SagaError::Downstream(e.to_string()))
    }
}

#[derive(Serialize)]
struct CommitBody {
    order_id: OrderId,
}

/// HTTP client for a remotely deployed product service.
#[derive(Clone)]
pub struct HttpStockCommitClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpStockCommitClient {
    /// Creates a client against `base_url` with the shared internal token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
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
impl StockCommitClient for HttpStockCommitClient {
    async fn commit(&self, order_id: OrderId) -> Result<()> {
        let url = format!("{}/internal/commit", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(INTERNAL_TOKEN_HEADER, &self.token)
            .json(&CommitBody { order_id })
            .send()
            .await
            .map_err(|e| SagaError::Downstream(e.to_string()))?;

        let code = response.status();
        if code.is_success() {
            Ok(())
        } else if code.is_client_error() {
            Err(SagaError::Rejected(format!("product service returned {code}")))
        } else {
            Err(SagaError::Downstream(format!("product service returned {code}")))
        }
    }
}
