//! Order store client
//!
//! Confirmed orders live in a Supabase-style REST backend. Each side of the
//! trade has its own collection; the backend answers with the stored row.
//! Order ids are assigned by the caller, and a create that repeats an id
//! merges into the existing row, so retrying a create cannot duplicate it.

use std::future::Future;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use shared::{ConfirmedOrderPayload, OrderSide};
use uuid::Uuid;

use crate::config::PersistenceConfig;
use crate::error::{AppError, AppResult};

/// Writes answer with the stored row
const RETURN_ROW: &str = "return=representation";

/// A create that repeats a primary key updates that row
const UPSERT_ROW: &str = "return=representation,resolution=merge-duplicates";

/// Row returned by the order store after a write
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredOrder {
    pub id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Persistence seam for confirmed orders
pub trait OrderStore: Clone + Send + Sync + 'static {
    /// Store a new order under `payload.id`. Repeating the call with the
    /// same payload must leave a single row.
    fn create(
        &self,
        side: OrderSide,
        payload: &ConfirmedOrderPayload,
    ) -> impl Future<Output = AppResult<StoredOrder>> + Send;

    fn replace(
        &self,
        side: OrderSide,
        id: Uuid,
        payload: &ConfirmedOrderPayload,
    ) -> impl Future<Output = AppResult<StoredOrder>> + Send;
}

/// HTTP client for the order store
#[derive(Clone)]
pub struct OrderStoreClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OrderStoreClient {
    /// Create a new OrderStoreClient
    pub fn new(config: &PersistenceConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self, side: OrderSide) -> String {
        format!("{}/{}", self.base_url, side.endpoint())
    }

    fn authorize(&self, request: RequestBuilder, prefer: &str) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", prefer)
    }

    fn create_request(&self, side: OrderSide, payload: &ConfirmedOrderPayload) -> RequestBuilder {
        let request = self.client.post(self.collection_url(side)).json(payload);
        self.authorize(request, UPSERT_ROW)
    }

    fn replace_request(
        &self,
        side: OrderSide,
        id: Uuid,
        payload: &ConfirmedOrderPayload,
    ) -> RequestBuilder {
        let url = format!("{}?id=eq.{}", self.collection_url(side), id);
        self.authorize(self.client.patch(url).json(payload), RETURN_ROW)
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Vec<StoredOrder>> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::PersistenceUnavailable(format!("request failed: {}", e)))?;

        let response = check_status(response).await?;

        response
            .json::<Vec<StoredOrder>>()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse order store response: {}", e)))
    }
}

impl OrderStore for OrderStoreClient {
    async fn create(
        &self,
        side: OrderSide,
        payload: &ConfirmedOrderPayload,
    ) -> AppResult<StoredOrder> {
        tracing::debug!(order_id = %payload.id, ?side, "Submitting confirmed order");

        let rows = self.send(self.create_request(side, payload)).await?;
        rows.into_iter().next().ok_or_else(|| AppError::PersistenceRejected {
            status: StatusCode::OK.as_u16(),
            message: "order store returned no row".to_string(),
        })
    }

    async fn replace(
        &self,
        side: OrderSide,
        id: Uuid,
        payload: &ConfirmedOrderPayload,
    ) -> AppResult<StoredOrder> {
        tracing::debug!(order_id = %id, ?side, "Replacing confirmed order");

        let rows = self.send(self.replace_request(side, id, payload)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Confirmed order {}", id)))
    }
}

async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

fn status_error(status: StatusCode, body: String) -> AppError {
    if status == StatusCode::NOT_FOUND {
        AppError::NotFound(format!("Order store resource ({})", body))
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AppError::PersistenceUnavailable(format!("{} - {}", status, body))
    } else {
        AppError::PersistenceRejected {
            status: status.as_u16(),
            message: body,
        }
    }
}
