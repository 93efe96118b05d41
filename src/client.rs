//! Stateless request/response functions against the pricing authority.
//! Each call is side-effect-free locally; failures come back as typed
//! `EngineError`s, never raw transport panics. Retrying is the caller's
//! decision.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dto::discount::{ValidateDiscountRequest, ValidateDiscountResponse};
use crate::dto::evaluate::{EligibleGiftsRequest, EvaluateCartRequest};
use crate::error::{EngineError, EngineResult};
use crate::gifts::GiftSelectionSubmission;
use crate::models::{CartLineItem, FreeGift, PromotionalCartResult};

#[async_trait]
pub trait PricingClient: Send + Sync {
    async fn validate_discount(
        &self,
        code: &str,
        subtotal: i64,
        items: &[CartLineItem],
    ) -> EngineResult<ValidateDiscountResponse>;

    async fn eligible_gifts(
        &self,
        items: &[CartLineItem],
        subtotal: i64,
    ) -> EngineResult<Vec<FreeGift>>;

    async fn evaluate(
        &self,
        items: &[CartLineItem],
        discount_code: Option<&str>,
        gift_selections: &[GiftSelectionSubmission],
    ) -> EngineResult<PromotionalCartResult>;
}

pub struct HttpPricingClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPricingClient {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(EngineError::Transport)?;
        Ok(Self {
            http,
            base_url: config.authority_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> EngineResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request_id = Uuid::new_v4();
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header("x-request-id", request_id.to_string())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, %request_id, "pricing authority rejected request");
            return Err(EngineError::UnexpectedStatus(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PricingClient for HttpPricingClient {
    async fn validate_discount(
        &self,
        code: &str,
        subtotal: i64,
        items: &[CartLineItem],
    ) -> EngineResult<ValidateDiscountResponse> {
        self.post_json(
            "/cart/validate-discount",
            &ValidateDiscountRequest {
                code,
                subtotal,
                items,
            },
        )
        .await
    }

    async fn eligible_gifts(
        &self,
        items: &[CartLineItem],
        subtotal: i64,
    ) -> EngineResult<Vec<FreeGift>> {
        self.post_json("/cart/eligible-gifts", &EligibleGiftsRequest { items, subtotal })
            .await
    }

    async fn evaluate(
        &self,
        items: &[CartLineItem],
        discount_code: Option<&str>,
        gift_selections: &[GiftSelectionSubmission],
    ) -> EngineResult<PromotionalCartResult> {
        self.post_json(
            "/cart/evaluate",
            &EvaluateCartRequest {
                items,
                discount_code,
                gift_selections,
            },
        )
        .await
    }
}
