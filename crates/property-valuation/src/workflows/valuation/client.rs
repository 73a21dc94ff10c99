use std::future::Future;

use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::classify::{CallFailure, FailureBody};
use super::domain::ValuationResult;
use super::mapping::ValuationRequest;
use crate::config::ApiConfig;

const CALCULATE_PATH: &str = "api/valuation/calculate";
const ANALYSIS_PATH: &str = "api/valuation/calculate/analysis";
const USER_AGENT: &str = concat!("property-valuation/", env!("CARGO_PKG_VERSION"));

/// Outbound calls to the valuation service, abstracted so the orchestrator can be exercised
/// without a network.
pub trait ValuationApi: Send + Sync {
    fn calculate(
        &self,
        request: &ValuationRequest,
    ) -> impl Future<Output = Result<ValuationResult, CallFailure>> + Send;

    /// Returns the raw analysis text exactly as the service sent it.
    fn analyze(
        &self,
        result: &ValuationResult,
    ) -> impl Future<Output = Result<String, CallFailure>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unable to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
    #[error("invalid endpoint '{path}' for base url: {reason}")]
    Endpoint { path: &'static str, reason: String },
}

/// `reqwest`-backed implementation talking to the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpValuationApi {
    http: Client,
    calculate_url: Url,
    analysis_url: Url,
}

impl HttpValuationApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            calculate_url: endpoint(&config.base_url, CALCULATE_PATH)?,
            analysis_url: endpoint(&config.base_url, ANALYSIS_PATH)?,
        })
    }

    pub fn calculate_url(&self) -> &Url {
        &self.calculate_url
    }

    pub fn analysis_url(&self) -> &Url {
        &self.analysis_url
    }

    async fn post_json<B>(&self, url: &Url, body: &B) -> Result<Response, CallFailure>
    where
        B: Serialize + ?Sized,
    {
        debug!(%url, "posting to valuation service");
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| CallFailure::unreachable(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(raw) => FailureBody::from_raw(&raw),
            Err(err) => {
                debug!(%url, error = %err, "failed to read error body");
                None
            }
        };
        Err(CallFailure::status(status.as_u16(), body))
    }
}

impl ValuationApi for HttpValuationApi {
    async fn calculate(&self, request: &ValuationRequest) -> Result<ValuationResult, CallFailure> {
        let response = self.post_json(&self.calculate_url, request).await?;
        let status = response.status().as_u16();
        let undecodable = |err: &dyn std::fmt::Display| {
            CallFailure::status(status, None)
                .with_detail(format!("undecodable valuation result: {err}"))
        };
        let payload = response
            .json::<Value>()
            .await
            .map_err(|err| undecodable(&err))?;
        ValuationResult::from_service_payload(payload).map_err(|err| undecodable(&err))
    }

    async fn analyze(&self, result: &ValuationResult) -> Result<String, CallFailure> {
        // Hand back what the service sent rather than a re-encoding of the parsed numbers.
        let response = match result.service_payload() {
            Some(payload) => self.post_json(&self.analysis_url, payload).await?,
            None => self.post_json(&self.analysis_url, result).await?,
        };
        let status = response.status().as_u16();
        response.text().await.map_err(|err| {
            CallFailure::status(status, None).with_detail(format!("unreadable analysis body: {err}"))
        })
    }
}

fn endpoint(base: &Url, path: &'static str) -> Result<Url, ClientError> {
    base.join(path).map_err(|err| ClientError::Endpoint {
        path,
        reason: err.to_string(),
    })
}
