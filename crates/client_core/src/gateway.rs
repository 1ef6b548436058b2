//! Remote quote API access: generation invocation and counter reads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    error::ClientError,
    protocol::{
        CounterQueryData, GenerateQuoteData, GraphQlRequest, GraphQlResponse,
        GENERATE_A_QUOTE_DOCUMENT, LIVE_QUERY_NAME, QUOTE_QUERY_NAME_DOCUMENT,
    },
};
use tracing::debug;
use url::Url;

use crate::config::Settings;

/// Invokes the remote generation function. Single call, fixed trigger token,
/// no retry. No timeout is enforced either: if the transport never resolves,
/// the orchestrator stays in `Processing` (known limitation).
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn invoke(&self) -> Result<Value, ClientError>;
}

/// Reads the current usage counter.
#[async_trait]
pub trait CounterGateway: Send + Sync {
    async fn fetch_current(&self) -> Result<u64, ClientError>;
}

pub struct MissingGenerationGateway;

#[async_trait]
impl GenerationGateway for MissingGenerationGateway {
    async fn invoke(&self) -> Result<Value, ClientError> {
        Err(ClientError::transport("generation gateway is unavailable"))
    }
}

pub struct MissingCounterGateway;

#[async_trait]
impl CounterGateway for MissingCounterGateway {
    async fn fetch_current(&self) -> Result<u64, ClientError> {
        Err(ClientError::transport("counter gateway is unavailable"))
    }
}

/// HTTP implementation of both gateways against the GraphQL quote API.
/// Authorization is the pre-established machine identity (API key header);
/// no per-call user credentials exist.
pub struct HttpQuoteGateway {
    http: Client,
    api_url: Url,
    api_key: String,
    generation_token: String,
}

impl HttpQuoteGateway {
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_url = Url::parse(&settings.api_url)
            .with_context(|| format!("invalid quote API URL '{}'", settings.api_url))?;
        Ok(Self {
            http: Client::new(),
            api_url,
            api_key: settings.api_key.clone(),
            generation_token: settings.generation_token.clone(),
        })
    }

    async fn post_graphql<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &'static str,
        variables: Value,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(self.api_url.clone())
            .header("x-api-key", &self.api_key)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|err| ClientError::transport(format!("{operation}: {err}")))?
            .error_for_status()
            .map_err(|err| ClientError::transport(format!("{operation}: {err}")))?;

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|err| ClientError::schema(format!("{operation}: {err}")))?;

        if let Some(errors) = body.errors.as_deref().filter(|errors| !errors.is_empty()) {
            return Err(ClientError::transport(format!(
                "{operation}: {}",
                errors[0].message
            )));
        }

        body.data
            .ok_or_else(|| ClientError::schema(format!("{operation}: response carried no data")))
    }
}

#[async_trait]
impl GenerationGateway for HttpQuoteGateway {
    async fn invoke(&self) -> Result<Value, ClientError> {
        let data: GenerateQuoteData = self
            .post_graphql(
                "generateAQuote",
                GENERATE_A_QUOTE_DOCUMENT,
                json!({ "input": self.generation_token }),
            )
            .await?;
        debug!(operation = "generateAQuote", "generation function resolved");
        Ok(data.generate_a_quote)
    }
}

#[async_trait]
impl CounterGateway for HttpQuoteGateway {
    async fn fetch_current(&self) -> Result<u64, ClientError> {
        let data: CounterQueryData = self
            .post_graphql(
                "quoteQueryName",
                QUOTE_QUERY_NAME_DOCUMENT,
                json!({ "queryName": LIVE_QUERY_NAME }),
            )
            .await?;
        // Only the first item is consulted; the LIVE record is unique.
        let record = data
            .quote_query_name
            .items
            .first()
            .ok_or_else(|| ClientError::schema("quoteQueryName: no counter record returned"))?;
        Ok(record.quotes_generated)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
