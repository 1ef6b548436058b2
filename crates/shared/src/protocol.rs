use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single counter record every deployment maintains is keyed by this
/// query name.
pub const LIVE_QUERY_NAME: &str = "LIVE";

/// GraphQL document for reading the usage counter record.
pub const QUOTE_QUERY_NAME_DOCUMENT: &str = r#"query QuoteQueryName(
  $queryName: String!
  $sortDirection: ModelSortDirection
  $filter: ModelQuoteAppDataFilterInput
  $limit: Int
  $nextToken: String
) {
  quoteQueryName(
    queryName: $queryName
    sortDirection: $sortDirection
    filter: $filter
    limit: $limit
    nextToken: $nextToken
  ) {
    items {
      id
      queryName
      quotesGenerated
      createdAt
      updatedAt
    }
    nextToken
  }
}"#;

/// GraphQL document invoking the remote generation function. The `input`
/// argument is an opaque trigger token, not user data.
pub const GENERATE_A_QUOTE_DOCUMENT: &str = r#"query GenerateAQuote($input: AWSJSON!) {
  generateAQuote(input: $input)
}"#;

#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
}

/// Nominal shape of the generation function's result. On the wire it may
/// arrive as a JSON string (sometimes doubly encoded) rather than an object;
/// the decoder unwraps those layers before validating this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationEnvelope {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Persisted usage-count entry. One record per deployment, `query_name`
/// always [`LIVE_QUERY_NAME`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterRecord {
    pub id: String,
    pub query_name: String,
    pub quotes_generated: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQueryPage {
    pub items: Vec<CounterRecord>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// `data` payload of the counter-read response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterQueryData {
    pub quote_query_name: QuoteQueryPage,
}

/// `data` payload of the generation response. The function result is kept as
/// a raw value; extracting the body is the decoder's job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuoteData {
    pub generate_a_quote: Value,
}
