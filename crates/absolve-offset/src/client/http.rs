//! HTTP layer: client construction, status mapping and body decoding.
//!
//! This is the ONLY place for status code handling. Stages never interpret
//! status codes. There is no retry loop: a failed attempt is terminal.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::Credential;
use crate::error::{OffsetError, OffsetResult};
use crate::types::OffsetConfig;

pub const USER_AGENT_VALUE: &str = concat!("absolve-offset/", env!("CARGO_PKG_VERSION"));

/// Cap on how much of an error body is carried into the error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// HTTP backend shared by the marketplace client and the pipeline notifier.
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub(crate) fn new(config: &OffsetConfig) -> OffsetResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| OffsetError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// POST a JSON body once; non-2xx becomes an error.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        credential: Option<&Credential>,
        body: &B,
    ) -> OffsetResult<reqwest::Response> {
        debug!(url = %url, authenticated = credential.is_some(), "POST");

        let mut request = self.client.post(url).json(body);
        if let Some(credential) = credential {
            request = request.header(AUTHORIZATION, credential.authorization_header());
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 => Err(OffsetError::Unauthorized {
                message: "invalid or missing private key".to_string(),
            }),

            _ => {
                let body = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(OffsetError::Api {
                    status: status.as_u16(),
                    body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                })
            }
        }
    }
}

/// Read a 2xx body as JSON, keeping non-JSON text as a string value.
///
/// For responses whose side effect has already happened, where a malformed
/// body must not turn success into failure.
pub(crate) async fn read_payload(response: reqwest::Response) -> serde_json::Value {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
        Err(e) => {
            warn!(error = %e, "failed to read response body");
            serde_json::Value::Null
        }
    }
}

/// Decode a 2xx body into `T`, also returning the raw JSON.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> OffsetResult<(T, serde_json::Value)> {
    let text = response.text().await.map_err(|e| OffsetError::Network {
        message: format!("failed to read {} body: {}", what, e),
    })?;

    let raw: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| OffsetError::Decode {
            message: format!("{} body is not JSON: {}", what, e),
        })?;

    let typed = serde_json::from_value::<T>(raw.clone()).map_err(|e| OffsetError::Decode {
        message: format!("failed to parse {}: {}", what, e),
    })?;

    Ok((typed, raw))
}
