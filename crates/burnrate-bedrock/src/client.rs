// SPDX-FileCopyrightText: 2026 Burnrate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Bedrock Converse API.
//!
//! Authenticates with a Bedrock API key sent as a bearer token. Each call is
//! a single attempt: failures are classified into [`CallErrorKind`] and
//! handed back so the worker pool owns retry and backoff.

use std::time::Duration;

use async_trait::async_trait;
use burnrate_config::model::BedrockConfig;
use burnrate_core::{
    BurnrateError, CallError, CallErrorKind, InvocationClient, InvocationRequest,
    InvocationResponse, TokenUsage,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::types::{ApiErrorBody, ConverseRequest, ConverseResponse};

/// Environment variable holding a Bedrock API key.
pub const BEARER_TOKEN_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Header carrying the AWS error code, e.g. `ThrottlingException:http://...`.
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

#[derive(Clone)]
pub struct BedrockClient {
    client: reqwest::Client,
    endpoint: String,
    model_id: String,
    token: SecretString,
}

impl std::fmt::Debug for BedrockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockClient")
            .field("endpoint", &self.endpoint)
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

/// Resolve the API key: `bedrock.api_key` first, then `AWS_BEARER_TOKEN_BEDROCK`.
pub fn resolve_api_key(config: &BedrockConfig) -> Result<SecretString, BurnrateError> {
    resolve_api_key_from(config.api_key.as_deref(), std::env::var(BEARER_TOKEN_ENV).ok())
}

fn resolve_api_key_from(
    configured: Option<&str>,
    from_env: Option<String>,
) -> Result<SecretString, BurnrateError> {
    configured
        .map(str::to_string)
        .or(from_env)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            BurnrateError::setup(format!(
                "no Bedrock API key: set bedrock.api_key or {BEARER_TOKEN_ENV}"
            ))
        })
}

impl BedrockClient {
    /// Build a client from configuration, resolving the API key.
    pub fn from_config(config: &BedrockConfig) -> Result<Self, BurnrateError> {
        let token = resolve_api_key(config)?;
        let client = Self::new(
            config.resolved_endpoint(),
            config.model_id.clone(),
            token,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(
            model = %client.model_id,
            endpoint = %client.endpoint,
            "Bedrock client initialized"
        );
        Ok(client)
    }

    pub fn new(
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, BurnrateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BurnrateError::setup(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model_id: model_id.into(),
            token,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn converse_url(&self) -> String {
        format!(
            "{}/model/{}/converse",
            self.endpoint,
            encode_path_segment(&self.model_id)
        )
    }

    async fn converse(&self, body: &ConverseRequest) -> Result<ConverseResponse, CallError> {
        let response = self
            .client
            .post(self.converse_url())
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        debug!(status = %status, model = %self.model_id, "converse response received");

        if status.is_success() {
            let text = response.text().await.map_err(classify_transport_error)?;
            return serde_json::from_str(&text).map_err(|e| {
                CallError::new(
                    CallErrorKind::Other,
                    format!("failed to parse Converse response: {e}"),
                )
            });
        }

        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(':').next().unwrap_or(v).to_string());
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        let kind = classify_status(status, error_type.as_deref());
        let message = match error_type {
            Some(code) => format!("Bedrock returned {status} ({code}): {message}"),
            None => format!("Bedrock returned {status}: {message}"),
        };
        Err(CallError::new(kind, message))
    }
}

#[async_trait]
impl InvocationClient for BedrockClient {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationResponse, CallError> {
        let body = ConverseRequest::user_prompt(
            &request.prompt,
            request.max_output_tokens,
            request.temperature,
        );
        let response = self.converse(&body).await?;
        Ok(InvocationResponse {
            text: response.text(),
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
        })
    }
}

/// Map an HTTP status (and AWS error code, if any) to a call error kind.
pub fn classify_status(status: StatusCode, error_type: Option<&str>) -> CallErrorKind {
    if let Some(code) = error_type {
        match code {
            "ThrottlingException" | "TooManyRequestsException" => {
                return CallErrorKind::Throttled;
            }
            "UnrecognizedClientException" | "ExpiredTokenException" | "InvalidSignatureException" => {
                return CallErrorKind::Auth;
            }
            _ => {}
        }
    }
    match status.as_u16() {
        408 => CallErrorKind::Timeout,
        429 => CallErrorKind::Throttled,
        401 => CallErrorKind::Auth,
        403 => CallErrorKind::PermissionDenied,
        404 => CallErrorKind::ModelNotFound,
        // ModelErrorException: the model failed while processing.
        424 => CallErrorKind::Server,
        500..=599 => CallErrorKind::Server,
        400..=499 => CallErrorKind::InvalidRequest,
        _ => CallErrorKind::Other,
    }
}

fn classify_transport_error(error: reqwest::Error) -> CallError {
    let kind = if error.is_timeout() {
        CallErrorKind::Timeout
    } else if error.is_connect() || error.is_request() || error.is_body() {
        CallErrorKind::Network
    } else if error.is_decode() {
        CallErrorKind::Other
    } else {
        CallErrorKind::Network
    };
    CallError::new(kind, format!("HTTP request failed: {error}"))
}

/// Everything outside the RFC 3986 unreserved set.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encode one URL path segment.
///
/// Model IDs contain `:` and inference-profile ARNs contain `/`, both of
/// which must be escaped inside a single path segment.
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_colon_is_encoded() {
        assert_eq!(
            encode_path_segment("anthropic.claude-3-haiku-20240307-v1:0"),
            "anthropic.claude-3-haiku-20240307-v1%3A0"
        );
    }

    #[test]
    fn arn_is_encoded_as_one_segment() {
        assert_eq!(
            encode_path_segment("arn:aws:bedrock:us-east-1:123:inference-profile/us.x"),
            "arn%3Aaws%3Abedrock%3Aus-east-1%3A123%3Ainference-profile%2Fus.x"
        );
    }

    #[test]
    fn unreserved_characters_pass_through_and_utf8_is_escaped() {
        assert_eq!(encode_path_segment("a-b.c_d~e"), "a-b.c_d~e");
        assert_eq!(encode_path_segment("us model é"), "us%20model%20%C3%A9");
    }

    #[test]
    fn converse_url_uses_endpoint_and_encoded_model() {
        let client = BedrockClient::new(
            "https://bedrock-runtime.us-east-1.amazonaws.com/",
            "m:1",
            SecretString::from("t".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.converse_url(),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/m%3A1/converse"
        );
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (429, CallErrorKind::Throttled),
            (408, CallErrorKind::Timeout),
            (500, CallErrorKind::Server),
            (503, CallErrorKind::Server),
            (424, CallErrorKind::Server),
            (401, CallErrorKind::Auth),
            (403, CallErrorKind::PermissionDenied),
            (404, CallErrorKind::ModelNotFound),
            (400, CallErrorKind::InvalidRequest),
            (422, CallErrorKind::InvalidRequest),
        ];
        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(classify_status(status, None), kind, "status {code}");
        }
    }

    #[test]
    fn error_type_header_refines_status() {
        let bad_request = StatusCode::BAD_REQUEST;
        assert_eq!(
            classify_status(bad_request, Some("ThrottlingException")),
            CallErrorKind::Throttled
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, Some("UnrecognizedClientException")),
            CallErrorKind::Auth
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, Some("AccessDeniedException")),
            CallErrorKind::PermissionDenied
        );
    }

    #[test]
    fn api_key_prefers_config_then_env() {
        let key = resolve_api_key_from(Some("from-config"), Some("from-env".into())).unwrap();
        assert_eq!(key.expose_secret(), "from-config");
        let key = resolve_api_key_from(None, Some("from-env".into())).unwrap();
        assert_eq!(key.expose_secret(), "from-env");
    }

    #[test]
    fn missing_api_key_is_a_setup_error() {
        let err = resolve_api_key_from(None, None).unwrap_err();
        assert!(matches!(err, BurnrateError::Setup { .. }));
        assert!(err.to_string().contains(BEARER_TOKEN_ENV));
        assert!(resolve_api_key_from(Some("  "), None).is_err());
    }

    #[test]
    fn debug_output_hides_token() {
        let client = BedrockClient::new(
            "http://localhost",
            "m",
            SecretString::from("super-secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
