// # DNSPod Record Updater
//
// This crate pushes A/AAAA values to DNSPod through the Tencent Cloud
// API 3.0 `ModifyRecord` action.
//
// ## Request shape
//
// ```http
// POST / HTTP/1.1
// Host: dnspod.tencentcloudapi.com
// Content-Type: application/json; charset=utf-8
// X-TC-Action: ModifyRecord
// X-TC-Version: 2021-03-23
// X-TC-Timestamp: <unix seconds>
// Authorization: TC3-HMAC-SHA256 Credential=..., SignedHeaders=..., Signature=...
//
// {"Domain":..,"RecordType":..,"RecordLine":"默认","Value":..,"RecordId":..,"SubDomain":..,"TTL":600}
// ```
//
// ## Constraints
//
// - Exactly one HTTP request per `update()` call; no retry, no caching
// - The secret key never appears in logs or error messages
// - Every failure is returned as a typed `RemoteUpdateError` and logged here;
//   callers only record it

mod sign;
mod types;

pub use sign::{ALGORITHM, SIGNED_HEADERS, authorization};

use async_trait::async_trait;
use chrono::Utc;
use ddns_core::error::RemoteUpdateError;
use ddns_core::traits::{Credentials, RecordUpdate, RecordUpdater, UpdateOutcome, UpdateReceipt};
use ddns_core::{Error, Result};
use std::time::Duration;

use crate::types::{ModifyRecordRequest, TencentResponse};

/// Public API endpoint host
pub const DNSPOD_API_HOST: &str = "dnspod.tencentcloudapi.com";

/// Service name used in the credential scope
pub const DNSPOD_SERVICE: &str = "dnspod";

/// API version sent as `X-TC-Version`
pub const DNSPOD_VERSION: &str = "2021-03-23";

/// Action used for every update
pub const MODIFY_RECORD_ACTION: &str = "ModifyRecord";

/// Record line; DNSPod's name for the default resolution line
pub const DEFAULT_RECORD_LINE: &str = "默认";

/// Content type of every request, also part of the signature
pub(crate) const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// DNSPod record updater
///
/// Stateless apart from the HTTP client: credentials arrive with every call.
#[derive(Debug)]
pub struct DnspodProvider {
    /// Full URL the request is POSTed to
    endpoint: String,

    /// Host header value, signed
    host: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl DnspodProvider {
    /// Create a provider talking to the public Tencent Cloud endpoint
    pub fn new() -> Self {
        Self::build(format!("https://{}/", DNSPOD_API_HOST), DNSPOD_API_HOST.to_string())
    }

    /// Create a provider talking to a custom endpoint
    ///
    /// The `Host` header, and therefore the signature, follows the URL's
    /// authority.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `endpoint` is not an absolute URL
    /// with a host.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| Error::config(format!("Invalid DNSPod endpoint {}: {}", endpoint, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("DNSPod endpoint {} has no host", endpoint)))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self::build(url.to_string(), host))
    }

    fn build(endpoint: String, host: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            endpoint,
            host,
            client,
        }
    }

    /// The URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Serialize the `ModifyRecord` body for `update`
    pub fn request_body(update: &RecordUpdate) -> serde_json::Result<String> {
        let request = ModifyRecordRequest {
            domain: &update.domain,
            record_type: update.record_type.as_str(),
            record_line: DEFAULT_RECORD_LINE,
            value: &update.value,
            record_id: update.record_id.get(),
            sub_domain: update.effective_sub_domain(),
            ttl: update.ttl(),
        };
        serde_json::to_string(&request)
    }

    /// Send one signed `ModifyRecord` call and interpret the reply
    async fn modify_record(&self, credentials: &Credentials, update: &RecordUpdate) -> UpdateOutcome {
        let payload = Self::request_body(update)
            .map_err(|e| RemoteUpdateError::MalformedResponse(format!("failed to encode request: {}", e)))?;

        let timestamp = Utc::now().timestamp();
        let authorization = authorization(
            credentials,
            &self.host,
            MODIFY_RECORD_ACTION,
            &payload,
            timestamp,
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", &self.host)
            .header("X-TC-Action", MODIFY_RECORD_ACTION)
            .header("X-TC-Version", DNSPOD_VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("Authorization", authorization)
            .body(payload)
            .send()
            .await
            .map_err(|e| RemoteUpdateError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteUpdateError::Transport(format!("failed to read response: {}", e)))?;

        parse_response(status.as_u16(), body)
    }
}

impl Default for DnspodProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an HTTP status and body to an update outcome
fn parse_response(status: u16, body: String) -> UpdateOutcome {
    let parsed: TencentResponse = serde_json::from_str(&body).map_err(|e| {
        RemoteUpdateError::MalformedResponse(format!("HTTP {}: {} ({})", status, e, body))
    })?;
    let response = parsed.response;

    if let Some(error) = response.error {
        return Err(RemoteUpdateError::Provider {
            code: error.code,
            message: error.message,
            request_id: response.request_id.unwrap_or_default(),
        });
    }

    if !(200..300).contains(&status) {
        return Err(RemoteUpdateError::MalformedResponse(format!(
            "HTTP {} without error details: {}",
            status, body
        )));
    }

    Ok(UpdateReceipt {
        request_id: response.request_id,
        record_id: response.record_id,
        raw_response: body,
    })
}

#[async_trait]
impl RecordUpdater for DnspodProvider {
    async fn update(&self, credentials: &Credentials, update: &RecordUpdate) -> UpdateOutcome {
        tracing::debug!(
            "Modifying DNSPod record: Domain={}, Type={}, Line={}, Value={}, RecordID={}, SubDomain={}, TTL={}",
            update.domain,
            update.record_type,
            DEFAULT_RECORD_LINE,
            update.value,
            update.record_id,
            update.effective_sub_domain(),
            update.ttl()
        );

        let outcome = self.modify_record(credentials, update).await;

        match &outcome {
            Ok(receipt) => tracing::info!(
                record_id = ?receipt.record_id,
                "ModifyRecord API Response for {} ({}): {}",
                update.domain,
                update.record_type,
                receipt.raw_response
            ),
            Err(RemoteUpdateError::Provider {
                code,
                message,
                request_id,
            }) => tracing::error!(
                "DNSPod API error occurred: Code={}, Message={}, RequestId={}",
                code,
                message,
                request_id
            ),
            Err(e) => tracing::error!("Failed to invoke ModifyRecord API: {}", e),
        }

        outcome
    }

    fn provider_name(&self) -> &'static str {
        "dnspod"
    }
}
