//! Tencent Cloud `DNSPod` API payloads

use serde::{Deserialize, Serialize};

/// Body of a `ModifyRecord` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyRecordRequest<'a> {
    pub domain: &'a str,
    pub record_type: &'a str,
    pub record_line: &'a str,
    pub value: &'a str,
    pub record_id: u64,
    pub sub_domain: &'a str,
    #[serde(rename = "TTL")]
    pub ttl: u64,
}

/// Generic Tencent Cloud response envelope
#[derive(Debug, Deserialize)]
pub struct TencentResponse {
    #[serde(rename = "Response")]
    pub response: ModifyRecordResponse,
}

/// Inner `Response` object of `ModifyRecord`
///
/// Either `error` is set, or `record_id` echoes the modified record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyRecordResponse {
    #[serde(default)]
    pub record_id: Option<u64>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub error: Option<TencentError>,
}

/// Error payload nested inside Tencent Cloud responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TencentError {
    pub code: String,
    pub message: String,
}
