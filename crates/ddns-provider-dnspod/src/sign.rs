//! TC3-HMAC-SHA256 request signing
//!
//! Tencent Cloud API 3.0 signs every call with a key derived from the
//! secret key, the UTC date and the service name. Only the three headers
//! listed in [`SIGNED_HEADERS`] take part in the canonical request.

use chrono::{DateTime, Utc};
use ddns_core::traits::Credentials;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{CONTENT_TYPE, DNSPOD_SERVICE};

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name, also the `Authorization` prefix
pub const ALGORITHM: &str = "TC3-HMAC-SHA256";

/// Headers covered by the signature
pub const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Build the `Authorization` header value for one POST
///
/// # Parameters
///
/// - `credentials`: secret id and key
/// - `host`: value sent in the `Host` header
/// - `action`: API action, e.g. `ModifyRecord`
/// - `payload`: exact JSON body
/// - `timestamp`: Unix seconds, also sent as `X-TC-Timestamp`
pub fn authorization(
    credentials: &Credentials,
    host: &str,
    action: &str,
    payload: &str,
    timestamp: i64,
) -> String {
    let date = DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d")
        .to_string();

    let canonical_headers = format!(
        "content-type:{}\nhost:{}\nx-tc-action:{}\n",
        CONTENT_TYPE,
        host,
        action.to_lowercase()
    );
    let canonical_request = format!(
        "POST\n/\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{}",
        sha256_hex(payload.as_bytes())
    );

    let credential_scope = format!("{date}/{DNSPOD_SERVICE}/tc3_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{timestamp}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let secret_date = hmac_sha256(
        format!("TC3{}", credentials.secret_key).as_bytes(),
        date.as_bytes(),
    );
    let secret_service = hmac_sha256(&secret_date, DNSPOD_SERVICE.as_bytes());
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request");
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.secret_id, credential_scope, SIGNED_HEADERS, signature
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DNSPOD_API_HOST;

    // 2024-01-15 08:00:00 UTC
    const TS: i64 = 1_705_305_600;

    fn credentials() -> Credentials {
        Credentials::new("test_secret_id", "test_secret_key")
    }

    fn sign(action: &str, payload: &str, timestamp: i64) -> String {
        authorization(&credentials(), DNSPOD_API_HOST, action, payload, timestamp)
    }

    fn signature_of(header: &str) -> &str {
        header.rsplit("Signature=").next().unwrap()
    }

    fn credential_of(header: &str) -> &str {
        let start = header.find("Credential=").unwrap() + "Credential=".len();
        let end = header[start..].find(',').unwrap() + start;
        &header[start..end]
    }

    #[test]
    fn test_header_layout() {
        let header = sign("ModifyRecord", "{}", TS);

        assert!(header.starts_with("TC3-HMAC-SHA256 Credential="));
        assert!(header.contains(", SignedHeaders=content-type;host;x-tc-action, "));

        let signature = signature_of(&header);
        assert_eq!(signature.len(), 64, "hex-encoded SHA-256");
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_credential_scope() {
        let header = sign("ModifyRecord", "{}", TS);
        assert_eq!(
            credential_of(&header),
            "test_secret_id/2024-01-15/dnspod/tc3_request"
        );
    }

    #[test]
    fn test_date_is_utc_day_of_timestamp() {
        // 2024-01-15 20:00:00 UTC, same day
        let evening = sign("ModifyRecord", "{}", 1_705_348_800);
        assert!(credential_of(&evening).contains("/2024-01-15/"));

        // 2024-01-16 08:00:00 UTC
        let next_day = sign("ModifyRecord", "{}", 1_705_392_000);
        assert!(credential_of(&next_day).contains("/2024-01-16/"));
    }

    #[test]
    fn test_deterministic() {
        let payload = r#"{"Domain":"example.com"}"#;
        assert_eq!(sign("ModifyRecord", payload, TS), sign("ModifyRecord", payload, TS));
    }

    #[test]
    fn test_inputs_change_signature() {
        let base = sign("ModifyRecord", r#"{"Value":"203.0.113.5"}"#, TS);

        let other_payload = sign("ModifyRecord", r#"{"Value":"203.0.113.6"}"#, TS);
        let other_action = sign("DescribeRecord", r#"{"Value":"203.0.113.5"}"#, TS);
        let other_time = sign("ModifyRecord", r#"{"Value":"203.0.113.5"}"#, TS + 1);
        let other_host = authorization(
            &credentials(),
            "127.0.0.1:8080",
            "ModifyRecord",
            r#"{"Value":"203.0.113.5"}"#,
            TS,
        );
        let other_key = authorization(
            &Credentials::new("test_secret_id", "another_key"),
            DNSPOD_API_HOST,
            "ModifyRecord",
            r#"{"Value":"203.0.113.5"}"#,
            TS,
        );

        for other in [other_payload, other_action, other_time, other_host, other_key] {
            assert_ne!(signature_of(&base), signature_of(&other));
        }
    }

    #[test]
    fn test_secret_key_never_in_header() {
        let header = sign("ModifyRecord", "{}", TS);
        assert!(!header.contains("test_secret_key"));
    }
}
