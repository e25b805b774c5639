// # HTTP Address Resolver
//
// This crate learns the host's current public address by asking an
// external "what is my IP" service over HTTPS.
//
// ## Architecture
//
// One fixed endpoint per address family. The endpoint is reachable over a
// single family only, so whichever endpoint answered decides the family of
// the returned address. The body is a JSON object; only its `ip` field is
// used.
//
// Every call is a fresh GET: no caching, no retry. A failed lookup simply
// waits for the next update cycle.

use ddns_core::error::ResolutionError;
use ddns_core::traits::{AddressFamily, AddressResolver, ResolvedAddress};

use serde::Deserialize;
use std::time::Duration;

/// Endpoint answering over IPv4 only
pub const IPV4_ENDPOINT: &str = "https://ipv4.my.ipinfo.app/api/ipDetails.php";

/// Endpoint answering over IPv6 only
pub const IPV6_ENDPOINT: &str = "https://ipv6.my.ipinfo.app/api/ipDetails.php";

/// Upper bound for one lookup, connect included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned by the lookup endpoints
///
/// The service also reports `asn`, `country` and similar fields; they are
/// ignored.
#[derive(Debug, Deserialize)]
struct IpDetails {
    ip: String,
}

/// Resolves public addresses through the ipinfo.app endpoints
pub struct HttpAddressResolver {
    ipv4_endpoint: String,
    ipv6_endpoint: String,
    client: reqwest::Client,
}

impl HttpAddressResolver {
    /// Create a resolver using the default endpoints
    pub fn new() -> Self {
        Self::with_endpoints(IPV4_ENDPOINT, IPV6_ENDPOINT)
    }

    /// Create a resolver with custom endpoints
    ///
    /// # Parameters
    ///
    /// - `ipv4_endpoint`: URL queried for [`AddressFamily::V4`]
    /// - `ipv6_endpoint`: URL queried for [`AddressFamily::V6`]
    pub fn with_endpoints(ipv4_endpoint: impl Into<String>, ipv6_endpoint: impl Into<String>) -> Self {
        Self {
            ipv4_endpoint: ipv4_endpoint.into(),
            ipv6_endpoint: ipv6_endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// The endpoint queried for `family`
    pub fn endpoint(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => &self.ipv4_endpoint,
            AddressFamily::V6 => &self.ipv6_endpoint,
        }
    }

    /// Fetch the address reported by `endpoint`
    ///
    /// The returned address is tagged with `family`; its text is passed
    /// through as the service reported it.
    pub async fn fetch(
        &self,
        endpoint: &str,
        family: AddressFamily,
    ) -> Result<ResolvedAddress, ResolutionError> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| ResolutionError::Network {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolutionError::MalformedBody {
                endpoint: endpoint.to_string(),
                message: format!("failed to read body: {}", e),
            })?;

        let ip = parse_ip_details(&body).map_err(|message| ResolutionError::MalformedBody {
            endpoint: endpoint.to_string(),
            message,
        })?;

        if ip.is_empty() {
            return Err(ResolutionError::EmptyAddress {
                endpoint: endpoint.to_string(),
            });
        }

        tracing::debug!("Fetched IP {} from {}", ip, endpoint);
        Ok(ResolvedAddress::new(ip, family))
    }
}

impl Default for HttpAddressResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AddressResolver for HttpAddressResolver {
    async fn resolve(&self, family: AddressFamily) -> Result<ResolvedAddress, ResolutionError> {
        self.fetch(self.endpoint(family), family).await
    }
}

/// Extract the `ip` field from a lookup body
fn parse_ip_details(body: &str) -> Result<String, String> {
    serde_json::from_str::<IpDetails>(body)
        .map(|details| details.ip.trim().to_string())
        .map_err(|e| format!("invalid JSON: {}", e))
}
