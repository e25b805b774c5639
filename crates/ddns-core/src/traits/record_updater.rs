// # Record Updater Trait
//
// Defines the interface for pushing an address to a DNS provider.
//
// ## Implementations
//
// - DNSPod (Tencent Cloud): `ddns-provider-dnspod` crate
//
// ## Outcome, not error propagation
//
// `update()` returns an [`UpdateOutcome`]. Callers log it and keep going:
// a failed update for one address family must never block the other family
// or stop the scheduling loop.

use async_trait::async_trait;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::error::RemoteUpdateError;
use crate::traits::AddressFamily;

/// Root label used when no subdomain is configured
pub const ROOT_LABEL: &str = "@";

/// TTL applied to every update
pub const DEFAULT_TTL: u64 = 600;

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Record type carrying addresses of `family`
    pub fn for_family(family: AddressFamily) -> Self {
        match family {
            AddressFamily::V4 => RecordType::A,
            AddressFamily::V6 => RecordType::Aaaa,
        }
    }

    /// Wire name used by provider APIs
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-side record identifier
///
/// Zero is not a valid identifier, so "not configured" is modelled as
/// `Option<RecordId>` rather than a zero sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(NonZeroU64);

impl RecordId {
    /// Wrap a raw identifier; `None` for zero
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw identifier
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s
            .trim()
            .parse()
            .map_err(|e| format!("'{}' is not a valid record id: {}", s, e))?;
        Self::new(raw).ok_or_else(|| "record id 0 is not a valid identifier".to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// API credentials for the DNS provider
///
/// Passed unmodified to the provider. The Debug implementation intentionally
/// does NOT expose the secret key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Secret ID
    pub secret_id: String,
    /// Secret key
    /// ⚠️ NEVER log this value
    pub secret_key: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Both halves are present
    pub fn is_complete(&self) -> bool {
        !self.secret_id.is_empty() && !self.secret_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id_set", &!self.secret_id.is_empty())
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

/// A single record mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Zone, e.g. "example.com"
    pub domain: String,
    /// Record to modify
    pub record_id: RecordId,
    /// New record value (IP literal)
    pub value: String,
    /// A or AAAA
    pub record_type: RecordType,
    /// Host label; empty means root
    pub sub_domain: String,
}

impl RecordUpdate {
    /// Subdomain to send, falling back to the root label
    pub fn effective_sub_domain(&self) -> &str {
        effective_sub_domain(&self.sub_domain)
    }

    /// TTL to send (fixed, not caller-tunable)
    pub fn ttl(&self) -> u64 {
        DEFAULT_TTL
    }
}

/// Map an empty label to [`ROOT_LABEL`]
pub fn effective_sub_domain(sub_domain: &str) -> &str {
    if sub_domain.trim().is_empty() {
        ROOT_LABEL
    } else {
        sub_domain
    }
}

/// Successful provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReceipt {
    /// Provider request identifier, when one was returned
    pub request_id: Option<String>,
    /// Record the provider reports as modified
    pub record_id: Option<u64>,
    /// Raw response body, kept for logging
    pub raw_response: String,
}

/// Typed result of one update attempt; logged and discarded by callers
pub type UpdateOutcome = Result<UpdateReceipt, RemoteUpdateError>;

/// Trait for DNS record updaters
///
/// # Contract
///
/// - Exactly one outbound remote call per invocation
/// - `record_id` is non-zero by construction; no re-validation needed
/// - Logs request parameters (never the secret key) and the outcome
/// - Never retries
#[async_trait]
pub trait RecordUpdater: Send + Sync {
    /// Push `update` to the provider using `credentials`
    async fn update(&self, credentials: &Credentials, update: &RecordUpdate) -> UpdateOutcome;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
