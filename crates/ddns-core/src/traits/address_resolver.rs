// # Address Resolver Trait
//
// Defines the interface for discovering the caller's current public address.
//
// ## Implementations
//
// - HTTPS JSON endpoints: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{AddressFamily, AddressResolver};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* AddressResolver implementation */;
//
//     let v4 = resolver.resolve(AddressFamily::V4).await?;
//     println!("public IPv4: {}", v4.value);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

use crate::error::ResolutionError;

/// IP address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Both families in processing order (IPv4 strictly first)
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// Short label used in log fields
    pub fn label(self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An address learned during the current cycle
///
/// Produced fresh on every cycle. It has no identity beyond that cycle and
/// is never compared against a previous value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    /// IP literal exactly as reported by the endpoint
    pub value: String,
    /// Which family this address belongs to (decided by the endpoint used)
    pub family: AddressFamily,
}

impl ResolvedAddress {
    /// Create a new resolved address
    pub fn new(value: impl Into<String>, family: AddressFamily) -> Self {
        Self {
            value: value.into(),
            family,
        }
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Trait for public address resolvers
///
/// # Contract
///
/// - One outbound request per call, no caching
/// - No retries: every failure is returned as a [`ResolutionError`]
/// - Must be usable from the background update task (`Send + Sync`)
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve the current public address for `family`
    ///
    /// # Returns
    ///
    /// - `Ok(ResolvedAddress)`: The current address, tagged with `family`
    /// - `Err(ResolutionError)`: Network, status, body or empty-address failure
    async fn resolve(&self, family: AddressFamily) -> Result<ResolvedAddress, ResolutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_are_processed_v4_first() {
        assert_eq!(AddressFamily::ALL, [AddressFamily::V4, AddressFamily::V6]);
    }

    #[test]
    fn resolved_address_displays_value() {
        let addr = ResolvedAddress::new("2001:db8::1", AddressFamily::V6);
        assert_eq!(addr.to_string(), "2001:db8::1");
        assert_eq!(addr.family.to_string(), "IPv6");
    }
}
