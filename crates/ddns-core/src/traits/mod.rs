//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressResolver`]: Learn the current public address per family
//! - [`RecordUpdater`]: Push an address to the DNS provider

pub mod address_resolver;
pub mod record_updater;

pub use address_resolver::{AddressFamily, AddressResolver, ResolvedAddress};
pub use record_updater::{
    Credentials, DEFAULT_TTL, ROOT_LABEL, RecordId, RecordType, RecordUpdate, RecordUpdater,
    UpdateOutcome, UpdateReceipt, effective_sub_domain,
};
