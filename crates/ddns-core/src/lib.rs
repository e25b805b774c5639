// # ddns-core
//
// Core library for the DNSPod dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **AddressResolver**: Trait for learning the current public IPv4/IPv6 address
// - **RecordUpdater**: Trait for pushing an address to the DNS provider
// - **Orchestrator**: Runs one cycle (IPv4 then IPv6, each family isolated)
// - **UpdateService**: Lifecycle controller with Start/Stop hooks and the periodic loop
// - **AppConfig**: File + environment configuration, turned into an immutable UpdatePlan
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP and provider implementations
// 2. **Failure Isolation**: One family's failure never affects the other, or the loop
// 3. **No Hidden State**: Every cycle resolves and pushes afresh; nothing is cached
// 4. **Library-First**: The daemon is a thin shell around this crate

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod service;
pub mod traits;

// Re-export core types for convenience
pub use config::{AppConfig, UpdatePlan, UpdateTarget};
pub use error::{Error, RemoteUpdateError, ResolutionError, Result};
pub use orchestrator::{CycleReport, FamilyOutcome, Orchestrator};
pub use service::{ServiceHooks, ServiceState, UPDATE_INTERVAL, UpdateService};
pub use traits::{AddressResolver, RecordUpdater};
