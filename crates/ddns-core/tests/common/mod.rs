//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record how the
//! orchestrator and the service drive their collaborators.

#![allow(dead_code)]

use ddns_core::config::{UpdatePlan, UpdateTarget};
use ddns_core::error::{RemoteUpdateError, ResolutionError};
use ddns_core::traits::{
    AddressFamily, AddressResolver, Credentials, RecordId, RecordType, RecordUpdate,
    RecordUpdater, ResolvedAddress, UpdateOutcome, UpdateReceipt,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const IPV4: &str = "203.0.113.5";
pub const IPV6: &str = "2001:db8::5";

/// A resolver that returns a scripted answer per family
pub struct ScriptedResolver {
    v4: Result<String, ResolutionError>,
    v6: Result<String, ResolutionError>,
    /// Families in call order
    calls: Mutex<Vec<AddressFamily>>,
    /// Optional artificial latency per call, changeable mid-test
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedResolver {
    /// Both families resolve successfully
    pub fn new() -> Self {
        Self {
            v4: Ok(IPV4.to_string()),
            v6: Ok(IPV6.to_string()),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, family: AddressFamily, error: ResolutionError) -> Self {
        match family {
            AddressFamily::V4 => self.v4 = Err(error),
            AddressFamily::V6 => self.v6 = Err(error),
        }
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(Some(delay));
        self
    }

    /// Change the latency of calls made from now on
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Highest number of lookups that were ever running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Families resolved so far, in order
    pub fn calls(&self) -> Vec<AddressFamily> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, family: AddressFamily) -> usize {
        self.calls().into_iter().filter(|f| *f == family).count()
    }
}

#[async_trait::async_trait]
impl AddressResolver for ScriptedResolver {
    async fn resolve(&self, family: AddressFamily) -> Result<ResolvedAddress, ResolutionError> {
        self.calls.lock().unwrap().push(family);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let answer = match family {
            AddressFamily::V4 => &self.v4,
            AddressFamily::V6 => &self.v6,
        };
        answer
            .clone()
            .map(|value| ResolvedAddress::new(value, family))
    }
}

/// An updater that records every request
pub struct RecordingUpdater {
    updates: Mutex<Vec<RecordUpdate>>,
    failing_types: Vec<RecordType>,
    completed: AtomicUsize,
}

impl RecordingUpdater {
    pub fn new() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            failing_types: Vec::new(),
            completed: AtomicUsize::new(0),
        }
    }

    /// Reject every update of `record_type` with a provider error
    pub fn failing(mut self, record_type: RecordType) -> Self {
        self.failing_types.push(record_type);
        self
    }

    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn updates_of(&self, record_type: RecordType) -> Vec<RecordUpdate> {
        self.updates()
            .into_iter()
            .filter(|u| u.record_type == record_type)
            .collect()
    }
}

#[async_trait::async_trait]
impl RecordUpdater for RecordingUpdater {
    async fn update(&self, _credentials: &Credentials, update: &RecordUpdate) -> UpdateOutcome {
        self.updates.lock().unwrap().push(update.clone());
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing_types.contains(&update.record_type) {
            return Err(RemoteUpdateError::Provider {
                code: "InvalidParameter".to_string(),
                message: "scripted failure".to_string(),
                request_id: "test-request".to_string(),
            });
        }

        Ok(UpdateReceipt {
            request_id: Some("test-request".to_string()),
            record_id: Some(update.record_id.get()),
            raw_response: "{}".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A resolution failure as produced by an HTTP 500
pub fn status_500(family: AddressFamily) -> ResolutionError {
    ResolutionError::Status {
        endpoint: format!("https://{}.test/ip", family.label().to_lowercase()),
        status: 500,
    }
}

/// Helper to create a plan for `example.com`
pub fn plan(record_id_ipv4: Option<u64>, record_id_ipv6: Option<u64>) -> UpdatePlan {
    UpdatePlan {
        credentials: Credentials::new("id", "key"),
        domain: "example.com".to_string(),
        ipv4: UpdateTarget::new(AddressFamily::V4, record_id_ipv4.and_then(RecordId::new), ""),
        ipv6: UpdateTarget::new(AddressFamily::V6, record_id_ipv6.and_then(RecordId::new), ""),
    }
}
