//! crates/dental_core/src/ports.rs
//!
//! Defines the contracts (traits) the back office depends on: where data is
//! stored and how simulated latency and failure are injected. Adapters in the
//! service crate supply the implementations, so tests can swap in a
//! deterministic policy or an in-memory store.

use async_trait::async_trait;
use std::time::Duration;

use crate::workflow::WorkflowType;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { key: String, needed: usize, limit: usize },
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port
//=========================================================================================

/// String key-value storage with local-storage semantics: a missing key reads
/// as `None` and every write replaces the whole value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;

    /// Total size of all keys and values, in bytes.
    async fn usage_bytes(&self) -> PortResult<usize>;
}

//=========================================================================================
// Fault Injection Port
//=========================================================================================

/// An inclusive range of artificial latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyRange {
    pub min: Duration,
    pub max: Duration,
}

impl LatencyRange {
    /// Latency padding collection reads and writes.
    pub const STORAGE: LatencyRange = LatencyRange::from_millis(100, 500);
    /// Latency padding credential checks.
    pub const AUTH: LatencyRange = LatencyRange::from_millis(200, 800);

    pub const fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }
}

/// Decides how long simulated operations take and whether a workflow step fails.
pub trait FaultPolicy: Send + Sync {
    /// Delay to apply before a persistence call completes.
    fn latency(&self, range: LatencyRange) -> Duration;

    /// How long a step with the given planned duration actually suspends.
    fn step_duration(&self, planned: Duration) -> Duration;

    /// Whether the step at `step_index` of a `kind` workflow fails.
    fn fail_step(&self, kind: WorkflowType, step_index: usize) -> bool;
}
