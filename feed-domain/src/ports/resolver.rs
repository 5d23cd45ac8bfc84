use async_trait::async_trait;

use crate::entities::SolarSystem;

/// Cached reference-data lookups used by the filter evaluator.
///
/// Implementations memoize resolved entries for the process lifetime and
/// guarantee at most one outstanding upstream fetch per key class. Errors
/// are transient: callers must not cache a failure.
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resolve_system(&self, system_id: u32) -> anyhow::Result<SolarSystem>;
    async fn resolve_group(&self, type_id: u32) -> anyhow::Result<u32>;
    async fn resolve_name(&self, id: u64) -> anyhow::Result<String>;
}

/// Raw upstream reference-data source (one network call per lookup).
/// Batching is an optimization a source may offer internally; each call is
/// logically independent.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch_system(&self, system_id: u32) -> anyhow::Result<SolarSystem>;
    async fn fetch_group(&self, type_id: u32) -> anyhow::Result<u32>;
    async fn fetch_name(&self, id: u64) -> anyhow::Result<String>;
}
