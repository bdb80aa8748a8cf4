//! Response types for the Sieve diagnostics API.

use serde::Serialize;
use sieve_core::{CacheEntryInfo, CacheStats};
use utoipa::ToSchema;

/// Liveness report.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "healthy" when the server answers.
    #[schema(example = "healthy")]
    pub status: String,
    /// Server version.
    #[schema(example = "0.3.0")]
    pub version: String,
    /// Whether results are being stored.
    pub cache_enabled: bool,
    /// Live cache entries.
    pub entries: usize,
    /// Segments with a registered retirement listener.
    pub tracked_segments: usize,
}

/// One cached filter result.
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheEntryResponse {
    /// Cache front that created the entry.
    #[schema(example = 1)]
    pub owner: u64,
    /// Segment the result belongs to.
    #[schema(example = 42)]
    pub segment: u64,
    /// Filter key.
    #[schema(example = "status:active")]
    pub filter: String,
    /// Representation: empty, dense or sparse.
    #[schema(example = "sparse")]
    pub kind: String,
    /// True if the filter matched nothing.
    pub is_empty: bool,
    /// Number of matching documents.
    pub cardinality: usize,
    /// Bytes used by the representation.
    pub size_in_bytes: usize,
    /// Popcount of the bitset, dense entries only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_cardinality: Option<usize>,
}

impl From<CacheEntryInfo> for CacheEntryResponse {
    fn from(entry: CacheEntryInfo) -> Self {
        Self {
            owner: entry.owner.as_u64(),
            segment: entry.segment.as_u64(),
            filter: entry.filter.to_string(),
            kind: entry.kind.to_string(),
            is_empty: entry.is_empty,
            cardinality: entry.cardinality,
            size_in_bytes: entry.size_in_bytes,
            bit_cardinality: entry.bit_cardinality,
        }
    }
}

/// Response for `GET /_cache/contents`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheContentsResponse {
    /// Live entries, ordered by segment, owner and filter.
    pub filter_cache: Vec<CacheEntryResponse>,
}

/// Response for `GET /_cache/stats`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheStatsResponse {
    /// Live entries.
    pub entries: usize,
    /// Bytes charged by the accountant.
    pub size_in_bytes: u64,
    /// Segments with a registered retirement listener.
    pub tracked_segments: usize,
    /// Cache hits.
    pub hits: u64,
    /// Cache misses.
    pub misses: u64,
    /// Entries removed by retirement or clear.
    pub evictions: u64,
    /// hits / (hits + misses).
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            entries: stats.entries,
            size_in_bytes: stats.size_in_bytes,
            tracked_segments: stats.tracked_segments,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Stable error code, e.g. `SIEVE-005`.
    #[schema(example = "SIEVE-005")]
    pub code: String,
}
