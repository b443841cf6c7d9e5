//! Default values for configuration

use crate::engine::HealthStatus;

/// Default search engine URL (the compose service name)
pub fn default_engine_url() -> String {
    std::env::var("ES_URL").unwrap_or_else(|_| "http://elasticsearch:9200".to_string())
}

/// Default target index
pub fn default_index_name() -> String {
    std::env::var("ES_INDEX").unwrap_or_else(|_| "address_places".to_string())
}

/// Overall readiness deadline in seconds
pub fn default_readiness_timeout() -> u64 {
    300
}

/// Fixed delay between health probes
pub fn default_poll_interval() -> u64 {
    5
}

/// Per-probe timeout, must stay below the poll interval
pub fn default_probe_timeout() -> u64 {
    4
}

/// Degraded-but-usable is enough to proceed
pub fn default_wait_for_status() -> HealthStatus {
    HealthStatus::Yellow
}

pub fn default_http_max_retries() -> u32 {
    3
}

pub fn default_backoff_base_ms() -> u64 {
    1000
}

pub fn default_backoff_max_ms() -> u64 {
    10_000
}

/// Statuses the HTTP layer retries with backoff
pub fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

pub fn default_request_timeout() -> u64 {
    30
}

/// Index creation may take longer than plain requests
pub fn default_create_timeout() -> u64 {
    60
}

/// Fields whose type must match for the live index to be compatible
pub fn default_fingerprint_fields() -> Vec<String> {
    vec!["centroid".to_string(), "address_parts".to_string()]
}

pub fn default_max_ngram_diff() -> u32 {
    10
}

pub fn default_total_fields_limit() -> u32 {
    2000
}

pub fn default_ngram_min() -> u32 {
    2
}

pub fn default_ngram_max() -> u32 {
    8
}

pub fn default_edge_ngram_min() -> u32 {
    2
}

pub fn default_edge_ngram_max() -> u32 {
    15
}

pub fn default_templates_enabled() -> bool {
    true
}
