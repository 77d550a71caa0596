/// Environment variables consulted, in order, when `provider.api_key` is unset
pub const API_KEY_ENV_VARS: &[&str] = &["POLYGON_API_KEY", "API_KEY"];

pub fn default_service_name() -> String {
    "optix".to_string()
}

pub fn default_service_version() -> String {
    "0.1.0".to_string()
}

// Provider defaults
pub fn default_provider_kind() -> super::ProviderKind {
    super::ProviderKind::Polygon
}

pub fn default_provider_base_url() -> String {
    "https://api.polygon.io".to_string()
}

pub fn default_provider_timeout_seconds() -> u64 {
    10
}

pub fn default_chain_page_limit() -> u32 {
    250
}

pub fn default_max_chain_pages() -> usize {
    4
}

// Pricing defaults
pub fn default_risk_free_rate() -> f64 {
    0.05
}

pub fn default_volatility() -> f64 {
    0.25
}

pub fn default_contract_multiplier() -> f64 {
    100.0
}

// Activity defaults
pub fn default_high_volume_oi_ratio() -> f64 {
    0.5
}

pub fn default_high_volume_min_contracts() -> u64 {
    500
}

pub fn default_block_notional_threshold() -> f64 {
    100_000.0
}

pub fn default_ratio_spike_percentile() -> f64 {
    95.0
}

pub fn default_skew_delta_buckets() -> Vec<f64> {
    vec![0.1, 0.2, 0.3, 0.4, 0.5]
}

// Server defaults
pub fn default_transport() -> super::Transport {
    super::Transport::Stdio
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    8000
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}
