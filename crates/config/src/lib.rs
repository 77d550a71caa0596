use serde::{Deserialize, Serialize};
use std::fmt;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Root of `optix.yaml`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub service: ServiceInfo,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceInfo {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Polygon.io REST API
    Polygon,
    /// In-memory data, no network access
    Static,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Polygon => write!(f, "polygon"),
            ProviderKind::Static => write!(f, "static"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub name: ProviderKind,
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Falls back to `POLYGON_API_KEY` / `API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_provider_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_chain_page_limit")]
    pub chain_page_limit: u32,
    #[serde(default = "default_max_chain_pages")]
    pub max_chain_pages: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_kind(),
            base_url: default_provider_base_url(),
            api_key: None,
            timeout_seconds: default_provider_timeout_seconds(),
            chain_page_limit: default_chain_page_limit(),
            max_chain_pages: default_max_chain_pages(),
        }
    }
}

impl ProviderConfig {
    /// Configured key, or the first non-empty key from the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !has_unresolved_env_vars(k))
            .map(str::to_string)
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .map(|v| v.trim().to_string())
                    .find(|v| !v.is_empty())
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    #[serde(default = "default_risk_free_rate")]
    pub default_risk_free_rate: f64,
    #[serde(default = "default_volatility")]
    pub default_volatility: f64,
    #[serde(default = "default_contract_multiplier")]
    pub contract_multiplier: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_risk_free_rate: default_risk_free_rate(),
            default_volatility: default_volatility(),
            contract_multiplier: default_contract_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivityConfig {
    #[serde(default = "default_high_volume_oi_ratio")]
    pub high_volume_oi_ratio: f64,
    #[serde(default = "default_high_volume_min_contracts")]
    pub high_volume_min_contracts: u64,
    #[serde(default = "default_block_notional_threshold")]
    pub block_notional_threshold: f64,
    #[serde(default = "default_ratio_spike_percentile")]
    pub ratio_spike_percentile: f64,
    #[serde(default = "default_skew_delta_buckets")]
    pub skew_delta_buckets: Vec<f64>,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            high_volume_oi_ratio: default_high_volume_oi_ratio(),
            high_volume_min_contracts: default_high_volume_min_contracts(),
            block_notional_threshold: default_block_notional_threshold(),
            ratio_spike_percentile: default_ratio_spike_percentile(),
            skew_delta_buckets: default_skew_delta_buckets(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Stdio,
    Http,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => write!(f, "stdio"),
            Transport::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_transport")]
    pub transport: Transport,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}
