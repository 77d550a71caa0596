use crate::*;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("Invalid version format: {0}. Must be in format X.Y.Z (e.g., 1.0.0)")]
    InvalidVersionFormat(String),

    #[error("Provider '{provider}' requires an API key (set provider.api_key or POLYGON_API_KEY)")]
    MissingApiKey { provider: String },

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },

    #[error("{field} is not a valid URL: {message}")]
    InvalidUrl { field: String, message: String },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("{field} must be a positive float")]
    InvalidPositiveFloat { field: String },

    #[error("{field} must be between 0 and 100")]
    InvalidPercentageRange { field: String },

    #[error("Pricing: {message}")]
    InvalidPricing { message: String },

    #[error("Activity: {message}")]
    InvalidActivity { message: String },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("{field} must be a non-zero port")]
    InvalidPort { field: String },

    #[error("Port {port} is used by both the HTTP server and the metrics exporter")]
    PortConflict { port: u16 },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &ServiceConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_service(&config.service, &mut report);
    validate_provider(&config.provider, &mut report);
    validate_pricing(&config.pricing, &mut report);
    validate_activity(&config.activity, &mut report);
    validate_server(config, &mut report);
    validate_logging(&config.logging, &mut report);

    report
}

fn validate_service(service: &ServiceInfo, report: &mut ValidationReport) {
    if service.name.trim().is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    }

    let version_ok = Regex::new(r"^\d+\.\d+\.\d+$")
        .map(|re| re.is_match(&service.version))
        .unwrap_or(false);
    if !version_ok {
        report.add_error(ValidationError::InvalidVersionFormat(service.version.clone()));
    }
}

fn validate_provider(provider: &ProviderConfig, report: &mut ValidationReport) {
    if provider.name == ProviderKind::Static {
        report.add_warning(
            "provider.name",
            "Static provider serves no live data; quote and chain tools will report not found",
        );
        return;
    }

    if let Err(e) = url::Url::parse(&provider.base_url) {
        report.add_error(ValidationError::InvalidUrl {
            field: "provider.base_url".to_string(),
            message: e.to_string(),
        });
    }

    match provider.api_key.as_deref() {
        Some(key) if has_unresolved_env_vars(key) => {
            if provider.resolve_api_key().is_none() {
                for var in unresolved_env_vars(key) {
                    report.add_error(ValidationError::InvalidEnvVar {
                        var,
                        message: "provider.api_key references an unset variable".to_string(),
                    });
                }
            } else {
                report.add_default("provider.api_key", "environment fallback");
            }
        }
        Some(key) if !key.trim().is_empty() => {}
        _ => match provider.resolve_api_key() {
            Some(_) => report.add_default("provider.api_key", "environment fallback"),
            None => report.add_error(ValidationError::MissingApiKey {
                provider: provider.name.to_string(),
            }),
        },
    }

    if provider.timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provider.timeout_seconds".to_string(),
        });
    }
    if provider.chain_page_limit == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provider.chain_page_limit".to_string(),
        });
    }
    if provider.max_chain_pages == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provider.max_chain_pages".to_string(),
        });
    } else if provider.max_chain_pages > 20 {
        report.add_warning(
            "provider.max_chain_pages",
            "More than 20 pages per chain request may hit provider rate limits",
        );
    }
}

fn validate_pricing(pricing: &PricingConfig, report: &mut ValidationReport) {
    if !pricing.default_risk_free_rate.is_finite() {
        report.add_error(ValidationError::InvalidPricing {
            message: "default_risk_free_rate must be finite".to_string(),
        });
    } else if !(-0.05..=0.25).contains(&pricing.default_risk_free_rate) {
        report.add_warning(
            "pricing.default_risk_free_rate",
            "Rate is outside -5%..25%; values are decimals (0.05 = 5%)",
        );
    }

    if !(pricing.default_volatility.is_finite() && pricing.default_volatility > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "pricing.default_volatility".to_string(),
        });
    } else if pricing.default_volatility > 2.0 {
        report.add_warning(
            "pricing.default_volatility",
            "Volatility above 200%; values are decimals (0.25 = 25%)",
        );
    }

    if !(pricing.contract_multiplier.is_finite() && pricing.contract_multiplier > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "pricing.contract_multiplier".to_string(),
        });
    }
}

fn validate_activity(activity: &ActivityConfig, report: &mut ValidationReport) {
    if !(activity.high_volume_oi_ratio.is_finite() && activity.high_volume_oi_ratio > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "activity.high_volume_oi_ratio".to_string(),
        });
    }

    if !(activity.block_notional_threshold.is_finite() && activity.block_notional_threshold > 0.0)
    {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "activity.block_notional_threshold".to_string(),
        });
    }

    let percentile = activity.ratio_spike_percentile;
    if !(percentile.is_finite() && percentile > 0.0 && percentile <= 100.0) {
        report.add_error(ValidationError::InvalidPercentageRange {
            field: "activity.ratio_spike_percentile".to_string(),
        });
    }

    if activity.high_volume_min_contracts == 0 {
        report.add_warning(
            "activity.high_volume_min_contracts",
            "A zero volume floor flags any contract trading above the OI ratio",
        );
    }

    let buckets = &activity.skew_delta_buckets;
    if buckets.len() < 2 {
        report.add_error(ValidationError::InvalidActivity {
            message: "skew_delta_buckets needs at least two edges".to_string(),
        });
    } else if buckets.iter().any(|b| !(b.is_finite() && *b >= 0.0 && *b <= 1.0)) {
        report.add_error(ValidationError::InvalidActivity {
            message: "skew_delta_buckets edges must lie in [0, 1]".to_string(),
        });
    } else if buckets.windows(2).any(|w| w[0] >= w[1]) {
        report.add_error(ValidationError::InvalidActivity {
            message: "skew_delta_buckets must be strictly ascending".to_string(),
        });
    }
}

fn validate_server(config: &ServiceConfig, report: &mut ValidationReport) {
    if config.server.http_port == 0 {
        report.add_error(ValidationError::InvalidPort {
            field: "server.http_port".to_string(),
        });
    }

    if config.metrics.enabled {
        if config.metrics.port == 0 {
            report.add_error(ValidationError::InvalidPort {
                field: "metrics.port".to_string(),
            });
        } else if config.server.transport == Transport::Http
            && config.metrics.port == config.server.http_port
        {
            report.add_error(ValidationError::PortConflict {
                port: config.metrics.port,
            });
        }
    }
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogLevel(logging.level.clone()));
    }

    let valid_formats = ["pretty", "json", "compact"];
    if !valid_formats.contains(&logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(logging.format.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServiceConfig {
        let mut config = generate_default_config();
        config.provider.api_key = Some("test-key".to_string());
        config
    }

    #[test]
    fn test_default_config_with_key_is_valid() {
        let report = validate_config(&valid_config());
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn test_unresolved_api_key_placeholder() {
        let mut config = valid_config();
        config.provider.api_key = Some("${OPTIX_TEST_VALIDATOR_UNSET}".to_string());

        // Environment fallback may satisfy the key on machines that export one
        if config.provider.resolve_api_key().is_none() {
            let report = validate_config(&config);
            assert!(report.errors.iter().any(|e| matches!(
                e,
                ValidationError::InvalidEnvVar { var, .. } if var == "OPTIX_TEST_VALIDATOR_UNSET"
            )));
        }
    }

    #[test]
    fn test_static_provider_needs_no_key() {
        let mut config = valid_config();
        config.provider.name = ProviderKind::Static;
        config.provider.api_key = None;

        let report = validate_config(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "provider.name"));
    }

    #[test]
    fn test_bad_thresholds() {
        let mut config = valid_config();
        config.activity.ratio_spike_percentile = 150.0;
        config.activity.block_notional_threshold = -1.0;
        config.activity.skew_delta_buckets = vec![0.3, 0.2, 0.4];

        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::InvalidPercentageRange {
            field: "activity.ratio_spike_percentile".to_string()
        }));
        assert!(report.errors.contains(&ValidationError::InvalidPositiveFloat {
            field: "activity.block_notional_threshold".to_string()
        }));
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidActivity { .. })));
    }

    #[test]
    fn test_bad_pricing() {
        let mut config = valid_config();
        config.pricing.default_volatility = 0.0;
        config.pricing.default_risk_free_rate = 0.5;

        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::InvalidPositiveFloat {
            field: "pricing.default_volatility".to_string()
        }));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.field == "pricing.default_risk_free_rate"));
    }

    #[test]
    fn test_invalid_base_url_and_version() {
        let mut config = valid_config();
        config.provider.base_url = "not a url".to_string();
        config.service.version = "v1".to_string();

        let report = validate_config(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUrl { .. })));
        assert!(report
            .errors
            .contains(&ValidationError::InvalidVersionFormat("v1".to_string())));
    }

    #[test]
    fn test_metrics_port_conflict() {
        let mut config = valid_config();
        config.server.transport = Transport::Http;
        config.metrics.enabled = true;
        config.metrics.port = config.server.http_port;

        let report = validate_config(&config);
        assert!(report
            .errors
            .contains(&ValidationError::PortConflict { port: 8000 }));
    }

    #[test]
    fn test_logging_values() {
        let mut config = valid_config();
        config.logging.format = "xml".to_string();
        config.logging.level = "loud".to_string();

        let report = validate_config(&config);
        assert!(report
            .errors
            .contains(&ValidationError::InvalidLogFormat("xml".to_string())));
        assert!(report
            .errors
            .contains(&ValidationError::InvalidLogLevel("loud".to_string())));
    }
}
