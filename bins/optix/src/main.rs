//! Optix CLI and tool server binary
//!
//! Commands for initializing and validating configuration, serving the
//! analytics tools over stdio or HTTP, and pricing a single option offline.

use analytics::pricing::DAYS_PER_YEAR;
use analytics::{price_and_greeks, BSInputs, OptionType};
use anyhow::{Context, Result};
use cli::{Cli, Commands, OptionTypeArg, TransportArg};
use config::{
    generate_default_config, load_config, save_config, validate_config, ProviderConfig,
    ProviderKind, ServiceConfig, Transport,
};
use mcp::{serve_http, serve_stdio, McpService, ToolContext};
use observability::{init_logging, init_metrics, LogFormat, ToolMetrics};
use provider::{MarketDataProvider, PolygonClient, PolygonSettings, StaticProvider};
use server::{validate_ports_available, ShutdownController};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SERVICE_NAME: &str = "optix";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Serve {
            transport,
            config,
            port,
        } => serve_command(config, transport, port).await,
        Commands::Validate { config } => {
            init_logging(SERVICE_NAME, LogFormat::Pretty, "warn")?;
            validate_command(config)
        }
        Commands::Init { output } => {
            init_logging(SERVICE_NAME, LogFormat::Pretty, "info")?;
            init_command(output)
        }
        Commands::Greeks {
            spot,
            strike,
            days,
            vol,
            rate,
            option_type,
        } => greeks_command(spot, strike, days, vol, rate, option_type),
    }
}

async fn serve_command(
    config_path: PathBuf,
    transport_override: Option<TransportArg>,
    port_override: Option<u16>,
) -> Result<()> {
    // Logging is configured from the file, so load errors are reported after init
    let (mut config, load_error) = match load_config(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (generate_default_config(), Some(e)),
    };

    let format = config.logging.format.parse().unwrap_or_default();
    init_logging(SERVICE_NAME, format, &config.logging.level)?;

    if let Some(e) = load_error {
        warn!(path = ?config_path, error = %e, "Using default configuration");
    }

    if let Some(transport) = transport_override {
        config.server.transport = match transport {
            TransportArg::Stdio => Transport::Stdio,
            TransportArg::Http => Transport::Http,
        };
    }
    if let Some(port) = port_override {
        config.server.http_port = port;
    }

    check_config(&config)?;

    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
    }

    let provider = build_provider(&config.provider)?;
    info!(
        provider = provider.name(),
        transport = %config.server.transport,
        "Starting {}",
        config.service.name
    );

    let transport = config.server.transport;
    let ctx = ToolContext::from_config(&config, provider, ToolMetrics::new(&transport.to_string()));
    let service = McpService::new(ctx);
    let shutdown = ShutdownController::with_ctrl_c();

    match transport {
        Transport::Stdio => serve_stdio(service, shutdown.child_token())
            .await
            .context("stdio transport failed")?,
        Transport::Http => {
            let server_config = server::ServerConfig::new(
                config.server.host.clone(),
                config.server.http_port,
            );
            validate_ports_available(&server_config).await?;
            serve_http(service, server_config, shutdown.child_token()).await?;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Log warnings and refuse to start on validation errors
fn check_config(config: &ServiceConfig) -> Result<()> {
    let report = validate_config(config);

    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    for default in &report.defaults_applied {
        debug!(field = %default.field, value = %default.value, "Default applied");
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start server due to configuration errors");
    }
    Ok(())
}

fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn MarketDataProvider>> {
    match config.name {
        ProviderKind::Polygon => {
            let client = PolygonClient::new(PolygonSettings {
                base_url: config.base_url.clone(),
                api_key: config.resolve_api_key(),
                timeout: Duration::from_secs(config.timeout_seconds),
                chain_page_limit: config.chain_page_limit,
                max_chain_pages: config.max_chain_pages,
            })
            .context("Failed to create Polygon client")?;
            Ok(Arc::new(client))
        }
        ProviderKind::Static => {
            warn!("Static provider selected; tools needing live market data will report DataUnavailable");
            Ok(Arc::new(StaticProvider::new()))
        }
    }
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            return Err(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {} {}", config.service.name, config.service.version);
    println!("Provider: {} ({})", config.provider.name, config.provider.base_url);
    println!(
        "Transport: {} (http port {})",
        config.server.transport, config.server.http_port
    );
    println!(
        "Pricing: rate {} / volatility {}",
        config.pricing.default_risk_free_rate, config.pricing.default_volatility
    );

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Export POLYGON_API_KEY (or set provider.api_key)");
    println!(
        "  2. Run 'optix validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'optix serve --config {:?}' to start the tool server",
        output_path
    );

    Ok(())
}

fn greeks_command(
    spot: f64,
    strike: f64,
    days: u32,
    vol: f64,
    rate: f64,
    option_type: OptionTypeArg,
) -> Result<()> {
    let option_type = match option_type {
        OptionTypeArg::Call => OptionType::Call,
        OptionTypeArg::Put => OptionType::Put,
    };

    let greeks = price_and_greeks(&BSInputs {
        spot,
        strike,
        time: f64::from(days) / DAYS_PER_YEAR,
        vol,
        rate,
        option_type,
    })?;

    println!(
        "{} {} @ spot {} | {} days | vol {} | rate {}",
        option_type, strike, spot, days, vol, rate
    );
    println!("  price  {:>12.4}", greeks.theoretical_price);
    println!("  delta  {:>12.4}", greeks.delta);
    println!("  gamma  {:>12.4}", greeks.gamma);
    println!("  theta  {:>12.4}  (per day)", greeks.theta);
    println!("  vega   {:>12.4}  (per vol point)", greeks.vega);
    println!("  rho    {:>12.4}  (per rate point)", greeks.rho);

    Ok(())
}
