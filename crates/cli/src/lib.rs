use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "master_config/optix.yaml";

#[derive(Parser, Debug)]
#[command(name = "optix")]
#[command(about = "Optix - options analytics tool server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the analytics tools over stdio or HTTP
    Serve {
        /// Transport override (defaults to the config file's `server.transport`)
        #[arg(short, long, value_enum)]
        transport: Option<TransportArg>,

        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override the HTTP port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate configuration without starting the server
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "optix.yaml")]
        output: PathBuf,
    },

    /// Price one option offline and print its Greeks
    Greeks {
        /// Spot price of the underlying
        #[arg(long)]
        spot: f64,

        /// Strike price
        #[arg(long)]
        strike: f64,

        /// Calendar days to expiration
        #[arg(long)]
        days: u32,

        /// Annualized volatility as a decimal
        #[arg(long, default_value_t = 0.25)]
        vol: f64,

        /// Annualized risk-free rate as a decimal
        #[arg(long, default_value_t = 0.05)]
        rate: f64,

        /// Option type
        #[arg(long = "type", value_enum, default_value = "call")]
        option_type: OptionTypeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportArg {
    /// Line-delimited JSON-RPC on stdin/stdout
    Stdio,

    /// JSON-RPC over `POST /mcp`
    Http,
}

impl TransportArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportArg::Stdio => "stdio",
            TransportArg::Http => "http",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionTypeArg {
    Call,
    Put,
}

impl OptionTypeArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionTypeArg::Call => "call",
            OptionTypeArg::Put => "put",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
