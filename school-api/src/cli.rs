//! Command-line flags shared by the service binaries

use clap::Args;
use school_common::config::{
    ConfigOverrides, ENV_API_KEY, ENV_BIND_ADDR, ENV_CONFIG, ENV_DATABASE, ENV_LOG_LEVEL,
    ENV_MAX_UPLOAD_BYTES,
};
use std::path::PathBuf;

/// Configuration flags. Each one falls back to its environment variable,
/// then the TOML file, then the compiled default.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML configuration file
    #[arg(long, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8000
    #[arg(long, env = ENV_BIND_ADDR)]
    pub bind: Option<String>,

    /// SQLite database file
    #[arg(long, env = ENV_DATABASE)]
    pub database: Option<PathBuf>,

    /// Shared secret for /secure routes
    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Upper bound for CSV upload bodies in bytes
    #[arg(long, env = ENV_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: Option<usize>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, env = ENV_LOG_LEVEL)]
    pub log_level: Option<String>,
}

impl From<ConfigArgs> for ConfigOverrides {
    fn from(args: ConfigArgs) -> Self {
        ConfigOverrides {
            config_file: args.config,
            bind_addr: args.bind,
            database_path: args.database,
            api_key: args.api_key,
            max_upload_bytes: args.max_upload_bytes,
            log_level: args.log_level,
        }
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_directive.parse()?)
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
