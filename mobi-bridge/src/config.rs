//! Runtime configuration.
//!
//! Values come from command-line flags with environment fallbacks (a `.env`
//! file is loaded first by the binary). [`AppConfig`] is the validated form
//! handed to the components.

use std::path::PathBuf;

use clap::Parser;

use crate::api::ApiServerConfig;
use crate::api::server::DEFAULT_PORT;
use crate::pipeline::PipelineConfig;
use crate::tools::{DEFAULT_CONVERTER, DEFAULT_DOWNLOADER};
use crate::{Error, Result};

/// Default directory for input and converted artifacts.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";

#[derive(Parser, Debug, Clone)]
#[command(name = "mobi-bridge")]
#[command(about = "Telegram bot converting FB2/TXT books to MOBI")]
#[command(version)]
pub struct Cli {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,

    /// Public host:port used in retrieval links
    #[arg(long, env = "SERVER_HOST", default_value = "")]
    pub server_host: String,

    /// HTTP server port
    #[arg(long, env = "HTTP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// HTTP bind address
    #[arg(long, env = "HTTP_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Directory for downloaded and converted files
    #[arg(long, env = "UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
    pub upload_dir: PathBuf,

    /// Downloader binary (wget-compatible)
    #[arg(long, env = "DOWNLOADER_BIN", default_value = DEFAULT_DOWNLOADER)]
    pub downloader: String,

    /// Converter binary (ebook-convert-compatible)
    #[arg(long, env = "CONVERTER_BIN", default_value = DEFAULT_CONVERTER)]
    pub converter: String,

    /// Log filter directive
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub api: ApiServerConfig,
    pub pipeline: PipelineConfig,
    pub downloader: String,
    pub converter: String,
}

impl AppConfig {
    /// Validate parsed arguments.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let token = cli.token.trim().to_string();
        if token.is_empty() {
            return Err(Error::config("TELEGRAM_TOKEN is not set"));
        }

        let public_host = cli.server_host.trim().trim_end_matches('/').to_string();
        if public_host.is_empty() {
            return Err(Error::config("SERVER_HOST is not set"));
        }
        if public_host.contains("://") {
            return Err(Error::config(format!(
                "SERVER_HOST must be host[:port] without a scheme, got '{}'",
                public_host
            )));
        }

        if cli.downloader.trim().is_empty() || cli.converter.trim().is_empty() {
            return Err(Error::config("tool binaries must not be empty"));
        }

        let api = ApiServerConfig {
            bind_address: cli.bind_address,
            port: cli.port,
        };
        api.socket_addr()?;

        Ok(Self {
            telegram_token: token,
            api,
            pipeline: PipelineConfig {
                upload_dir: cli.upload_dir,
                public_host,
            },
            downloader: cli.downloader,
            converter: cli.converter,
        })
    }
}
