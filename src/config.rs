//! Service configuration
//!
//! Read from command-line flags with environment fallbacks. `main` loads an
//! optional `.env` file before parsing.

use clap::{Parser, ValueEnum};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Postgres(String),
    Memory,
}

#[derive(Debug, Parser)]
#[command(name = "promotion-ledger", about = "Promotion code ledger service")]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8083)]
    pub port: u16,

    /// `PostgreSQL` connection string; promotions are kept in memory when unset
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Connection pool size
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// NATS server for promotion events; publishing is disabled when unset
    #[arg(long, env = "NATS_URL")]
    pub nats_url: Option<String>,

    /// Subject prefix for promotion events
    #[arg(long, env = "NATS_SUBJECT_PREFIX", default_value = "promotions")]
    pub nats_subject_prefix: String,

    /// Log level used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn storage(&self) -> Storage {
        match self.database_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Storage::Postgres(url.to_string()),
            _ => Storage::Memory,
        }
    }
}
