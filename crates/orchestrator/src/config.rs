//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use composition::ComposerConfig;
use rpc::RetryPolicy;
use saga::SagaConfig;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `RPC_TIMEOUT_MS`: per-call timeout (default: `10000`)
/// - `RPC_MAX_RETRIES`: attempts for retried reads (default: `3`)
/// - `RPC_RETRY_DELAY_MS`: base backoff delay (default: `200`)
/// - `CACHE_TTL_SECS`: composite cache lifetime (default: `300`)
/// - `SAGA_TIMEOUT_MS`: aggregate saga deadline (default: unset)
/// - `CACHE_SWEEP_SECS`: interval between expired-entry sweeps (default: `60`)
/// - `TRANSPORT_JOURNAL_CAPACITY`: requests kept by the standalone
///   transport for inspection (default: `256`, `0` disables)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub rpc_timeout: Duration,
    pub rpc_max_retries: u32,
    pub rpc_retry_delay: Duration,
    pub cache_ttl: Duration,
    pub saga_timeout: Option<Duration>,
    pub cache_sweep_interval: Duration,
    pub journal_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or(defaults.log_format),
            rpc_timeout: parse("RPC_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.rpc_timeout),
            rpc_max_retries: lookup("RPC_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .filter(|&n| n >= 1)
                .unwrap_or(defaults.rpc_max_retries),
            rpc_retry_delay: parse("RPC_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.rpc_retry_delay),
            cache_ttl: parse("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            saga_timeout: parse("SAGA_TIMEOUT_MS")
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis),
            cache_sweep_interval: parse("CACHE_SWEEP_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_sweep_interval),
            journal_capacity: lookup("TRANSPORT_JOURNAL_CAPACITY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.journal_capacity),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            cache_ttl: self.cache_ttl,
            retry: RetryPolicy::new(self.rpc_max_retries, self.rpc_retry_delay),
            ..ComposerConfig::default()
        }
    }

    pub fn saga_config(&self) -> SagaConfig {
        SagaConfig {
            deadline: self.saga_timeout,
            ..SagaConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            rpc_timeout: rpc::DEFAULT_TIMEOUT,
            rpc_max_retries: 3,
            rpc_retry_delay: Duration::from_millis(200),
            cache_ttl: Duration::from_secs(300),
            saga_timeout: None,
            cache_sweep_interval: cache::memory::DEFAULT_SWEEP_INTERVAL,
            journal_capacity: 256,
        }
    }
}
