use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use url::Url;

use crate::domain::NetworkType;
use crate::services::PipelineOptions;

/// Testnet epoch: 2022-10-31 21:07:47 UTC.
pub const TESTNET_EPOCH_ADJUSTMENT: i64 = 1_667_250_467;
/// Mainnet epoch: 2021-03-16 00:06:25 UTC.
pub const MAINNET_EPOCH_ADJUSTMENT: i64 = 1_615_853_185;

const MIN_RESET_SECS: u64 = 2;
const MAX_RESET_SECS: u64 = 86_400;

/// Identifies the ledger node and the network parameters needed to interpret its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub node_url: String,
    pub network_type: NetworkType,
    /// Seconds between the Unix epoch and the network epoch.
    pub epoch_adjustment: i64,
}

impl NetworkDescriptor {
    pub fn new(node_url: impl Into<String>, network_type: NetworkType, epoch_adjustment: i64) -> Self {
        Self {
            node_url: node_url.into(),
            network_type,
            epoch_adjustment,
        }
    }

    pub fn testnet(node_url: impl Into<String>) -> Self {
        Self::new(node_url, NetworkType::TESTNET, TESTNET_EPOCH_ADJUSTMENT)
    }

    pub fn mainnet(node_url: impl Into<String>) -> Self {
        Self::new(node_url, NetworkType::MAINNET, MAINNET_EPOCH_ADJUSTMENT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: NetworkDescriptor,
    pub page_size: u32,
    pub max_aggregate_depth: usize,
    pub request_timeout_secs: u64,
    pub pipeline_timeout_secs: u64,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_reset_secs: u64,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_with_node(None)
    }

    /// Same as [`Config::from_env`], with `node_url` taking precedence over `SYMBOL_NODE_URL`.
    pub fn from_env_with_node(node_url: Option<String>) -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let node_url = match node_url {
            Some(node_url) => node_url,
            None => env::var("SYMBOL_NODE_URL").context("SYMBOL_NODE_URL must be set")?,
        };
        Self::from_lookup(node_url, |key| env::var(key).ok())
    }

    /// Builds the configuration from `node_url` plus optional overrides read through `lookup`.
    pub fn from_lookup<F>(node_url: String, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_url = validate_node_url(&node_url)?;

        let network_type = match lookup("SYMBOL_NETWORK_TYPE") {
            Some(raw) => NetworkType::parse(&raw)
                .with_context(|| format!("SYMBOL_NETWORK_TYPE {:?} is not mainnet, testnet or a byte", raw))?,
            None => NetworkType::TESTNET,
        };
        let default_epoch = if network_type == NetworkType::MAINNET {
            MAINNET_EPOCH_ADJUSTMENT
        } else {
            TESTNET_EPOCH_ADJUSTMENT
        };

        let page_size: u32 = parse_or(&lookup, "PAGE_SIZE", 100)?;
        if !(10..=100).contains(&page_size) {
            anyhow::bail!("PAGE_SIZE must be between 10 and 100, got {}", page_size);
        }

        let max_aggregate_depth: usize = parse_or(&lookup, "MAX_AGGREGATE_DEPTH", 4)?;
        if max_aggregate_depth == 0 {
            anyhow::bail!("MAX_AGGREGATE_DEPTH must be at least 1");
        }

        let circuit_breaker_threshold: u32 = parse_or(&lookup, "CIRCUIT_BREAKER_THRESHOLD", 3)?;
        if circuit_breaker_threshold == 0 {
            anyhow::bail!("CIRCUIT_BREAKER_THRESHOLD must be at least 1");
        }

        // failsafe's jittered backoff needs a start above one second
        let circuit_breaker_reset_secs: u64 = parse_or(&lookup, "CIRCUIT_BREAKER_RESET_SECS", 60)?;
        if !(MIN_RESET_SECS..=MAX_RESET_SECS).contains(&circuit_breaker_reset_secs) {
            anyhow::bail!(
                "CIRCUIT_BREAKER_RESET_SECS must be between {} and {}, got {}",
                MIN_RESET_SECS,
                MAX_RESET_SECS,
                circuit_breaker_reset_secs
            );
        }

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got {:?}", other),
        };

        Ok(Config {
            network: NetworkDescriptor::new(
                node_url,
                network_type,
                parse_or(&lookup, "SYMBOL_EPOCH_ADJUSTMENT", default_epoch)?,
            ),
            page_size,
            max_aggregate_depth,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            pipeline_timeout_secs: parse_or(&lookup, "PIPELINE_TIMEOUT_SECS", 60)?,
            circuit_breaker_threshold,
            circuit_breaker_reset_secs,
            log_format,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            page_size: self.page_size,
            max_aggregate_depth: self.max_aggregate_depth,
            timeout: Some(Duration::from_secs(self.pipeline_timeout_secs)),
        }
    }
}

fn validate_node_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid node URL {:?}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("node URL must use http or https, got {}", url.scheme());
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup("http://localhost:3000/".to_string(), move |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.network.node_url, "http://localhost:3000");
        assert_eq!(config.network.network_type, NetworkType::TESTNET);
        assert_eq!(config.network.epoch_adjustment, TESTNET_EPOCH_ADJUSTMENT);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_aggregate_depth, 4);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(
            config.pipeline_options().timeout,
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_mainnet_uses_mainnet_epoch() {
        let config = config_with(&[("SYMBOL_NETWORK_TYPE", "mainnet")]).unwrap();
        assert_eq!(config.network.epoch_adjustment, MAINNET_EPOCH_ADJUSTMENT);
    }

    #[test]
    fn test_invalid_page_size() {
        assert!(config_with(&[("PAGE_SIZE", "500")]).is_err());
        assert!(config_with(&[("PAGE_SIZE", "abc")]).is_err());
    }

    #[test]
    fn test_invalid_node_url() {
        assert!(Config::from_lookup("ftp://node".to_string(), |_| None).is_err());
        assert!(Config::from_lookup("not a url".to_string(), |_| None).is_err());
    }

    #[test]
    fn test_circuit_breaker_reset_bounds() {
        assert!(config_with(&[("CIRCUIT_BREAKER_RESET_SECS", "0")]).is_err());
        assert!(config_with(&[("CIRCUIT_BREAKER_RESET_SECS", "1")]).is_err());
        assert!(config_with(&[("CIRCUIT_BREAKER_RESET_SECS", "18446744073709551615")]).is_err());
        assert!(config_with(&[("CIRCUIT_BREAKER_THRESHOLD", "0")]).is_err());

        let config = config_with(&[("CIRCUIT_BREAKER_RESET_SECS", "2")]).unwrap();
        assert_eq!(config.circuit_breaker_reset_secs, 2);
    }

    #[test]
    fn test_json_log_format() {
        let config = config_with(&[("LOG_FORMAT", "json")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
