/// Configuration management
use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REFRESH_SECS: u64 = 300;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the REST backend (e.g. https://desk.example.com/api)
    pub api_base: String,

    /// Push channel URL (e.g. wss://desk.example.com/events)
    pub push_url: String,

    /// Optional data directory for the local store (credential, notes)
    pub data_dir: Option<PathBuf>,

    /// Bearer token override; when absent the stored credential is used
    pub token: Option<String>,

    /// Timeout for individual REST requests
    pub request_timeout: Duration,

    /// Interval between periodic full-snapshot refreshes
    pub refresh_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:3000/api".to_string(),
            push_url: "ws://127.0.0.1:3000/events".to_string(),
            data_dir: None,
            token: None,
            request_timeout: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

impl Config {
    /// Create config from command line arguments
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.len() < 3 {
            return Err(SyncError::Config(format!(
                "Usage: {} <api-base> <push-url> [--data-dir <path>] [--token <bearer>] [--refresh-secs <n>] [--timeout-secs <n>]",
                args.first().unwrap_or(&"deskline".to_string())
            )));
        }

        let mut config = Config {
            api_base: args[1].trim_end_matches('/').to_string(),
            push_url: args[2].clone(),
            ..Config::default()
        };

        let mut i = 3;
        while i < args.len() {
            match args[i].as_str() {
                "--data-dir" => {
                    let path = args.get(i + 1).ok_or_else(|| {
                        SyncError::Config("--data-dir requires a path argument".to_string())
                    })?;
                    config.data_dir = Some(PathBuf::from(path));
                    i += 2;
                }
                "--token" => {
                    let token = args
                        .get(i + 1)
                        .ok_or_else(|| SyncError::Config("--token requires a value".to_string()))?;
                    config.token = Some(token.clone());
                    i += 2;
                }
                "--refresh-secs" => {
                    let secs = args.get(i + 1).ok_or_else(|| {
                        SyncError::Config("--refresh-secs requires a number".to_string())
                    })?;
                    let secs = secs.parse::<u64>().map_err(|_| {
                        SyncError::Config("--refresh-secs must be a valid number".to_string())
                    })?;
                    config.refresh_interval = Duration::from_secs(secs);
                    i += 2;
                }
                "--timeout-secs" => {
                    let secs = args.get(i + 1).ok_or_else(|| {
                        SyncError::Config("--timeout-secs requires a number".to_string())
                    })?;
                    let secs = secs.parse::<u64>().map_err(|_| {
                        SyncError::Config("--timeout-secs must be a valid number".to_string())
                    })?;
                    config.request_timeout = Duration::from_secs(secs);
                    i += 2;
                }
                other => {
                    return Err(SyncError::Config(format!("Unknown argument: {}", other)));
                }
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_minimal_args() {
        let config =
            Config::from_args(&args(&["deskline", "https://x.test/api/", "wss://x.test/events"]))
                .unwrap();
        assert_eq!(config.api_base, "https://x.test/api");
        assert_eq!(config.push_url, "wss://x.test/events");
        assert_eq!(
            config.refresh_interval,
            Duration::from_secs(DEFAULT_REFRESH_SECS)
        );
    }

    #[test]
    fn test_flags() {
        let config = Config::from_args(&args(&[
            "deskline",
            "https://x.test/api",
            "wss://x.test/events",
            "--refresh-secs",
            "60",
            "--token",
            "abc",
        ]))
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_args() {
        assert!(Config::from_args(&args(&["deskline"])).is_err());
        assert!(Config::from_args(&args(&[
            "deskline",
            "https://x.test/api",
            "wss://x.test/events",
            "--refresh-secs"
        ]))
        .is_err());
    }
}
