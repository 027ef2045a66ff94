use anyhow::{bail, Context, Result};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub max_upload_bytes: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same rules as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("ANALYTICS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs = parse_or(&lookup, "ANALYTICS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_upload_bytes = parse_or(&lookup, "ANALYTICS_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        if timeout_secs == 0 {
            bail!("ANALYTICS_TIMEOUT_SECS must be positive");
        }

        let cfg = Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
        };
        cfg.check()?;
        Ok(cfg)
    }

    /// Replaces the service URL (CLI override).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Result<Self> {
        self.api_url = api_url.into();
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!("ANALYTICS_API_URL must start with http:// or https://");
        }
        Ok(())
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.api_url, "http://localhost:5000");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("ANALYTICS_API_URL", "https://ml.internal:8443"),
            ("ANALYTICS_TIMEOUT_SECS", "5"),
            ("ANALYTICS_MAX_UPLOAD_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_url, "https://ml.internal:8443");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.max_upload_bytes, 1024);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[("ANALYTICS_API_URL", "localhost:5000")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("ANALYTICS_TIMEOUT_SECS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("ANALYTICS_TIMEOUT_SECS", "soon")])).is_err());

        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert!(cfg.with_api_url("ftp://host").is_err());
    }
}
