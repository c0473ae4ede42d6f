use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_HISTORY_PATH: &str = ".crm/calculator_history.json";
pub const DEFAULT_DASHBOARD_REFRESH_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub history_path: PathBuf,
    pub dashboard_refresh_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` is this over
    /// `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("CRM_BASE_URL").ok_or("CRM_BASE_URL is required")?;
        let base_url = normalize_base_url(&base_url)?;

        let timeout_seconds = parse_u64(&lookup, "CRM_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECONDS)?;

        let history_path = lookup("CRM_HISTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH));

        let dashboard_refresh_seconds = parse_u64(
            &lookup,
            "CRM_DASHBOARD_REFRESH_SECONDS",
            DEFAULT_DASHBOARD_REFRESH_SECONDS,
        )?;
        if dashboard_refresh_seconds == 0 {
            return Err("CRM_DASHBOARD_REFRESH_SECONDS must be greater than zero".into());
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_seconds),
            history_path,
            dashboard_refresh_seconds,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        base_url: Option<&str>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, String> {
        if let Some(url) = base_url {
            self.base_url = normalize_base_url(url)?;
        }
        if let Some(secs) = timeout_seconds {
            self.timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

fn normalize_base_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(format!("Invalid CRM_BASE_URL: {}", raw));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_base_url_is_set() {
        let config = Config::from_lookup(lookup_from(&[("CRM_BASE_URL", "http://localhost:5000/")]))
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));
        assert_eq!(config.history_path, PathBuf::from(DEFAULT_HISTORY_PATH));
        assert_eq!(config.dashboard_refresh_seconds, 300);
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.contains("CRM_BASE_URL"));
    }

    #[test]
    fn base_url_without_scheme_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("CRM_BASE_URL", "localhost:5000")])).is_err());
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("CRM_BASE_URL", "http://crm.local"),
            ("CRM_TIMEOUT_SECONDS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.contains("CRM_TIMEOUT_SECONDS"));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[
            ("CRM_BASE_URL", "http://crm.local"),
            ("CRM_DASHBOARD_REFRESH_SECONDS", "0"),
        ]))
        .is_err());
    }

    #[test]
    fn overrides_replace_env_values() {
        let config = Config::from_lookup(lookup_from(&[("CRM_BASE_URL", "http://crm.local")]))
            .unwrap()
            .with_overrides(Some("https://crm.example.com/"), Some(5))
            .unwrap();

        assert_eq!(config.base_url, "https://crm.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
