//! Process configuration from the environment

use crate::fetch::ProxyRule;
use std::env;

/// Object-store bucket whose URLs must go through the audio proxy
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://tennyvoice.s3.ap-northeast-2.amazonaws.com/";

/// Default `Cache-Control` max-age of proxied audio, in seconds
pub const DEFAULT_CACHE_MAX_AGE: u64 = 3600;

/// Process configuration derived from the environment and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the proxy server binds
    pub listen: String,
    /// URL prefixes the proxy may fetch
    pub allowed_origins: Vec<String>,
    /// Base URL clients use to reach the proxy
    pub proxy_base: String,
    /// `Cache-Control` max-age for proxied responses
    pub cache_max_age: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            listen: "127.0.0.1:3000".to_string(),
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            proxy_base: "http://127.0.0.1:3000".to_string(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }
}

impl AppConfig {
    /// Read `VOICE_COMPARE_*` variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let listen = lookup("VOICE_COMPARE_LISTEN")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.listen);
        let allowed_origins = lookup("VOICE_COMPARE_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);
        let proxy_base = lookup("VOICE_COMPARE_PROXY_BASE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.proxy_base);
        let cache_max_age = lookup("VOICE_COMPARE_CACHE_MAX_AGE")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(defaults.cache_max_age);

        AppConfig {
            listen,
            allowed_origins,
            proxy_base,
            cache_max_age,
        }
    }

    /// Proxy routing rule for fetchers and the server
    pub fn proxy_rule(&self) -> ProxyRule {
        ProxyRule::new(self.allowed_origins.clone(), self.proxy_base.clone())
    }
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
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, AppConfig::default());
        assert!(config.proxy_rule().is_allowed(&format!("{DEFAULT_ALLOWED_ORIGIN}a.wav")));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("VOICE_COMPARE_LISTEN", "0.0.0.0:8080"),
            (
                "VOICE_COMPARE_ALLOWED_ORIGINS",
                "https://a.example/, ,https://b.example/",
            ),
            ("VOICE_COMPARE_CACHE_MAX_AGE", "60"),
        ]));

        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example/".to_string(), "https://b.example/".to_string()]
        );
        assert_eq!(config.cache_max_age, 60);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("VOICE_COMPARE_CACHE_MAX_AGE", "soon"),
            ("VOICE_COMPARE_ALLOWED_ORIGINS", " , "),
        ]));
        assert_eq!(config.cache_max_age, DEFAULT_CACHE_MAX_AGE);
        assert_eq!(config.allowed_origins, vec![DEFAULT_ALLOWED_ORIGIN.to_string()]);
    }
}
