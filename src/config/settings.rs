use serde::Deserialize;

use crate::error::{ClientError, Result};

/// ================================
/// Client-wide configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfiguration {
    pub rest: RestConfig,
    #[serde(default = "default_version")]
    pub version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestConfig {
    /// Base host of the deployment, e.g. `https://varhub.example.org/varhub`.
    /// A missing scheme defaults to http.
    pub host: String,
    /// Per-request timeout. None disables the client-side deadline.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_version() -> String {
    "v2".to_string()
}

/// REST path segment every endpoint hangs off, appended to the host when
/// the configured value does not already carry it.
pub const REST_PATH: &str = "webservices/rest";

impl ClientConfiguration {
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let config = Self {
            rest: RestConfig {
                host: host.into(),
                timeout_seconds: None,
            },
            version: default_version(),
        };
        crate::config::loader::validate(&config)?;
        Ok(config)
    }

    /// Normalized root every endpoint path is joined onto:
    /// `{host}/webservices/rest/{version}/`.
    pub fn api_root(&self) -> Result<reqwest::Url> {
        let mut host = self.rest.host.trim().trim_end_matches('/').to_string();
        if host.is_empty() {
            return Err(ClientError::Configuration("rest.host is empty".to_string()));
        }
        if !host.contains("://") {
            host = format!("http://{}", host);
        }
        if !host.ends_with(REST_PATH) {
            host = format!("{}/{}", host, REST_PATH);
        }
        let root = format!("{}/{}/", host, self.version);
        reqwest::Url::parse(&root).map_err(|e| {
            ClientError::Configuration(format!("invalid rest.host '{}': {}", self.rest.host, e))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn api_root_normalizes_scheme_and_rest_path() {
        let cfg = ClientConfiguration::new("varhub.example.org:9090/varhub").unwrap();
        assert_eq!(
            cfg.api_root().unwrap().as_str(),
            "http://varhub.example.org:9090/varhub/webservices/rest/v2/"
        );
    }

    #[test]
    fn api_root_keeps_existing_scheme_and_suffix() {
        let cfg =
            ClientConfiguration::new("https://varhub.example.org/varhub/webservices/rest/").unwrap();
        assert_eq!(
            cfg.api_root().unwrap().as_str(),
            "https://varhub.example.org/varhub/webservices/rest/v2/"
        );
    }

    #[test]
    fn empty_host_is_rejected() {
        let err = ClientConfiguration::new("   ").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }
}
