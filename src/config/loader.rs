use crate::config::settings::ClientConfiguration;
use crate::error::{ClientError, Result};
use std::fs;
use std::path::Path;

/// Load and validate a client configuration from a YAML or JSON file.
/// The format is picked from the file extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfiguration> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| ClientError::Configuration(format!("cannot read {}: {}", path.display(), e)))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let config: ClientConfiguration = match ext.as_str() {
        "yml" | "yaml" => serde_yaml::from_str(&raw)
            .map_err(|e| ClientError::Configuration(format!("invalid YAML configuration: {}", e)))?,
        "json" => serde_json::from_str(&raw)
            .map_err(|e| ClientError::Configuration(format!("invalid JSON configuration: {}", e)))?,
        other => {
            return Err(ClientError::Configuration(format!(
                "unsupported configuration format '{}', expected yml, yaml or json",
                other
            )))
        }
    };

    validate(&config)?;
    Ok(config)
}

/// Shape checks beyond what serde enforces.
pub fn validate(config: &ClientConfiguration) -> Result<()> {
    if config.rest.host.trim().is_empty() {
        return Err(ClientError::Configuration(
            "rest.host is required".to_string(),
        ));
    }
    if config.version.is_empty()
        || !config.version.starts_with('v')
        || !config.version[1..].chars().all(|c| c.is_ascii_digit())
        || config.version.len() < 2
    {
        return Err(ClientError::Configuration(format!(
            "version '{}' does not match 'v<number>'",
            config.version
        )));
    }
    // must produce a parseable URL as well
    config.api_root().map(|_| ())
}
