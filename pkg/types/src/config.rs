use serde::{Deserialize, Serialize};

/// Webhook server configuration file (YAML).
///
/// Example `quota-config.yaml`:
/// ```yaml
/// port: 9443
/// data-dir: /var/lib/k3rs/quota
/// resolver-cache: true
/// strict-namespace-ownership: false
/// log-format: json
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfigFile {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    /// Cache the ProjectQuota listing between store changes.
    #[serde(default, alias = "resolver-cache")]
    pub resolver_cache: Option<bool>,
    /// Fail resolution when two ProjectQuotas claim the same namespace.
    #[serde(default, alias = "strict-namespace-ownership")]
    pub strict_namespace_ownership: Option<bool>,
    #[serde(default, alias = "log-format")]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg: ServerConfigFile = load_config_file("/nonexistent/quota-config.yaml").unwrap();
        assert!(cfg.port.is_none());
        assert!(cfg.resolver_cache.is_none());
    }

    #[test]
    fn kebab_case_keys_are_accepted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port: 8443\ndata-dir: /tmp/q\nresolver-cache: true\nstrict-namespace-ownership: true\nlog-format: json"
        )
        .unwrap();
        let cfg: ServerConfigFile = load_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.port, Some(8443));
        assert_eq!(cfg.data_dir.as_deref(), Some("/tmp/q"));
        assert_eq!(cfg.resolver_cache, Some(true));
        assert_eq!(cfg.strict_namespace_ownership, Some(true));
        assert_eq!(cfg.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
