//! Configuration logic and models.
use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;

use crate::constants::SERVICE_NAME;

/// Errors while loading monitor configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
    /// Unable to load configuration from file.
    ///
    /// Error parameters:
    ///
    /// - Path to the configuration file.
    #[error("unable to load configuration from file: '{0}'")]
    Load(String),

    /// Unable to open the configuration file.
    ///
    /// Error parameters:
    ///
    /// - Path to the configuration file.
    #[error("unable to open the configuration file: '{0}'")]
    Open(String),
}

/// Configuration of the MongoDB command monitor.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct MonitorConf {
    /// Service name reported on command spans.
    #[serde(default = "MonitorConf::default_service_name")]
    pub service_name: String,

    /// Attach the rendered command document to spans as the statement attribute.
    #[serde(default = "MonitorConf::default_statement")]
    pub statement: bool,

    /// Cap the rendered statement to this many bytes.
    #[serde(default)]
    pub max_statement_length: Option<usize>,
}

impl MonitorConf {
    fn default_service_name() -> String {
        SERVICE_NAME.to_string()
    }

    fn default_statement() -> bool {
        true
    }
}

impl Default for MonitorConf {
    fn default() -> Self {
        MonitorConf {
            service_name: MonitorConf::default_service_name(),
            statement: MonitorConf::default_statement(),
            max_statement_length: None,
        }
    }
}

/// Load configuration from file, if the file exists.
pub fn load<C>(path: &str, default: C) -> Result<C>
where
    C: serde::de::DeserializeOwned,
{
    // Check if the configuration file exists and return the default if it does not.
    if !PathBuf::from(path).exists() {
        return Ok(default);
    }

    // Load and deserialize the configuration.
    let file = File::open(path).with_context(|| ConfError::Open(path.into()))?;
    let conf = serde_yaml::from_reader(file).with_context(|| ConfError::Load(path.into()))?;
    Ok(conf)
}

#[cfg(test)]
mod tests {
    use super::load;
    use super::MonitorConf;

    #[test]
    fn defaults() {
        let conf = MonitorConf::default();
        assert_eq!(conf.service_name, "mongo");
        assert!(conf.statement);
        assert_eq!(conf.max_statement_length, None);
    }

    #[test]
    fn from_yaml() {
        let conf: MonitorConf = serde_yaml::from_str(
            "service_name: orders-db\nmax_statement_length: 1024\n",
        )
        .unwrap();
        assert_eq!(conf.service_name, "orders-db");
        assert!(conf.statement);
        assert_eq!(conf.max_statement_length, Some(1024));
    }

    #[test]
    fn missing_file_returns_default() {
        let conf = load("/does/not/exist.yaml", MonitorConf::default()).unwrap();
        assert_eq!(conf.service_name, "mongo");
    }
}
