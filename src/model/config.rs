use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const ENV_CONFIG_PATH: &str = "DOC_AUTH_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "doc_auth.yaml";
const ENV_TIMEOUT_SECS: &str = "DOC_AUTH_TIMEOUT_SECS";

/// Connect and total timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// TrueID (vendor B) account settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LexisNexisConfig {
    pub base_url: Option<Url>,
    pub trueid_account_id: Option<String>,
    pub trueid_username: Option<String>,
    pub trueid_password: Option<String>,
    pub trueid_liveness_workflow: Option<String>,
    pub trueid_noliveness_workflow: Option<String>,
    /// Seconds; falls back to [`DEFAULT_TIMEOUT`]
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl LexisNexisConfig {
    /// Fail fast on anything a request cannot be built without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_none() {
            return Err(ConfigError::Missing("base_url"));
        }
        require(&self.trueid_account_id, "trueid_account_id")?;
        require(&self.trueid_username, "trueid_username")?;
        require(&self.trueid_password, "trueid_password")?;
        require(&self.trueid_liveness_workflow, "trueid_liveness_workflow")?;
        require(&self.trueid_noliveness_workflow, "trueid_noliveness_workflow")?;
        validate_timeout(self.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn workflow(&self, liveness_enabled: bool) -> Option<&str> {
        if liveness_enabled {
            self.trueid_liveness_workflow.as_deref()
        } else {
            self.trueid_noliveness_workflow.as_deref()
        }
    }

    /// `…/restws/identity/v3/accounts/<account>/workflows/<workflow>/conversations`
    pub fn conversation_url(&self, liveness_enabled: bool) -> Result<Url, ConfigError> {
        let base = self
            .base_url
            .as_ref()
            .ok_or(ConfigError::Missing("base_url"))?;
        let account = self
            .trueid_account_id
            .as_deref()
            .ok_or(ConfigError::Missing("trueid_account_id"))?;
        let workflow = self.workflow(liveness_enabled).ok_or(ConfigError::Missing(
            if liveness_enabled {
                "trueid_liveness_workflow"
            } else {
                "trueid_noliveness_workflow"
            },
        ))?;

        let path = format!(
            "/restws/identity/v3/accounts/{}/workflows/{}/conversations",
            account, workflow
        );
        base.join(&path).map_err(|e| ConfigError::Invalid {
            field: "base_url",
            reason: e.to_string(),
        })
    }
}

/// AssureID (vendor A) account settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcuantConfig {
    pub assure_id_url: Option<Url>,
    pub assure_id_username: Option<String>,
    pub assure_id_password: Option<String>,
    pub assure_id_subscription_id: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl AcuantConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assure_id_url.is_none() {
            return Err(ConfigError::Missing("assure_id_url"));
        }
        require(&self.assure_id_username, "assure_id_username")?;
        require(&self.assure_id_password, "assure_id_password")?;
        validate_timeout(self.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Resolve a service path such as `/AssureIDService/Document/<id>` against the base URL
    pub fn url_for(&self, path: &str) -> Result<Url, ConfigError> {
        let base = self
            .assure_id_url
            .as_ref()
            .ok_or(ConfigError::Missing("assure_id_url"))?;
        base.join(path).map_err(|e| ConfigError::Invalid {
            field: "assure_id_url",
            reason: e.to_string(),
        })
    }
}

fn require(value: &Option<String>, field: &'static str) -> Result<(), ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ConfigError::Missing(field)),
    }
}

fn validate_timeout(timeout: Option<u64>) -> Result<(), ConfigError> {
    match timeout {
        Some(0) => Err(ConfigError::Invalid {
            field: "timeout",
            reason: "must be at least one second".to_string(),
        }),
        _ => Ok(()),
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub lexis_nexis: Option<LexisNexisConfig>,
    #[serde(default)]
    pub acuant: Option<AcuantConfig>,
}

/// Vendor configuration, validated at load time
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub lexis_nexis: Option<LexisNexisConfig>,
    pub acuant: Option<AcuantConfig>,
}

impl Config {
    /// Load configuration from the config file and environment
    ///
    /// The file path comes from `DOC_AUTH_CONFIG_PATH` (default `doc_auth.yaml`);
    /// a missing file yields an empty configuration. `DOC_AUTH_TIMEOUT_SECS`
    /// overrides the timeout of every configured vendor.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path)?.unwrap_or_default();

        let timeout_override = match std::env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                field: ENV_TIMEOUT_SECS,
                reason: e.to_string(),
            })?),
            Err(_) => None,
        };

        Self::from_file(file, timeout_override)
    }

    /// Build a validated configuration from an already parsed file
    pub fn from_file(file: ConfigFile, timeout_override: Option<u64>) -> Result<Self, ConfigError> {
        let mut config = Self {
            lexis_nexis: file.lexis_nexis,
            acuant: file.acuant,
        };

        if let Some(secs) = timeout_override {
            if let Some(ln) = config.lexis_nexis.as_mut() {
                ln.timeout = Some(secs);
            }
            if let Some(acuant) = config.acuant.as_mut() {
                acuant.timeout = Some(secs);
            }
        }

        if let Some(ln) = &config.lexis_nexis {
            ln.validate()?;
        }
        if let Some(acuant) = &config.acuant {
            acuant.validate()?;
        }

        Ok(config)
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Result<Option<ConfigFile>, ConfigError> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(None);
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        // Handle empty file
        let contents = contents.trim();
        if contents.is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Some(ConfigFile::default()));
        }

        let parsed = serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Loaded configuration from file");
        Ok(Some(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
lexis_nexis:
  base_url: https://lexis.nexis.example.com
  trueid_account_id: "456"
  trueid_username: test_username
  trueid_password: test_password
  trueid_liveness_workflow: liveness_workflow
  trueid_noliveness_workflow: no_liveness_workflow
acuant:
  assure_id_url: https://acuant.assureid.example.com
  assure_id_username: acuant.username
  assure_id_password: acuant.password
  timeout: 10
"#;

    fn parse(yaml: &str) -> ConfigFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_full_config_validates() {
        let config = Config::from_file(parse(FULL_CONFIG), None).unwrap();
        let ln = config.lexis_nexis.unwrap();
        assert_eq!(ln.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.acuant.unwrap().timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_override_applies_to_all_vendors() {
        let config = Config::from_file(parse(FULL_CONFIG), Some(5)).unwrap();
        assert_eq!(config.lexis_nexis.unwrap().timeout(), Duration::from_secs(5));
        assert_eq!(config.acuant.unwrap().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_base_url_fails_fast() {
        let file = parse(
            r#"
lexis_nexis:
  trueid_account_id: "456"
"#,
        );
        let err = Config::from_file(file, None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("base_url")));
        assert_eq!(err.to_string(), "config missing base_url");
    }

    #[test]
    fn test_blank_credentials_are_missing() {
        let mut ln = parse(FULL_CONFIG).lexis_nexis.unwrap();
        ln.trueid_password = Some("  ".to_string());
        assert!(matches!(
            ln.validate(),
            Err(ConfigError::Missing("trueid_password"))
        ));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let mut acuant = parse(FULL_CONFIG).acuant.unwrap();
        acuant.timeout = Some(0);
        assert!(matches!(
            acuant.validate(),
            Err(ConfigError::Invalid { field: "timeout", .. })
        ));
    }

    #[test]
    fn test_conversation_url_per_workflow() {
        let ln = parse(FULL_CONFIG).lexis_nexis.unwrap();
        assert_eq!(
            ln.conversation_url(true).unwrap().as_str(),
            "https://lexis.nexis.example.com/restws/identity/v3/accounts/456/workflows/liveness_workflow/conversations"
        );
        assert!(
            ln.conversation_url(false)
                .unwrap()
                .as_str()
                .ends_with("/workflows/no_liveness_workflow/conversations")
        );
    }

    #[test]
    fn test_acuant_url_for_path() {
        let acuant = parse(FULL_CONFIG).acuant.unwrap();
        assert_eq!(
            acuant.url_for("/AssureIDService/Document/Instance").unwrap().as_str(),
            "https://acuant.assureid.example.com/AssureIDService/Document/Instance"
        );
    }
}
