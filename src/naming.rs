use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Path of an optional JSON file holding a `NamingConfig`
pub const CONFIG_ENV: &str = "PSTEST_CONFIG";
pub const MAIN_ENV: &str = "PSTEST_MAIN";
pub const MAIN_PREFIX_ENV: &str = "PSTEST_MAIN_PREFIX";
pub const MAIN_SUFFIX_ENV: &str = "PSTEST_MAIN_SUFFIX";
pub const MAIN_EXTENSION_ENV: &str = "PSTEST_MAIN_EXTENSION";
pub const TEST_PREFIX_ENV: &str = "PSTEST_TEST_PREFIX";
pub const TEST_SUFFIX_ENV: &str = "PSTEST_TEST_SUFFIX";

static GLOBAL: OnceLock<NamingConfig> = OnceLock::new();

/// Error loading the naming configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read naming config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid naming config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How test files map to the programs they judge
///
/// Empty strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    /// Explicit program path; disables inference entirely
    pub main: Option<PathBuf>,
    /// Prepended to the inferred program name
    pub main_prefix: Option<String>,
    /// Appended to the inferred program name
    pub main_suffix: Option<String>,
    /// Replaces the test file's extension (without the leading dot)
    pub main_extension: Option<String>,
    /// Stripped from the start of the test file name
    pub test_prefix: Option<String>,
    /// Stripped from the end of the test file name
    pub test_suffix: Option<String>,
}

impl NamingConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.normalized())
    }

    /// Read `PSTEST_CONFIG` and the `PSTEST_*` overrides from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`
    ///
    /// Individual variables override fields loaded from the config file.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mut config = match var(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };

        if let Some(main) = var(MAIN_ENV) {
            config.main = Some(main.into());
        }
        for (key, field) in [
            (MAIN_PREFIX_ENV, &mut config.main_prefix),
            (MAIN_SUFFIX_ENV, &mut config.main_suffix),
            (MAIN_EXTENSION_ENV, &mut config.main_extension),
            (TEST_PREFIX_ENV, &mut config.test_prefix),
            (TEST_SUFFIX_ENV, &mut config.test_suffix),
        ] {
            if let Some(value) = var(key) {
                *field = Some(value);
            }
        }

        Ok(config.normalized())
    }

    /// Process-wide configuration, read from the environment on first use
    ///
    /// An unreadable configuration is reported once and replaced by the
    /// default.
    pub fn global() -> &'static NamingConfig {
        GLOBAL.get_or_init(|| {
            Self::from_env().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring naming configuration");
                Self::default()
            })
        })
    }

    /// Install the process-wide configuration before its first use
    ///
    /// Returns the rejected value if the configuration was already set or read.
    pub fn set_global(config: NamingConfig) -> Result<(), NamingConfig> {
        GLOBAL.set(config.normalized())
    }

    /// True if test file names are stripped instead of inferred
    pub fn has_test_affix(&self) -> bool {
        self.test_prefix.is_some() || self.test_suffix.is_some()
    }

    fn normalized(mut self) -> Self {
        if self.main.as_ref().is_some_and(|main| main.as_os_str().is_empty()) {
            self.main = None;
        }
        for field in [
            &mut self.main_prefix,
            &mut self.main_suffix,
            &mut self.main_extension,
            &mut self.test_prefix,
            &mut self.test_suffix,
        ] {
            if field.as_deref() == Some("") {
                *field = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_default() {
        let config = NamingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, NamingConfig::default());
        assert!(!config.has_test_affix());
    }

    #[test]
    fn environment_variables() {
        let config = NamingConfig::from_lookup(lookup(&[
            (MAIN_PREFIX_ENV, "sol_"),
            (TEST_SUFFIX_ENV, "_test"),
            (TEST_PREFIX_ENV, ""),
        ]))
        .unwrap();
        assert_eq!(config.main_prefix.as_deref(), Some("sol_"));
        assert_eq!(config.test_suffix.as_deref(), Some("_test"));
        assert_eq!(config.test_prefix, None);
        assert!(config.has_test_affix());
    }

    #[test]
    fn json_fields_and_empty_strings() {
        let config = NamingConfig::from_json(
            r#"{ "main": "", "main_extension": "py", "test_prefix": "check_" }"#,
        )
        .unwrap();
        assert_eq!(config.main, None);
        assert_eq!(config.main_extension.as_deref(), Some("py"));
        assert_eq!(config.test_prefix.as_deref(), Some("check_"));
    }

    #[test]
    fn unknown_json_field_is_rejected() {
        let err = NamingConfig::from_json(r#"{ "mian": "x.py" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "main": "a.py", "main_suffix": "_v1" }}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config =
            NamingConfig::from_lookup(lookup(&[(CONFIG_ENV, path.as_str()), (MAIN_ENV, "b.py")])).unwrap();
        assert_eq!(config.main, Some(PathBuf::from("b.py")));
        assert_eq!(config.main_suffix.as_deref(), Some("_v1"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = NamingConfig::from_lookup(lookup(&[(CONFIG_ENV, "/nonexistent/pstest.json")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
