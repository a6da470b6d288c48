//! Configuration, read from YAML. Every field has a default matching the
//! chat page the selectors were written for.
use crate::activation::store::DEFAULT_PREFERENCE_KEY;
use crate::debounce::DEFAULT_QUIET_PERIOD;
use crate::error::LatexError;
use crate::typeset::TypesetConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    pub container: String,
    pub message: String,
    pub toggle_mount: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: r#"[data-element-id="chat-space-end-part"]"#.to_string(),
            message: r#"[data-element-id="ai-response"]"#.to_string(),
            toggle_mount: r#"[data-element-id="message-input"]"#.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub selectors: SelectorConfig,
    pub quiet_period_ms: u64,
    pub preference_key: String,
    pub typeset: TypesetConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selectors: SelectorConfig::default(),
            quiet_period_ms: DEFAULT_QUIET_PERIOD.as_millis() as u64,
            preference_key: DEFAULT_PREFERENCE_KEY.to_string(),
            typeset: TypesetConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, LatexError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, LatexError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.quiet_period(), Duration::from_millis(300));
        assert_eq!(config.preference_key, "latexExtensionActive");
        assert!(config.typeset.process_escapes);
        assert!(config.typeset.process_environments);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            r#"
quiet-period-ms: 50
selectors:
  message: '[role="message"]'
typeset:
  packages: [ams, physics]
  process-environments: false
"#,
        )
        .unwrap();
        assert_eq!(config.quiet_period_ms, 50);
        assert_eq!(config.selectors.message, r#"[role="message"]"#);
        assert_eq!(
            config.selectors.container,
            SelectorConfig::default().container
        );
        assert_eq!(config.typeset.packages, vec!["ams", "physics"]);
        assert_eq!(config.typeset.inline_math.len(), 2);
        assert!(!config.typeset.process_environments);
        assert!(config.typeset.process_escapes);
    }

    #[test]
    fn test_written_defaults_load_back() {
        let text = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(text.contains("quiet-period-ms: 300"));
        assert_eq!(Config::from_yaml(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("quiet-period-ms: soon"),
            Err(LatexError::Yaml(_))
        ));
    }
}
