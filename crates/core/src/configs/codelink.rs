use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::configs::display::DisplayConfig;
use crate::types::{CodelinkError, CodelinkResult};

pub const CONFIG_FILE_NAME: &str = "codelink.yml";

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CodelinkConfig {
    pub display: Option<DisplayConfig>,
    pub design: Option<DesignConfig>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DesignConfig {
    /// URL of the design file this project links its components to
    pub file_url: String,
}

pub fn parse_config(yaml_str: &str) -> CodelinkResult<CodelinkConfig> {
    let config: CodelinkConfig = serde_yaml::from_str(yaml_str)?;
    if let Some(display) = &config.display {
        display.validate()?;
    }
    Ok(config)
}

pub fn config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CONFIG_FILE_NAME)
}

/// Load `codelink.yml` from the workspace root, if there is one
pub fn load_config(workspace_root: &Path) -> CodelinkResult<Option<CodelinkConfig>> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        CodelinkError::Config(format!("Failed to read config {}: {}", path.display(), e))
    })?;

    parse_config(&content).map(Some).map_err(|e| {
        CodelinkError::Config(format!("Failed to parse config {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
display:
  color: false
  spinner:
    frames: ["-", "+"]
    intervalMs: 120
design:
  fileUrl: https://design.example.com/file/AbC123/Components
"#;
        let config = parse_config(yaml).unwrap();
        let display = config.display.unwrap();
        assert_eq!(display.color, Some(false));
        assert_eq!(display.spinner.unwrap().interval_ms, Some(120));
        assert_eq!(
            config.design.unwrap().file_url,
            "https://design.example.com/file/AbC123/Components"
        );
    }

    #[test]
    fn test_parse_empty_mapping() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, CodelinkConfig::default());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = parse_config("design:\n  fileUrl: x\n  token: secret\n").unwrap_err();
        assert!(matches!(err, CodelinkError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_reports_path_on_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(config_path(dir.path()), "display: [").unwrap();

        let err = load_config(dir.path()).unwrap_err();
        match err {
            CodelinkError::Config(message) => assert!(message.contains(CONFIG_FILE_NAME)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            config_path(dir.path()),
            "design:\n  fileUrl: https://design.example.com/file/k\n",
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap().unwrap();
        assert!(config.design.is_some());
    }
}
