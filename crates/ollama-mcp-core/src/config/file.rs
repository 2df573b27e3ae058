//! Optional YAML configuration file
//!
//! Looked up at `$OLLAMA_MCP_CONFIG`, else `<config dir>/ollama-mcp/config.yaml`.
//! Every field is optional; environment variables override whatever is set here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::traits::{ConfigError, ConfigResult};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub ollama_host: Option<String>,
    pub default_model: Option<String>,
    pub disabled_tools: Option<Vec<String>>,
    pub max_conversations: Option<usize>,
    pub conversation_timeout_hours: Option<u64>,
    pub stream: Option<bool>,
    pub default_temperature: Option<f32>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// User-level location (`~/.config/ollama-mcp/config.yaml` on Linux)
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("ollama-mcp").join("config.yaml")
    }

    /// Load the file at `path`; a missing file is `Ok(None)`
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }

        serde_yaml::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert!(ConfigFile::load(dir.path().join("nope.yaml")).unwrap().is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "default_model: qwen2.5-coder\ndisabled_tools: [precommit, codereview]\nmax_conversations: 5\n",
        )
        .unwrap();

        let file = ConfigFile::load(&path).unwrap().unwrap();
        assert_eq!(file.default_model.as_deref(), Some("qwen2.5-coder"));
        assert_eq!(file.max_conversations, Some(5));
        assert_eq!(
            file.disabled_tools,
            Some(vec!["precommit".to_string(), "codereview".to_string()])
        );
        assert_eq!(file.ollama_host, None);
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(ConfigFile::load(&path).unwrap(), Some(ConfigFile::default()));
    }

    #[test]
    fn test_bad_yaml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "max_conversations: [not a number").unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }
}
