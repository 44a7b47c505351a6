use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DomainError, PDF_MIME_TYPE};

pub const CONFIG_PATH_ENV: &str = "RESUME_SYNC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub autosave: AutosaveConfig,
    pub preview: PreviewConfig,
    pub renderer: RendererConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Where rendered exports go; defaults to `<data_dir>/exports`.
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub mime_type: String,
    /// Base of handle URIs. Empty means `http://<host>:<port>`.
    pub handle_base: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            export_dir: None,
        }
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            mime_type: PDF_MIME_TYPE.to_string(),
            handle_base: String::new(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "resume-render".to_string(),
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Reads the YAML file named by `RESUME_SYNC_CONFIG` (or `config.yaml`)
    /// if it exists, then applies environment overrides.
    pub fn load() -> Result<Self, DomainError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(DomainError::internal(format!(
                "Failed to read config {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, DomainError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
            .map_err(|e| DomainError::validation(format!("Invalid config: {}", e)))
    }

    pub fn apply_env(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), DomainError> {
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = parse_env("SERVER_PORT", &port)?;
        }
        if let Some(dir) = var("RESUME_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = var("AUTOSAVE_DEBOUNCE_MS") {
            self.autosave.debounce_ms = parse_env("AUTOSAVE_DEBOUNCE_MS", &ms)?;
        }
        if let Some(program) = var("RENDERER_PROGRAM") {
            self.renderer.program = program;
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.autosave.debounce_ms)
    }

    pub fn renderer_timeout(&self) -> Duration {
        Duration::from_secs(self.renderer.timeout_secs)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.storage
            .export_dir
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("exports"))
    }

    pub fn handle_base(&self) -> String {
        if self.preview.handle_base.is_empty() {
            format!("http://{}:{}", self.server.host, self.server.port)
        } else {
            self.preview.handle_base.clone()
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("{} has an invalid value: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.debounce(), Duration::from_millis(1000));
        assert_eq!(config.renderer_timeout(), Duration::from_secs(30));
        assert_eq!(config.preview.mime_type, "application/pdf");
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.export_dir(), PathBuf::from("./data/exports"));
        assert_eq!(config.handle_base(), "http://127.0.0.1:8787");
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml(
            r#"
autosave:
  debounce_ms: 250
renderer:
  program: /usr/local/bin/render-cv
  args: ["--format", "pdf"]
"#,
        )
        .unwrap();

        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.renderer.program, "/usr/local/bin/render-cv");
        assert_eq!(config.renderer.args, vec!["--format", "pdf"]);
        assert_eq!(config.renderer.timeout_secs, 30);
        assert_eq!(config.server.port, 8787);
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(Config::from_yaml("server: [1, 2").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.server.port, 8787);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "9000"),
            ("RESUME_DATA_DIR", "/var/lib/resume"),
            ("AUTOSAVE_DEBOUNCE_MS", "500"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/resume"));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "SERVER_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.is_validation());
    }
}
