//! Configuration service for Weft

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::config::WeftConfig;

const OUTPUT_FORMATS: &[&str] = &["json", "text"];

pub trait ConfigService: Send + Sync {
    fn load(&self, global_only: bool) -> Result<WeftConfig, ConfigError>;
    fn config_path(&self, global: bool) -> PathBuf;
    fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError>;
}

pub struct DefaultConfigService {
    root: PathBuf,
    global_path: PathBuf,
}

impl DefaultConfigService {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            global_path: Self::global_config_path(),
        }
    }

    pub fn with_global_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_path = path.into();
        self
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/weft/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("weft")
            .join("config.toml")
    }

    fn project_config_path(&self) -> PathBuf {
        self.root.join(".weft").join("config.toml")
    }

    fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
        if !path.exists() {
            return Ok(toml::Table::new());
        }
        let content = std::fs::read_to_string(path)?;
        content
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let config = WeftConfig::default();
        let content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl ConfigService for DefaultConfigService {
    fn load(&self, global_only: bool) -> Result<WeftConfig, ConfigError> {
        let mut table = Self::load_table(&self.global_path)?;
        if !global_only {
            merge_tables(&mut table, Self::load_table(&self.project_config_path())?);
        }

        let config = toml::Value::Table(table)
            .try_into::<WeftConfig>()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        let config = if global_only {
            config
        } else {
            apply_env_overrides(config, |key| std::env::var(key).ok())
        };
        validate(&config)?;

        tracing::debug!(
            "Loaded config (global: {}, project: {})",
            self.global_path.display(),
            self.project_config_path().display()
        );
        Ok(config)
    }

    fn config_path(&self, global: bool) -> PathBuf {
        if global {
            self.global_path.clone()
        } else {
            self.project_config_path()
        }
    }

    fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                key: "config".to_string(),
                message: format!(
                    "Config already exists: {}. Use --force to overwrite.",
                    path.display()
                ),
            });
        }

        Self::write_default_config(&path)?;
        Ok(path)
    }
}

/// Recursively overlay `overlay` onto `base`; keys only in `base` survive.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn apply_env_overrides<F>(mut config: WeftConfig, var: F) -> WeftConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = var("WEFT_OUTPUT_FORMAT") {
        config.output.format = val;
    }
    if let Some(val) = var("WEFT_COMPLETION_LIMIT") {
        match val.parse() {
            Ok(limit) => config.completion.limit = limit,
            Err(_) => tracing::warn!("Ignoring WEFT_COMPLETION_LIMIT={}: not a number", val),
        }
    }
    if let Some(val) = var("WEFT_RUN_SYNCHRONOUSLY") {
        match val.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => config.scheduler.run_synchronously = true,
            "0" | "false" | "no" => config.scheduler.run_synchronously = false,
            _ => tracing::warn!("Ignoring WEFT_RUN_SYNCHRONOUSLY={}: not a boolean", val),
        }
    }
    config
}

fn validate(config: &WeftConfig) -> Result<(), ConfigError> {
    if !OUTPUT_FORMATS.contains(&config.output.format.as_str()) {
        return Err(ConfigError::InvalidValue {
            key: "output.format".to_string(),
            message: format!(
                "'{}' is not one of: {}",
                config.output.format,
                OUTPUT_FORMATS.join(", ")
            ),
        });
    }
    if config.format.tab_width == 0 {
        return Err(ConfigError::InvalidValue {
            key: "format.tab_width".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> DefaultConfigService {
        DefaultConfigService::new(&dir.path().join("project"))
            .with_global_path(dir.path().join("global").join("config.toml"))
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = service(&dir).load(true).unwrap();
        assert_eq!(config.completion.limit, 100);
        assert!(!config.scheduler.run_synchronously);
    }

    #[test]
    fn test_project_overrides_global_per_key() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        write(
            &service.config_path(true),
            "[completion]\nlimit = 10\ninclude_keywords = false\n[format]\ntab_width = 2\n",
        );
        write(&service.config_path(false), "[completion]\nlimit = 25\n");

        let config = service.load(true).unwrap();
        assert_eq!(config.completion.limit, 10);

        let table = {
            let mut table = DefaultConfigService::load_table(&service.config_path(true)).unwrap();
            merge_tables(
                &mut table,
                DefaultConfigService::load_table(&service.config_path(false)).unwrap(),
            );
            table
        };
        let merged = toml::Value::Table(table).try_into::<WeftConfig>().unwrap();
        assert_eq!(merged.completion.limit, 25);
        assert!(!merged.completion.include_keywords);
        assert_eq!(merged.format.tab_width, 2);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        write(&service.config_path(true), "[completion\nlimit = ");
        assert!(matches!(service.load(true), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        write(&service.config_path(true), "[output]\nformat = \"yaml\"\n");
        match service.load(true) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "output.format"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("WEFT_OUTPUT_FORMAT", "text"),
            ("WEFT_COMPLETION_LIMIT", "7"),
            ("WEFT_RUN_SYNCHRONOUSLY", "true"),
        ]
        .into();
        let config = apply_env_overrides(WeftConfig::default(), |key| {
            vars.get(key).map(|v| v.to_string())
        });
        assert_eq!(config.output.format, "text");
        assert_eq!(config.completion.limit, 7);
        assert!(config.scheduler.run_synchronously);

        let config = apply_env_overrides(WeftConfig::default(), |key| {
            (key == "WEFT_COMPLETION_LIMIT").then(|| "many".to_string())
        });
        assert_eq!(config.completion.limit, 100);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        let path = service.init(false, false).unwrap();
        assert!(path.ends_with(".weft/config.toml"));
        let written: WeftConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.compile.compiler, "cc");

        assert!(matches!(
            service.init(false, false),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(service.init(false, true).is_ok());
    }
}
