//! Global Configuration Singleton

use std::sync::OnceLock;

use crate::models::config::WeftConfig;

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub run_synchronously: bool,
    pub max_file_size_bytes: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            run_synchronously: false,
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

impl From<&WeftConfig> for RuntimeConfig {
    fn from(config: &WeftConfig) -> Self {
        Self {
            run_synchronously: config.scheduler.run_synchronously,
            max_file_size_bytes: u64::from(config.compile.max_file_size_mb) * 1024 * 1024,
        }
    }
}

pub fn init(config: &WeftConfig) {
    if CONFIG.set(RuntimeConfig::from(config)).is_err() {
        tracing::debug!("Runtime config already initialized");
    }
}

pub fn run_synchronously() -> bool {
    config().run_synchronously
}

pub fn max_file_size_bytes() -> u64 {
    config().max_file_size_bytes
}

fn config() -> RuntimeConfig {
    CONFIG.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_from_weft_config() {
        let mut config = WeftConfig::default();
        config.scheduler.run_synchronously = true;
        config.compile.max_file_size_mb = 2;

        let runtime = RuntimeConfig::from(&config);
        assert!(runtime.run_synchronously);
        assert_eq!(runtime.max_file_size_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let runtime = RuntimeConfig::from(&WeftConfig::default());
        let fallback = RuntimeConfig::default();
        assert_eq!(runtime.run_synchronously, fallback.run_synchronously);
        assert_eq!(runtime.max_file_size_bytes, fallback.max_file_size_bytes);
    }
}
