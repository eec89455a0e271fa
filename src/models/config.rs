//! Configuration model for Weft

use serde::{Deserialize, Serialize};

/// Weft configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeftConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub compile: CompileConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub format: FormatConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Worker scheduling
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulerConfig {
    /// Run every task inline on the calling thread
    #[serde(default)]
    pub run_synchronously: bool,
}

/// Compile command resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    #[serde(default = "defaults::compiler")]
    pub compiler: String,

    #[serde(default = "defaults::fallback_flags")]
    pub fallback_flags: Vec<String>,

    /// Directory holding compile_commands.json; searched upward from each file when unset
    #[serde(default)]
    pub compile_commands_dir: Option<String>,

    /// Larger source files are skipped
    #[serde(default = "defaults::max_file_size_mb")]
    pub max_file_size_mb: u32,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            compiler: defaults::compiler(),
            fallback_flags: defaults::fallback_flags(),
            compile_commands_dir: None,
            max_file_size_mb: defaults::max_file_size_mb(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "defaults::completion_limit")]
    pub limit: usize,

    #[serde(default = "defaults::enabled")]
    pub include_keywords: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            limit: defaults::completion_limit(),
            include_keywords: defaults::enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "defaults::tab_width")]
    pub tab_width: usize,

    #[serde(default = "defaults::enabled")]
    pub expand_tabs: bool,

    #[serde(default = "defaults::enabled")]
    pub trim_trailing_whitespace: bool,

    #[serde(default = "defaults::enabled")]
    pub insert_final_newline: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            tab_width: defaults::tab_width(),
            expand_tabs: defaults::enabled(),
            trim_trailing_whitespace: defaults::enabled(),
            insert_final_newline: defaults::enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::format(),
        }
    }
}

mod defaults {
    pub fn compiler() -> String {
        "cc".to_string()
    }
    pub fn fallback_flags() -> Vec<String> {
        vec!["-fsyntax-only".to_string()]
    }
    pub fn max_file_size_mb() -> u32 {
        10
    }
    pub fn completion_limit() -> usize {
        100
    }
    pub fn tab_width() -> usize {
        4
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn format() -> String {
        "json".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WeftConfig::default();
        assert!(!config.scheduler.run_synchronously);
        assert_eq!(config.compile.compiler, "cc");
        assert_eq!(config.compile.fallback_flags, vec!["-fsyntax-only"]);
        assert_eq!(config.completion.limit, 100);
        assert_eq!(config.format.tab_width, 4);
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: WeftConfig = toml::from_str(
            r#"
            [scheduler]
            run_synchronously = true

            [format]
            tab_width = 2
            "#,
        )
        .unwrap();
        assert!(config.scheduler.run_synchronously);
        assert_eq!(config.format.tab_width, 2);
        assert!(config.format.expand_tabs);
        assert_eq!(config.completion.limit, 100);
    }
}
