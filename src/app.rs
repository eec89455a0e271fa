//! Application container for Weft

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::output::{OutputContext, OutputFormat};
use crate::config;
use crate::error::WeftResult;
use crate::models::config::WeftConfig;
use crate::models::diagnostic::Diagnostic;
use crate::services::capabilities::DiagnosticsConsumer;
use crate::services::config::{ConfigService, DefaultConfigService};
use crate::services::session::{Session, SessionCapabilities};

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) config_service: Arc<dyn ConfigService>,
    pub(crate) config: WeftConfig,
}

impl App {
    /// `format` overrides the configured output format
    pub fn new(format: Option<&str>) -> anyhow::Result<Self> {
        let root = std::env::current_dir()?;

        tracing::debug!("Initializing Weft at {:?}", root);

        let config_service = Arc::new(DefaultConfigService::new(&root));
        let config = config_service.load(false).unwrap_or_else(|e| {
            tracing::warn!("Using default config: {}", e);
            WeftConfig::default()
        });

        config::init(&config);

        let format: OutputFormat = format
            .unwrap_or(&config.output.format)
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        let output = OutputContext::new(root.clone(), format);

        tracing::info!(
            "Weft initialized ({})",
            if config::run_synchronously() { "synchronous" } else { "worker thread" }
        );

        Ok(Self {
            root,
            output,
            config_service,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WeftConfig {
        &self.config
    }

    /// A session over the tree-sitter capabilities, reporting to `diagnostics`
    pub fn open_session(&self, diagnostics: Arc<dyn DiagnosticsConsumer>) -> WeftResult<Session> {
        let capabilities = SessionCapabilities::syntax(&self.config, diagnostics);
        Session::new(capabilities, config::run_synchronously())
    }

    /// A session for commands that do not need diagnostics
    pub fn open_quiet_session(&self) -> WeftResult<Session> {
        self.open_session(Arc::new(|_: &Path, _: Vec<Diagnostic>| {}))
    }
}
