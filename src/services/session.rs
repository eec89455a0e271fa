//! Session orchestrator
//!
//! A `Session` owns the drafts of every tracked file, the cache of built
//! units and the scheduler that sequences all work on them:
//!
//! - document changes enqueue a rebuild at the back of the queue and return
//!   immediately; diagnostics arrive later through the `DiagnosticsConsumer`
//! - completion and formatting jump to the front of the queue and block the
//!   caller until the result is ready
//! - AST dumps queue at the back so they observe every change made before
//!   them
//!
//! Diagnostics are only published for the version that is still current when
//! a rebuild finishes, so a slow build of old content never overwrites the
//! report for newer content.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;

use crate::error::{BuildError, SchedulerError, WeftError, WeftResult};
use crate::infra::ast::ParserPool;
use crate::infra::compile_db::{CompilationDatabase, DirectoryCompilationDatabase};
use crate::infra::scheduler::{Placement, Scheduler, panic_message};
use crate::infra::vfs::{FileSystemProvider, RealFileSystem};
use crate::models::config::WeftConfig;
use crate::models::lsp::{CompletionItem, Position, Range, Replacement};
use crate::services::analysis::{SyntaxCompletionProvider, SyntaxUnitBuilder, WhitespaceFormatter};
use crate::services::capabilities::{
    BuildInputs, CompletionProvider, CompletionRequest, DiagnosticsConsumer, FormatRequest,
    FormatScope, Formatter, UnitBuilder,
};
use crate::services::drafts::{Draft, DraftStore};
use crate::services::units::{Unit, UnitStore};

/// Everything a session delegates to
pub struct SessionCapabilities {
    pub builder: Arc<dyn UnitBuilder>,
    pub completion: Arc<dyn CompletionProvider>,
    pub formatter: Arc<dyn Formatter>,
    pub compile_db: Arc<dyn CompilationDatabase>,
    pub fs: Arc<dyn FileSystemProvider>,
    pub diagnostics: Arc<dyn DiagnosticsConsumer>,
}

impl SessionCapabilities {
    /// Tree-sitter capabilities over the real file system
    pub fn syntax(config: &WeftConfig, diagnostics: Arc<dyn DiagnosticsConsumer>) -> Self {
        let parsers = Arc::new(ParserPool::new());
        Self {
            builder: Arc::new(SyntaxUnitBuilder::new(Arc::clone(&parsers))),
            completion: Arc::new(SyntaxCompletionProvider::new(
                parsers,
                config.completion.clone(),
            )),
            formatter: Arc::new(WhitespaceFormatter::new(config.format.clone())),
            compile_db: Arc::new(DirectoryCompilationDatabase::from_config(&config.compile)),
            fs: Arc::new(RealFileSystem),
            diagnostics,
        }
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystemProvider>) -> Self {
        self.fs = fs;
        self
    }
}

struct SessionState {
    drafts: DraftStore,
    units: UnitStore,
    caps: SessionCapabilities,
}

impl SessionState {
    /// Rebuild `path` if `version` is still its current draft, then publish
    /// diagnostics if it still is once the build is done.
    fn rebuild(&self, path: &Path, version: u64) {
        let draft = match self.drafts.read(path) {
            Ok(draft) if draft.version == version => draft,
            _ => {
                tracing::trace!("Skipping rebuild of {} v{}: superseded", path.display(), version);
                return;
            }
        };

        let unit = self.build_unit(path, &draft);
        let diagnostics = unit.diagnostics().to_vec();
        self.units.store(unit);

        if self.drafts.version(path) == Some(version) {
            tracing::debug!(
                "Publishing {} diagnostics for {} v{}",
                diagnostics.len(),
                path.display(),
                version
            );
            self.caps.diagnostics.on_diagnostics_ready(path, diagnostics);
        } else {
            tracing::debug!(
                "Discarding diagnostics for {} v{}: file changed during build",
                path.display(),
                version
            );
        }
    }

    /// Build a unit for `draft`. Failures become a unit carrying a single
    /// diagnostic that describes them.
    fn build_unit(&self, path: &Path, draft: &Draft) -> Unit {
        let command = self.caps.compile_db.compile_command(path);
        let inputs = BuildInputs {
            path,
            contents: &draft.contents,
            version: draft.version,
            command: &command,
            fs: self.caps.fs.as_ref(),
        };

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| self.caps.builder.build(inputs)))
            .unwrap_or_else(|payload| {
                Err(BuildError::Panicked(panic_message(payload.as_ref()).to_string()))
            });

        match result {
            Ok(unit) => unit,
            Err(e) => {
                tracing::warn!("Build of {} v{} failed: {}", path.display(), draft.version, e);
                Unit::failed(path, draft.version, &e)
            }
        }
    }

    fn format(&self, path: &Path, scope: FormatScope) -> WeftResult<Vec<Replacement>> {
        let draft = self.drafts.read(path)?;
        Ok(self.caps.formatter.format(FormatRequest {
            path,
            contents: &draft.contents,
            scope,
        }))
    }
}

pub struct Session {
    // Must stay the first field: shutting the worker down before the state
    // goes away keeps every running task's view of the state valid.
    scheduler: Scheduler,
    state: Arc<SessionState>,
}

impl Session {
    pub fn new(capabilities: SessionCapabilities, run_synchronously: bool) -> WeftResult<Self> {
        let scheduler = Scheduler::new(run_synchronously)?;
        Ok(Self {
            scheduler,
            state: Arc::new(SessionState {
                drafts: DraftStore::new(),
                units: UnitStore::new(),
                caps: capabilities,
            }),
        })
    }

    pub fn is_synchronous(&self) -> bool {
        self.scheduler.is_synchronous()
    }

    /// Start tracking `path` or replace its contents, and schedule a rebuild.
    ///
    /// Returns once the draft is stored; diagnostics are delivered later.
    pub fn add_document(&self, path: impl AsRef<Path>, contents: &str) -> WeftResult<()> {
        let path = path.as_ref();
        let _span = tracing::debug_span!("add_document", path = %path.display()).entered();

        let version = self.state.drafts.upsert(path, contents);
        tracing::debug!("Stored {} v{} ({} bytes)", path.display(), version, contents.len());
        self.schedule_rebuild(path, version)
    }

    /// Stop tracking `path`. The cached unit is released by a queued task so
    /// it is never dropped underneath a build that is still using it. The
    /// same task forgets the draft's tombstone: every rebuild queued before
    /// it has run by then.
    pub fn remove_document(&self, path: impl AsRef<Path>) -> WeftResult<()> {
        let path = path.as_ref();
        let _span = tracing::debug_span!("remove_document", path = %path.display()).entered();

        let tombstone = self.state.drafts.remove(path);
        if tombstone.is_none() {
            tracing::debug!("Removing untracked file {}", path.display());
        }

        let state = Arc::clone(&self.state);
        let path = path.to_path_buf();
        self.scheduler.add_to_end(move || {
            if state.units.remove(&path).is_some() {
                tracing::trace!("Released unit for {}", path.display());
            }
            if let Some(version) = tombstone {
                state.drafts.prune(&path, version);
            }
        })?;
        Ok(())
    }

    /// Rebuild `path` from its current draft even if nothing changed.
    pub fn force_reparse(&self, path: impl AsRef<Path>) -> WeftResult<()> {
        let path = path.as_ref();
        let _span = tracing::debug_span!("force_reparse", path = %path.display()).entered();

        let draft = self.state.drafts.read(path)?;
        self.schedule_rebuild(path, draft.version)
    }

    /// Completion candidates at `position`, computed ahead of queued rebuilds.
    pub fn code_complete(
        &self,
        path: impl AsRef<Path>,
        position: Position,
    ) -> WeftResult<Vec<CompletionItem>> {
        let path = self.tracked_path(path.as_ref())?;
        let _span = tracing::debug_span!("code_complete", path = %path.display()).entered();

        self.run_blocking(Placement::Front, move |state| {
            let draft = state.drafts.read(&path)?;
            let command = state.caps.compile_db.compile_command(&path);
            Ok(state.caps.completion.complete(CompletionRequest {
                path: &path,
                contents: &draft.contents,
                position,
                command: &command,
            }))
        })
    }

    pub fn format_range(
        &self,
        path: impl AsRef<Path>,
        range: Range,
    ) -> WeftResult<Vec<Replacement>> {
        self.format(path.as_ref(), FormatScope::Range(range))
    }

    pub fn format_file(&self, path: impl AsRef<Path>) -> WeftResult<Vec<Replacement>> {
        self.format(path.as_ref(), FormatScope::File)
    }

    pub fn format_on_type(
        &self,
        path: impl AsRef<Path>,
        position: Position,
    ) -> WeftResult<Vec<Replacement>> {
        self.format(path.as_ref(), FormatScope::OnType(position))
    }

    /// Current contents of a tracked file
    pub fn get_document(&self, path: impl AsRef<Path>) -> WeftResult<String> {
        Ok(self.state.drafts.read(path.as_ref())?.contents.to_string())
    }

    /// Rendering of the unit for `path` after every previously queued change
    /// has been applied. Builds a unit if none is cached.
    pub fn dump_ast(&self, path: impl AsRef<Path>) -> WeftResult<String> {
        let path = self.tracked_path(path.as_ref())?;
        let _span = tracing::debug_span!("dump_ast", path = %path.display()).entered();

        self.run_blocking(Placement::Back, move |state| {
            let draft = state.drafts.read(&path)?;
            let unit = state
                .units
                .get_or_build(&path, || state.build_unit(&path, &draft));
            Ok(unit.dump())
        })
    }

    /// Wait until every task queued so far has run.
    pub fn block_until_idle(&self) -> WeftResult<()> {
        self.run_blocking(Placement::Back, |_| Ok(()))
    }

    pub fn tracked_files(&self) -> Vec<PathBuf> {
        self.state.drafts.tracked_files()
    }

    /// Finish the running task, drop queued ones and stop the worker.
    /// Later calls fail with `SchedulerError::Terminated`.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
    }

    fn format(&self, path: &Path, scope: FormatScope) -> WeftResult<Vec<Replacement>> {
        let path = self.tracked_path(path)?;
        let _span = tracing::debug_span!("format", path = %path.display(), ?scope).entered();

        self.run_blocking(Placement::Front, move |state| state.format(&path, scope))
    }

    fn tracked_path(&self, path: &Path) -> WeftResult<PathBuf> {
        self.state.drafts.read(path)?;
        Ok(path.to_path_buf())
    }

    fn schedule_rebuild(&self, path: &Path, version: u64) -> WeftResult<()> {
        let state = Arc::clone(&self.state);
        let path = path.to_path_buf();
        self.scheduler.add_to_end(move || state.rebuild(&path, version))?;
        Ok(())
    }

    /// Run `task` on the scheduler and wait for its result.
    ///
    /// On a multi-threaded tokio runtime the wait runs inside
    /// `block_in_place`.
    ///
    /// # Errors
    ///
    /// `SchedulerError::BlockingInRuntime` when a worker-thread session is
    /// asked to wait from inside a current-thread runtime, including its
    /// blocking pool. Synchronous sessions have their reply before the wait
    /// and work from any context.
    fn run_blocking<T, F>(&self, placement: Placement, task: F) -> WeftResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SessionState) -> WeftResult<T> + Send + 'static,
    {
        let synchronous = self.scheduler.is_synchronous();
        let runtime = if synchronous { None } else { blocking_runtime()? };

        let (reply_tx, mut reply_rx) = oneshot::channel();
        let state = Arc::clone(&self.state);
        self.scheduler.add(placement, move || {
            let _ = reply_tx.send(task(&state));
        })?;

        let reply = match runtime {
            _ if synchronous => reply_rx.try_recv().ok(),
            Some(RuntimeFlavor::MultiThread) => {
                tokio::task::block_in_place(|| reply_rx.blocking_recv()).ok()
            }
            _ => reply_rx.blocking_recv().ok(),
        };
        reply.unwrap_or(Err(WeftError::Scheduler(SchedulerError::TaskDropped)))
    }
}

/// Flavor of the tokio runtime the caller is on, if any. Only a
/// multi-threaded runtime can hand its thread over to a blocking wait.
fn blocking_runtime() -> Result<Option<RuntimeFlavor>, SchedulerError> {
    match Handle::try_current() {
        Err(_) => Ok(None),
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(Some(RuntimeFlavor::MultiThread))
        }
        Ok(handle) => {
            tracing::error!(
                "Blocking session call from a {:?} tokio runtime",
                handle.runtime_flavor()
            );
            Err(SchedulerError::BlockingInRuntime)
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}
