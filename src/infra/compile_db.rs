//! Compilation database lookup
//!
//! Resolves the compile command a build should use for a file, either from a
//! `compile_commands.json` found near the file or from configured fallback flags.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::CompileDbError;
use crate::models::config::CompileConfig;

const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

/// Working directory and full argument vector for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub arguments: Vec<String>,
}

impl CompileCommand {
    /// Quote-include search directories (`-I`, `-iquote`), resolved against `directory`
    pub fn include_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        let mut args = self.arguments.iter();

        while let Some(arg) = args.next() {
            let dir = match arg.as_str() {
                "-I" | "-iquote" => args.next().map(String::as_str),
                other => other.strip_prefix("-I").filter(|d| !d.is_empty()),
            };
            if let Some(dir) = dir {
                dirs.push(self.directory.join(dir));
            }
        }
        dirs
    }
}

pub trait CompilationDatabase: Send + Sync {
    fn compile_command(&self, path: &Path) -> CompileCommand;
}

/// `<compiler> <flags...> <file>`, run from the file's directory
#[derive(Debug, Clone)]
pub struct FallbackCompilationDatabase {
    compiler: String,
    flags: Vec<String>,
}

impl Default for FallbackCompilationDatabase {
    fn default() -> Self {
        Self::from_config(&CompileConfig::default())
    }
}

impl FallbackCompilationDatabase {
    pub fn new(compiler: impl Into<String>, flags: Vec<String>) -> Self {
        Self {
            compiler: compiler.into(),
            flags,
        }
    }

    pub fn from_config(config: &CompileConfig) -> Self {
        Self::new(config.compiler.clone(), config.fallback_flags.clone())
    }
}

impl CompilationDatabase for FallbackCompilationDatabase {
    fn compile_command(&self, path: &Path) -> CompileCommand {
        let mut arguments = Vec::with_capacity(self.flags.len() + 2);
        arguments.push(self.compiler.clone());
        arguments.extend(self.flags.iter().cloned());
        arguments.push(path.display().to_string());

        CompileCommand {
            directory: path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
            arguments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatabaseEntry {
    directory: PathBuf,
    file: PathBuf,
    #[serde(default)]
    arguments: Option<Vec<String>>,
    #[serde(default)]
    command: Option<String>,
}

impl DatabaseEntry {
    fn matches(&self, path: &Path) -> bool {
        self.directory.join(&self.file) == path
    }

    fn to_command(&self) -> CompileCommand {
        let arguments = match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            // No shell quoting support; arguments with spaces need the array form
            (None, Some(command)) => command.split_whitespace().map(str::to_string).collect(),
            (None, None) => Vec::new(),
        };
        CompileCommand {
            directory: self.directory.clone(),
            arguments,
        }
    }
}

type CachedDatabase = Option<Arc<Vec<DatabaseEntry>>>;

/// Looks up `compile_commands.json` in a fixed directory or the nearest
/// ancestor of each file, falling back to fixed flags.
pub struct DirectoryCompilationDatabase {
    fixed_dir: Option<PathBuf>,
    fallback: FallbackCompilationDatabase,
    databases: Mutex<HashMap<PathBuf, CachedDatabase>>,
}

impl DirectoryCompilationDatabase {
    pub fn new(fixed_dir: Option<PathBuf>, fallback: FallbackCompilationDatabase) -> Self {
        Self {
            fixed_dir,
            fallback,
            databases: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CompileConfig) -> Self {
        Self::new(
            config.compile_commands_dir.as_ref().map(PathBuf::from),
            FallbackCompilationDatabase::from_config(config),
        )
    }

    fn database_in(&self, dir: &Path) -> CachedDatabase {
        let mut databases = self
            .databases
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = databases.get(dir) {
            return cached.clone();
        }

        let loaded = match load_database(dir) {
            Ok(entries) => entries.map(Arc::new),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };
        databases.insert(dir.to_path_buf(), loaded.clone());
        loaded
    }

    fn search_dirs<'a>(&'a self, path: &'a Path) -> Box<dyn Iterator<Item = &'a Path> + 'a> {
        match &self.fixed_dir {
            Some(dir) => Box::new(std::iter::once(dir.as_path())),
            None => Box::new(path.ancestors().skip(1)),
        }
    }
}

impl CompilationDatabase for DirectoryCompilationDatabase {
    fn compile_command(&self, path: &Path) -> CompileCommand {
        for dir in self.search_dirs(path) {
            let Some(entries) = self.database_in(dir) else {
                continue;
            };
            if let Some(entry) = entries.iter().find(|e| e.matches(path)) {
                tracing::trace!("Compile command for {} from {}", path.display(), dir.display());
                return entry.to_command();
            }
            // Nearest database wins, even when it has no entry for the file
            break;
        }
        self.fallback.compile_command(path)
    }
}

fn load_database(dir: &Path) -> Result<Option<Vec<DatabaseEntry>>, CompileDbError> {
    let path = dir.join(COMPILE_COMMANDS_FILE);
    if !path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)?;
    let entries: Vec<DatabaseEntry> =
        serde_json::from_str(&content).map_err(|e| CompileDbError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;

    tracing::debug!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(Some(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_database(dir: &Path, json: &str) {
        std::fs::write(dir.join(COMPILE_COMMANDS_FILE), json).unwrap();
    }

    #[test]
    fn test_fallback_command() {
        let db = FallbackCompilationDatabase::default();
        let command = db.compile_command(Path::new("/src/a.cc"));
        assert_eq!(command.directory, PathBuf::from("/src"));
        assert_eq!(command.arguments, vec!["cc", "-fsyntax-only", "/src/a.cc"]);
    }

    #[test]
    fn test_include_dirs() {
        let command = CompileCommand {
            directory: PathBuf::from("/proj"),
            arguments: ["c++", "-Iinclude", "-I", "/abs", "-iquote", "q", "-I"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        assert_eq!(
            command.include_dirs(),
            vec![
                PathBuf::from("/proj/include"),
                PathBuf::from("/abs"),
                PathBuf::from("/proj/q"),
            ]
        );
    }

    #[test]
    fn test_directory_database_lookup() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        let json = serde_json::json!([
            {
                "directory": root.path(),
                "file": "src/a.cc",
                "command": "clang++ -Iinclude -c src/a.cc"
            },
            {
                "directory": root.path(),
                "file": root.path().join("src/c.cc"),
                "arguments": ["clang++", "-DC", "src/c.cc"]
            }
        ]);
        write_database(root.path(), &json.to_string());

        let db = DirectoryCompilationDatabase::new(None, FallbackCompilationDatabase::default());

        let command = db.compile_command(&src.join("a.cc"));
        assert_eq!(command.directory, root.path());
        assert_eq!(command.arguments, vec!["clang++", "-Iinclude", "-c", "src/a.cc"]);
        assert_eq!(command.include_dirs(), vec![root.path().join("include")]);

        let command = db.compile_command(&src.join("c.cc"));
        assert_eq!(command.arguments, vec!["clang++", "-DC", "src/c.cc"]);

        // Unlisted file falls back
        let command = db.compile_command(&src.join("b.cc"));
        assert_eq!(command.directory, src);
        assert_eq!(command.arguments[0], "cc");
    }

    #[test]
    fn test_invalid_database_falls_back() {
        let root = tempfile::tempdir().unwrap();
        write_database(root.path(), "{ not json");

        let db = DirectoryCompilationDatabase::new(
            Some(root.path().to_path_buf()),
            FallbackCompilationDatabase::new("clang", vec![]),
        );
        let file = root.path().join("a.cc");
        let command = db.compile_command(&file);
        assert_eq!(command.arguments, vec!["clang".to_string(), file.display().to_string()]);
    }
}
