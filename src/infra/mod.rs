//! Infrastructure layer for Weft
//!
//! Contains low-level implementations and external integrations.

pub mod ast;
pub mod compile_db;
pub mod file_filter;
pub mod position;
pub mod scheduler;
pub mod vfs;

pub use compile_db::{
    CompilationDatabase, CompileCommand, DirectoryCompilationDatabase,
    FallbackCompilationDatabase,
};
pub use file_filter::{FileFilter, FileFilterConfig};
pub use position::{offset_to_position, position_to_offset};
pub use scheduler::Scheduler;
pub use vfs::{FileSystemProvider, InMemoryFileSystem, RealFileSystem};
