//! Service layer for Weft

pub mod analysis;
pub mod capabilities;
pub mod config;
pub mod drafts;
pub mod session;
pub mod units;

pub use capabilities::{
    CompletionProvider, DiagnosticsConsumer, FormatScope, Formatter, UnitBuilder,
};
pub use config::{ConfigService, DefaultConfigService};
pub use drafts::{Draft, DraftStore};
pub use session::{Session, SessionCapabilities};
pub use units::{Unit, UnitHandle, UnitStore};
