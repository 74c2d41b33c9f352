//! Shuck - unpack anything by asking the right tool
//!
//! This library resolves an archive file to a known format, runs the
//! matching chain of external tools through anonymous pipes, and then
//! reorganizes whatever landed in the scratch directory into a tidy,
//! predictable result. It never decodes archive bytes itself.

pub mod archive;
pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod format;
pub mod options;
pub mod organize;
pub mod pipeline;
pub mod policy;
pub mod process;

pub use error::{Error, Result};

// Re-export commonly used types
pub use archive::Archive;
pub use classify::{Classification, ContentKind};
pub use config::Config;
pub use detect::resolve;
pub use extract::{extract, list, Extraction};
pub use format::{ArchiveKind, Encoding};
pub use options::Options;
pub use policy::{OneEntryChoice, OneEntryPolicy, OneEntryPrompt, RecursionPolicy, Session};
pub use process::Processor;
