//! Caller-supplied switches for a processing run

use crate::policy::OneEntryPolicy;

/// Hard stop for chains of nested archives
pub const DEFAULT_MAX_DEPTH: u32 = 32;

/// The options bundle the frontend hands to [`crate::Processor`]
#[derive(Debug, Clone)]
pub struct Options {
    /// No prompts; every decision falls to its default
    pub batch: bool,
    /// Extract included archives without asking
    pub recursive: bool,
    /// Flatten extracted files into the destination
    pub flat: bool,
    /// Replace an existing same-named result instead of negotiating
    pub overwrite: bool,
    /// Starting point for the one-entry question
    pub one_entry: OneEntryPolicy,
    /// Remove each source archive once it unpacked cleanly
    pub delete_source: bool,
    /// Stop following nested archives at this depth
    pub max_depth: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            batch: false,
            recursive: false,
            flat: false,
            overwrite: false,
            one_entry: OneEntryPolicy::default(),
            delete_source: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
