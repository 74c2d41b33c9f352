//! Session policies for nested archives and single entries
//!
//! [`Session`] is the one piece of state threaded through a whole run:
//! whether freshly discovered archives get extracted too, and whether
//! a lone top-level entry lands directly in the destination or gets
//! wrapped. Both start from configurable defaults and change only on
//! an explicit answer at a prompt.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::{Error, Result};

/// What to do about archives found inside an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecursionPolicy {
    /// Extract nested archives for the rest of the session
    Always,
    /// Extract this batch of nested archives, then ask again next time
    Once,
    /// Skip this batch, ask again next time
    #[default]
    NotNow,
    /// Skip nested archives for the rest of the session
    Never,
    /// Show the nested archive names, then ask again
    List,
}

impl RecursionPolicy {
    /// Parse a menu answer. Letters match the prompt and nothing else
    /// is accepted.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice {
            "a" => Some(Self::Always),
            "o" => Some(Self::Once),
            "n" => Some(Self::NotNow),
            "v" => Some(Self::Never),
            "l" => Some(Self::List),
            _ => None,
        }
    }
}

/// Where a single top-level entry should end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OneEntryPolicy {
    /// Straight into the destination under its negotiated name
    #[default]
    Here,
    /// Inside a directory named after the archive
    Wrap,
    /// Ask, when a terminal is attached
    Ask,
}

impl std::str::FromStr for OneEntryPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "here" => Ok(Self::Here),
            "wrap" => Ok(Self::Wrap),
            "ask" => Ok(Self::Ask),
            other => Err(Error::Config(format!(
                "unknown one-entry policy `{other}`"
            ))),
        }
    }
}

/// An answer to the one-entry question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneEntryChoice {
    Here,
    Wrap,
    /// Extract here and stop asking
    AlwaysHere,
    /// Wrap and stop asking
    AlwaysWrap,
}

/// Asks the one-entry question; the terminal frontend renders a menu,
/// tests substitute a canned answer.
pub trait OneEntryPrompt {
    fn choose(&mut self, entry: &str) -> OneEntryChoice;
}

/// Never asks, always extracts here
pub struct NoPrompt;

impl OneEntryPrompt for NoPrompt {
    fn choose(&mut self, _entry: &str) -> OneEntryChoice {
        OneEntryChoice::Here
    }
}

/// Mutable policy state for one run
#[derive(Debug, Default)]
pub struct Session {
    recursion: RecursionPolicy,
    one_entry: OneEntryPolicy,
}

impl Session {
    pub fn new(one_entry: OneEntryPolicy) -> Self {
        Self {
            recursion: RecursionPolicy::default(),
            one_entry,
        }
    }

    /// Decide whether the included archives of one extraction get
    /// extracted as well. `forced` is the recursive flag; in batch
    /// mode it is the whole answer. Interactively this loops over a
    /// single-letter menu until an answer lands, and any trouble
    /// reading the answer counts as a no.
    pub fn decide_recursion<R: BufRead, W: Write>(
        &mut self,
        forced: bool,
        batch: bool,
        included: &[PathBuf],
        file_count: usize,
        input: &mut R,
        output: &mut W,
    ) -> bool {
        if forced {
            return true;
        }
        match self.recursion {
            RecursionPolicy::Always => return true,
            RecursionPolicy::Never => return false,
            _ => {}
        }
        if batch {
            return forced;
        }

        let mut line = String::new();
        loop {
            let _ = write!(
                output,
                "{} archive(s) among {} file(s) inside. unpack them too? \
                 [a]lways/[o]nce/[n]ot now/ne[v]er/[l]ist: ",
                included.len(),
                file_count
            );
            let _ = output.flush();

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => return false,
                Ok(_) => {}
            }
            match RecursionPolicy::from_choice(&line.trim().to_ascii_lowercase()) {
                Some(RecursionPolicy::Always) => {
                    self.recursion = RecursionPolicy::Always;
                    return true;
                }
                Some(RecursionPolicy::Once) => return true,
                Some(RecursionPolicy::NotNow) => return false,
                Some(RecursionPolicy::Never) => {
                    self.recursion = RecursionPolicy::Never;
                    return false;
                }
                Some(RecursionPolicy::List) => {
                    for path in included {
                        let _ = writeln!(output, "  {}", path.display());
                    }
                }
                None => {}
            }
        }
    }

    /// Settle the one-entry question for `entry`: true extracts into
    /// the destination, false wraps. Batch mode never asks.
    pub fn one_entry_here(
        &mut self,
        entry: &str,
        batch: bool,
        prompt: &mut dyn OneEntryPrompt,
    ) -> bool {
        match self.one_entry {
            OneEntryPolicy::Here => true,
            OneEntryPolicy::Wrap => false,
            OneEntryPolicy::Ask => {
                if batch {
                    return true;
                }
                match prompt.choose(entry) {
                    OneEntryChoice::Here => true,
                    OneEntryChoice::Wrap => false,
                    OneEntryChoice::AlwaysHere => {
                        self.one_entry = OneEntryPolicy::Here;
                        true
                    }
                    OneEntryChoice::AlwaysWrap => {
                        self.one_entry = OneEntryPolicy::Wrap;
                        false
                    }
                }
            }
        }
    }
}
