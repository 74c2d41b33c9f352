//! Post-extraction content classification
//!
//! A pure function of the scratch directory's top level and the
//! archive's base name. The outcome decides which organization
//! strategy runs, and the recursive walk below it counts files and
//! spots archives worth a second round of extraction.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::format;
use crate::Result;

/// The shape extraction left behind at the top level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Nothing was produced
    Empty,
    /// A single entry carrying the archive's own base name
    MatchingDir,
    /// A single entry under some other name
    OneEntry,
    /// Two or more entries loose at the top level
    Bomb,
}

/// Everything the organizer and the recursion decision need to know
/// about what extraction produced
#[derive(Debug)]
pub struct Classification {
    pub kind: ContentKind,
    /// Names directly inside the scratch directory, sorted
    pub entries: Vec<String>,
    /// The single entry name for [`ContentKind::OneEntry`], with a
    /// trailing slash when that entry is a directory
    pub sole_entry: Option<String>,
    /// Regular files anywhere under the content root
    pub file_count: usize,
    /// Archive files found under the content root, relative to it
    pub included: Vec<PathBuf>,
    /// Name of the sole top-level directory, when there is one; the
    /// content root is that directory, otherwise the scratch dir itself
    pub root_entry: Option<String>,
}

/// Classify the scratch directory against the expected base name and
/// walk the content root for the file count and included archives.
pub(crate) fn classify(scratch: &Path, base: &str) -> Result<Classification> {
    let mut top: Vec<(String, bool)> = Vec::new();
    for entry in std::fs::read_dir(scratch)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type()?.is_dir();
        top.push((name, is_dir));
    }
    top.sort();

    let (kind, sole_entry, root_entry) = match top.as_slice() {
        [] => (ContentKind::Empty, None, None),
        [(name, is_dir)] => {
            let root = is_dir.then(|| name.clone());
            if name == base {
                (ContentKind::MatchingDir, None, root)
            } else {
                let slash = if *is_dir { "/" } else { "" };
                (ContentKind::OneEntry, Some(format!("{name}{slash}")), root)
            }
        }
        _ => (ContentKind::Bomb, None, None),
    };

    let root = match &root_entry {
        Some(name) => scratch.join(name),
        None => scratch.to_path_buf(),
    };
    let mut file_count = 0;
    let mut included = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        file_count += 1;
        let name = entry.file_name().to_string_lossy();
        if format::is_archive_name(&name) {
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            included.push(rel.to_path_buf());
        }
    }

    Ok(Classification {
        kind,
        entries: top.into_iter().map(|(name, _)| name).collect(),
        sole_entry,
        file_count,
        included,
        root_entry,
    })
}
