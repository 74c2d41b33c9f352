//! The extraction engine
//!
//! Extraction happens inside a fresh scratch directory created in the
//! current directory: the engine changes into it, runs the archive's
//! pipeline, and classifies whatever appeared. The original working
//! directory is restored on every path out, and a failed extraction
//! takes its scratch directory with it.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::archive::Archive;
use crate::classify::{self, Classification, ContentKind};
use crate::format::ArchiveKind;
use crate::pipeline::{self, Input, PipeRun, Sink, Stage};
use crate::{Error, Result};

/// Scratch directories are dotted so a half-done run is recognizable
const TMP_PREFIX: &str = ".shuck-";

/// Change into a directory and fall back to the previous one on drop.
pub(crate) struct WorkDir {
    original: PathBuf,
}

impl WorkDir {
    pub(crate) fn enter(target: &Path) -> Result<Self> {
        let original = std::env::current_dir()?;
        std::env::set_current_dir(target)?;
        Ok(Self { original })
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(err) = std::env::set_current_dir(&self.original) {
            warn!(
                "could not return to {}: {}",
                self.original.display(),
                err
            );
        }
    }
}

/// A finished, classified extraction still sitting in its scratch
/// directory, waiting for an organization strategy to claim it
pub struct Extraction {
    pub(crate) scratch: TempDir,
    pub content: Classification,
    pub base: String,
}

/// Extract `archive` into a scratch directory under the current
/// directory and classify the result. The source file is read once,
/// front to back.
pub fn extract(archive: Archive) -> Result<Extraction> {
    let cwd = std::env::current_dir()?;
    let scratch = tempfile::Builder::new()
        .prefix(TMP_PREFIX)
        .tempdir_in(&cwd)?;

    let stages = archive.extract_stages();
    let single = archive.kind == ArchiveKind::Single;
    let base = archive.base.clone();
    let sink = if single {
        Sink::File(File::create(scratch.path().join(&base))?)
    } else {
        Sink::Discard
    };
    let mut file = archive.into_file();
    file.seek(SeekFrom::Start(0))?;

    debug!("extracting into {}", scratch.path().display());
    let run = {
        let _workdir = WorkDir::enter(scratch.path())?;
        pipeline::run(&stages, Input::File(file), sink)?
    };

    // a single-file decode that produced nothing is treated the same
    // as an archive with no members
    if single {
        let decoded = scratch.path().join(&base);
        if matches!(decoded.metadata(), Ok(meta) if meta.len() == 0) {
            std::fs::remove_file(&decoded)?;
        }
    }

    let content = classify::classify(scratch.path(), &base)?;
    verify(&stages, &run, &content)?;
    Ok(Extraction {
        scratch,
        content,
        base,
    })
}

/// List the archive's member names without touching the filesystem. A
/// single compressed file has one implied member, its own decoded name.
pub fn list(archive: Archive) -> Result<Vec<String>> {
    let Some(stages) = archive.list_stages() else {
        return Ok(vec![archive.base]);
    };
    let mut file = archive.into_file();
    file.seek(SeekFrom::Start(0))?;
    let run = pipeline::run(&stages, Input::File(file), Sink::Capture)?;
    for (stage, status) in stages.iter().zip(&run.statuses) {
        if !status.success() {
            return Err(Error::CommandFailed {
                command: stage.to_string(),
                status: status.to_string(),
            });
        }
    }
    let text = String::from_utf8_lossy(&run.captured);
    Ok(text
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Exit-status policy: anything above 1 or a signal death is fatal
/// outright, and exactly 1 is fatal only when nothing was produced.
fn verify(stages: &[Stage], run: &PipeRun, content: &Classification) -> Result<()> {
    for (stage, status) in stages.iter().zip(&run.statuses) {
        let exited_one = status.code() == Some(1);
        if exited_one && content.kind == ContentKind::Empty {
            return Err(Error::ExtractionEmpty {
                command: stage.to_string(),
                status: status.to_string(),
            });
        }
        if fatal(status) {
            return Err(Error::CommandFailed {
                command: stage.to_string(),
                status: status.to_string(),
            });
        }
    }
    Ok(())
}

fn fatal(status: &ExitStatus) -> bool {
    match status.code() {
        Some(0) | Some(1) => false,
        Some(_) => true,
        // killed by a signal
        None => true,
    }
}
