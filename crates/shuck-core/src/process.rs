//! Driving archives through the full cycle
//!
//! [`Processor`] owns the per-run policy state and walks each archive
//! through resolution, extraction, organization and, when allowed, the
//! same cycle again for whatever archives turned up inside. One
//! archive's failure is recorded and its siblings keep going.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::classify::ContentKind;
use crate::extract::{self, WorkDir};
use crate::options::Options;
use crate::organize;
use crate::policy::{OneEntryPrompt, Session};
use crate::{detect, Error, Result};

/// Processes a batch of archives under one set of options and one
/// policy session
pub struct Processor<'a> {
    options: Options,
    session: Session,
    prompt: Box<dyn OneEntryPrompt + 'a>,
    input: Box<dyn BufRead + 'a>,
    output: Box<dyn Write + 'a>,
    failures: Vec<(PathBuf, Error)>,
}

impl<'a> Processor<'a> {
    /// `prompt`, `input` and `output` are only consulted outside batch
    /// mode; the frontend wires the terminal in, tests wire buffers.
    pub fn new(
        options: Options,
        prompt: Box<dyn OneEntryPrompt + 'a>,
        input: Box<dyn BufRead + 'a>,
        output: Box<dyn Write + 'a>,
    ) -> Self {
        let session = Session::new(options.one_entry);
        Self {
            options,
            session,
            prompt,
            input,
            output,
            failures: Vec::new(),
        }
    }

    /// Archives that could not be processed so far
    pub fn failures(&self) -> &[(PathBuf, Error)] {
        &self.failures
    }

    /// Process every path, recording failures instead of stopping.
    pub fn process(&mut self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(err) = self.process_one(path, 0) {
                error!("{}: {}", path.display(), err);
                self.failures.push((path.clone(), err));
            }
        }
    }

    /// Fold the failure list into the run's overall outcome. A lone
    /// failure surfaces as itself, several collapse into a count.
    pub fn finish(mut self) -> Result<()> {
        match self.failures.len() {
            0 => Ok(()),
            1 => Err(self.failures.remove(0).1),
            n => Err(Error::PartialFailure { count: n as u32 }),
        }
    }

    fn process_one(&mut self, path: &Path, depth: u32) -> Result<()> {
        let archive = detect::resolve(path)?;
        info!("unpacking {} ({})", path.display(), archive.kind);
        let extraction = extract::extract(archive)?;
        let file_count = extraction.content.file_count;

        // settle the one-entry question before picking a strategy
        let extract_here = match (extraction.content.kind, &extraction.content.sole_entry) {
            (ContentKind::OneEntry, Some(sole)) => {
                let sole = sole.clone();
                self.session
                    .one_entry_here(&sole, self.options.batch, self.prompt.as_mut())
            }
            _ => false,
        };

        let strategy = organize::select(
            extraction.content.kind,
            self.options.flat,
            self.options.overwrite,
            extract_here,
        );
        let dest = std::env::current_dir()?;
        let organized = organize::apply(strategy, extraction, &dest)?;

        if let Some(target) = &organized.target {
            info!("unpacked {} into {}", path.display(), target.display());
        } else if file_count == 0 {
            info!("{} was empty", path.display());
        } else {
            info!("unpacked {} file(s) from {}", file_count, path.display());
        }

        if !organized.included.is_empty() {
            self.maybe_recurse(&organized.included, file_count, depth);
        }

        if self.options.delete_source {
            std::fs::remove_file(path)?;
            info!("removed {}", path.display());
        }
        Ok(())
    }

    /// Consult the session about the included archives and run each
    /// through the cycle again. A nested failure is that archive's
    /// own, not the parent's.
    fn maybe_recurse(&mut self, included: &[PathBuf], file_count: usize, depth: u32) {
        if depth >= self.options.max_depth {
            warn!(
                "{} nested archive(s) left alone, depth limit {} reached",
                included.len(),
                self.options.max_depth
            );
            return;
        }
        let recurse = self.session.decide_recursion(
            self.options.recursive,
            self.options.batch,
            included,
            file_count,
            &mut self.input,
            &mut self.output,
        );
        if !recurse {
            return;
        }
        for path in included {
            if let Err(err) = self.process_nested(path, depth + 1) {
                error!("{}: {}", path.display(), err);
                self.failures.push((path.clone(), err));
            }
        }
    }

    /// A nested archive unpacks beside itself, so step into its parent
    /// directory for the duration.
    fn process_nested(&mut self, path: &Path, depth: u32) -> Result<()> {
        let Some(parent) = path.parent() else {
            return Err(Error::InvalidPath(format!(
                "{} has no parent directory",
                path.display()
            )));
        };
        let Some(name) = path.file_name() else {
            return Err(Error::InvalidPath(format!(
                "{} has no file name",
                path.display()
            )));
        };
        let _workdir = WorkDir::enter(parent)?;
        self.process_one(Path::new(name), depth)
    }
}
