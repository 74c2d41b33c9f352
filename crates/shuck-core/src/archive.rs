//! A resolved archive and the command chains that unpack it
//!
//! [`Archive`] pairs the open source file with its detected kind and
//! encoding and knows which external commands extract or list it. The
//! streaming families (tar, single files) read the archive on stdin
//! behind an optional decompression filter; zip and rar tools insist on
//! a path argument, which must be absolute because extraction runs
//! inside a scratch directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::format::{self, ArchiveKind, Encoding};
use crate::pipeline::Stage;
use crate::Result;

/// An archive file whose format has been resolved
pub struct Archive {
    /// The path as the caller named it
    pub path: PathBuf,
    abs: PathBuf,
    /// File name with the recognized archive suffix stripped
    pub base: String,
    pub kind: ArchiveKind,
    pub encoding: Option<Encoding>,
    file: File,
}

impl Archive {
    pub(crate) fn new(
        path: &Path,
        name: &str,
        kind: ArchiveKind,
        encoding: Option<Encoding>,
        file: File,
    ) -> Result<Self> {
        let abs = path.canonicalize()?;
        Ok(Self {
            path: path.to_path_buf(),
            abs,
            base: format::base_name(name),
            kind,
            encoding,
            file,
        })
    }

    /// Take the open source file back out; the read position is
    /// unspecified after detection, so rewind before piping it.
    pub(crate) fn into_file(self) -> File {
        self.file
    }

    fn abs_arg(&self) -> String {
        self.abs.to_string_lossy().into_owned()
    }

    /// The stdin-to-stdout decoder for this archive's encoding. A
    /// single file without one degrades to a plain byte copy.
    fn filter_stage(&self) -> Option<Stage> {
        let (program, args) = self.encoding?.filter();
        let mut stage = Stage::new(program);
        for arg in args {
            stage = stage.arg(*arg);
        }
        Some(stage)
    }

    /// The pipeline that unpacks this archive into the current
    /// directory, reading the source from stdin where the tool allows.
    pub(crate) fn extract_stages(&self) -> Vec<Stage> {
        match self.kind {
            ArchiveKind::Tar => {
                let tar = Stage::new("tar").arg("-x").arg("-f").arg("-");
                match self.filter_stage() {
                    Some(filter) => vec![filter, tar],
                    None => vec![tar],
                }
            }
            ArchiveKind::Zip => {
                vec![Stage::new("unzip").arg("-q").arg("-o").arg(self.abs_arg())]
            }
            ArchiveKind::Rar => vec![Stage::new("unrar")
                .arg("x")
                .arg("-p-")
                .arg("-idq")
                .arg(self.abs_arg())],
            ArchiveKind::Single => {
                vec![self.filter_stage().unwrap_or_else(|| Stage::new("cat"))]
            }
        }
    }

    /// The pipeline that prints one member name per line, or `None`
    /// for a single compressed file, which has exactly one implied
    /// member.
    pub(crate) fn list_stages(&self) -> Option<Vec<Stage>> {
        match self.kind {
            ArchiveKind::Tar => {
                let tar = Stage::new("tar").arg("-t").arg("-f").arg("-");
                Some(match self.filter_stage() {
                    Some(filter) => vec![filter, tar],
                    None => vec![tar],
                })
            }
            ArchiveKind::Zip => Some(vec![Stage::new("zipinfo").arg("-1").arg(self.abs_arg())]),
            ArchiveKind::Rar => Some(vec![Stage::new("unrar")
                .arg("vb")
                .arg("-p-")
                .arg(self.abs_arg())]),
            ArchiveKind::Single => None,
        }
    }
}
