//! Real archive fixtures built in-process
//!
//! shuck never decodes archive bytes itself, so its tests need genuine
//! archives on disk. These builders write them with the tar, flate2 and
//! zip crates instead of shelling out to the very tools under test.

use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{Builder, Header};

fn append_entries<W: Write>(builder: &mut Builder<W>, entries: &[(&str, &[u8])]) -> Result<()> {
    for (entry, content) in entries {
        let mut header = Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, entry, *content)?;
    }
    Ok(())
}

/// Writes a tar archive under `dir` holding the given `(path, content)` entries
pub fn tar_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut builder = Builder::new(File::create(&path)?);
    append_entries(&mut builder, entries)?;
    builder.finish()?;
    Ok(path)
}

/// Writes a gzip-compressed tar archive under `dir`
pub fn tar_gz_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> Result<PathBuf> {
    let path = dir.join(name);
    let encoder = GzEncoder::new(File::create(&path)?, Compression::default());
    let mut builder = Builder::new(encoder);
    append_entries(&mut builder, entries)?;
    builder.into_inner()?.finish()?;
    Ok(path)
}

/// Writes a zip archive under `dir` holding the given `(path, content)` entries
pub fn zip_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut writer = zip::ZipWriter::new(File::create(&path)?);
    for (entry, content) in entries {
        writer.start_file(*entry, zip::write::SimpleFileOptions::default())?;
        writer.write_all(content)?;
    }
    writer.finish()?;
    Ok(path)
}

/// Writes a gzip-compressed single file, no archive container around it
pub fn gzip_file(dir: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut encoder = GzEncoder::new(File::create(&path)?, Compression::default());
    encoder.write_all(content)?;
    encoder.finish()?;
    Ok(path)
}

/// Tar archive named `<stem>.tar` whose sole top-level entry is a
/// directory also named `stem`
pub fn matching_dir_tar(dir: &Path, stem: &str) -> Result<PathBuf> {
    let alpha = format!("{stem}/alpha.txt");
    let beta = format!("{stem}/sub/beta.txt");
    tar_archive(
        dir,
        &format!("{stem}.tar"),
        &[
            (alpha.as_str(), b"alpha\n" as &[u8]),
            (beta.as_str(), b"beta\n" as &[u8]),
        ],
    )
}

/// Tar archive carrying another tar archive inside it
pub fn nested_tar(dir: &Path, name: &str, inner_name: &str) -> Result<PathBuf> {
    let mut inner = Vec::new();
    {
        let mut builder = Builder::new(&mut inner);
        append_entries(&mut builder, &[("nested.txt", b"nested payload\n" as &[u8])])?;
        builder.finish()?;
    }
    tar_archive(dir, name, &[(inner_name, inner.as_slice())])
}
