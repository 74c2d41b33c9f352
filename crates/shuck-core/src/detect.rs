//! Filename and content based format detection
//!
//! Three strategies run in strict order and the first hit wins: a mime
//! mapping (suffix to mime type to tool family, with the encoding
//! peeled off the name separately), the suffix table in
//! [`crate::format`], and last a magic-byte sniff over the leading 512
//! bytes. A sniff that only recognizes a compression encoding resolves
//! to a single compressed file.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::bytes::Regex;
use tracing::debug;

use crate::archive::Archive;
use crate::format::{self, ArchiveKind, Encoding};
use crate::{Error, Result};

const SNIFF_LEN: usize = 512;

/// Suffixes the mime strategy peels off as a transfer encoding before
/// guessing the type of what remains
const MIME_ENCODINGS: &[(&str, Encoding)] = &[
    ("gz", Encoding::Gzip),
    ("bz2", Encoding::Bzip2),
    ("xz", Encoding::Xz),
    ("z", Encoding::Compress),
    ("br", Encoding::Brotli),
];

/// Name suffix to canonical mime type
const MIME_GLOBS: &[(&str, &str)] = &[
    ("tar", "application/x-tar"),
    ("zip", "application/zip"),
    ("jar", "application/java-archive"),
    ("epub", "application/epub+zip"),
    ("rar", "application/vnd.rar"),
];

/// Canonical mime type to the tool family that unpacks it
const MIME_TYPES: &[(&str, ArchiveKind)] = &[
    ("application/x-tar", ArchiveKind::Tar),
    ("application/zip", ArchiveKind::Zip),
    ("application/java-archive", ArchiveKind::Zip),
    ("application/epub+zip", ArchiveKind::Zip),
    ("application/vnd.rar", ArchiveKind::Rar),
];

/// Split `name` into everything before its final dot and the suffix
/// after it. A leading or trailing dot does not count as a suffix.
fn split_last_suffix(name: &str) -> Option<(&str, &str)> {
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    Some((&name[..dot], &name[dot + 1..]))
}

/// Mime-database style guess. `x.tar.gz` peels the `gz` encoding, maps
/// `tar` to `application/x-tar`, and maps that to the tar family; a
/// bare `x.gz` leaves no inner suffix and misses, so the suffix table
/// gets its turn.
fn mime_guess(name: &str) -> Option<(ArchiveKind, Option<Encoding>)> {
    let lower = name.to_ascii_lowercase();
    let (stem, encoding) = match split_last_suffix(&lower) {
        Some((stem, suffix)) => {
            match MIME_ENCODINGS.iter().find(|(probe, _)| *probe == suffix) {
                Some((_, encoding)) => (stem, Some(*encoding)),
                None => (lower.as_str(), None),
            }
        }
        None => return None,
    };
    let (_, suffix) = split_last_suffix(stem)?;
    let (_, mime) = MIME_GLOBS.iter().find(|(probe, _)| *probe == suffix)?;
    let (_, kind) = MIME_TYPES.iter().find(|(probe, _)| probe == mime)?;
    Some((*kind, encoding))
}

fn kind_signatures() -> &'static [(Regex, ArchiveKind)] {
    static SIGNATURES: OnceLock<Vec<(Regex, ArchiveKind)>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        [
            // zip local file header, plus the end record an empty zip
            // consists of
            (r"(?-u)^PK\x03\x04", ArchiveKind::Zip),
            (r"(?-u)^PK\x05\x06", ArchiveKind::Zip),
            // covers both rar4 and rar5 headers
            (r"(?-u)^Rar!\x1a\x07", ArchiveKind::Rar),
            // posix tar magic sits at offset 257
            (r"(?s-u)^.{257}ustar", ArchiveKind::Tar),
        ]
        .into_iter()
        .map(|(pattern, kind)| (Regex::new(pattern).unwrap(), kind))
        .collect()
    })
}

fn encoding_signatures() -> &'static [(Regex, Encoding)] {
    static SIGNATURES: OnceLock<Vec<(Regex, Encoding)>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        [
            (r"(?-u)^\x1f\x8b", Encoding::Gzip),
            (r"(?-u)^BZh[1-9]", Encoding::Bzip2),
            (r"(?-u)^\xfd7zXZ\x00", Encoding::Xz),
            (r"(?-u)^\x28\xb5\x2f\xfd", Encoding::Zstd),
            (r"(?-u)^LZIP", Encoding::Lzip),
            (r"(?-u)^\x1f\x9d", Encoding::Compress),
            (r"(?-u)^LRZI", Encoding::Lrzip),
            // raw lzma carries no real magic; the usual properties byte
            // with a round dictionary size is the best available tell,
            // so it stays last
            (r"(?-u)^\x5d\x00\x00", Encoding::Lzma),
        ]
        .into_iter()
        .map(|(pattern, encoding)| (Regex::new(pattern).unwrap(), encoding))
        .collect()
    })
}

/// Read the head of the file and match it against the base-kind
/// signatures and, independently, the encoding signatures. The read
/// position is left wherever the read stopped; callers rewind.
fn sniff(file: &mut File) -> Result<(Option<ArchiveKind>, Option<Encoding>)> {
    let mut buf = [0u8; SNIFF_LEN];
    let mut filled = 0;
    loop {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 || filled + n == SNIFF_LEN {
            filled += n;
            break;
        }
        filled += n;
    }
    let head = &buf[..filled];
    let kind = kind_signatures()
        .iter()
        .find(|(signature, _)| signature.is_match(head))
        .map(|(_, kind)| *kind);
    let encoding = encoding_signatures()
        .iter()
        .find(|(signature, _)| signature.is_match(head))
        .map(|(_, encoding)| *encoding);
    Ok((kind, encoding))
}

/// Resolve `path` to a concrete [`Archive`], or fail with
/// [`Error::UnknownFormat`] when no strategy recognizes it.
pub fn resolve(path: &Path) -> Result<Archive> {
    let mut file = File::open(path)?;
    if !file.metadata()?.is_file() {
        return Err(Error::InvalidPath(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return Err(Error::InvalidPath(format!(
            "{} has no usable file name",
            path.display()
        )));
    };

    let mut strategy = "mime";
    let mut resolved = mime_guess(name);
    if resolved.is_none() {
        strategy = "suffix";
        resolved = format::lookup_extension(name);
    }
    if resolved.is_none() {
        strategy = "magic";
        resolved = match sniff(&mut file)? {
            (Some(kind), encoding) => Some((kind, encoding)),
            (None, Some(encoding)) => Some((ArchiveKind::Single, Some(encoding))),
            (None, None) => None,
        };
    }

    let Some((kind, encoding)) = resolved else {
        return Err(Error::UnknownFormat(path.to_path_buf()));
    };
    debug!(
        "resolved {} as {} (encoding {:?}) via {}",
        path.display(),
        kind,
        encoding,
        strategy
    );
    Archive::new(path, name, kind, encoding, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_guess_handles_peeled_encodings() {
        assert_eq!(
            mime_guess("backup.tar.gz"),
            Some((ArchiveKind::Tar, Some(Encoding::Gzip)))
        );
        assert_eq!(
            mime_guess("Backup.TAR.XZ"),
            Some((ArchiveKind::Tar, Some(Encoding::Xz)))
        );
        assert_eq!(mime_guess("site.zip"), Some((ArchiveKind::Zip, None)));
        assert_eq!(mime_guess("plugin.jar"), Some((ArchiveKind::Zip, None)));
    }

    #[test]
    fn test_mime_guess_leaves_bare_encodings_to_the_suffix_table() {
        assert_eq!(mime_guess("notes.gz"), None);
        assert_eq!(mime_guess("plain"), None);
        assert_eq!(mime_guess(".gz"), None);
    }

    #[test]
    fn test_name_wins_over_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.tbz2");
        std::fs::write(&path, b"this is not bzip2 at all").unwrap();
        let archive = resolve(&path).unwrap();
        assert_eq!(archive.kind, ArchiveKind::Tar);
        assert_eq!(archive.encoding, Some(Encoding::Bzip2));
    }

    #[test]
    fn test_sniffed_gzip_blob_resolves_as_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery");
        std::fs::write(&path, [0x1f, 0x8b, 0x08, 0x00, 0x00]).unwrap();
        let archive = resolve(&path).unwrap();
        assert_eq!(archive.kind, ArchiveKind::Single);
        assert_eq!(archive.encoding, Some(Encoding::Gzip));
    }

    #[test]
    fn test_sniffed_ustar_magic_resolves_as_tar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headerless");
        let mut content = vec![0u8; 257];
        content.extend_from_slice(b"ustar\x0000");
        content.resize(512, 0);
        std::fs::write(&path, &content).unwrap();
        let archive = resolve(&path).unwrap();
        assert_eq!(archive.kind, ArchiveKind::Tar);
        assert_eq!(archive.encoding, None);
    }

    #[test]
    fn test_unrecognized_file_is_an_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        std::fs::write(&path, "just some text\n").unwrap();
        assert!(matches!(
            resolve(&path),
            Err(Error::UnknownFormat(reported)) if reported == path
        ));
    }

    #[test]
    fn test_directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve(dir.path()),
            Err(Error::InvalidPath(_))
        ));
    }
}
