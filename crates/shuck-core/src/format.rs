//! Archive format vocabulary
//!
//! Every format shuck understands is described here: the base kind
//! deciding which tool family unpacks it, the stream encoding wrapped
//! around it, and the suffix tables that tie file names to both. The
//! detection strategies in [`crate::detect`] and the name handling in
//! the classifier all read from these tables, so adding a format is a
//! matter of adding rows.

/// Base archive kind, deciding which external tool family handles a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Member-bearing tape archive, streamed through `tar`
    Tar,
    /// Zip family (including jar/xpi/epub containers), via `unzip`
    Zip,
    /// Rar archive, via `unrar`
    Rar,
    /// A single compressed file with no archive structure inside
    Single,
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveKind::Tar => write!(f, "tar"),
            ArchiveKind::Zip => write!(f, "zip"),
            ArchiveKind::Rar => write!(f, "rar"),
            ArchiveKind::Single => write!(f, "compressed"),
        }
    }
}

/// Stream compression applied around the base format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Bzip2,
    Gzip,
    /// Old `compress(1)` LZW data
    Compress,
    Lzma,
    Xz,
    Lzip,
    Zstd,
    Brotli,
    Lrzip,
}

impl Encoding {
    /// The command that decodes this encoding from stdin to stdout
    pub fn filter(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Encoding::Bzip2 => ("bzcat", &[]),
            // zcat handles both gzip and compress'd data
            Encoding::Gzip | Encoding::Compress => ("zcat", &[]),
            Encoding::Lzma => ("lzcat", &[]),
            Encoding::Xz => ("xzcat", &[]),
            Encoding::Lzip => ("lzip", &["-cd"]),
            Encoding::Zstd => ("zstd", &["-d"]),
            Encoding::Brotli => ("br", &["--decompress"]),
            Encoding::Lrzip => ("lrzcat", &[]),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Bzip2 => write!(f, "bzip2"),
            Encoding::Gzip => write!(f, "gzip"),
            Encoding::Compress => write!(f, "compress"),
            Encoding::Lzma => write!(f, "lzma"),
            Encoding::Xz => write!(f, "xz"),
            Encoding::Lzip => write!(f, "lzip"),
            Encoding::Zstd => write!(f, "zstd"),
            Encoding::Brotli => write!(f, "brotli"),
            Encoding::Lrzip => write!(f, "lrzip"),
        }
    }
}

/// Known suffixes mapped to kind and encoding. Keys are matched against
/// the last one or two dot-separated components of the lowercased file
/// name, longest first, so `x.tar.gz` never reads as plain gzip.
const EXTENSIONS: &[(&str, ArchiveKind, Option<Encoding>)] = &[
    ("tar", ArchiveKind::Tar, None),
    ("tar.gz", ArchiveKind::Tar, Some(Encoding::Gzip)),
    ("tgz", ArchiveKind::Tar, Some(Encoding::Gzip)),
    ("tar.bz2", ArchiveKind::Tar, Some(Encoding::Bzip2)),
    ("tbz", ArchiveKind::Tar, Some(Encoding::Bzip2)),
    ("tbz2", ArchiveKind::Tar, Some(Encoding::Bzip2)),
    ("tb2", ArchiveKind::Tar, Some(Encoding::Bzip2)),
    ("tar.xz", ArchiveKind::Tar, Some(Encoding::Xz)),
    ("txz", ArchiveKind::Tar, Some(Encoding::Xz)),
    ("tar.lzma", ArchiveKind::Tar, Some(Encoding::Lzma)),
    ("tlz", ArchiveKind::Tar, Some(Encoding::Lzma)),
    ("tar.lz", ArchiveKind::Tar, Some(Encoding::Lzip)),
    ("tar.z", ArchiveKind::Tar, Some(Encoding::Compress)),
    ("taz", ArchiveKind::Tar, Some(Encoding::Compress)),
    ("tar.zst", ArchiveKind::Tar, Some(Encoding::Zstd)),
    ("tzst", ArchiveKind::Tar, Some(Encoding::Zstd)),
    ("tar.br", ArchiveKind::Tar, Some(Encoding::Brotli)),
    ("tar.lrz", ArchiveKind::Tar, Some(Encoding::Lrzip)),
    ("zip", ArchiveKind::Zip, None),
    ("jar", ArchiveKind::Zip, None),
    ("xpi", ArchiveKind::Zip, None),
    ("epub", ArchiveKind::Zip, None),
    ("crx", ArchiveKind::Zip, None),
    ("rar", ArchiveKind::Rar, None),
    ("gz", ArchiveKind::Single, Some(Encoding::Gzip)),
    ("bz2", ArchiveKind::Single, Some(Encoding::Bzip2)),
    ("xz", ArchiveKind::Single, Some(Encoding::Xz)),
    ("lzma", ArchiveKind::Single, Some(Encoding::Lzma)),
    ("lz", ArchiveKind::Single, Some(Encoding::Lzip)),
    ("z", ArchiveKind::Single, Some(Encoding::Compress)),
    ("zst", ArchiveKind::Single, Some(Encoding::Zstd)),
    ("zstd", ArchiveKind::Single, Some(Encoding::Zstd)),
    ("br", ArchiveKind::Single, Some(Encoding::Brotli)),
    ("lrz", ArchiveKind::Single, Some(Encoding::Lrzip)),
];

/// The full suffix table, for the `--supported` listing
pub fn extension_table() -> &'static [(&'static str, ArchiveKind, Option<Encoding>)] {
    EXTENSIONS
}

/// The one- and two-component suffixes of a file name, lowercased,
/// longest first. A suffix only counts when something precedes it, so a
/// file literally named `tar.gz` probes as `gz` alone.
pub(crate) fn suffix_probes(name: &str) -> Vec<String> {
    let lower = name.to_ascii_lowercase();
    let parts: Vec<&str> = lower.split('.').collect();
    let mut probes = Vec::new();
    if parts.len() > 2 {
        probes.push(parts[parts.len() - 2..].join("."));
    }
    if parts.len() > 1 {
        probes.push(parts[parts.len() - 1].to_string());
    }
    probes
}

/// Look up kind and encoding for a file name by its suffix
pub fn lookup_extension(name: &str) -> Option<(ArchiveKind, Option<Encoding>)> {
    for probe in suffix_probes(name) {
        if let Some(&(_, kind, encoding)) = EXTENSIONS.iter().find(|(ext, _, _)| *ext == probe) {
            return Some((kind, encoding));
        }
    }
    None
}

/// Strip the recognized suffix from a file name: `proj.tar.gz` becomes
/// `proj`, `notes.txt.gz` becomes `notes.txt`. Unrecognized names come
/// back unchanged, as does a name that is nothing but suffix.
pub fn base_name(name: &str) -> String {
    for probe in suffix_probes(name) {
        if EXTENSIONS.iter().any(|(ext, _, _)| *ext == probe) {
            let keep = name.len() - probe.len() - 1;
            if keep > 0 {
                return name[..keep].to_string();
            }
        }
    }
    name.to_string()
}

/// Whether a file name looks like an archive we could unpack
pub fn is_archive_name(name: &str) -> bool {
    lookup_extension(name).is_some()
}
