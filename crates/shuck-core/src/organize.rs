//! Moving extracted content out of the scratch directory
//!
//! Five strategies cover every classification: delete an empty
//! extraction, flatten files into the destination, overwrite an
//! existing copy, promote a single entry to its proper name, or wrap a
//! bomb in a directory named after the archive. Whichever runs, the
//! scratch directory does not survive it. Names already taken in the
//! destination are negotiated, never overwritten, and every rename
//! away from the expected name is reported.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::classify::ContentKind;
use crate::extract::Extraction;
use crate::format;
use crate::{Error, Result};

/// Numbered suffixes tried before falling back to a generated name
const MAX_NUMBERED: u32 = 9;

/// The five ways extracted content reaches its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Empty,
    Flat,
    Overwrite,
    Match,
    Bomb,
}

/// Where organization put things
#[derive(Debug, Default)]
pub struct Organized {
    /// Final locations of the included archives, in discovery order
    pub included: Vec<PathBuf>,
    /// Final path of the relocated content, when a single one exists
    pub target: Option<PathBuf>,
}

/// Pick the strategy for a classified extraction, first match wins.
/// `extract_here` carries the already-settled one-entry decision.
pub fn select(kind: ContentKind, flat: bool, overwrite: bool, extract_here: bool) -> Strategy {
    match kind {
        ContentKind::Empty => Strategy::Empty,
        _ if flat && kind != ContentKind::OneEntry => Strategy::Flat,
        ContentKind::MatchingDir if overwrite => Strategy::Overwrite,
        ContentKind::MatchingDir => Strategy::Match,
        ContentKind::OneEntry if extract_here => Strategy::Match,
        _ => Strategy::Bomb,
    }
}

/// Run the chosen strategy, consuming the extraction. The scratch
/// directory is gone afterwards whichever branch runs.
pub fn apply(strategy: Strategy, extraction: Extraction, dest: &Path) -> Result<Organized> {
    normalize_permissions(extraction.scratch.path())?;
    debug!("organizing with {:?} into {}", strategy, dest.display());
    match strategy {
        Strategy::Empty => empty(extraction),
        Strategy::Flat => flat(extraction, dest),
        Strategy::Overwrite => overwrite(extraction, dest),
        Strategy::Match => promote(extraction, dest),
        Strategy::Bomb => wrap(extraction, dest),
    }
}

/// Owner gets the run of things, everyone else reads: 0o755 on
/// directories, 0o644 on files. Symlinks are left alone.
#[cfg(unix)]
fn normalize_permissions(root: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    for entry in WalkDir::new(root) {
        let entry = entry?;
        let mode = if entry.file_type().is_dir() {
            0o755
        } else if entry.file_type().is_file() {
            0o644
        } else {
            continue;
        };
        std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn normalize_permissions(_root: &Path) -> Result<()> {
    Ok(())
}

enum Claim {
    /// Nothing sits at this path yet
    Free(PathBuf),
    /// A freshly created uniquely-named directory to move into
    Generated(PathBuf),
}

/// Any entry at the path counts as occupied, dangling symlinks included.
fn taken(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Find a free spot for `candidate` under `dest`: the plain name, the
/// numbered variants, then a generated prefix directory.
fn claim(dest: &Path, candidate: &str) -> Result<Claim> {
    let plain = dest.join(candidate);
    if !taken(&plain) {
        return Ok(Claim::Free(plain));
    }
    for n in 1..=MAX_NUMBERED {
        let numbered = dest.join(format!("{candidate}.{n}"));
        if !taken(&numbered) {
            return Ok(Claim::Free(numbered));
        }
    }
    let keeper = tempfile::Builder::new()
        .prefix(&format!("{candidate}."))
        .tempdir_in(dest)?;
    let path = keeper.path().to_path_buf();
    // this directory is the permanent home now, not scratch space
    std::mem::forget(keeper);
    Ok(Claim::Generated(path))
}

/// Move `source` to a negotiated spot named after `candidate` under
/// `dest` and report where it went.
fn place(source: &Path, dest: &Path, candidate: &str) -> Result<PathBuf> {
    let desired = dest.join(candidate);
    let target = match claim(dest, candidate)? {
        Claim::Free(target) => {
            std::fs::rename(source, &target)?;
            target
        }
        Claim::Generated(parent) => {
            let target = parent.join(candidate);
            std::fs::rename(source, &target)?;
            target
        }
    };
    if target != desired {
        info!(
            "{} already exists, using {}",
            desired.display(),
            target.display()
        );
    }
    Ok(target)
}

/// Map included paths, recorded relative to the content root, to their
/// homes after the root moved to `target`.
fn relocate(extraction: &Extraction, target: &Path) -> Vec<PathBuf> {
    if extraction.content.root_entry.is_some() {
        extraction
            .content
            .included
            .iter()
            .map(|rel| target.join(rel))
            .collect()
    } else if extraction.content.included.is_empty() {
        Vec::new()
    } else {
        // the content root was the scratch directory holding exactly
        // one file, and that file is the inclusion
        vec![target.to_path_buf()]
    }
}

fn empty(extraction: Extraction) -> Result<Organized> {
    extraction.scratch.close()?;
    Ok(Organized::default())
}

fn flat(extraction: Extraction, dest: &Path) -> Result<Organized> {
    let mut organized = Organized::default();
    for entry in WalkDir::new(extraction.scratch.path())
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let target = place(entry.path(), dest, &name)?;
        if format::is_archive_name(&name) {
            organized.included.push(target);
        }
    }
    extraction.scratch.close()?;
    Ok(organized)
}

fn overwrite(extraction: Extraction, dest: &Path) -> Result<Organized> {
    let target = dest.join(&extraction.base);
    if let Ok(existing) = target.symlink_metadata() {
        if existing.is_dir() {
            std::fs::remove_dir_all(&target)?;
        } else {
            std::fs::remove_file(&target)?;
        }
        info!("replaced existing {}", target.display());
    }
    std::fs::rename(extraction.scratch.path().join(&extraction.base), &target)?;
    let included = relocate(&extraction, &target);
    extraction.scratch.close()?;
    Ok(Organized {
        included,
        target: Some(target),
    })
}

/// Promote the sole top-level entry: a directory takes the archive's
/// base name, a file keeps its own.
fn promote(extraction: Extraction, dest: &Path) -> Result<Organized> {
    let Some(entry) = extraction.content.entries.first().cloned() else {
        return Err(Error::InvalidPath("nothing to promote".to_string()));
    };
    let source = extraction.scratch.path().join(&entry);
    let candidate = if source.is_dir() {
        extraction.base.clone()
    } else {
        entry
    };
    let target = place(&source, dest, &candidate)?;
    let included = relocate(&extraction, &target);
    extraction.scratch.close()?;
    Ok(Organized {
        included,
        target: Some(target),
    })
}

/// Rename the whole scratch directory to the archive's base name. The
/// consumed handle points at a path that no longer exists, which its
/// drop quietly tolerates.
fn wrap(extraction: Extraction, dest: &Path) -> Result<Organized> {
    let target = place(extraction.scratch.path(), dest, &extraction.base)?;
    // included paths are relative to the content root, which for a
    // wrapped sole directory sits one level below the target
    let root = match &extraction.content.root_entry {
        Some(sole) => target.join(sole),
        None => target.clone(),
    };
    let included = extraction
        .content
        .included
        .iter()
        .map(|rel| root.join(rel))
        .collect();
    Ok(Organized {
        included,
        target: Some(target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn extraction_with(base: &str, build: impl FnOnce(&Path)) -> Extraction {
        let scratch = tempfile::tempdir().unwrap();
        build(scratch.path());
        let content = classify(scratch.path(), base).unwrap();
        Extraction {
            scratch,
            content,
            base: base.to_string(),
        }
    }

    #[test]
    fn test_selection_precedence() {
        use ContentKind::*;
        assert_eq!(select(Empty, true, true, true), Strategy::Empty);
        assert_eq!(select(MatchingDir, true, false, false), Strategy::Flat);
        assert_eq!(select(Bomb, true, false, false), Strategy::Flat);
        assert_eq!(select(OneEntry, true, false, true), Strategy::Match);
        assert_eq!(select(MatchingDir, false, true, false), Strategy::Overwrite);
        assert_eq!(select(MatchingDir, false, false, false), Strategy::Match);
        assert_eq!(select(OneEntry, false, false, false), Strategy::Bomb);
        assert_eq!(select(Bomb, false, true, false), Strategy::Bomb);
    }

    #[test]
    fn test_matching_directory_is_promoted_in_place() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("backup/a.txt"));
        });
        let scratch_path = extraction.scratch.path().to_path_buf();
        let organized = apply(Strategy::Match, extraction, dest.path()).unwrap();
        assert!(dest.path().join("backup/a.txt").is_file());
        assert_eq!(organized.target, Some(dest.path().join("backup")));
        assert!(!scratch_path.exists());
    }

    #[test]
    fn test_one_entry_directory_takes_the_archives_name() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("payload/x.txt"));
        });
        apply(Strategy::Match, extraction, dest.path()).unwrap();
        assert!(dest.path().join("backup/x.txt").is_file());
        assert!(!dest.path().join("payload").exists());
    }

    #[test]
    fn test_one_entry_file_keeps_its_own_name() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("notes.txt"));
        });
        let organized = apply(Strategy::Match, extraction, dest.path()).unwrap();
        assert!(dest.path().join("notes.txt").is_file());
        assert_eq!(organized.target, Some(dest.path().join("notes.txt")));
    }

    #[test]
    fn test_taken_names_get_a_numbered_suffix() {
        let dest = tempfile::tempdir().unwrap();
        touch(&dest.path().join("backup/old.txt"));
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("backup/new.txt"));
        });
        let organized = apply(Strategy::Match, extraction, dest.path()).unwrap();
        assert_eq!(organized.target, Some(dest.path().join("backup.1")));
        assert!(dest.path().join("backup.1/new.txt").is_file());
        assert!(dest.path().join("backup/old.txt").is_file());
    }

    #[test]
    fn test_exhausted_suffixes_fall_back_to_a_generated_directory() {
        let dest = tempfile::tempdir().unwrap();
        touch(&dest.path().join("backup/x"));
        for n in 1..=9 {
            touch(&dest.path().join(format!("backup.{n}/x")));
        }
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("backup/new.txt"));
        });
        let organized = apply(Strategy::Match, extraction, dest.path()).unwrap();
        let target = organized.target.unwrap();
        assert!(target.join("new.txt").is_file());
        let parent_name = target
            .parent()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(parent_name.starts_with("backup."));
    }

    #[cfg(unix)]
    #[test]
    fn test_a_dangling_symlink_still_occupies_its_name() {
        let dest = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("no-such-target", dest.path().join("backup")).unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("backup/new.txt"));
        });
        let organized = apply(Strategy::Match, extraction, dest.path()).unwrap();
        assert_eq!(organized.target, Some(dest.path().join("backup.1")));
        assert!(dest.path().join("backup.1/new.txt").is_file());
        let leftover = dest.path().join("backup").symlink_metadata().unwrap();
        assert!(leftover.file_type().is_symlink());
    }

    #[test]
    fn test_bomb_content_is_wrapped_under_the_base_name() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("a.txt"));
            touch(&scratch.join("b.txt"));
        });
        let organized = apply(Strategy::Bomb, extraction, dest.path()).unwrap();
        assert_eq!(organized.target, Some(dest.path().join("backup")));
        assert!(dest.path().join("backup/a.txt").is_file());
        assert!(dest.path().join("backup/b.txt").is_file());
    }

    #[test]
    fn test_flat_moves_files_and_drops_directories() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("a/b.txt"));
            touch(&scratch.join("c.txt"));
        });
        apply(Strategy::Flat, extraction, dest.path()).unwrap();
        assert!(dest.path().join("b.txt").is_file());
        assert!(dest.path().join("c.txt").is_file());
        assert!(!dest.path().join("a").exists());
    }

    #[test]
    fn test_flat_negotiates_collisions_per_file() {
        let dest = tempfile::tempdir().unwrap();
        touch(&dest.path().join("inner.tar.gz"));
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("sub/inner.tar.gz"));
            touch(&scratch.join("other.txt"));
        });
        let organized = apply(Strategy::Flat, extraction, dest.path()).unwrap();
        assert!(dest.path().join("inner.tar.gz.1").is_file());
        assert_eq!(
            organized.included,
            [dest.path().join("inner.tar.gz.1")]
        );
    }

    #[test]
    fn test_overwrite_replaces_an_existing_copy() {
        let dest = tempfile::tempdir().unwrap();
        touch(&dest.path().join("backup/old.txt"));
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("backup/new.txt"));
        });
        let organized = apply(Strategy::Overwrite, extraction, dest.path()).unwrap();
        assert!(dest.path().join("backup/new.txt").is_file());
        assert!(!dest.path().join("backup/old.txt").exists());
        assert_eq!(organized.target, Some(dest.path().join("backup")));
    }

    #[test]
    fn test_empty_extraction_leaves_nothing_behind() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |_| {});
        let scratch_path = extraction.scratch.path().to_path_buf();
        let organized = apply(Strategy::Empty, extraction, dest.path()).unwrap();
        assert!(!scratch_path.exists());
        assert!(organized.target.is_none());
        assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_included_archives_surface_at_their_final_location() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("backup/vendor/inner.zip"));
        });
        let organized = apply(Strategy::Match, extraction, dest.path()).unwrap();
        assert_eq!(
            organized.included,
            [dest.path().join("backup/vendor/inner.zip")]
        );
    }

    #[test]
    fn test_a_promoted_archive_file_is_reported_where_it_landed() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("outer", |scratch| {
            touch(&scratch.join("inner.tar.gz"));
        });
        let organized = apply(Strategy::Match, extraction, dest.path()).unwrap();
        assert_eq!(organized.included, [dest.path().join("inner.tar.gz")]);
    }

    #[test]
    fn test_wrapped_sole_directory_reports_archives_where_they_landed() {
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("payload/inner.tar.gz"));
        });
        let organized = apply(Strategy::Bomb, extraction, dest.path()).unwrap();
        assert_eq!(organized.target, Some(dest.path().join("backup")));
        assert_eq!(
            organized.included,
            [dest.path().join("backup/payload/inner.tar.gz")]
        );
        assert!(dest.path().join("backup/payload/inner.tar.gz").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_normalized_before_moving() {
        use std::os::unix::fs::PermissionsExt;
        let dest = tempfile::tempdir().unwrap();
        let extraction = extraction_with("backup", |scratch| {
            touch(&scratch.join("backup/script.sh"));
            std::fs::set_permissions(
                &scratch.join("backup/script.sh"),
                std::fs::Permissions::from_mode(0o777),
            )
            .unwrap();
        });
        apply(Strategy::Match, extraction, dest.path()).unwrap();
        let file_mode = dest
            .path()
            .join("backup/script.sh")
            .metadata()
            .unwrap()
            .permissions()
            .mode();
        let dir_mode = dest
            .path()
            .join("backup")
            .metadata()
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o644);
        assert_eq!(dir_mode & 0o777, 0o755);
    }
}
