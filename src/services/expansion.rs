use crate::models::PathKind;
use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

/// Expand a selection into the ordered list of leaf files to merge.
///
/// - A file entry is one leaf.
/// - A directory entry contributes every file beneath it, at all depths,
///   depth-first with siblings sorted by file name. That is the same as
///   ordering by the component-wise lexicographic order of the full path,
///   so output does not depend on the host's enumeration order.
/// - Entries that no longer exist are skipped.
///
/// Unreadable directory entries and non-UTF-8 paths are logged and skipped.
/// The same file reachable through two selected entries is emitted twice.
pub fn expand_selection(paths: &[Utf8PathBuf], follow_symlinks: bool) -> Vec<Utf8PathBuf> {
    let mut leaves = Vec::new();

    for path in paths {
        match PathKind::resolve(path) {
            PathKind::File => leaves.push(path.clone()),
            PathKind::Directory => expand_directory(path, follow_symlinks, &mut leaves),
            PathKind::Missing => {
                tracing::warn!("Skipping missing selection: {}", path);
            }
        }
    }

    leaves
}

fn expand_directory(root: &Utf8Path, follow_symlinks: bool, leaves: &mut Vec<Utf8PathBuf>) {
    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .min_depth(1)
        .sort_by_file_name();

    let before = leaves.len();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root, e);
                continue;
            }
        };

        // A symlink to a file is still a leaf even when links are not followed
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(path) => leaves.push(path),
            Err(path) => {
                tracing::warn!("Skipping non UTF-8 path: {}", path.display());
            }
        }
    }

    tracing::debug!("Expanded {} into {} files", root, leaves.len() - before);
}
