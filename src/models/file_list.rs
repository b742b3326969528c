use crate::models::PathKind;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;

type ListState = IndexSet<Utf8PathBuf>;

/// Ordered, duplicate-free list of selected paths with undo/redo history.
///
/// Order is insertion order and determines merge order. Paths are compared
/// exactly as given (case-sensitive, no normalization).
///
/// # History
///
/// Every mutation other than [`undo`](Self::undo) and [`redo`](Self::redo)
/// pushes a full snapshot of the pre-mutation list onto the undo stack and
/// clears the redo stack. Mutations that are rejected outright (a duplicate or
/// missing path passed to [`add`](Self::add)) leave history untouched.
///
/// # Concurrency
///
/// The model does no locking. Callers must not mutate it while a merge is
/// reading a [`snapshot`](Self::snapshot) taken from it.
#[derive(Debug, Clone, Default)]
pub struct FileListModel {
    entries: ListState,
    undo_stack: Vec<ListState>,
    redo_stack: Vec<ListState>,
}

impl FileListModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` if it is an existing file or directory not already in the list.
    ///
    /// Returns `false` (and records no history) when the path is rejected.
    pub fn add(&mut self, path: impl Into<Utf8PathBuf>) -> bool {
        let path = path.into();
        if !self.accepts(&path) {
            tracing::debug!("Ignoring selection: {}", path);
            return false;
        }

        self.push_history();
        self.entries.insert(path);
        true
    }

    /// Add a batch of paths (a drag-and-drop) as a single undoable step.
    ///
    /// Each path is filtered by the same rules as [`add`](Self::add). One undo
    /// snapshot is recorded for the whole batch, and only if at least one path
    /// was accepted. Returns the number of accepted paths.
    pub fn add_all<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        let before = self.entries.clone();
        let mut accepted = 0;

        for path in paths {
            let path = path.into();
            if self.accepts(&path) {
                self.entries.insert(path);
                accepted += 1;
            } else {
                tracing::debug!("Ignoring selection: {}", path);
            }
        }

        if accepted > 0 {
            self.undo_stack.push(before);
            self.redo_stack.clear();
        }

        accepted
    }

    /// Remove every given path that is present, preserving the order of the rest.
    ///
    /// History is recorded even if none of the paths are present.
    /// Returns the number of removed paths.
    pub fn remove_selected<P: AsRef<Utf8Path>>(&mut self, paths: &[P]) -> usize {
        self.push_history();

        let mut removed = 0;
        for path in paths {
            let path: &Utf8Path = path.as_ref();
            if self.entries.shift_remove(path) {
                removed += 1;
            }
        }
        removed
    }

    /// Restore the most recent undo snapshot. Returns `false` if there is none.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.entries, previous);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone snapshot. Returns `false` if there is none.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.entries, next);
                self.undo_stack.push(current);
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of the ordered paths, for rendering or merging.
    pub fn snapshot(&self) -> Vec<Utf8PathBuf> {
        self.entries.iter().cloned().collect()
    }

    /// Paths paired with their kind, resolved at call time.
    pub fn entries(&self) -> impl Iterator<Item = (&Utf8Path, PathKind)> {
        self.entries
            .iter()
            .map(|path| (path.as_path(), PathKind::resolve(path)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: impl AsRef<Utf8Path>) -> bool {
        let path: &Utf8Path = path.as_ref();
        self.entries.contains(path)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn accepts(&self, path: &Utf8Path) -> bool {
        !self.entries.contains(path) && PathKind::resolve(path).is_selectable()
    }

    fn push_history(&mut self) {
        self.undo_stack.push(self.entries.clone());
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Utf8PathBuf, Utf8PathBuf, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let a = root.join("a.txt");
        let b = root.join("b.txt");
        let dir = root.join("sub");
        fs::write(&a, "a\n").unwrap();
        fs::write(&b, "b\n").unwrap();
        fs::create_dir(&dir).unwrap();
        (temp_dir, a, b, dir)
    }

    #[test]
    fn test_add_appends_in_order() {
        let (_temp_dir, a, b, dir) = fixture();
        let mut list = FileListModel::new();

        assert!(list.add(b.clone()));
        assert!(list.add(dir.clone()));
        assert!(list.add(a.clone()));

        assert_eq!(list.snapshot(), vec![b, dir, a]);
        assert!(list.can_undo());
        assert!(!list.can_redo());
    }

    #[test]
    fn test_add_duplicate_is_ignored_without_history() {
        let (_temp_dir, a, _b, _dir) = fixture();
        let mut list = FileListModel::new();
        list.add(a.clone());
        let undo_depth = list.undo_stack.len();

        assert!(!list.add(a.clone()));
        assert_eq!(list.len(), 1);
        assert_eq!(list.undo_stack.len(), undo_depth);
    }

    #[test]
    fn test_add_missing_path_is_ignored() {
        let mut list = FileListModel::new();
        assert!(!list.add("missing/path"));
        assert!(list.is_empty());
        assert!(!list.can_undo());
    }

    #[test]
    fn test_remove_selected_pushes_history_and_clears_redo() {
        let (_temp_dir, a, b, _dir) = fixture();
        let mut list = FileListModel::new();
        list.add(a.clone());
        list.add(b.clone());
        list.undo();
        assert!(list.can_redo());

        let removed = list.remove_selected(&[a.clone(), b.clone()]);
        assert_eq!(removed, 1);
        assert!(list.is_empty());
        assert!(!list.can_redo());

        assert!(list.undo());
        assert_eq!(list.snapshot(), vec![a]);
    }

    #[test]
    fn test_remove_absent_path_still_records_history() {
        let (_temp_dir, a, b, _dir) = fixture();
        let mut list = FileListModel::new();
        list.add(a.clone());
        let depth = list.undo_stack.len();

        assert_eq!(list.remove_selected(&[b]), 0);
        assert_eq!(list.undo_stack.len(), depth + 1);
        assert_eq!(list.snapshot(), vec![a]);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let (_temp_dir, a, b, _dir) = fixture();
        let mut list = FileListModel::new();
        list.add(a.clone());
        list.add(b.clone());

        assert!(list.undo());
        assert_eq!(list.snapshot(), vec![a.clone()]);
        assert!(list.redo());
        assert_eq!(list.snapshot(), vec![a, b]);
        assert!(!list.redo());
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut list = FileListModel::new();
        assert!(!list.undo());
        assert!(!list.redo());
        assert!(list.is_empty());
    }

    #[test]
    fn test_add_all_records_single_step() {
        let (_temp_dir, a, b, dir) = fixture();
        let mut list = FileListModel::new();

        let accepted = list.add_all([
            a.clone(),
            b.clone(),
            a.clone(),
            Utf8PathBuf::from("nope"),
            dir.clone(),
        ]);
        assert_eq!(accepted, 3);
        assert_eq!(list.snapshot(), vec![a, b, dir]);
        assert_eq!(list.undo_stack.len(), 1);

        assert!(list.undo());
        assert!(list.is_empty());
    }

    #[test]
    fn test_add_all_with_nothing_accepted_leaves_history() {
        let mut list = FileListModel::new();
        assert_eq!(list.add_all(["x/y", "z"]), 0);
        assert!(!list.can_undo());
    }

    #[test]
    fn test_entries_resolve_kind_lazily() {
        let (_temp_dir, a, _b, dir) = fixture();
        let mut list = FileListModel::new();
        list.add(a.clone());
        list.add(dir.clone());

        fs::remove_file(&a).unwrap();

        let kinds: Vec<PathKind> = list.entries().map(|(_, kind)| kind).collect();
        assert_eq!(kinds, vec![PathKind::Missing, PathKind::Directory]);
    }
}
