use camino::Utf8Path;

/// Kind of a selected path, resolved against the filesystem at call time.
///
/// Kinds are never cached in the file list: a path that was a file when it
/// was added may be a directory, or gone, by the time it is rendered or merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    Missing,
}

impl PathKind {
    /// Resolve the kind of `path` right now (follows symlinks).
    pub fn resolve(path: &Utf8Path) -> Self {
        if path.is_file() {
            PathKind::File
        } else if path.is_dir() {
            PathKind::Directory
        } else {
            PathKind::Missing
        }
    }

    /// Whether a path of this kind can be selected.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, PathKind::Missing)
    }

    /// Label shown in the type column of a file list ("文件" / "文件夹").
    pub fn label(&self) -> &'static str {
        match self {
            PathKind::File => "文件",
            PathKind::Directory => "文件夹",
            PathKind::Missing => "不存在",
        }
    }
}
