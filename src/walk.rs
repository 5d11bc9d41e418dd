//! Deterministic pre-order tree walk.

use std::path::Path;

use crate::traits::{FsDir, FsRead};
use crate::{FsError, WalkEntry};

/// What the walker should do after visiting an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep going; descend if the entry is a directory.
    Continue,
    /// Do not descend into this entry. Siblings are still visited.
    SkipSubtree,
}

/// Walk the tree rooted at `root` depth-first, parents before children.
///
/// Entries are classified with [`FsRead::symlink_metadata`], so symlinks are
/// reported as [`FileType::Symlink`](crate::FileType::Symlink) and never
/// descended into. Children are visited in byte order of their names, which
/// makes the visit order reproducible for a given tree.
///
/// The first error, from the backend or from `visit`, stops the walk and is
/// returned; nothing after it is visited.
///
/// # Example
///
/// ```rust,no_run
/// use anyfs_permissions::{walk, FsError, NativeFs, WalkControl};
/// use std::path::Path;
///
/// let mut paths = Vec::new();
/// walk(&NativeFs::new(), Path::new("/srv/files"), |entry| {
///     paths.push(entry.path.clone());
///     Ok::<_, FsError>(WalkControl::Continue)
/// })?;
/// # Ok::<(), FsError>(())
/// ```
pub fn walk<F, V, E>(fs: &F, root: &Path, mut visit: V) -> Result<(), E>
where
    F: FsRead + FsDir + ?Sized,
    V: FnMut(&WalkEntry) -> Result<WalkControl, E>,
    E: From<FsError>,
{
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((path, depth)) = pending.pop() {
        let md = fs.symlink_metadata(&path)?;
        let entry = WalkEntry {
            path,
            file_type: md.file_type,
            permissions: md.permissions,
            depth,
        };

        let control = visit(&entry)?;
        if control == WalkControl::SkipSubtree || !md.is_dir() {
            continue;
        }

        let mut children = fs.read_dir(&entry.path)?.collect_all()?;
        children.sort_by(|a, b| a.name.cmp(&b.name));
        // Reversed so the smallest name is popped first.
        pending.extend(
            children
                .into_iter()
                .rev()
                .map(|child| (child.path, depth + 1)),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirEntry, FileType, Metadata, ReadDirIter};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    /// Read-only tree: path -> type.
    struct Tree(BTreeMap<PathBuf, FileType>);

    impl Tree {
        fn new(entries: &[(&str, FileType)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(p, t)| (PathBuf::from(p), *t))
                    .collect(),
            )
        }
    }

    impl FsRead for Tree {
        fn symlink_metadata(&self, path: &Path) -> Result<Metadata, FsError> {
            let file_type = *self.0.get(path).ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })?;
            Ok(Metadata {
                file_type,
                ..Default::default()
            })
        }
    }

    impl FsDir for Tree {
        fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
            // Deliberately reverse order to prove the walker sorts.
            let mut entries: Vec<_> = self
                .0
                .iter()
                .filter(|(p, _)| p.parent() == Some(path))
                .map(|(p, t)| {
                    Ok(DirEntry {
                        name: p.file_name().unwrap().to_string_lossy().into_owned(),
                        path: p.clone(),
                        file_type: *t,
                    })
                })
                .collect();
            entries.reverse();
            Ok(ReadDirIter::from_vec(entries))
        }
    }

    fn sample() -> Tree {
        Tree::new(&[
            ("/r", FileType::Directory),
            ("/r/b", FileType::Directory),
            ("/r/b/x", FileType::File),
            ("/r/a", FileType::File),
            ("/r/c", FileType::Symlink),
        ])
    }

    fn visit_all(tree: &Tree, root: &str) -> Vec<(String, usize)> {
        let mut seen = Vec::new();
        walk(tree, Path::new(root), |e| {
            seen.push((e.path.display().to_string(), e.depth));
            Ok::<_, FsError>(WalkControl::Continue)
        })
        .unwrap();
        seen
    }

    #[test]
    fn visits_pre_order_sorted() {
        let seen = visit_all(&sample(), "/r");
        assert_eq!(
            seen,
            vec![
                ("/r".to_string(), 0),
                ("/r/a".to_string(), 1),
                ("/r/b".to_string(), 1),
                ("/r/b/x".to_string(), 2),
                ("/r/c".to_string(), 1),
            ]
        );
    }

    #[test]
    fn skip_subtree_prunes_directory_only() {
        let tree = sample();
        let mut seen = Vec::new();
        walk(&tree, Path::new("/r"), |e| {
            seen.push(e.path.display().to_string());
            Ok::<_, FsError>(if e.path == Path::new("/r/b") {
                WalkControl::SkipSubtree
            } else {
                WalkControl::Continue
            })
        })
        .unwrap();
        assert_eq!(seen, vec!["/r", "/r/a", "/r/b", "/r/c"]);
    }

    #[test]
    fn file_root_visits_once() {
        let seen = visit_all(&sample(), "/r/a");
        assert_eq!(seen, vec![("/r/a".to_string(), 0)]);
    }

    #[test]
    fn visitor_error_stops_walk() {
        let tree = sample();
        let mut seen = 0;
        let result = walk(&tree, Path::new("/r"), |e| {
            seen += 1;
            if e.path == Path::new("/r/b") {
                Err(FsError::Backend("stop".into()))
            } else {
                Ok(WalkControl::Continue)
            }
        });
        assert!(matches!(result, Err(FsError::Backend(_))));
        assert_eq!(seen, 3);
    }

    #[test]
    fn missing_root_is_not_found() {
        let result = walk(&sample(), Path::new("/nope"), |_| {
            Ok::<_, FsError>(WalkControl::Continue)
        });
        assert!(matches!(result, Err(FsError::NotFound { .. })));
    }
}
