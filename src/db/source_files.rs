use rustc_hash::FxHashMap;

use super::FileIdx;

/// Canonicalize separators and resolve `.`/`..` segments without touching
/// the filesystem.  A leading `/` survives; `..` at the root is dropped.
pub fn fix_path_slashes(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(|c| c == '/' || c == '\\') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let joined = segments.join("/");
    if path.starts_with('/') || path.starts_with('\\') {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// The identity of a source file: the fixed path, lower-cased.
pub fn normalize_path(path: &str) -> String {
    fix_path_slashes(path).to_lowercase()
}

/// Ordered list of source file paths, unique by normalized path.
#[derive(Clone, Debug, Default)]
pub struct SourceFileTable {
    paths: Vec<String>,
    by_normalized: FxHashMap<String, FileIdx>,
}

impl PartialEq for SourceFileTable {
    fn eq(&self, other: &Self) -> bool {
        self.paths == other.paths
    }
}

impl SourceFileTable {
    pub fn new() -> SourceFileTable {
        SourceFileTable::default()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Return the index for `path`, appending it if no file with the same
    /// normalized path exists.  An empty path means "no file".
    pub fn intern(&mut self, path: &str) -> Option<FileIdx> {
        if path.is_empty() {
            return None;
        }
        let key = normalize_path(path);
        if let Some(idx) = self.by_normalized.get(&key) {
            return Some(*idx);
        }
        let idx = FileIdx::from_usize(self.paths.len());
        self.paths.push(fix_path_slashes(path));
        self.by_normalized.insert(key, idx);
        Some(idx)
    }

    /// Append a path exactly as stored on disk.  A path whose normalized form
    /// is already present still gets its own slot, but lookups keep resolving
    /// to the first one.
    pub fn push_raw(&mut self, path: String) -> FileIdx {
        let idx = FileIdx::from_usize(self.paths.len());
        self.by_normalized.entry(normalize_path(&path)).or_insert(idx);
        self.paths.push(path);
        idx
    }

    pub fn find(&self, path: &str) -> Option<FileIdx> {
        self.by_normalized.get(&normalize_path(path)).copied()
    }

    pub fn get(&self, idx: FileIdx) -> &str {
        &self.paths[idx.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileIdx, &str)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, p)| (FileIdx::from_usize(i), p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slashes_and_dots_are_resolved() {
        assert_eq!(fix_path_slashes("C:\\src\\.\\foo\\..\\bar.h"), "C:/src/bar.h");
        assert_eq!(fix_path_slashes("/usr//include/./a.h"), "/usr/include/a.h");
        assert_eq!(fix_path_slashes("a/b/../../c.h"), "c.h");
        assert_eq!(fix_path_slashes("/../x.h"), "/x.h");
    }

    #[test]
    fn normalization_is_case_insensitive() {
        assert_eq!(normalize_path("Src\\Foo.H"), "src/foo.h");
    }

    #[test]
    fn same_file_spelled_differently_interns_once() {
        let mut files = SourceFileTable::new();
        let a = files.intern("src/A.h");
        let b = files.intern("src\\.\\a.h");
        assert_eq!(a, b);
        assert_eq!(files.len(), 1);
        assert_eq!(files.get(a.unwrap()), "src/A.h");
    }

    #[test]
    fn empty_path_is_no_file() {
        let mut files = SourceFileTable::new();
        assert_eq!(files.intern(""), None);
        assert!(files.is_empty());
    }
}
