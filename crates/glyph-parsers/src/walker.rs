//! Recursive source-file discovery for `scan`/`summarize_repo`.
//!
//! C/C++ repositories aren't assumed to be git repos, so this walker
//! filters by a plain extension allowlist and ignore-pattern
//! path-component match rather than consulting `.gitignore`.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    ignore_patterns: Vec<String>,
}

impl FileWalker {
    pub fn new(root: &Path, extensions: &[String], ignore_patterns: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            ignore_patterns: ignore_patterns.to_vec(),
        }
    }

    /// Walks the root directory and returns every file whose extension is
    /// in `extensions` and whose path has no component matching
    /// `ignore_patterns` exactly.
    pub fn walk(&self) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .build();

        let mut out = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.into_path();
            if self.is_ignored(&path) {
                continue;
            }
            if self.has_matching_extension(&path) {
                out.push(path);
            }
        }
        out.sort();
        out
    }

    fn is_ignored(&self, path: &Path) -> bool {
        path.components().any(|c| {
            let s = c.as_os_str().to_string_lossy();
            self.ignore_patterns.iter().any(|p| p == s.as_ref())
        })
    }

    fn has_matching_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{}", ext.to_lowercase());
        self.extensions.iter().any(|e| *e == dotted)
    }
}
