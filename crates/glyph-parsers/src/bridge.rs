//! Wraps the `clang` crate (safe bindings over `clang-sys`/libclang) and
//! resolves a native libclang at first use.
//!
//! The `Clang`/`Index`/`TranslationUnit` triple in the `clang` crate borrows
//! transitively (`Index<'c>` borrows `Clang`, `TranslationUnit<'i>` borrows
//! `Index<'i>`), so there is no way to stash a parsed unit on a long-lived
//! struct without self-referential lifetimes. Instead [`parse_with`] opens a
//! fresh `Clang`/`Index` per call and hands the translation unit to a
//! caller-supplied closure — the extractor, rewriter, and call graph builder
//! all run inside that closure and return owned data.

use std::env;
use std::path::{Path, PathBuf};

use clang::{Clang, Index, TranslationUnit, Unsaved};

use crate::error::{ParseError, Result};

/// Environment and search-path knobs for locating libclang, read from
/// [`glyph_core::config::ClangConfig`] by callers.
#[derive(Debug, Clone, Default)]
pub struct LibraryHints {
    pub library_file: Option<String>,
    pub search_path: Vec<String>,
}

/// Resolves a libclang to load, trying each of the following in order, and
/// points `clang-sys`'s own loader at it by setting the environment
/// variables it already honours (`LIBCLANG_PATH` for a containing
/// directory). Must run before the first [`Clang::new`] call in the process.
///
/// Step 5 (clang-sys's own dynamic-loader search) needs no action here: if
/// none of the earlier steps found a candidate, `Clang::new()` still
/// attempts its own broad search when `clang-sys`'s `runtime` feature is
/// enabled, which this workspace uses instead of vendoring a bundled
/// library.
pub fn resolve_library(hints: &LibraryHints) {
    if let Ok(explicit) = env::var("LIBCLANG_LIBRARY_FILE") {
        if Path::new(&explicit).exists() {
            set_search_dir(&explicit);
            return;
        }
    }
    if let Some(explicit) = &hints.library_file {
        if Path::new(explicit).exists() {
            set_search_dir(explicit);
            return;
        }
    }

    if cfg!(target_os = "macos") {
        if let Some(dylib) = brew_llvm_lib() {
            set_search_dir(&dylib);
            return;
        }
    } else if let Some(candidate) = linux_candidates().into_iter().next() {
        set_search_dir(&candidate);
        return;
    }

    let mut extra_dirs: Vec<String> = Vec::new();
    if let Ok(path_list) = env::var("LIBCLANG_SEARCH_PATH") {
        extra_dirs.extend(env::split_paths(&path_list).map(|p| p.to_string_lossy().into_owned()));
    }
    extra_dirs.extend(hints.search_path.iter().cloned());
    if !extra_dirs.is_empty() {
        let joined = env::join_paths(extra_dirs).unwrap_or_default();
        if let Some(existing) = env::var_os("LIBCLANG_PATH") {
            let mut combined = existing;
            combined.push(":");
            combined.push(joined);
            env::set_var("LIBCLANG_PATH", combined);
        } else {
            env::set_var("LIBCLANG_PATH", joined);
        }
    }
    // Otherwise: leave LIBCLANG_PATH untouched and let clang-sys's own
    // dynamic-loader search (step 5) try OS-default library directories.
}

fn set_search_dir(library_file: &str) {
    if let Some(dir) = Path::new(library_file).parent() {
        env::set_var("LIBCLANG_PATH", dir);
    }
}

fn brew_llvm_lib() -> Option<String> {
    let output = std::process::Command::new("brew")
        .args(["--prefix", "llvm"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let prefix = String::from_utf8(output.stdout).ok()?;
    let candidate = PathBuf::from(prefix.trim()).join("lib").join("libclang.dylib");
    candidate.exists().then(|| candidate.to_string_lossy().into_owned())
}

fn linux_candidates() -> Vec<String> {
    let globs = [
        "/usr/lib/llvm-*/lib/libclang.so",
        "/usr/lib/x86_64-linux-gnu/libclang*.so",
        "/usr/local/lib/libclang*.so",
    ];
    let mut found: Vec<String> = Vec::new();
    for pattern in globs {
        if let Ok(paths) = glob_simple(pattern) {
            found.extend(paths);
        }
    }
    found.sort();
    found
}

/// Minimal single-`*` glob over one directory, avoiding a dependency the
/// teacher stack doesn't already carry for this narrow a need.
fn glob_simple(pattern: &str) -> std::io::Result<Vec<String>> {
    let path = Path::new(pattern);
    let dir = path.parent().unwrap_or(Path::new("/"));
    let file_pattern = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let (prefix, suffix) = match file_pattern.split_once('*') {
        Some((p, s)) => (p, s),
        None => (file_pattern, ""),
    };
    let mut out = Vec::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(suffix) && name.len() >= prefix.len() + suffix.len() {
            out.push(entry.path().to_string_lossy().into_owned());
        }
    }
    Ok(out)
}

/// Clang args for `filename`: `-x c` unless the extension names a C++
/// variant, then extra flags verbatim.
pub fn clang_args_for(filename: &Path, extra: &[String]) -> Vec<String> {
    let is_cpp = filename
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "hpp" | "hh" | "hxx" | "cc" | "cpp" | "cxx"));
    let mut args = if is_cpp {
        vec!["-x".to_string(), "c++".to_string()]
    } else {
        vec!["-x".to_string(), "c".to_string()]
    };
    args.extend(extra.iter().cloned());
    args
}

/// Parses `filename` (reading `source` verbatim if given, else from disk)
/// with detailed preprocessing records, and hands the resulting translation
/// unit to `f`. The bridge never treats parse diagnostics as fatal — only a
/// failure of libclang to produce a TU at all surfaces as [`ParseError`].
pub fn parse_with<R>(
    filename: &Path,
    source: Option<&str>,
    extra_args: &[String],
    f: impl FnOnce(&TranslationUnit) -> R,
) -> Result<R> {
    let clang = Clang::new().map_err(ParseError::LibraryLoad)?;
    let index = Index::new(&clang, false, false);
    let args = clang_args_for(filename, extra_args);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let mut parser = index.parser(filename);
    parser.arguments(&arg_refs);
    parser.detailed_preprocessing_record(true);
    let owned_source;
    if let Some(src) = source {
        owned_source = src.to_string();
        parser.unsaved(&[Unsaved::new(filename, &owned_source)]);
    }

    let tu = parser.parse().map_err(|e| ParseError::Parse {
        file: filename.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(f(&tu))
}
