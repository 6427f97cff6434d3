//! Shared `search_scope` semantics (`all` / `source`) used by every tool
//! that walks the project tree: symbol search, pattern search, directory
//! listing. `source` layers a fixed exclusion list for generated/vendor
//! directories on top of whatever the project's VCS ignore rules already
//! exclude; `all` walks everything.

use crate::error::SerenaError;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Fixed exclusion list for `search_scope="source"`, beyond VCS ignores.
pub const SOURCE_SCOPE_EXCLUDED: &[&str] = &[
    "node_modules",
    ".next",
    ".nuxt",
    "__pycache__",
    ".venv",
    "venv",
    ".pytest_cache",
    ".mypy_cache",
    "dist",
    "build",
    "target",
    ".git",
    "coverage",
    "htmlcov",
    "wheelhouse",
    "vendor",
    "migrations",
];

/// Whether a path component of `relative_path` falls under the fixed
/// `source` exclusion list (`*.egg-info` is matched by suffix, everything
/// else by exact component match).
pub fn is_excluded_source_path(relative_path: &Path) -> bool {
    relative_path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        SOURCE_SCOPE_EXCLUDED.contains(&s.as_ref()) || s.ends_with(".egg-info")
    })
}

/// Response metadata documenting which categories a `source`-scoped walk
/// dropped, and how to re-run without the exclusions (correctness
/// property: scope exclusion transparency).
pub fn scope_metadata(scope: &str) -> Value {
    if scope == "source" {
        json!({
            "scope": "source",
            "excluded_categories": SOURCE_SCOPE_EXCLUDED,
            "rerun_hint": "pass search_scope=\"all\" to include excluded/vendor paths",
        })
    } else {
        json!({ "scope": scope })
    }
}

/// Enumerate candidate files under `root` for a scope-wide walk.
/// `source` respects VCS ignores plus the fixed exclusion list; `all`
/// walks everything. Capped at `max_files` to bound worst-case cost on
/// very large trees.
pub fn enumerate_scope_files(
    root: &Path,
    scope: &str,
    max_files: usize,
) -> Result<Vec<PathBuf>, SerenaError> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder.hidden(false).follow_links(false);
    match scope {
        "source" => {
            builder.git_ignore(true).git_exclude(true).git_global(true);
        }
        "all" => {
            builder
                .git_ignore(false)
                .git_exclude(false)
                .git_global(false)
                .ignore(false);
        }
        other => {
            return Err(SerenaError::InvalidParameter(format!(
                "unknown search_scope '{other}'; expected 'all' or 'source'"
            )))
        }
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if scope == "source" && is_excluded_source_path(relative) {
            continue;
        }
        files.push(path.to_path_buf());
        if files.len() >= max_files {
            break;
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_scope_excludes_fixed_list() {
        assert!(is_excluded_source_path(Path::new("node_modules/foo.js")));
        assert!(is_excluded_source_path(Path::new("pkg/vendor/lib.rs")));
        assert!(is_excluded_source_path(Path::new("foo.egg-info/PKG-INFO")));
        assert!(!is_excluded_source_path(Path::new("src/main.rs")));
    }

    #[test]
    fn scope_metadata_lists_excluded_categories_for_source() {
        let meta = scope_metadata("source");
        assert!(meta["excluded_categories"]
            .as_array()
            .unwrap()
            .contains(&json!("vendor")));
        assert_eq!(
            meta["rerun_hint"],
            json!("pass search_scope=\"all\" to include excluded/vendor paths")
        );
    }

    #[test]
    fn scope_metadata_for_all_has_no_exclusions() {
        let meta = scope_metadata("all");
        assert!(meta.get("excluded_categories").is_none());
    }
}
