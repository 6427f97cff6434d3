//! Centralized store paths: `~/.serena/projects/{id}/`, `SERENA_HOME`
//! override, and the atomic write-temp-then-rename primitive shared by
//! the config/memory/editor layers.

use std::path::{Path, PathBuf};

/// FNV-1a, 64-bit. Stable across runs and platforms; collisions are
/// astronomically unlikely for the number of projects one user has.
fn fnv1a_hex(bytes: &[u8]) -> String {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    format!("{:016x}", hash)
}

/// Stable identifier for a project root: an FNV-1a hash of the
/// canonicalized absolute path. Falls back to the uncanonicalized path
/// (e.g. the root doesn't exist yet) rather than failing outright, so
/// callers can compute a project's directory before creating it.
pub fn project_id(root: &Path) -> String {
    let canonical = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    fnv1a_hex(canonical.to_string_lossy().as_bytes())
}

/// Root of the centralized store. `SERENA_HOME` overrides the default
/// of `~/.serena`.
pub fn serena_home() -> PathBuf {
    if let Ok(dir) = std::env::var("SERENA_HOME") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".serena"))
        .unwrap_or_else(|| PathBuf::from(".serena"))
}

/// Per-project directory under the centralized store:
/// `~/.serena/projects/{project-id}/`.
pub fn project_dir(root: &Path) -> PathBuf {
    serena_home().join("projects").join(project_id(root))
}

/// Write `contents` to `path` atomically: write to a sibling temp file,
/// then rename over the destination. Creates the parent directory if
/// missing.
pub fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp_name = format!(".{}.tmp-{}", file_name.to_string_lossy(), std::process::id());
    let tmp_path = parent.join(tmp_name);

    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_is_stable_for_same_root() {
        let dir = tempfile::tempdir().unwrap();
        let a = project_id(dir.path());
        let b = project_id(dir.path());
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn project_id_differs_across_roots() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        assert_ne!(project_id(a.path()), project_id(b.path()));
    }

    #[test]
    fn serena_home_honors_env_override() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("SERENA_HOME", dir.path());
        assert_eq!(serena_home(), dir.path());
        std::env::remove_var("SERENA_HOME");
    }

    #[test]
    fn project_dir_nests_under_projects() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("SERENA_HOME", dir.path());
        let root = tempfile::tempdir().unwrap();
        let pd = project_dir(root.path());
        assert!(pd.starts_with(dir.path().join("projects")));
        std::env::remove_var("SERENA_HOME");
    }

    #[test]
    fn atomic_write_creates_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file.txt");

        atomic_write(&path, b"first").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
