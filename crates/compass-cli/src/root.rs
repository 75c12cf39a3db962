use std::path::{Path, PathBuf};

/// Resolve the compass root directory.
///
/// Priority:
/// 1. `--root` flag / `COMPASS_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.compass/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover(&cwd).unwrap_or(cwd)
}

/// Upward search from `start`. A `.compass/` anywhere in the ancestor chain
/// wins over a `.git/`, even one closer to `start`.
fn discover(start: &Path) -> Option<PathBuf> {
    for marker in [".compass", ".git"] {
        let mut dir = start;
        loop {
            if dir.join(marker).is_dir() {
                return Some(dir.to_path_buf());
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }
    None
}
