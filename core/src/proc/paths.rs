use std::env;
use std::path::{Path, PathBuf};

/// True if `path` is a regular file with an execute bit set.
#[cfg(unix)]
pub fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

/// Locate an executable by name. `extra_dirs` are searched before the
/// `PATH` entries, so a virtual environment's bin directory can shadow a
/// system-wide install.
pub fn find_on_path(name: &str, extra_dirs: &[PathBuf]) -> Option<PathBuf> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    let dirs = extra_dirs
        .iter()
        .cloned()
        .chain(env::split_paths(&path_var));
    for dir in dirs {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, "#!/bin/sh\n").unwrap();
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn extra_dirs_are_searched_first() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fictional-solver");
        make_executable(&tool);

        let found = find_on_path("fictional-solver", &[dir.path().to_path_buf()]);
        assert_eq!(found, Some(tool));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_files_do_not_resolve() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fictional-solver"), "data").unwrap();

        assert!(!is_executable_file(&dir.path().join("fictional-solver")));
        assert_eq!(
            find_on_path("fictional-solver", &[dir.path().to_path_buf()]),
            None
        );
    }

    #[test]
    fn directories_never_count_as_executables() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_executable_file(dir.path()));
    }
}
