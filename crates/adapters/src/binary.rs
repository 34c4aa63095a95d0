// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resolution of vendor benchmark binaries.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised when a benchmark binary cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// Nothing exists at the resolved path, or it is not a regular file.
    #[error("Binary not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but has no execute permission.
    #[error("Binary is not executable: {0}")]
    NotExecutable(PathBuf),
}

/// Join `bin_dir` and `name` and check the result is an executable file.
pub fn locate_binary(bin_dir: &Path, name: &str) -> Result<PathBuf, LocateError> {
    let path = bin_dir.join(name);
    let metadata = match std::fs::metadata(&path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(LocateError::NotFound(path)),
    };

    if !is_executable(&metadata) {
        return Err(LocateError::NotExecutable(path));
    }
    Ok(path)
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_binary(dir.path(), "rocblas-bench").unwrap_err();
        assert_eq!(err, LocateError::NotFound(dir.path().join("rocblas-bench")));
    }

    #[test]
    fn test_directory_is_not_a_binary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("trtexec")).unwrap();
        assert!(matches!(
            locate_binary(dir.path(), "trtexec"),
            Err(LocateError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_permission_is_required() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutlass_profiler");
        std::fs::write(&path, b"").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(
            locate_binary(dir.path(), "cutlass_profiler"),
            Err(LocateError::NotExecutable(path.clone()))
        );

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(locate_binary(dir.path(), "cutlass_profiler"), Ok(path));
    }
}
