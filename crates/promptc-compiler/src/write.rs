/// Persisting a compiled file set

use std::fs;
use std::path::{Path, PathBuf};

use crate::driver::OutputFile;
use crate::error::{CompileError, Result};

/// Write every file under `out_dir`, creating directories as needed.
///
/// Returns the paths written, in input order.
pub fn write_files(out_dir: &Path, files: &[OutputFile]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|source| CompileError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let target = out_dir.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| CompileError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, &file.contents).map_err(|source| CompileError::Write {
            path: target.clone(),
            source,
        })?;
        tracing::debug!(path = %target.display(), bytes = file.contents.len(), "wrote");
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gen");
        let files = vec![
            OutputFile::new("typescript", "index.ts", "export {};\n"),
            OutputFile::new("typescript", "nested/types.ts", "export type A = string;\n"),
        ];

        let written = write_files(&out, &files).unwrap();
        assert_eq!(written, vec![out.join("index.ts"), out.join("nested/types.ts")]);
        assert_eq!(fs::read_to_string(out.join("nested/types.ts")).unwrap(), "export type A = string;\n");
    }

    #[test]
    fn test_write_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let files = vec![OutputFile::new("node", "index.js", "")];
        match write_files(&blocker, &files) {
            Err(CompileError::Write { path, .. }) => assert_eq!(path, blocker),
            other => panic!("expected write error, got {:?}", other),
        }
    }
}
