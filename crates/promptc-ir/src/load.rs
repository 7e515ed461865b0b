//! Prompt discovery on disk.

use std::path::{Path, PathBuf};

use crate::document::{parse_prompt, Format};
use crate::error::{LoadError, Result};
use crate::ir::{JsonSchema, PromptWithPath};

/// Default discovery pattern, relative to the base directory.
pub const DEFAULT_PATTERN: &str = "**/*prompt.{yaml,yml}";

/// Load a single prompt document, choosing the format from its extension.
pub fn load_prompt_file(path: impl AsRef<Path>) -> Result<PromptWithPath> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let source = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let prompt = parse_prompt(&source, format, path)?;
    Ok(PromptWithPath {
        path: path.to_path_buf(),
        prompt,
    })
}

/// Read a standalone schema document (YAML or JSON).
///
/// The document is taken as-is; no `$ref` resolution happens here.
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<JsonSchema> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let source = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let value: serde_json::Value = match format {
        Format::Yaml => serde_yaml::from_str(&source).map_err(|source| LoadError::Yaml {
            file: path.to_path_buf(),
            source,
        })?,
        Format::Json => serde_json::from_str(&source).map_err(|source| LoadError::Json {
            file: path.to_path_buf(),
            source,
        })?,
    };
    Ok(JsonSchema::new(value))
}

/// Find every file under `base_dir` matching `pattern` and load it.
///
/// The pattern may contain `{a,b}` alternations. Results are ordered by
/// path so repeated runs see the same prompt order.
pub fn load_prompts(base_dir: impl AsRef<Path>, pattern: &str) -> Result<Vec<PromptWithPath>> {
    let base_dir = base_dir.as_ref();
    let files = discover(base_dir, pattern)?;
    if files.is_empty() {
        tracing::warn!(dir = %base_dir.display(), pattern, "no matching prompt files found");
    }

    files
        .iter()
        .map(|file| {
            tracing::debug!(file = %file.display(), "loading prompt");
            load_prompt_file(file)
        })
        .collect()
}

/// Expand `pattern` under `base_dir` into the sorted list of matching files.
pub fn discover(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for alternative in expand_braces(pattern) {
        let full = base_dir.join(&alternative);
        let full = full.to_string_lossy();
        let paths = glob::glob(&full).map_err(|source| LoadError::Pattern {
            pattern: alternative.clone(),
            source,
        })?;
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().to_path_buf();
                    return Err(LoadError::io(path, e.into_error()));
                }
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Expand shell-style `{a,b}` alternations, which `glob` does not support.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|i| open + i) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    pattern[open + 1..close]
        .split(',')
        .flat_map(|choice| expand_braces(&format!("{prefix}{choice}{suffix}")))
        .collect()
}
