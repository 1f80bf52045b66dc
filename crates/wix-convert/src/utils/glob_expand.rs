use anyhow::{Context, Result};
use std::path::PathBuf;

/// Expand glob patterns into a list of file paths
///
/// If a pattern doesn't contain glob characters (*, ?, [, ]),
/// treat it as a literal path, which must exist.
pub fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let paths = glob::glob(pattern)
                .with_context(|| format!("Invalid glob pattern: {}", pattern))?;

            let mut match_count = 0;
            for path in paths {
                let path =
                    path.with_context(|| format!("Failed to read glob match for: {}", pattern))?;
                if path.is_file() {
                    files.push(path);
                    match_count += 1;
                }
            }

            if match_count == 0 {
                tracing::warn!(pattern = %pattern, "No files matched pattern");
            }
        } else {
            let path = PathBuf::from(pattern);
            if !path.exists() {
                anyhow::bail!("File not found: {}", pattern);
            }
            files.push(path);
        }
    }

    Ok(files)
}
