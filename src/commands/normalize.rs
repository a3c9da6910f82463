//! Print a markdown file with its code samples made browser-safe

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::content::Normalizer;

/// Print the normalized file
pub fn run(file: &Path, whole: bool) -> Result<()> {
    print!("{}", normalize_file(file, whole)?);
    Ok(())
}

/// Rewrite code blocks only, or the whole text with `whole`
pub fn normalize_file(file: &Path, whole: bool) -> Result<String> {
    let text =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let normalizer = Normalizer::new();
    let normalized = if whole {
        normalizer.normalize(&text)
    } else {
        normalizer.normalize_code_blocks(&text)
    };

    Ok(normalized.into_owned())
}
