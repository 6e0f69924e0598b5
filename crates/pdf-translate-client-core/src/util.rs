//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Replace the first `format=md` query parameter with `format=pdf`.
///
/// Returns the input unchanged if it carries no Markdown format parameter.
pub fn pdf_export_url(export_url: &str) -> String {
    export_url.replacen("format=md", "format=pdf", 1)
}
