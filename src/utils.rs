//! Shared utility functions

use regex::Regex;
use std::sync::LazyLock;

/// Longest sanitized name (in characters) kept before truncation kicks in
pub const MAX_NAME_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// Characters rejected by at least one of Windows, macOS or Linux
static ILLEGAL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\\/*?:"<>|]"#).unwrap()
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").unwrap()
});

fn is_trimmable(c: char) -> bool {
    c == '.' || c.is_whitespace()
}

/// Make a string safe to use as a file or directory name.
///
/// Removes characters illegal on common filesystems, collapses whitespace,
/// trims dots and spaces from both ends and truncates long names to
/// 147 characters plus `...`. A trailing ellipsis that follows a regular
/// character survives trimming, so sanitizing twice gives the same result.
pub fn sanitize_filename(name: &str) -> String {
    let name = ILLEGAL_CHARS.replace_all(name, "");
    let name = WHITESPACE_RUN.replace_all(&name, " ");
    let name = trim_name(&name);

    if name.chars().count() <= MAX_NAME_CHARS {
        return name.to_string();
    }

    let prefix: String = name.chars().take(MAX_NAME_CHARS - ELLIPSIS.len()).collect();
    format!("{}{}", prefix.trim_end_matches(is_trimmable), ELLIPSIS)
}

/// Trim dots and whitespace from both ends, keeping a trailing `...`
/// that directly follows a character other than a dot or space.
fn trim_name(name: &str) -> &str {
    let name = name.trim_start_matches(is_trimmable);

    if let Some(stem) = name.strip_suffix(ELLIPSIS) {
        if stem.chars().last().is_some_and(|c| !is_trimmable(c)) {
            return name;
        }
    }

    name.trim_end_matches(is_trimmable)
}
