//! Text extraction primitives for CLI values and tool output.

use regex::Regex;

/// Extract first match from content using regex pattern with capture group.
/// Pattern must contain exactly one capture group for the value to extract.
pub fn extract_first(content: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Value following `marker` on the first line that contains it, trimmed.
///
/// Returns `None` when no line carries the marker or the value is blank.
pub fn value_after_marker(content: &str, marker: &str) -> Option<String> {
    let pattern = format!(r"(?m){}(.*)$", regex::escape(marker));
    extract_first(content, &pattern)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn split_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a list separated by commas, whitespace, or any mix of the two.
pub fn split_flexible_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
