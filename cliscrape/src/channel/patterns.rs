//! Prompt patterns and output cleanup.

use regex::bytes::Regex;

use crate::platform::PrivilegeLevel;

/// Build a single regex matching the prompt of any privilege level.
pub fn combined_prompt_pattern<'a>(
    levels: impl IntoIterator<Item = &'a PrivilegeLevel>,
) -> Result<Regex, regex::Error> {
    let combined = levels
        .into_iter()
        .map(|level| format!("(?:{})", level.pattern.as_str()))
        .collect::<Vec<_>>()
        .join("|");

    if combined.is_empty() {
        Regex::new(r"[>#]\s*$")
    } else {
        Regex::new(&combined)
    }
}

/// Strip the command echo from the front and the prompt line from the end.
///
/// Line endings are normalized to `\n`.
pub fn normalize_output(raw: &str, command: &str) -> String {
    let raw = raw.replace("\r\n", "\n").replace('\r', "");

    let output = raw.trim_start_matches('\n');
    let output = match output.strip_prefix(command) {
        Some(rest) => rest.trim_start_matches('\n'),
        None => output,
    };

    let output = output.trim_end_matches([' ', '\n']);
    match output.rfind('\n') {
        Some(pos) => output[..pos].to_string(),
        // Only the prompt came back
        None => String::new(),
    }
}

/// The last line of the buffer, which is the prompt once a read completes.
pub fn trailing_prompt(raw: &str) -> &str {
    raw.trim_end().rsplit(['\n', '\r']).next().unwrap_or("").trim()
}
