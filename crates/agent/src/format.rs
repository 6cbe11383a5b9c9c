//! Output post-processing for display
//!
//! Purely cosmetic: strips terminal escape codes and inserts markdown breaks
//! before the agent's step keywords. There is no word-boundary check, so the
//! keywords are rewritten wherever they appear, including inside tool
//! results (an email body containing "Action" gets a break too).
//!
//! Escape stripping is a single pass. A sequence split around another one,
//! such as `"\x1b\x1b[0m[0m"`, leaves the outer sequence behind once the
//! inner one is removed.

use regex::Regex;
use std::sync::OnceLock;

/// CSI and two-byte escape sequences
const ANSI_ESCAPE: &str = r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])";

/// Applied in order
const DISPLAY_BREAKS: &[(&str, &str)] = &[
    ("...", "...\n\n"),
    ("Action", "\n**Action**"),
    ("Observation", "\n**Observation**"),
    ("Thought", "\n**Thought**"),
    ("Final Answer", "\n**Final Answer**"),
];

fn ansi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ANSI_ESCAPE).expect("ANSI escape pattern compiles"))
}

/// Remove ANSI escape sequences, leaving everything else untouched.
///
/// One pass only; see the module notes on nested sequences.
pub fn strip_ansi(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Strip escapes, then insert display breaks before step keywords.
///
/// Occurrences already in their replaced form are kept, so
/// `format_transcript(&format_transcript(x)) == format_transcript(x)`.
pub fn format_transcript(raw: &str) -> String {
    let mut text = strip_ansi(raw);
    for (marker, replacement) in DISPLAY_BREAKS {
        text = insert_break(&text, marker, replacement);
    }
    text
}

fn insert_break(text: &str, marker: &str, replacement: &str) -> String {
    let Some(at) = replacement.find(marker) else {
        return text.replace(marker, replacement);
    };
    let prefix = &replacement[..at];
    let suffix = &replacement[at + marker.len()..];

    let mut out = String::with_capacity(text.len() + replacement.len());
    let mut last = 0;
    for (i, _) in text.match_indices(marker) {
        out.push_str(&text[last..i]);
        let end = i + marker.len();
        let formatted = text[..i].ends_with(prefix) && text[end..].starts_with(suffix);
        out.push_str(if formatted { marker } else { replacement });
        last = end;
    }
    out.push_str(&text[last..]);
    out
}
