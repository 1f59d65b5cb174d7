//! Name-change directives in unified diffs.

use std::io::{self, BufRead};

use crate::patch::NAME_DIRECTIVE;

/// Scan a unified diff for added `name:` lines.
///
/// Every line containing [`NAME_DIRECTIVE`] is split on the marker and the
/// trailing non-empty fragment, trimmed, becomes the new name. Later lines
/// override earlier ones. Returns `None` when no line matches.
///
/// A fragment that is only whitespace is skipped, so `+name:  ` never
/// blanks out a name set earlier. Lines are split on raw bytes; invalid
/// UTF-8 elsewhere in the diff is ignored and a matched fragment is decoded
/// lossily.
pub fn scan_name_directive<R: BufRead>(reader: R) -> io::Result<Option<String>> {
    let mut name = None;
    for line in reader.split(b'\n') {
        let line = line?;
        if !contains_marker(&line) {
            continue;
        }
        let line = String::from_utf8_lossy(&line);
        if let Some(fragment) = line
            .rsplit(NAME_DIRECTIVE)
            .map(str::trim)
            .find(|s| !s.is_empty())
        {
            name = Some(fragment.to_string());
        }
    }
    Ok(name)
}

fn contains_marker(line: &[u8]) -> bool {
    line.windows(NAME_DIRECTIVE.len())
        .any(|window| window == NAME_DIRECTIVE.as_bytes())
}
