use std::fs;
use std::io;
use std::path::Path;

/// Write `lines` to `path` joined by newlines, replacing any existing file.
pub fn save_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    fs::write(path, lines.join("\n"))
}
