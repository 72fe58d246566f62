//! File IO shared by the parser, the index and the toggle engine.
//!
//! Conventions
//! - Lines are addressed with trailing '\r' stripped; offsets into a line
//!   always refer to that CR-stripped text.
//! - Reassembly uses the newline style detected on read, and restores the
//!   final-newline presence of the original file.
//! - All writes go through `write_atomic`: temp file in the target directory,
//!   fsync, then rename. A failed write never leaves a half-written target.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Newline flavor of a buffer plus whether it ended with a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewlineStyle {
    pub crlf: bool,
    pub final_newline: bool,
}

impl NewlineStyle {
    pub fn separator(self) -> &'static str {
        if self.crlf { "\r\n" } else { "\n" }
    }
}

/// Detect the newline style from the first line break in `content`.
/// Buffers without any '\n' default to LF.
pub fn detect_newline(content: &str) -> NewlineStyle {
    let final_newline = content.ends_with('\n');
    for w in content.as_bytes().windows(2) {
        if w[1] == b'\n' {
            return NewlineStyle {
                crlf: w[0] == b'\r',
                final_newline,
            };
        }
    }
    NewlineStyle {
        crlf: false,
        final_newline,
    }
}

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {}", path.display()))
}

/// Logical lines of `content` with trailing '\r' removed.
/// The trailing empty slice after a final '\n' is not included (as with
/// `str::lines`); line numbers agree with a strict '\n' split for every
/// line that can hold an entry.
pub fn content_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

/// Reassemble lines with the given newline style.
pub fn join_lines(lines: &[String], style: NewlineStyle) -> String {
    let nl = style.separator();
    let mut out = lines.join(nl);
    if style.final_newline {
        out.push_str(nl);
    }
    out
}

/// Atomic write with robust temp file strategy
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    // Prefer same-dir tempfile; fall back to OS temp on EPERM/ENOENT
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    // Preserve original permissions
    #[cfg(unix)]
    let perms = fs::metadata(path)
        .map(|m| m.permissions())
        .unwrap_or_else(|_| std::os::unix::fs::PermissionsExt::from_mode(0o644));
    #[cfg(not(unix))]
    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let tmp = match tempfile::NamedTempFile::new_in(dir) {
        Ok(t) => t,
        Err(_) => tempfile::NamedTempFile::new()?, // fallback to /tmp
    };

    // Write the content fully
    use std::io::Write;
    let mut file = tmp.as_file();
    file.set_len(0)?;
    file.write_all(data)?;
    file.sync_all()?;

    // Apply permissions to the temp file (best effort)
    #[cfg(unix)]
    fs::set_permissions(tmp.path(), perms).context("set temp permissions")?;
    #[cfg(not(unix))]
    if let Some(perms) = perms {
        fs::set_permissions(tmp.path(), perms).context("set temp permissions")?;
    }

    // fsync parent dir to ensure durability on Unix
    #[cfg(unix)]
    {
        if let Ok(parent_file) = std::fs::File::open(dir) {
            let _ = parent_file.sync_all();
        }
    }

    // Atomically replace the destination
    match tmp.persist(path) {
        Ok(_) => {}
        Err(e) => {
            // Different filesystem? Try copy fallback
            std::fs::copy(e.file.path(), path)?;
        }
    }

    Ok(())
}
