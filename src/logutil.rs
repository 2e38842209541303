//! Logging helpers for user-chosen strings (pet names) so log lines stay
//! single-line and bounded.

use std::borrow::Cow;
use std::fmt::Write;

/// Longest name preview written to a log line. Names come straight from the
/// terminal with no length limit; 64 characters is enough to tell pets apart
/// while keeping a hatch or rename record on one readable line.
const MAX_PREVIEW: usize = 64;

/// Escape a string for single-line logging:
/// - backslash, `\n`, `\r`, `\t` become their two-character escapes
/// - other control characters become `\xNN`
/// - anything past `MAX_PREVIEW` characters is cut and marked with `…`
///
/// Borrows the input when nothing needs changing.
pub fn escape_log(s: &str) -> Cow<'_, str> {
    let clean = s.chars().count() <= MAX_PREVIEW
        && !s.chars().any(|c| c == '\\' || c.is_control());
    if clean {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW * 2) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
