//! Escaping of values embedded in `SET_GCODE_VARIABLE` commands.

use std::fmt::Display;

/// Marker written for absent values, both by `escape` and by the clear pass.
pub const NONE_MARKER: &str = "None";

/// Render a value so it fits inside one double-quoted G-code token.
///
/// Absent values become [`NONE_MARKER`]. Present values are stringified,
/// backslashes are doubled, `"` is backslash-escaped and every `\n` / `\r`
/// becomes a single space. No length limit is applied.
pub fn escape<T: Display>(value: Option<T>) -> String {
    let Some(value) = value else {
        return NONE_MARKER.to_string();
    };

    let text = value.to_string();
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}
