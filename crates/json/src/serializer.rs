//! Compact and pretty-printed textual emission from a [`Value`] tree
//! (`spec.md` §4.5, C5).

use std::fmt::Write as _;

use crate::number::Number;
use crate::value::Value;

/// Knobs for [`to_string_pretty`].
#[derive(Debug, Clone, Copy)]
pub struct PrettyOptions {
    /// Spaces per indent level.
    pub indent_width: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        PrettyOptions { indent_width: 4 }
    }
}

/// Single-line form: no insignificant whitespace.
pub fn to_string_compact(value: &Value) -> String {
    let mut out = String::new();
    write_compact(value, &mut out);
    out
}

/// Multi-line, indented form. Empty containers still render inline (`{}` /
/// `[]`) regardless of depth.
pub fn to_string_pretty(value: &Value, options: PrettyOptions) -> String {
    let mut out = String::new();
    write_pretty(value, &mut out, 0, options);
    out
}

fn write_compact(value: &Value, out: &mut String) {
    match value {
        Value::Null(_) => out.push_str("null"),
        Value::Bool(b, _) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n, _) => write_number(n, out),
        Value::String(s) => write_escaped_string(s.as_str().unwrap_or(""), out),
        Value::Array(arr) => {
            out.push('[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_compact(item, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            out.push('{');
            for (i, (key, val)) in obj.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped_string(key.as_str().unwrap_or(""), out);
                out.push(':');
                write_compact(val, out);
            }
            out.push('}');
        }
    }
}

fn write_pretty(value: &Value, out: &mut String, depth: usize, options: PrettyOptions) {
    match value {
        Value::Array(arr) if arr.len() > 0 => {
            out.push('[');
            out.push('\n');
            for (i, item) in arr.iter().enumerate() {
                push_indent(out, depth + 1, options);
                write_pretty(item, out, depth + 1, options);
                if i + 1 < arr.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth, options);
            out.push(']');
        }
        Value::Object(obj) if obj.len() > 0 => {
            out.push('{');
            out.push('\n');
            for (i, (key, val)) in obj.iter().enumerate() {
                push_indent(out, depth + 1, options);
                write_escaped_string(key.as_str().unwrap_or(""), out);
                out.push_str(": ");
                write_pretty(val, out, depth + 1, options);
                if i + 1 < obj.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth, options);
            out.push('}');
        }
        other => write_compact(other, out),
    }
}

fn push_indent(out: &mut String, depth: usize, options: PrettyOptions) {
    for _ in 0..depth * options.indent_width {
        out.push(' ');
    }
}

fn write_number(n: &Number, out: &mut String) {
    match n {
        Number::I64(v) => {
            let _ = write!(out, "{v}");
        }
        Number::U64(v) => {
            let _ = write!(out, "{v}");
        }
        Number::F64(v) => {
            if v.fract() == 0.0 && v.abs() < 1e16 {
                let _ = write!(out, "{v:.1}");
            } else {
                // Rust's `Display` for `f64` already emits the shortest
                // decimal string that round-trips back to the same bits,
                // which satisfies the spec's 16-significant-digit contract
                // without hand-rolling Grisu/Ryu.
                let _ = write!(out, "{v}");
            }
        }
    }
}

fn write_escaped_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{00}'..='\u{1F}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::default_allocator;
    use crate::array::Array;
    use crate::object::Object;
    use crate::parser::{parse, ParseOptions};

    #[test]
    fn empty_containers_render_inline_in_both_modes() {
        let arr = Value::Array(Array::new(default_allocator()));
        assert_eq!(to_string_compact(&arr), "[]");
        assert_eq!(to_string_pretty(&arr, PrettyOptions::default()), "[]");

        let obj = Value::Object(Object::new(default_allocator()));
        assert_eq!(to_string_compact(&obj), "{}");
    }

    #[test]
    fn compact_object_has_no_insignificant_whitespace() {
        let v = parse(r#"{"a":1,"b":[1,2]}"#, ParseOptions::default()).unwrap();
        assert_eq!(to_string_compact(&v), r#"{"a":1,"b":[1,2]}"#);
    }

    #[test]
    fn pretty_mode_indents_members() {
        let v = parse(r#"{"a":1}"#, ParseOptions::default()).unwrap();
        let pretty = to_string_pretty(&v, PrettyOptions::default());
        assert_eq!(pretty, "{\n    \"a\": 1\n}");
    }

    #[test]
    fn round_trip_through_parse_and_serialize_for_integers() {
        let v = parse(r#"{"x":-5,"y":18446744073709551615}"#, ParseOptions::default()).unwrap();
        let text = to_string_compact(&v);
        let reparsed = parse(&text, ParseOptions::default()).unwrap();
        assert_eq!(v, reparsed);
    }

    #[test]
    fn control_bytes_are_escaped() {
        let s = Value::from_str("a\tb", default_allocator());
        assert_eq!(to_string_compact(&s), r#""a\tb""#);
    }

    #[test]
    fn non_ascii_bytes_pass_through_unchanged() {
        let s = Value::from_str("café \u{1F600}", default_allocator());
        let text = to_string_compact(&s);
        assert_eq!(text, "\"café \u{1F600}\"");
        let reparsed = parse(&text, ParseOptions::default()).unwrap();
        assert_eq!(reparsed.as_str().unwrap(), "café \u{1F600}");
    }
}
