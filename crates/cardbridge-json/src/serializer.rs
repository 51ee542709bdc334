//! Canonical JSON serialization.
//!
//! Mirrors the parser's grammar exactly — nothing is emitted here
//! that the parser above couldn't read back. Numbers follow the
//! wire's `"%.f"`-equivalent rule: an integral value is written
//! without a decimal point, everything else with the minimal decimal
//! text `f32`'s own `Display` produces.

use crate::value::JsonValue;

pub fn to_string(value: &JsonValue) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Number(n) => write_number(*n, out),
        JsonValue::String(s) => write_string(s, out),
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        JsonValue::Object(entries) => {
            out.push('{');
            for (i, (key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(val, out);
            }
            out.push('}');
        }
    }
}

fn write_number(n: f32, out: &mut String) {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        out.push_str(&format!("{}", n as i64));
    } else {
        out.push_str(&n.to_string());
    }
}

fn write_string(s: &str, out: &mut String) {
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
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn integral_numbers_drop_decimal_point() {
        assert_eq!(to_string(&JsonValue::Number(42.0)), "42");
        assert_eq!(to_string(&JsonValue::Number(0.0)), "0");
        assert_eq!(to_string(&JsonValue::Number(-5.0)), "-5");
    }

    #[test]
    fn fractional_numbers_keep_decimal_point() {
        assert_eq!(to_string(&JsonValue::Number(3.5)), "3.5");
    }

    #[test]
    fn escapes_control_and_special_bytes() {
        let s = JsonValue::String("a\nb\"c\\d".into());
        assert_eq!(to_string(&s), r#""a\nb\"c\\d""#);
    }

    #[test]
    fn round_trip_semantic_equality() {
        let original = br#"{"i":"q1","c":2,"r":0,"nested":[1,2.5,"x"]}"#;
        let parsed = parse(original).unwrap();
        let serialized = to_string(&parsed);
        let reparsed = parse(serialized.as_bytes()).unwrap();
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn object_key_order_preserved() {
        let parsed = parse(br#"{"z":1,"a":2}"#).unwrap();
        let s = to_string(&parsed);
        assert_eq!(s, r#"{"z":1,"a":2}"#);
    }
}
